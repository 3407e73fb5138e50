//! Chart Plotter Module
//! Interactive bucket charts for the viewer using egui_plot.

use crate::charts::renderer::daily_series;
use crate::stats::{BucketCounts, MetricComparison, MetricStats, SummaryReport};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, HLine, Legend, Line, Plot, PlotPoints};

pub const ALL_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const LABELLED_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const MEAN_COLOR: Color32 = Color32::from_rgb(243, 156, 18); // Orange
const SIGNIFICANT_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Draws report charts and tables with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Bars in bucket order with a dashed line at the mean count.
    pub fn draw_bucket_chart(
        ui: &mut egui::Ui,
        id: &str,
        counts: &BucketCounts,
        color: Color32,
        height: f32,
    ) {
        let labels: Vec<String> = counts.buckets().iter().map(|b| b.key.clone()).collect();
        let mean = counts.mean();

        let bars: Vec<Bar> = counts
            .buckets()
            .iter()
            .enumerate()
            .map(|(i, b)| Bar::new(i as f64, b.count as f64).name(&b.key).width(0.7))
            .collect();

        Plot::new(id)
            .height(height)
            .legend(Legend::default())
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_y(0.0)
            .y_axis_label("Count")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (mark.value - idx).abs() < 1e-6 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(color).name("count"));
                plot_ui.hline(
                    HLine::new(mean)
                        .color(MEAN_COLOR)
                        .width(1.5)
                        .name(format!("mean {:.1}", mean)),
                );
            });
    }

    /// Daily counts over the year as a line, with the per-day average.
    pub fn draw_daily_chart(
        ui: &mut egui::Ui,
        id: &str,
        summary: &SummaryReport,
        year: i32,
        color: Color32,
        height: f32,
    ) {
        let points: PlotPoints = daily_series(&summary.daily, year)
            .iter()
            .enumerate()
            .map(|(i, c)| [(i + 1) as f64, *c as f64])
            .collect();
        let mean = summary.avg_per_day;

        Plot::new(id)
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label("Day of year")
            .y_axis_label("Count")
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(points).color(color).width(1.0).name("daily count"));
                plot_ui.hline(
                    HLine::new(mean)
                        .color(MEAN_COLOR)
                        .width(1.5)
                        .name(format!("mean {:.2}", mean)),
                );
            });
    }

    /// Scalar figures of a summary.
    pub fn draw_summary_table(ui: &mut egui::Ui, summary: &SummaryReport) {
        let bucket = |b: &Option<crate::stats::Bucket>| match b {
            Some(b) => format!("{} ({})", b.key, b.count),
            None => "-".to_string(),
        };

        let rows = [
            ("Total", summary.total.to_string()),
            ("Per day", format!("{:.2}", summary.avg_per_day)),
            ("Per week", format!("{:.2}", summary.avg_per_week)),
            ("Per month", format!("{:.2}", summary.avg_per_month)),
            ("Busiest weekday", bucket(&summary.busiest_weekday)),
            ("Quietest weekday", bucket(&summary.quietest_weekday)),
            ("Busiest month", bucket(&summary.busiest_month)),
            ("Quietest month", bucket(&summary.quietest_month)),
        ];

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("summary_{}", summary.title)))
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for (name, value) in rows {
                            ui.label(RichText::new(name).strong().size(11.0));
                            ui.label(RichText::new(value).size(11.0));
                            ui.end_row();
                        }
                    });
            });
    }

    /// Metric statistics per label group with the Welch p-value.
    pub fn draw_metric_table(ui: &mut egui::Ui, metric: &MetricComparison) {
        let default_text_color = ui.visuals().text_color();
        let p_color = if metric.is_significant {
            SIGNIFICANT_COLOR
        } else {
            default_text_color
        };

        let row = |ui: &mut egui::Ui, name: &str, s: &MetricStats| {
            ui.label(RichText::new(name).size(11.0));
            ui.label(RichText::new(s.count.to_string()).size(11.0));
            for v in [s.mean, s.median, s.std, s.p95, s.p05] {
                ui.label(RichText::new(format!("{:.2}", v)).size(11.0));
            }
            ui.end_row();
        };

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&metric.column).strong());
                egui::Grid::new(ui.make_persistent_id(format!("metric_{}", metric.column)))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Group", "N", "Mean", "Median", "Std", "P95", "P05"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();
                        row(ui, "yes", &metric.yes);
                        row(ui, "no", &metric.no);
                    });

                ui.horizontal(|ui| {
                    match metric.std_diff {
                        Some(d) => {
                            ui.label(RichText::new(format!("(yes-no)/σ {:.3}", d)).size(11.0))
                        }
                        None => ui.label(RichText::new("(yes-no)/σ -").size(11.0)),
                    };
                    match metric.p_value {
                        Some(p) => ui.label(
                            RichText::new(format!("p-value {:.4}", p))
                                .size(11.0)
                                .color(p_color),
                        ),
                        None => ui.label(RichText::new("p-value -").size(11.0)),
                    };
                    if metric.skipped > 0 {
                        ui.label(
                            RichText::new(format!("{} non-numeric skipped", metric.skipped))
                                .size(11.0)
                                .color(Color32::GRAY),
                        );
                    }
                });
            });
    }
}
