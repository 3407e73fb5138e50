//! Chart Viewer Widget
//! Right side scrollable panel with one card per year report.

use crate::charts::{ChartPlotter, ALL_COLOR, LABELLED_COLOR};
use crate::pipeline::PipelineOutput;
use crate::stats::{SummaryReport, YearReport};
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;
const PLOT_HEIGHT: f32 = 200.0;

/// Which slice of each year is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    All,
    Labelled,
}

#[derive(Default)]
pub struct ChartViewer {
    pub reports: Vec<YearReport>,
    /// Years whose report failed, with the message.
    pub errors: Vec<(i32, String)>,
    pub label_column: String,
    pub section: Section,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
        self.errors.clear();
    }

    /// Take the reports of a finished run, years ascending.
    pub fn set_output(&mut self, output: PipelineOutput, label_column: &str) {
        self.clear();
        self.label_column = label_column.to_string();
        for (year, result) in output.reports {
            match result {
                Ok(report) => self.reports.push(report),
                Err(e) => self.errors.push((year, e.to_string())),
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if self.reports.is_empty() && self.errors.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.radio_value(&mut self.section, Section::All, "All rows");
            ui.radio_value(
                &mut self.section,
                Section::Labelled,
                format!("Only {}", self.label_column),
            );
        });
        ui.add_space(8.0);

        let section = self.section;
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (year, message) in &self.errors {
                    ui.label(
                        RichText::new(format!("⚠ {}: {}", year, message))
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                }
                for report in &self.reports {
                    Self::draw_year_card(ui, report, section);
                    ui.add_space(CARD_SPACING);
                }
            });
    }

    fn draw_year_card(ui: &mut egui::Ui, report: &YearReport, section: Section) {
        let (summary, color) = match section {
            Section::All => (&report.all, ALL_COLOR),
            Section::Labelled => (&report.labelled, LABELLED_COLOR),
        };

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(&summary.title)
                        .size(18.0)
                        .strong()
                        .color(color),
                );
                ui.label(
                    RichText::new(format!("dropped: {}", report.filter))
                        .size(11.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(8.0);

                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.set_width(260.0);
                        ChartPlotter::draw_summary_table(ui, summary);
                        if let Some(metric) = &summary.metric {
                            ui.add_space(8.0);
                            ChartPlotter::draw_metric_table(ui, metric);
                        }
                    });
                    ui.add_space(10.0);
                    ui.vertical(|ui| Self::draw_plots(ui, summary, report.year, color));
                });
            });
    }

    fn draw_plots(ui: &mut egui::Ui, summary: &SummaryReport, year: i32, color: Color32) {
        let id = |kind: &str| format!("{}_{}", summary.title, kind);
        let half = (ui.available_width() - 10.0).max(200.0) / 2.0;

        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.set_width(half);
                ui.label(RichText::new("By weekday").size(14.0).strong());
                ChartPlotter::draw_bucket_chart(
                    ui,
                    &id("weekday"),
                    &summary.weekdays,
                    color,
                    PLOT_HEIGHT,
                );
            });
            ui.vertical(|ui| {
                ui.set_width(half);
                ui.label(RichText::new("By month").size(14.0).strong());
                ChartPlotter::draw_bucket_chart(
                    ui,
                    &id("month"),
                    &summary.months,
                    color,
                    PLOT_HEIGHT,
                );
            });
        });
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.set_width(half);
                ui.label(RichText::new("Top categories").size(14.0).strong());
                ChartPlotter::draw_bucket_chart(
                    ui,
                    &id("categories"),
                    &summary.top_categories,
                    color,
                    PLOT_HEIGHT,
                );
            });
            ui.vertical(|ui| {
                ui.set_width(half);
                ui.label(RichText::new("Per day").size(14.0).strong());
                ChartPlotter::draw_daily_chart(
                    ui,
                    &id("daily"),
                    summary,
                    year,
                    color,
                    PLOT_HEIGHT,
                );
            });
        });
    }
}
