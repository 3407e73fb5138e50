//! Static Chart Renderer
//! Writes PNG charts for a yearly report with plotters.
//!
//! Per report section:
//! 1. Weekday bars (Monday..Sunday)
//! 2. Month bars (January..December)
//! 3. Top-N category bars (ascending)
//! 4. Daily line over the year
//!
//! Every chart carries a horizontal line at the mean bucket count.

use crate::pipeline::PipelineOutput;
use crate::stats::{BucketCounts, SummaryReport, YearReport};
use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;

const BAR_COLOR: RGBColor = RGBColor(91, 155, 213);
const LINE_COLOR: RGBColor = RGBColor(112, 173, 71);
const MEAN_COLOR: RGBColor = RGBColor(237, 125, 49);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create chart directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Drawing failed: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(e.to_string())
    }
}

/// Which chart of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Weekday,
    Month,
    Categories,
    Daily,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Weekday,
        ChartKind::Month,
        ChartKind::Categories,
        ChartKind::Daily,
    ];

    fn slug(&self) -> &'static str {
        match self {
            ChartKind::Weekday => "weekday",
            ChartKind::Month => "month",
            ChartKind::Categories => "categories",
            ChartKind::Daily => "daily",
        }
    }
}

/// `2021_serious_month.png` style names.
pub fn chart_file_name(year: i32, section: &str, kind: ChartKind) -> String {
    let section: String = section
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{}_{}_{}.png", year, section, kind.slug())
}

/// Counts for every day of `year` (index 0 = January 1st), zero where the
/// report has no bucket.
pub fn daily_series(daily: &BucketCounts, year: i32) -> Vec<usize> {
    let days = crate::stats::days_in_year(year) as usize;
    let mut series = vec![0; days];
    for bucket in daily.buckets() {
        if let Ok(date) = NaiveDate::parse_from_str(&bucket.key, "%Y-%m-%d") {
            if date.year() == year {
                series[date.ordinal0() as usize] += bucket.count;
            }
        }
    }
    series
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every successful year of a run. Failures are logged and
    /// skipped; returns the number of files written.
    pub fn render_output(output: &PipelineOutput, label_column: &str, dir: &Path) -> usize {
        let mut written = 0;
        for report in output.successful() {
            match Self::render_year(report, label_column, dir) {
                Ok(files) => written += files.len(),
                Err(e) => warn!("Charts for {} not rendered: {}", report.year, e),
            }
        }
        info!("Wrote {} charts to {}", written, dir.display());
        written
    }

    /// Render both sections of a year report into `dir`. Returns the written
    /// files.
    pub fn render_year(
        report: &YearReport,
        label_column: &str,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ChartError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (section, summary) in [("all", &report.all), (label_column, &report.labelled)] {
            for kind in ChartKind::ALL {
                let path = dir.join(chart_file_name(report.year, section, kind));
                Self::render(summary, report.year, kind, &path)?;
                debug!("Wrote {}", path.display());
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Render one chart of one section to `path`.
    pub fn render(
        summary: &SummaryReport,
        year: i32,
        kind: ChartKind,
        path: &Path,
    ) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        match kind {
            ChartKind::Weekday => Self::draw_bars(
                &root,
                &format!("{}: count by weekday", summary.title),
                "Weekday",
                &summary.weekdays,
            )?,
            ChartKind::Month => Self::draw_bars(
                &root,
                &format!("{}: count by month", summary.title),
                "Month",
                &summary.months,
            )?,
            ChartKind::Categories => Self::draw_bars(
                &root,
                &format!("{}: top categories", summary.title),
                "Category",
                &summary.top_categories,
            )?,
            ChartKind::Daily => Self::draw_daily(
                &root,
                &format!("{}: count per day", summary.title),
                &daily_series(&summary.daily, year),
                summary.avg_per_day,
            )?,
        }

        root.present()?;
        Ok(())
    }

    fn draw_bars(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        x_desc: &str,
        counts: &BucketCounts,
    ) -> Result<(), ChartError> {
        let labels: Vec<String> = counts.buckets().iter().map(|b| b.key.clone()).collect();
        let n = labels.len().max(1) as u32;
        let mean = counts.mean();
        let y_max = counts.max().map(|b| b.count).unwrap_or(0).max(1) as f64 * 1.15;

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(70)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc("Count")
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(counts.buckets().iter().enumerate().map(|(i, b)| {
            let i = i as u32;
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), b.count as f64),
                ],
                BAR_COLOR.filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))?;

        chart
            .draw_series(LineSeries::new(
                vec![(SegmentValue::Exact(0), mean), (SegmentValue::Exact(n), mean)],
                MEAN_COLOR.stroke_width(2),
            ))?
            .label(format!("mean {:.1}", mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &MEAN_COLOR));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }

    fn draw_daily(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        series: &[usize],
        mean: f64,
    ) -> Result<(), ChartError> {
        let days = series.len().max(1) as u32;
        let y_max = series.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.15;

        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(1u32..days, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Day of year")
            .y_desc("Count")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                series
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i as u32 + 1, *c as f64)),
                LINE_COLOR.stroke_width(1),
            ))?
            .label("daily count")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &LINE_COLOR));

        chart
            .draw_series(LineSeries::new(
                vec![(1u32, mean), (days, mean)],
                MEAN_COLOR.stroke_width(2),
            ))?
            .label(format!("mean {:.2}", mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &MEAN_COLOR));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_file_name() {
        assert_eq!(
            chart_file_name(2021, "serious", ChartKind::Month),
            "2021_serious_month.png"
        );
        assert_eq!(
            chart_file_name(2020, "All Rows", ChartKind::Daily),
            "2020_all_rows_daily.png"
        );
    }

    #[test]
    fn test_daily_series_fills_gaps() {
        let daily =
            BucketCounts::from_keys(["2020-01-01", "2020-01-01", "2020-12-31", "2019-05-05"]);
        let series = daily_series(&daily, 2020);
        assert_eq!(series.len(), 366);
        assert_eq!(series[0], 2);
        assert_eq!(series[1], 0);
        assert_eq!(series[365], 1);
        assert_eq!(series.iter().sum::<usize>(), 3);
    }
}
