//! Per-year summary reports.

use crate::config::DatasetProfile;
use crate::data::{Dataset, DatasetError, DateRange, FilterCounts, FilterError, Label, RowFilter};
use crate::stats::aggregator::{Aggregator, Bucket, BucketCounts, Bucketing};
use crate::stats::calculator::{MetricComparison, StatsCalculator};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

const WEEKS_PER_YEAR: f64 = 52.0;
const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("Year {0} is outside the supported calendar")]
    InvalidYear(i32),
}

/// Scalar statistics and bucket series for one slice of the dataset.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub title: String,
    pub total: usize,
    pub avg_per_day: f64,
    pub avg_per_week: f64,
    pub avg_per_month: f64,
    /// Weekday counts in calendar order.
    pub weekdays: BucketCounts,
    /// Month counts in calendar order.
    pub months: BucketCounts,
    /// Day counts in date order.
    pub daily: BucketCounts,
    pub busiest_weekday: Option<Bucket>,
    pub quietest_weekday: Option<Bucket>,
    pub busiest_month: Option<Bucket>,
    pub quietest_month: Option<Bucket>,
    /// Top-N categories, ascending by count.
    pub top_categories: BucketCounts,
    pub metric: Option<MetricComparison>,
}

/// Everything computed for one calendar year.
#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    pub year: i32,
    pub filter: FilterCounts,
    pub all: SummaryReport,
    /// Summary of the rows labelled "yes".
    pub labelled: SummaryReport,
}

/// Number of days in `year` (365 or 366).
pub fn days_in_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .unwrap_or(365)
}

/// Builds reports from a cleaned, labelled dataset.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    filter: RowFilter,
    category_column: String,
    label_column: String,
    metric_column: Option<String>,
    top_n: usize,
}

impl ReportBuilder {
    pub fn new(profile: &DatasetProfile, top_n: usize) -> Self {
        Self {
            filter: RowFilter::new(&profile.category_column, &profile.excluded_category),
            category_column: profile.category_column.clone(),
            label_column: profile.label_column.clone(),
            metric_column: profile.metric_column.clone(),
            top_n,
        }
    }

    /// Summarize one year: filter, then report on all rows and on the
    /// "yes"-labelled subset.
    pub fn year_report(&self, dataset: &Dataset, year: i32) -> Result<YearReport, ReportError> {
        let range = DateRange::year(year).ok_or(ReportError::InvalidYear(year))?;
        let outcome = self.filter.apply(dataset, range)?;
        let days = days_in_year(year);

        let all = self.summarize(&outcome.dataset, year.to_string(), days)?;
        let subset = outcome
            .dataset
            .where_eq(&self.label_column, Label::Yes.as_str())?;
        let labelled = self.summarize(
            &subset,
            format!("{} {}", year, self.label_column),
            days,
        )?;

        Ok(YearReport {
            year,
            filter: outcome.counts,
            all,
            labelled,
        })
    }

    /// Summarize an already filtered slice covering `days` calendar days.
    pub fn summarize(
        &self,
        dataset: &Dataset,
        title: String,
        days: u32,
    ) -> Result<SummaryReport, ReportError> {
        let weekdays = Aggregator::count_by_date(dataset, Bucketing::Weekday)?;
        let months = Aggregator::count_by_date(dataset, Bucketing::Month)?;
        let daily = Aggregator::count_by_date(dataset, Bucketing::Day)?;
        let top_categories =
            Aggregator::top_categories(dataset, &self.category_column, self.top_n)?;

        let metric = match &self.metric_column {
            Some(column) => Some(StatsCalculator::compare_metric(
                dataset,
                column,
                &self.label_column,
            )?),
            None => None,
        };

        let total = dataset.height();
        Ok(SummaryReport {
            title,
            total,
            avg_per_day: per(total, days as f64),
            avg_per_week: per(total, WEEKS_PER_YEAR),
            avg_per_month: per(total, MONTHS_PER_YEAR),
            busiest_weekday: weekdays.max().cloned(),
            quietest_weekday: weekdays.min().cloned(),
            busiest_month: months.max().cloned(),
            quietest_month: months.min().cloned(),
            weekdays: weekdays.in_calendar_order(Bucketing::Weekday),
            months: months.in_calendar_order(Bucketing::Month),
            daily: daily.in_calendar_order(Bucketing::Day),
            top_categories,
            metric,
        })
    }
}

fn per(total: usize, divisor: f64) -> f64 {
    if total == 0 || divisor <= 0.0 {
        0.0
    } else {
        total as f64 / divisor
    }
}

fn bucket_label(bucket: &Option<Bucket>) -> String {
    match bucket {
        Some(b) => format!("{} ({})", b.key, b.count),
        None => "-".to_string(),
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        writeln!(f, "  total rows        {}", self.total)?;
        writeln!(f, "  average per day   {:.2}", self.avg_per_day)?;
        writeln!(f, "  average per week  {:.2}", self.avg_per_week)?;
        writeln!(f, "  average per month {:.2}", self.avg_per_month)?;
        writeln!(f, "  busiest weekday   {}", bucket_label(&self.busiest_weekday))?;
        writeln!(f, "  quietest weekday  {}", bucket_label(&self.quietest_weekday))?;
        writeln!(f, "  busiest month     {}", bucket_label(&self.busiest_month))?;
        writeln!(f, "  quietest month    {}", bucket_label(&self.quietest_month))?;

        if !self.top_categories.is_empty() {
            writeln!(f, "  top categories:")?;
            for bucket in self.top_categories.buckets().iter().rev() {
                writeln!(f, "    {:>7}  {}", bucket.count, bucket.key)?;
            }
        }

        if let Some(m) = &self.metric {
            writeln!(
                f,
                "  {}: yes mean {:.2} (n={}), no mean {:.2} (n={})",
                m.column, m.yes.mean, m.yes.count, m.no.mean, m.no.count
            )?;
            if let Some(p) = m.p_value {
                let marker = if m.is_significant { " *" } else { "" };
                writeln!(f, "  welch p-value {:.4}{}", p, marker)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for YearReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.all)?;
        writeln!(f, "  filtered out: {}", self.filter)?;
        write!(f, "{}", self.labelled)
    }
}
