//! Stats module - aggregation, metric statistics and yearly reports

mod aggregator;
mod calculator;
mod report;

pub use aggregator::{Bucket, BucketCounts};
pub use calculator::{MetricComparison, MetricStats};
pub use report::{days_in_year, ReportBuilder, ReportError, SummaryReport, YearReport};
