//! Calendar columns derived from the primary date.

use crate::data::dataset::{Dataset, DatasetError};
use chrono::{Datelike, NaiveDate};

pub const YEAR_COLUMN: &str = "year";
pub const MONTH_COLUMN: &str = "month";
pub const WEEKDAY_COLUMN: &str = "weekday";

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// Add `year`, `month` and `weekday` label columns. Rows without a date get
/// the sentinel.
pub fn add_calendar_columns(dataset: Dataset, sentinel: &str) -> Result<Dataset, DatasetError> {
    let dates = dataset.dates()?;
    let label = |f: &dyn Fn(NaiveDate) -> String| -> Vec<String> {
        dates
            .iter()
            .map(|d| d.map(f).unwrap_or_else(|| sentinel.to_string()))
            .collect()
    };

    let years = label(&|d| d.year().to_string());
    let months = label(&|d| month_name(d).to_string());
    let weekdays = label(&|d| weekday_name(d).to_string());

    dataset
        .with_string_column(YEAR_COLUMN, years)?
        .with_string_column(MONTH_COLUMN, months)?
        .with_string_column(WEEKDAY_COLUMN, weekdays)
}
