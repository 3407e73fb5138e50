//! Dataset wrapper around a polars DataFrame.
//!
//! Every column is either a string column or a `Date` column. The primary date
//! column drives range filtering and calendar bucketing.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use thiserror::Error;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' is not a date column")]
    NotADateColumn(String),
    #[error("Mask length {mask} does not match row count {rows}")]
    MaskLength { mask: usize, rows: usize },
}

/// An ordered table of records sharing one schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
    date_column: String,
}

impl Dataset {
    pub fn new(df: DataFrame, date_column: impl Into<String>) -> Self {
        Self {
            df,
            date_column: date_column.into(),
        }
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    #[cfg(test)]
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Primary dates, `None` where the source value did not parse.
    pub fn dates(&self) -> Result<Vec<Option<NaiveDate>>, DatasetError> {
        self.dates_of(&self.date_column)
    }

    /// Dates held in any `Date` column.
    pub fn dates_of(&self, column: &str) -> Result<Vec<Option<NaiveDate>>, DatasetError> {
        let col = self.df.column(column)?;
        if col.dtype() != &DataType::Date {
            return Err(DatasetError::NotADateColumn(column.to_string()));
        }
        let days = col.cast(&DataType::Int32)?;
        Ok(days.i32()?.into_iter().map(|d| d.and_then(from_epoch_days)).collect())
    }

    /// Values of a column as owned strings. Nulls become `fallback`.
    pub fn strings(&self, column: &str, fallback: &str) -> Result<Vec<String>, DatasetError> {
        let col = self.df.column(column)?;
        column_strings(col, fallback)
    }

    /// Keep the rows where `mask` is true, preserving order.
    pub fn retain(&self, mask: &[bool]) -> Result<Dataset, DatasetError> {
        if mask.len() != self.df.height() {
            return Err(DatasetError::MaskLength {
                mask: mask.len(),
                rows: self.df.height(),
            });
        }
        let mask = BooleanChunked::new("mask".into(), mask);
        Ok(Self::new(self.df.filter(&mask)?, self.date_column.clone()))
    }

    /// Keep rows whose string column equals `value`.
    pub fn where_eq(&self, column: &str, value: &str) -> Result<Dataset, DatasetError> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(column).eq(lit(value)))
            .collect()?;
        Ok(Self::new(df, self.date_column.clone()))
    }

    /// Drop rows whose string column equals `value`.
    pub fn where_ne(&self, column: &str, value: &str) -> Result<Dataset, DatasetError> {
        let df = self
            .df
            .clone()
            .lazy()
            .filter(col(column).neq(lit(value)))
            .collect()?;
        Ok(Self::new(df, self.date_column.clone()))
    }

    /// Stable ascending sort on the primary date column.
    pub fn sorted_by_date(&self) -> Result<Dataset, DatasetError> {
        let df = self.df.sort(
            [self.date_column.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;
        Ok(Self::new(df, self.date_column.clone()))
    }

    /// Add or replace a string column.
    pub fn with_string_column(
        mut self,
        name: &str,
        values: Vec<String>,
    ) -> Result<Dataset, DatasetError> {
        self.df.with_column(Column::new(name.into(), values))?;
        Ok(self)
    }

    /// Drop exact duplicate rows, keeping the first occurrence in place.
    /// Nulls compare equal.
    pub fn unique_rows(&self) -> Result<Dataset, DatasetError> {
        let df = self
            .df
            .unique_stable(None, UniqueKeepStrategy::First, None)?;
        Ok(Self::new(df, self.date_column.clone()))
    }

    /// Whether the frames hold the same values, nulls compared equal.
    #[cfg(test)]
    pub fn same_rows(&self, other: &Dataset) -> bool {
        self.df.equals_missing(&other.df)
    }
}

/// Build a polars `Date` column from calendar dates.
pub fn date_column(name: &str, dates: &[Option<NaiveDate>]) -> Result<Column, DatasetError> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(to_epoch_days)).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

fn column_strings(col: &Column, fallback: &str) -> Result<Vec<String>, DatasetError> {
    if col.dtype() == &DataType::Date {
        let days = col.cast(&DataType::Int32)?;
        return Ok(days
            .i32()?
            .into_iter()
            .map(|d| match d.and_then(from_epoch_days) {
                Some(date) => date.to_string(),
                None => fallback.to_string(),
            })
            .collect());
    }

    let as_str = col.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fallback).to_string())
        .collect())
}

fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Dataset {
        let mut df = df!("offense" => ["robbery", "arson", "robbery"]).unwrap();
        let dates = [Some(ymd(2021, 3, 2)), None, Some(ymd(2020, 1, 1))];
        df.with_column(date_column("date", &dates).unwrap()).unwrap();
        Dataset::new(df, "date")
    }

    #[test]
    fn test_epoch_conversion() {
        assert_eq!(to_epoch_days(ymd(1970, 1, 1)), 0);
        assert_eq!(from_epoch_days(1), Some(ymd(1970, 1, 2)));
    }

    #[test]
    fn test_dates_round_trip_through_frame() {
        let ds = sample();
        assert_eq!(
            ds.dates().unwrap(),
            vec![Some(ymd(2021, 3, 2)), None, Some(ymd(2020, 1, 1))]
        );
    }

    #[test]
    fn test_dates_of_string_column_errors() {
        let ds = sample();
        assert!(matches!(
            ds.dates_of("offense"),
            Err(DatasetError::NotADateColumn(_))
        ));
    }

    #[test]
    fn test_retain_checks_mask_length() {
        let ds = sample();
        assert!(ds.retain(&[true]).is_err());
        let kept = ds.retain(&[true, false, true]).unwrap();
        assert_eq!(kept.height(), 2);
    }

    #[test]
    fn test_where_eq_and_ne() {
        let ds = sample();
        assert_eq!(ds.where_eq("offense", "robbery").unwrap().height(), 2);
        assert_eq!(ds.where_ne("offense", "robbery").unwrap().height(), 1);
    }

    #[test]
    fn test_unique_rows_keeps_first_in_order() {
        let df = df!(
            "a" => [Some("x"), Some("y"), Some("x"), None, None],
            "b" => ["1", "1", "1", "2", "2"]
        )
        .unwrap();
        let unique = Dataset::new(df, "a").unique_rows().unwrap();
        assert_eq!(unique.height(), 3);
        assert_eq!(
            unique.strings("a", "-").unwrap(),
            vec!["x", "y", "-"]
        );
    }

    #[test]
    fn test_strings_renders_dates() {
        let ds = sample();
        assert_eq!(
            ds.strings("date", "unknown").unwrap(),
            vec!["2021-03-02", "unknown", "2020-01-01"]
        );
    }
}
