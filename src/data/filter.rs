//! Filter stage: date range, exact duplicates, excluded category.

use crate::data::dataset::{Dataset, DatasetError};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// January 1st through December 31st of `year`.
    pub fn year(year: i32) -> Option<Self> {
        Some(Self::new(
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// A range whose start lies after its end selects nothing.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Row counts removed by each rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub undated_skipped: usize,
    pub out_of_range: usize,
    pub duplicates_removed: usize,
    pub excluded_removed: usize,
}

impl fmt::Display for FilterCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} undated, {} outside the year, {} duplicate, {} excluded",
            self.undated_skipped, self.out_of_range, self.duplicates_removed, self.excluded_removed
        )
    }
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    pub counts: FilterCounts,
}

/// Restricts a cleaned dataset to a date range.
#[derive(Debug, Clone)]
pub struct RowFilter {
    category_column: String,
    excluded_category: String,
}

impl RowFilter {
    pub fn new(category_column: impl Into<String>, excluded_category: impl Into<String>) -> Self {
        Self {
            category_column: category_column.into(),
            excluded_category: excluded_category.into(),
        }
    }

    /// Rows dated inside `range`, exact duplicates dropped (first kept), the
    /// excluded category dropped, sorted ascending by date.
    pub fn apply(&self, dataset: &Dataset, range: DateRange) -> Result<FilterOutcome, FilterError> {
        let mut counts = FilterCounts::default();

        let dates = dataset.dates()?;
        let in_range: Vec<bool> = dates
            .iter()
            .map(|d| match d {
                None => {
                    counts.undated_skipped += 1;
                    false
                }
                Some(date) if range.contains(*date) => true,
                Some(_) => {
                    counts.out_of_range += 1;
                    false
                }
            })
            .collect();
        let ranged = dataset.retain(&in_range)?;

        let (unique, duplicates) = dedupe(&ranged)?;
        counts.duplicates_removed = duplicates;

        let before = unique.height();
        let kept = unique.where_ne(&self.category_column, &self.excluded_category)?;
        counts.excluded_removed = before - kept.height();

        let sorted = kept.sorted_by_date()?;
        debug!(
            "Filter {}..={}: kept {} rows, {:?}",
            range.start,
            range.end,
            sorted.height(),
            counts
        );

        Ok(FilterOutcome {
            dataset: sorted,
            counts,
        })
    }
}

/// Drop exact duplicate rows, keeping the first occurrence.
pub fn dedupe(dataset: &Dataset) -> Result<(Dataset, usize), FilterError> {
    let unique = dataset.unique_rows()?;
    let removed = dataset.height() - unique.height();
    Ok((unique, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::date_column;
    use polars::df;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset(dates: &[Option<NaiveDate>], categories: &[&str]) -> Dataset {
        let mut df = df!("category" => categories).unwrap();
        df.with_column(date_column("date", dates).unwrap()).unwrap();
        Dataset::new(df, "date")
    }

    fn filter() -> RowFilter {
        RowFilter::new("category", "unknown")
    }

    #[test]
    fn test_single_day_range() {
        let ds = dataset(
            &[
                Some(ymd(2020, 1, 1)),
                Some(ymd(2020, 1, 2)),
                Some(ymd(2020, 1, 3)),
            ],
            &["a", "b", "c"],
        );
        let day = ymd(2020, 1, 2);
        let out = filter().apply(&ds, DateRange::new(day, day)).unwrap();
        assert_eq!(out.dataset.height(), 1);
        assert_eq!(out.dataset.dates().unwrap(), vec![Some(day)]);
        assert_eq!(out.counts.out_of_range, 2);
    }

    #[test]
    fn test_result_within_bounds_and_sorted() {
        let ds = dataset(
            &[
                Some(ymd(2021, 6, 1)),
                Some(ymd(2020, 12, 31)),
                Some(ymd(2021, 1, 1)),
                None,
                Some(ymd(2021, 12, 31)),
                Some(ymd(2022, 1, 1)),
            ],
            &["a", "b", "c", "d", "e", "f"],
        );
        let range = DateRange::year(2021).unwrap();
        let out = filter().apply(&ds, range).unwrap();
        let dates: Vec<NaiveDate> = out.dataset.dates().unwrap().into_iter().flatten().collect();
        assert_eq!(
            dates,
            vec![ymd(2021, 1, 1), ymd(2021, 6, 1), ymd(2021, 12, 31)]
        );
        assert!(dates.iter().all(|d| range.contains(*d)));
        assert_eq!(out.counts.undated_skipped, 1);
        assert_eq!(out.counts.out_of_range, 2);
        assert_eq!(
            out.counts.to_string(),
            "1 undated, 2 outside the year, 0 duplicate, 0 excluded"
        );
    }

    #[test]
    fn test_inverted_range_is_empty_not_error() {
        let ds = dataset(&[Some(ymd(2020, 5, 5))], &["a"]);
        let range = DateRange::new(ymd(2020, 12, 1), ymd(2020, 1, 1));
        assert!(range.is_empty());
        let out = filter().apply(&ds, range).unwrap();
        assert!(out.dataset.is_empty());
    }

    #[test]
    fn test_duplicates_and_excluded_removed() {
        let d = Some(ymd(2020, 3, 3));
        let ds = dataset(&[d, d, d, d], &["a", "a", "b", "unknown"]);
        let out = filter().apply(&ds, DateRange::year(2020).unwrap()).unwrap();
        assert_eq!(out.dataset.height(), 2);
        assert_eq!(out.counts.duplicates_removed, 1);
        assert_eq!(out.counts.excluded_removed, 1);
        assert_eq!(
            out.dataset.strings("category", "?").unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_dedupe_idempotent() {
        let d = Some(ymd(2020, 3, 3));
        let ds = dataset(&[d, d, Some(ymd(2020, 3, 4)), d], &["a", "a", "a", "b"]);
        let (once, removed) = dedupe(&ds).unwrap();
        assert_eq!(removed, 1);
        let (twice, removed_again) = dedupe(&once).unwrap();
        assert_eq!(removed_again, 0);
        assert!(once.same_rows(&twice));
    }

    #[test]
    fn test_dedupe_compares_cells_not_joined_text() {
        let d = Some(ymd(2020, 3, 3));
        let mut df = df!(
            "a" => ["x\u{1f}y", "x"],
            "b" => ["z", "y\u{1f}z"]
        )
        .unwrap();
        df.with_column(date_column("date", &[d, d]).unwrap()).unwrap();
        let ds = Dataset::new(df, "date");

        let (unique, removed) = dedupe(&ds).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(unique.height(), 2);
    }
}
