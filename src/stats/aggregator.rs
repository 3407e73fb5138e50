//! Group-and-count aggregation over calendar buckets and categories.

use crate::data::{month_name, weekday_name, Dataset, DatasetError, MONTHS, WEEKDAYS};
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Inputs at least this long are counted in parallel chunks.
const PARALLEL_THRESHOLD: usize = 50_000;
const CHUNK_SIZE: usize = 16_384;

/// How a date maps to a bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bucketing {
    /// English day name, e.g. `"Monday"`.
    Weekday,
    /// English month name, e.g. `"January"`.
    Month,
    /// ISO date, e.g. `"2021-03-02"`.
    Day,
}

impl Bucketing {
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Bucketing::Weekday => weekday_name(date).to_string(),
            Bucketing::Month => month_name(date).to_string(),
            Bucketing::Day => date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Sort position of a key in calendar order. Unknown keys sort last.
    fn rank(&self, key: &str) -> usize {
        match self {
            Bucketing::Weekday => WEEKDAYS.iter().position(|d| *d == key),
            Bucketing::Month => MONTHS.iter().position(|m| *m == key),
            Bucketing::Day => NaiveDate::parse_from_str(key, "%Y-%m-%d")
                .ok()
                .map(|d| d.num_days_from_ce().max(0) as usize),
        }
        .unwrap_or(usize::MAX)
    }
}

/// One (key, count) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub count: usize,
}

/// Bucket counts in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BucketCounts {
    buckets: Vec<Bucket>,
}

impl BucketCounts {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<Bucket> = Vec::new();
        for key in keys {
            let key = key.as_ref();
            match index.get(key) {
                Some(&i) => buckets[i].count += 1,
                None => {
                    index.insert(key.to_string(), buckets.len());
                    buckets.push(Bucket {
                        key: key.to_string(),
                        count: 1,
                    });
                }
            }
        }
        Self { buckets }
    }

    /// Same result as [`BucketCounts::from_keys`]; large inputs are split into
    /// chunks counted on the rayon pool and merged in chunk order.
    pub fn from_keys_parallel(keys: &[String]) -> Self {
        if keys.len() < PARALLEL_THRESHOLD {
            return Self::from_keys(keys);
        }
        let partials: Vec<BucketCounts> = keys
            .par_chunks(CHUNK_SIZE)
            .map(|chunk| Self::from_keys(chunk))
            .collect();

        let mut merged = BucketCounts::default();
        for partial in partials {
            merged.merge(partial);
        }
        merged
    }

    /// Add `other`'s counts. New keys are appended in `other`'s order.
    pub fn merge(&mut self, other: BucketCounts) {
        let mut index: HashMap<String, usize> = self
            .buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.key.clone(), i))
            .collect();
        for bucket in other.buckets {
            match index.get(&bucket.key) {
                Some(&i) => self.buckets[i].count += bucket.count,
                None => {
                    index.insert(bucket.key.clone(), self.buckets.len());
                    self.buckets.push(bucket);
                }
            }
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<usize> {
        self.buckets.iter().find(|b| b.key == key).map(|b| b.count)
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Highest count; ties go to the bucket seen first.
    pub fn max(&self) -> Option<&Bucket> {
        self.buckets.iter().fold(None, |best, b| match best {
            Some(top) if top.count >= b.count => Some(top),
            _ => Some(b),
        })
    }

    /// Lowest count; ties go to the bucket seen first.
    pub fn min(&self) -> Option<&Bucket> {
        self.buckets.iter().fold(None, |best, b| match best {
            Some(low) if low.count <= b.count => Some(low),
            _ => Some(b),
        })
    }

    /// Mean count per present bucket, 0 when there are none.
    pub fn mean(&self) -> f64 {
        if self.buckets.is_empty() {
            0.0
        } else {
            self.total() as f64 / self.buckets.len() as f64
        }
    }

    /// Sort ascending by count (stable) and keep the last `n`.
    pub fn top_n(&self, n: usize) -> BucketCounts {
        let mut sorted = self.buckets.clone();
        sorted.sort_by_key(|b| b.count);
        let skip = sorted.len().saturating_sub(n);
        BucketCounts {
            buckets: sorted.into_iter().skip(skip).collect(),
        }
    }

    /// Reorder for display: Monday..Sunday, January..December, or by date.
    pub fn in_calendar_order(&self, bucketing: Bucketing) -> BucketCounts {
        let mut sorted = self.buckets.clone();
        sorted.sort_by_key(|b| bucketing.rank(&b.key));
        BucketCounts { buckets: sorted }
    }
}

/// Stateless helper that groups dataset rows into buckets.
pub struct Aggregator;

impl Aggregator {
    /// Count rows per calendar bucket of the primary date. Undated rows are
    /// not counted.
    pub fn count_by_date(
        dataset: &Dataset,
        bucketing: Bucketing,
    ) -> Result<BucketCounts, DatasetError> {
        let keys: Vec<String> = dataset
            .dates()?
            .into_iter()
            .flatten()
            .map(|d| bucketing.key(d))
            .collect();
        Ok(BucketCounts::from_keys_parallel(&keys))
    }

    /// Count rows per distinct value of a column.
    pub fn count_by_column(dataset: &Dataset, column: &str) -> Result<BucketCounts, DatasetError> {
        let keys = dataset.strings(column, "")?;
        Ok(BucketCounts::from_keys_parallel(&keys))
    }

    /// The `n` most frequent values of `column`, ascending by count.
    pub fn top_categories(
        dataset: &Dataset,
        column: &str,
        n: usize,
    ) -> Result<BucketCounts, DatasetError> {
        Ok(Self::count_by_column(dataset, column)?.top_n(n))
    }
}
