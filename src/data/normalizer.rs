//! Normalizer Module
//! Case-folds column names and string cells, replaces null-like tokens with the
//! sentinel and parses designated date columns.

use crate::config::DatasetProfile;
use crate::data::dataset::{date_column, Dataset, DatasetError};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rejected date values logged individually before going quiet.
const MAX_LOGGED_REJECTS: usize = 5;

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("Date column '{0}' not present")]
    MissingDateColumn(String),
}

/// Cleaned dataset plus what the cleaning could not make sense of.
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub dataset: Dataset,
    /// Rows whose primary date was missing or unparseable. They stay in the
    /// dataset with a null date and are skipped by range filters.
    pub unparseable_dates: usize,
}

/// Matches cells against the configured null-like tokens.
#[derive(Debug, Clone)]
pub struct Normalizer {
    null_tokens: Vec<String>,
    sentinel: String,
    date_columns: Vec<String>,
    date_format: String,
}

impl Normalizer {
    pub fn new(profile: &DatasetProfile) -> Self {
        Self {
            null_tokens: profile
                .null_tokens
                .iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
            sentinel: profile.sentinel.clone(),
            date_columns: profile
                .date_columns()
                .iter()
                .map(|c| normalize_name(c))
                .collect(),
            date_format: profile.date_format.clone(),
        }
    }

    /// Whether `cell` is one of the null-like tokens, ignoring case and
    /// surrounding whitespace.
    pub fn is_null_like(&self, cell: &str) -> bool {
        let folded = cell.trim().to_lowercase();
        self.null_tokens.iter().any(|t| *t == folded)
    }

    /// Normalize one string cell. `None` (a CSV null) maps to the sentinel.
    pub fn clean_cell(&self, cell: Option<&str>) -> String {
        match cell {
            Some(v) if !self.is_null_like(v) => v.trim().to_lowercase(),
            _ => self.sentinel.clone(),
        }
    }

    /// Parse a date cell. Values with a trailing time part are parsed on the
    /// leading date token.
    pub fn parse_date(&self, cell: Option<&str>) -> Option<NaiveDate> {
        let raw = cell?.trim();
        if self.is_null_like(raw) {
            return None;
        }
        NaiveDate::parse_from_str(raw, &self.date_format)
            .ok()
            .or_else(|| {
                let token = raw.split_whitespace().next()?;
                NaiveDate::parse_from_str(token, &self.date_format).ok()
            })
    }

    /// Produce the cleaned dataset. Pure: the input frame is not modified.
    pub fn normalize(&self, df: &DataFrame) -> Result<NormalizeOutcome, NormalizerError> {
        let primary = self
            .date_columns
            .first()
            .cloned()
            .unwrap_or_default();

        let mut columns = Vec::with_capacity(df.width());
        let mut unparseable_dates = 0;

        for col in df.get_columns() {
            let name = normalize_name(col.name().as_str());
            let text = col.cast(&DataType::String)?;
            let cells = text.str()?;

            if self.date_columns.contains(&name) {
                let mut rejected = 0;
                let dates: Vec<Option<NaiveDate>> = cells
                    .into_iter()
                    .map(|cell| {
                        let parsed = self.parse_date(cell);
                        if parsed.is_none() {
                            if rejected < MAX_LOGGED_REJECTS {
                                debug!("Unparseable date in '{}': {:?}", name, cell);
                            }
                            rejected += 1;
                        }
                        parsed
                    })
                    .collect();

                if rejected > 0 {
                    warn!(
                        "{} of {} values in date column '{}' did not parse as {}",
                        rejected,
                        dates.len(),
                        name,
                        self.date_format
                    );
                }
                if name == primary {
                    unparseable_dates = rejected;
                }
                columns.push(date_column(&name, &dates)?);
            } else {
                let values: Vec<String> = cells.into_iter().map(|c| self.clean_cell(c)).collect();
                columns.push(Column::new(name.into(), values));
            }
        }

        let df = DataFrame::new(columns)?;
        if !df
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == primary)
        {
            return Err(NormalizerError::MissingDateColumn(primary));
        }

        info!(
            "Normalized {} rows ({} without a usable date)",
            df.height(),
            unparseable_dates
        );

        Ok(NormalizeOutcome {
            dataset: Dataset::new(df, primary),
            unparseable_dates,
        })
    }
}

/// Column names are trimmed and case-folded.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn normalizer() -> Normalizer {
        let mut profile = DatasetProfile::crime();
        profile.date_column = "date".to_string();
        Normalizer::new(&profile)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_null_like_tokens_any_case_and_padding() {
        let n = normalizer();
        for token in ["", "  ", "NA", "na", "Null", "NULL ", "<Null>", "<NULL>", " <null> "] {
            assert!(n.is_null_like(token), "{token:?} should be null-like");
        }
        assert!(!n.is_null_like("nan"));
        assert!(!n.is_null_like("North"));
    }

    #[test]
    fn test_clean_cell() {
        let n = normalizer();
        assert_eq!(n.clean_cell(Some("  Assault OFFENSES ")), "assault offenses");
        assert_eq!(n.clean_cell(Some("<Null>")), "unknown");
        assert_eq!(n.clean_cell(None), "unknown");
    }

    #[test]
    fn test_parse_date_formats() {
        let n = normalizer();
        assert_eq!(n.parse_date(Some("04/13/2020")), Some(ymd(2020, 4, 13)));
        assert_eq!(
            n.parse_date(Some("04/13/2020 09:00:00 PM")),
            Some(ymd(2020, 4, 13))
        );
        assert_eq!(n.parse_date(Some("2020-04-13")), None);
        assert_eq!(n.parse_date(Some("13/04/2020")), None);
        assert_eq!(n.parse_date(Some("NULL")), None);
        assert_eq!(n.parse_date(None), None);
    }

    #[test]
    fn test_normalize_frame() {
        let raw = df!(
            "Date " => [Some("01/02/2021"), Some("garbage"), None],
            "Offense Parent Group" => [Some(" ROBBERY"), Some("<Null>"), Some("NA")],
            "MCPP" => [Some("Downtown"), None, Some("null ")]
        )
        .unwrap();

        let outcome = normalizer().normalize(&raw).unwrap();
        let ds = &outcome.dataset;
        assert_eq!(outcome.unparseable_dates, 2);
        assert_eq!(
            ds.column_names(),
            vec!["date", "offense parent group", "mcpp"]
        );
        assert_eq!(ds.dates().unwrap(), vec![Some(ymd(2021, 1, 2)), None, None]);
        assert_eq!(
            ds.strings("offense parent group", "?").unwrap(),
            vec!["robbery", "unknown", "unknown"]
        );
        assert_eq!(
            ds.strings("mcpp", "?").unwrap(),
            vec!["downtown", "unknown", "unknown"]
        );
    }

    #[test]
    fn test_no_null_token_survives() {
        let raw = df!("date" => ["01/01/2021"; 4], "x" => ["NA", "null", "<Null>", ""]).unwrap();
        let n = normalizer();
        let ds = n.normalize(&raw).unwrap().dataset;
        for cell in ds.strings("x", "?").unwrap() {
            assert!(!n.is_null_like(&cell));
            assert_eq!(cell, "unknown");
        }
    }

    #[test]
    fn test_missing_date_column() {
        let raw = df!("x" => ["a"]).unwrap();
        assert!(matches!(
            normalizer().normalize(&raw),
            Err(NormalizerError::MissingDateColumn(c)) if c == "date"
        ));
    }
}
