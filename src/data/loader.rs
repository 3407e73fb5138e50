//! CSV Data Loader Module
//! Reads the source CSV into a DataFrame with every column kept as text.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),
    #[error("Column '{0}' not present in CSV")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file. Schema inference is disabled so every column is a
    /// string column; type coercion belongs to the normalizer.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        debug!("Columns: {:?}", df.get_column_names());

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Hand the loaded DataFrame over to the pipeline.
    pub fn take_dataframe(&mut self) -> Result<DataFrame, LoaderError> {
        self.df.take().ok_or(LoaderError::NoData)
    }
}

/// Keep only `columns`. Headers are matched after trimming and case-folding,
/// so `"Offense "` satisfies a request for `"offense"`. An empty list keeps
/// everything.
pub fn select_columns(df: &DataFrame, columns: &[String]) -> Result<DataFrame, LoaderError> {
    if columns.is_empty() {
        return Ok(df.clone());
    }
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut picked = Vec::with_capacity(columns.len());
    for wanted in columns {
        let wanted_key = wanted.trim().to_lowercase();
        let header = present
            .iter()
            .find(|h| h.trim().to_lowercase() == wanted_key)
            .ok_or_else(|| LoaderError::MissingColumn(wanted.clone()))?;
        picked.push(header.clone());
    }
    Ok(df.select(picked)?)
}
