//! Configuration file handling.
//!
//! Loads `trendify.toml`, fills dataset fields from the selected preset and
//! merges command-line overrides on top.

use crate::cli::{Args, OutputFormat};
use crate::data::normalize_name;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "trendify.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset description (columns, lists, date format).
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory that receives rendered PNG charts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Render PNG charts.
    #[serde(default = "default_charts")]
    pub charts: bool,

    /// Number of categories kept by the top-N aggregation.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Report output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            charts: default_charts(),
            top_n: default_top_n(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> String {
    "trendify_out".to_string()
}

fn default_charts() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

/// Built-in dataset layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Municipal crime incident export.
    #[default]
    Crime,
    /// Crowdfunding project records.
    Crowdfunding,
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Crime => write!(f, "crime"),
            Preset::Crowdfunding => write!(f, "crowdfunding"),
        }
    }
}

/// Dataset section as written in the file. Unset fields come from the preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub preset: Preset,
    pub date_column: Option<String>,
    pub extra_date_columns: Option<Vec<String>>,
    pub date_format: Option<String>,
    pub category_column: Option<String>,
    pub secondary_column: Option<String>,
    pub excluded_category: Option<String>,
    pub allow_list: Option<Vec<String>>,
    pub deny_list: Option<Vec<String>>,
    pub label_column: Option<String>,
    pub metric_column: Option<String>,
    pub columns: Option<Vec<String>>,
    pub null_tokens: Option<Vec<String>>,
    pub sentinel: Option<String>,
    #[serde(default)]
    pub years: Vec<i32>,
}

impl DatasetConfig {
    /// Resolve against the preset into a complete profile. Column names and
    /// category values are folded the same way the normalizer folds headers
    /// and cells.
    pub fn resolve(&self) -> DatasetProfile {
        let base = DatasetProfile::preset(self.preset);
        DatasetProfile {
            date_column: normalize_name(&pick(&self.date_column, base.date_column)),
            extra_date_columns: pick(&self.extra_date_columns, base.extra_date_columns)
                .iter()
                .map(|c| normalize_name(c))
                .collect(),
            date_format: pick(&self.date_format, base.date_format),
            category_column: normalize_name(&pick(&self.category_column, base.category_column)),
            secondary_column: normalize_name(&pick(&self.secondary_column, base.secondary_column)),
            excluded_category: normalize_name(&pick(
                &self.excluded_category,
                base.excluded_category,
            )),
            allow_list: pick(&self.allow_list, base.allow_list),
            deny_list: pick(&self.deny_list, base.deny_list),
            label_column: normalize_name(&pick(&self.label_column, base.label_column)),
            metric_column: self
                .metric_column
                .clone()
                .or(base.metric_column)
                .map(|c| normalize_name(&c)),
            columns: pick(&self.columns, base.columns),
            null_tokens: pick(&self.null_tokens, base.null_tokens),
            sentinel: pick(&self.sentinel, base.sentinel),
            years: if self.years.is_empty() {
                base.years
            } else {
                self.years.clone()
            },
        }
    }
}

fn pick<T: Clone>(value: &Option<T>, fallback: T) -> T {
    value.clone().unwrap_or(fallback)
}

/// Everything the pipeline needs to know about one dataset.
///
/// Column names are matched after normalization, so they are lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub date_column: String,
    pub extra_date_columns: Vec<String>,
    pub date_format: String,
    pub category_column: String,
    pub secondary_column: String,
    pub excluded_category: String,
    pub allow_list: Vec<String>,
    pub deny_list: Vec<String>,
    pub label_column: String,
    pub metric_column: Option<String>,
    pub columns: Vec<String>,
    pub null_tokens: Vec<String>,
    pub sentinel: String,
    pub years: Vec<i32>,
}

impl Default for DatasetProfile {
    fn default() -> Self {
        Self::crime()
    }
}

/// Null-like cell values, compared after trimming and case-folding.
pub fn default_null_tokens() -> Vec<String> {
    ["", "na", "null", "<null>"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl DatasetProfile {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Crime => Self::crime(),
            Preset::Crowdfunding => Self::crowdfunding(),
        }
    }

    pub fn crime() -> Self {
        Self {
            date_column: "offense start datetime".to_string(),
            extra_date_columns: Vec::new(),
            date_format: "%m/%d/%Y".to_string(),
            category_column: "offense parent group".to_string(),
            secondary_column: "offense".to_string(),
            excluded_category: "unknown".to_string(),
            allow_list: strings(&[
                "homicide offenses",
                "assault offenses",
                "robbery",
                "sex offenses",
                "kidnapping/abduction",
                "human trafficking",
                "arson",
                "burglary/breaking&entering",
                "motor vehicle theft",
            ]),
            deny_list: strings(&["simple assault", "intimidation"]),
            label_column: "serious".to_string(),
            metric_column: None,
            columns: strings(&[
                "report number",
                "offense start datetime",
                "offense parent group",
                "offense",
                "precinct",
                "mcpp",
            ]),
            null_tokens: default_null_tokens(),
            sentinel: "unknown".to_string(),
            years: Vec::new(),
        }
    }

    pub fn crowdfunding() -> Self {
        Self {
            date_column: "launched".to_string(),
            extra_date_columns: strings(&["deadline"]),
            date_format: "%m/%d/%Y".to_string(),
            category_column: "state".to_string(),
            secondary_column: "main_category".to_string(),
            excluded_category: "live".to_string(),
            allow_list: strings(&["successful"]),
            deny_list: Vec::new(),
            label_column: "funded".to_string(),
            metric_column: Some("usd_pledged_real".to_string()),
            columns: strings(&[
                "id",
                "name",
                "main_category",
                "launched",
                "deadline",
                "state",
                "backers",
                "country",
                "usd_pledged_real",
                "usd_goal_real",
            ]),
            null_tokens: default_null_tokens(),
            sentinel: "unknown".to_string(),
            years: Vec::new(),
        }
    }

    /// All columns that hold dates, primary first.
    pub fn date_columns(&self) -> Vec<String> {
        let mut cols = vec![self.date_column.clone()];
        cols.extend(self.extra_date_columns.iter().cloned());
        cols
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `--config`, else `./trendify.toml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }

    /// Apply command-line overrides.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(preset) = args.preset {
            self.dataset.preset = preset;
        }
        if !args.years.is_empty() {
            self.dataset.years = args.years.clone();
        }
        if let Some(top_n) = args.top_n {
            self.general.top_n = top_n;
        }
        if let Some(dir) = &args.output_dir {
            self.general.output_dir = dir.to_string_lossy().to_string();
        }
        if args.no_charts {
            self.general.charts = false;
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
    }

    /// Default configuration as commented TOML, for `--init-config`.
    pub fn default_toml() -> String {
        let profile = DatasetProfile::crime();
        format!(
            r#"# trendify configuration

[general]
# Directory for rendered PNG charts
output_dir = "{output_dir}"
# Render charts at all
charts = true
# Categories kept in the top-N breakdown
top_n = {top_n}
# "text" or "json"
format = "text"

[dataset]
# "crime" or "crowdfunding"; any field below overrides the preset
preset = "crime"
date_column = "{date_column}"
date_format = "{date_format}"
category_column = "{category_column}"
secondary_column = "{secondary_column}"
excluded_category = "{excluded}"
label_column = "{label}"
# Empty means every year present in the data
years = []
"#,
            output_dir = default_output_dir(),
            top_n = default_top_n(),
            date_column = profile.date_column,
            date_format = profile.date_format,
            category_column = profile.category_column,
            secondary_column = profile.secondary_column,
            excluded = profile.excluded_category,
            label = profile.label_column,
        )
    }
}
