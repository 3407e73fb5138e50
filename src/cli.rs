//! Command-line interface argument parsing.

use crate::config::Preset;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

/// Trendify - yearly trend reports from a CSV of dated records
///
/// Cleans the table, keeps one calendar year at a time and reports counts per
/// weekday, month and category with PNG charts.
///
/// Examples:
///   trendify crime_data.csv
///   trendify crime_data.csv --year 2021 --year 2022 --format json
///   trendify ks-projects.csv --preset crowdfunding --no-charts
///   trendify --view
///   trendify --init-config
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file to analyze
    #[arg(value_name = "CSV", required_unless_present_any = ["init_config", "view"])]
    pub csv: Option<PathBuf>,

    /// Dataset layout to assume
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// Restrict reports to these years (repeatable)
    #[arg(short, long = "year", value_name = "YEAR")]
    pub years: Vec<i32>,

    /// Number of categories in the top-N breakdown
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Directory for PNG charts
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long)]
    pub no_charts: bool,

    /// Report format on stdout
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for trendify.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Open the desktop viewer instead of printing
    #[arg(long)]
    pub view: bool,

    /// Write a default trendify.toml and exit
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Printed report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_years_and_preset() {
        let args = Args::try_parse_from([
            "trendify",
            "data.csv",
            "--year",
            "2021",
            "-y",
            "2022",
            "--preset",
            "crowdfunding",
        ])
        .unwrap();
        assert_eq!(args.csv, Some(PathBuf::from("data.csv")));
        assert_eq!(args.years, vec![2021, 2022]);
        assert_eq!(args.preset, Some(Preset::Crowdfunding));
    }

    #[test]
    fn test_preset_only_from_flag() {
        let args = Args::try_parse_from(["trendify", "data.csv"]).unwrap();
        assert_eq!(args.preset, None);
    }

    #[test]
    fn test_csv_required_without_view() {
        assert!(Args::try_parse_from(["trendify"]).is_err());
        assert!(Args::try_parse_from(["trendify", "--view"]).is_ok());
        assert!(Args::try_parse_from(["trendify", "--init-config"]).is_ok());
    }

    #[test]
    fn test_log_level() {
        let args = Args::try_parse_from(["trendify", "a.csv", "-v"]).unwrap();
        assert_eq!(args.log_level(), Level::DEBUG);
        let args = Args::try_parse_from(["trendify", "a.csv", "-q"]).unwrap();
        assert_eq!(args.log_level(), Level::WARN);
        assert!(Args::try_parse_from(["trendify", "a.csv", "-q", "-v"]).is_err());
    }
}
