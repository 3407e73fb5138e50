//! Trendify - CSV cleaning, calendar bucketing and yearly chart reports
//!
//! Loads a CSV of dated records, normalizes it, labels each row and prints a
//! report per calendar year, with PNG charts or an interactive viewer.

mod charts;
mod cli;
mod config;
mod data;
mod gui;
mod pipeline;
mod stats;

use anyhow::{bail, Context, Result};
use charts::StaticChartRenderer;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use eframe::egui;
use gui::TrendifyApp;
use pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let args = Args::parse_args();

    if let Err(e) = init_logging(&args) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so JSON on stdout stays parseable.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn run(args: Args) -> Result<ExitCode> {
    if args.init_config {
        write_default_config(Path::new(DEFAULT_CONFIG_FILE))?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::discover(args.config.as_deref())?;
    config.merge_with_args(&args);

    if args.view {
        run_viewer(config, args.csv)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(csv) = args.csv else {
        bail!("No CSV file given");
    };
    run_report(&config, &csv)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Print the reports and render charts. Exits non-zero when any year failed.
fn run_report(config: &Config, csv: &Path) -> Result<ExitCode> {
    let profile = config.dataset.resolve();
    let label_column = profile.label_column.clone();
    let pipeline = Pipeline::new(profile, config.general.top_n);

    let output = pipeline
        .run(csv)
        .with_context(|| format!("Failed to analyze {}", csv.display()))?;

    match config.general.format {
        OutputFormat::Text => {
            for (year, result) in &output.reports {
                match result {
                    Ok(report) => println!("{}", report),
                    Err(e) => println!("== {} ==\n  failed: {}\n", year, e),
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&output.summary())
                .context("Failed to serialize reports")?;
            println!("{}", json);
        }
    }

    if config.general.charts {
        let dir = PathBuf::from(&config.general.output_dir);
        StaticChartRenderer::render_output(&output, &label_column, &dir);
    }

    if output.reports.values().any(|r| r.is_err()) {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_viewer(config: Config, csv: Option<PathBuf>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Trendify"),
        ..Default::default()
    };

    eframe::run_native(
        "Trendify",
        options,
        Box::new(move |cc| Ok(Box::new(TrendifyApp::new(cc, config, csv)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {}", e))
}
