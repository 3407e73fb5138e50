//! End-to-end pipeline: load, clean, label, then one report per year.

use crate::config::DatasetProfile;
use crate::data::{
    add_calendar_columns, select_columns, Classifier, DataLoader, Dataset, DatasetError,
    LoaderError, Normalizer, NormalizerError,
};
use crate::stats::{ReportBuilder, ReportError, YearReport};
use chrono::Datelike;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Normalizer(#[from] NormalizerError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Cleaned, labelled dataset ready for reporting.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub dataset: Dataset,
    pub unparseable_dates: usize,
}

/// Result of one run. Each year maps to its own report or error.
#[derive(Debug)]
pub struct PipelineOutput {
    pub source: PathBuf,
    pub rows_loaded: usize,
    pub unparseable_dates: usize,
    pub reports: BTreeMap<i32, Result<YearReport, ReportError>>,
}

/// Serializable view of [`PipelineOutput`].
#[derive(Debug, Serialize)]
pub struct OutputSummary<'a> {
    pub source: String,
    pub rows_loaded: usize,
    pub unparseable_dates: usize,
    pub years: Vec<&'a YearReport>,
    pub errors: BTreeMap<i32, String>,
}

impl PipelineOutput {
    pub fn successful(&self) -> impl Iterator<Item = &YearReport> {
        self.reports.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn summary(&self) -> OutputSummary<'_> {
        OutputSummary {
            source: self.source.display().to_string(),
            rows_loaded: self.rows_loaded,
            unparseable_dates: self.unparseable_dates,
            years: self.successful().collect(),
            errors: self
                .reports
                .iter()
                .filter_map(|(year, r)| r.as_ref().err().map(|e| (*year, e.to_string())))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    profile: DatasetProfile,
    top_n: usize,
}

impl Pipeline {
    pub fn new(profile: DatasetProfile, top_n: usize) -> Self {
        Self { profile, top_n }
    }

    pub fn profile(&self) -> &DatasetProfile {
        &self.profile
    }

    /// Load `path` and report on every configured (or present) year.
    pub fn run(&self, path: &Path) -> Result<PipelineOutput, PipelineError> {
        let start = Instant::now();

        let mut loader = DataLoader::new();
        loader.load_csv(path)?;
        let rows_loaded = loader.get_row_count();
        let df = loader.take_dataframe()?;

        let prepared = self.prepare(&df)?;
        let years = self.years(&prepared.dataset)?;
        info!("Reporting on {} year(s): {:?}", years.len(), years);

        let reports = self.reports(&prepared.dataset, &years);
        debug!("Pipeline finished in {:?}", start.elapsed());

        Ok(PipelineOutput {
            source: path.to_path_buf(),
            rows_loaded,
            unparseable_dates: prepared.unparseable_dates,
            reports,
        })
    }

    /// Select, normalize, label and add calendar columns.
    pub fn prepare(&self, df: &DataFrame) -> Result<PreparedData, PipelineError> {
        let p = &self.profile;
        let selected = select_columns(df, &p.columns)?;
        let outcome = Normalizer::new(p).normalize(&selected)?;

        let labelled = Classifier::from_profile(p).label_dataset(
            outcome.dataset,
            &p.category_column,
            &p.secondary_column,
            &p.label_column,
        )?;
        let dataset = add_calendar_columns(labelled, &p.sentinel)?;

        Ok(PreparedData {
            dataset,
            unparseable_dates: outcome.unparseable_dates,
        })
    }

    /// Configured years, or every year present in the primary date column.
    pub fn years(&self, dataset: &Dataset) -> Result<Vec<i32>, DatasetError> {
        if !self.profile.years.is_empty() {
            let mut years = self.profile.years.clone();
            years.sort_unstable();
            years.dedup();
            return Ok(years);
        }
        let present: BTreeSet<i32> = dataset
            .dates()?
            .into_iter()
            .flatten()
            .map(|d| d.year())
            .collect();
        Ok(present.into_iter().collect())
    }

    /// One report per year, computed in parallel. A failing year does not
    /// affect the others.
    pub fn reports(
        &self,
        dataset: &Dataset,
        years: &[i32],
    ) -> BTreeMap<i32, Result<YearReport, ReportError>> {
        let builder = ReportBuilder::new(&self.profile, self.top_n);
        years
            .par_iter()
            .map(|&year| {
                let report = builder.year_report(dataset, year);
                match &report {
                    Ok(r) => info!(
                        "{}: {} rows, {} {}",
                        year, r.all.total, r.labelled.total, self.profile.label_column
                    ),
                    Err(e) => warn!("{}: report failed: {}", year, e),
                }
                (year, report)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("incidents.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    const HEADER: &str = "Report Number,Offense Start DateTime,Offense Parent Group,Offense,Precinct,MCPP,Beat";

    fn crime_csv(dir: &Path) -> PathBuf {
        write_csv(
            dir,
            &[
                HEADER,
                "1,01/06/2020 10:00:00 PM,ASSAULT OFFENSES,Aggravated Assault,N,BALLARD,B1",
                "2,01/06/2020 11:00:00 PM,ASSAULT OFFENSES,Simple Assault,N,BALLARD,B1",
                "2,01/06/2020 11:00:00 PM,ASSAULT OFFENSES,Simple Assault,N,BALLARD,B1",
                "3,02/29/2020,ROBBERY,Robbery,<Null>,NA,B2",
                "4,not a date,ROBBERY,Robbery,S,DOWNTOWN,B3",
                "5,03/01/2021,LARCENY-THEFT,Shoplifting,S,DOWNTOWN,B3",
                "6,03/02/2021,NULL ,Other,S,DOWNTOWN,B3",
                "7,12/31/2021 01:00:00 AM,MOTOR VEHICLE THEFT,Theft of Motor Vehicle,W,,B4",
            ],
        )
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = crime_csv(dir.path());
        let pipeline = Pipeline::new(DatasetProfile::crime(), 10);

        let output = pipeline.run(&path).unwrap();
        assert_eq!(output.rows_loaded, 8);
        assert_eq!(output.unparseable_dates, 1);
        assert_eq!(output.reports.keys().copied().collect::<Vec<_>>(), vec![2020, 2021]);

        let y2020 = output.reports[&2020].as_ref().unwrap();
        assert_eq!(y2020.all.total, 3);
        assert_eq!(y2020.filter.duplicates_removed, 1);
        assert_eq!(y2020.labelled.total, 2);
        assert!((y2020.all.avg_per_day - 3.0 / 366.0).abs() < 1e-12);
        assert_eq!(y2020.all.busiest_month.as_ref().unwrap().key, "January");

        let y2021 = output.reports[&2021].as_ref().unwrap();
        assert_eq!(y2021.all.total, 2);
        assert_eq!(y2021.filter.excluded_removed, 1);
        assert_eq!(y2021.labelled.total, 1);
        assert!((y2021.all.avg_per_day - 2.0 / 365.0).abs() < 1e-12);

        let summary = output.summary();
        assert_eq!(summary.years.len(), 2);
        assert!(summary.errors.is_empty());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"busiest_month\""));
    }

    #[test]
    fn test_prepare_normalizes_and_labels() {
        let dir = TempDir::new().unwrap();
        let path = crime_csv(dir.path());
        let mut loader = DataLoader::new();
        let df = loader.load_csv(&path).unwrap().clone();

        let prepared = Pipeline::new(DatasetProfile::crime(), 10)
            .prepare(&df)
            .unwrap();
        let ds = &prepared.dataset;

        assert!(!ds.column_names().contains(&"beat".to_string()));
        assert_eq!(
            ds.strings("serious", "?").unwrap(),
            vec!["yes", "no", "no", "yes", "yes", "no", "no", "yes"]
        );
        let mcpp = ds.strings("mcpp", "?").unwrap();
        assert_eq!(mcpp[0], "ballard");
        assert_eq!(mcpp[3], "unknown");
        assert_eq!(mcpp[7], "unknown");
        assert_eq!(ds.strings("weekday", "?").unwrap()[0], "Monday");
        assert_eq!(ds.strings("year", "?").unwrap()[4], "unknown");
    }

    #[test]
    fn test_configured_years_include_empty_year() {
        let dir = TempDir::new().unwrap();
        let path = crime_csv(dir.path());
        let mut profile = DatasetProfile::crime();
        profile.years = vec![2022, 2020, 2022];

        let output = Pipeline::new(profile, 10).run(&path).unwrap();
        assert_eq!(output.reports.keys().copied().collect::<Vec<_>>(), vec![2020, 2022]);
        let empty = output.reports[&2022].as_ref().unwrap();
        assert_eq!(empty.all.total, 0);
        assert_eq!(empty.all.avg_per_week, 0.0);
    }

    #[test]
    fn test_invalid_year_fails_only_its_section() {
        let dir = TempDir::new().unwrap();
        let path = crime_csv(dir.path());
        let mut profile = DatasetProfile::crime();
        profile.years = vec![2020, i32::MAX];

        let output = Pipeline::new(profile, 10).run(&path).unwrap();
        assert!(output.reports[&2020].is_ok());
        assert!(matches!(
            output.reports[&i32::MAX],
            Err(ReportError::InvalidYear(_))
        ));
        assert_eq!(output.summary().errors.len(), 1);
    }

    #[test]
    fn test_missing_selected_column() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), &["a,b", "1,2"]);
        let err = Pipeline::new(DatasetProfile::crime(), 10)
            .run(&path)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Loader(LoaderError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_crowdfunding_metric_comparison() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            &[
                "ID,name,main_category,launched,deadline,state,backers,country,usd_pledged_real,usd_goal_real",
                "1,A,Games,01/10/2017,02/10/2017,successful,10,US,5000,1000",
                "2,B,Games,01/11/2017,02/11/2017,successful,12,US,7000,1000",
                "3,C,Music,01/12/2017,02/12/2017,failed,1,GB,10,1000",
                "4,D,Music,01/13/2017,02/13/2017,failed,2,GB,30,1000",
                "5,E,Music,01/14/2017,02/14/2017,live,2,GB,30,1000",
                "6,F,Art,01/15/2017,NA,canceled,0,US,,500",
            ],
        );
        let output = Pipeline::new(DatasetProfile::crowdfunding(), 10)
            .run(&path)
            .unwrap();
        let report = output.reports[&2017].as_ref().unwrap();
        assert_eq!(report.all.total, 5);
        assert_eq!(report.filter.excluded_removed, 1);
        assert_eq!(report.labelled.total, 2);

        let metric = report.all.metric.as_ref().unwrap();
        assert_eq!(metric.yes.count, 2);
        assert_eq!(metric.no.count, 2);
        assert_eq!(metric.skipped, 1);
        assert!((metric.yes.mean - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_case_profile_matches_normalized_data() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            &[
                "ID,name,main_category,launched,deadline,state,backers,country,usd_pledged_real,usd_goal_real",
                "1,A,Games,01/10/2017,02/10/2017,Successful,10,US,5000,1000",
                "2,B,Games,01/11/2017,02/11/2017,LIVE,12,US,7000,1000",
                "3,C,Music,01/12/2017,02/12/2017,failed,1,GB,10,1000",
            ],
        );
        let config: Config = toml::from_str(
            r#"
[dataset]
preset = "crowdfunding"
category_column = "State"
excluded_category = "Live"
"#,
        )
        .unwrap();
        let output = Pipeline::new(config.dataset.resolve(), 10)
            .run(&path)
            .unwrap();
        let report = output.reports[&2017].as_ref().unwrap();
        assert_eq!(report.filter.excluded_removed, 1);
        assert_eq!(report.all.total, 2);
        assert_eq!(report.labelled.total, 1);
    }
}
