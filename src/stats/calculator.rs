//! Statistics Calculator Module
//! Descriptive statistics of a numeric column and a Welch t-test between the
//! "yes" and "no" label groups.

use crate::data::{Dataset, DatasetError, Label};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Descriptive statistics for one group of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for MetricStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Metric column compared across label groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub column: String,
    pub yes: MetricStats,
    pub no: MetricStats,
    /// Standardized mean difference, (yes - no) / std(no).
    pub std_diff: Option<f64>,
    pub p_value: Option<f64>,
    pub is_significant: bool,
    /// Cells that were not numeric (sentinel, free text).
    pub skipped: usize,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> MetricStats {
        let n = values.len();
        if n == 0 {
            return MetricStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };

        MetricStats {
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            variance,
            p95: Self::percentile(&sorted, 95.0),
            p05: Self::percentile(&sorted, 5.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Perform Welch's t-test (independent samples, unequal variance).
    pub fn perform_ttest(group_values: &[f64], control_values: &[f64]) -> (f64, bool) {
        let n1 = group_values.len() as f64;
        let n2 = control_values.len() as f64;

        if n1 < 2.0 || n2 < 2.0 {
            return (f64::NAN, false);
        }

        let mean1 = group_values.iter().sum::<f64>() / n1;
        let mean2 = control_values.iter().sum::<f64>() / n2;

        let var1 = group_values
            .iter()
            .map(|x| (x - mean1).powi(2))
            .sum::<f64>()
            / (n1 - 1.0);
        let var2 = control_values
            .iter()
            .map(|x| (x - mean2).powi(2))
            .sum::<f64>()
            / (n2 - 1.0);

        let se = (var1 / n1 + var2 / n2).sqrt();
        if se == 0.0 {
            return (1.0, false);
        }

        let t = (mean1 - mean2) / se;

        // Welch-Satterthwaite degrees of freedom
        let df_num = (var1 / n1 + var2 / n2).powi(2);
        let df_denom = (var1 / n1).powi(2) / (n1 - 1.0) + (var2 / n2).powi(2) / (n2 - 1.0);
        let df = df_num / df_denom;

        if let Ok(dist) = StudentsT::new(0.0, 1.0, df) {
            let p_value = 2.0 * (1.0 - dist.cdf(t.abs()));
            (p_value, p_value <= SIGNIFICANCE_THRESHOLD)
        } else {
            (f64::NAN, false)
        }
    }

    /// Numeric values of `metric_column` split by label. Non-numeric cells
    /// are counted, not parsed.
    pub fn values_by_label(
        dataset: &Dataset,
        metric_column: &str,
        label_column: &str,
    ) -> Result<(Vec<f64>, Vec<f64>, usize), DatasetError> {
        let metric = dataset.strings(metric_column, "")?;
        let labels = dataset.strings(label_column, "")?;

        let mut yes = Vec::new();
        let mut no = Vec::new();
        let mut skipped = 0;
        for (raw, label) in metric.iter().zip(labels.iter()) {
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    if label == Label::Yes.as_str() {
                        yes.push(v);
                    } else {
                        no.push(v);
                    }
                }
                _ => skipped += 1,
            }
        }
        Ok((yes, no, skipped))
    }

    /// Compare the metric between "yes" and "no" rows.
    pub fn compare_metric(
        dataset: &Dataset,
        metric_column: &str,
        label_column: &str,
    ) -> Result<MetricComparison, DatasetError> {
        let (yes_values, no_values, skipped) =
            Self::values_by_label(dataset, metric_column, label_column)?;

        let yes = Self::compute_descriptive_stats(&yes_values);
        let no = Self::compute_descriptive_stats(&no_values);

        let std_diff = if no.std > 0.0 && !no.mean.is_nan() && !yes.mean.is_nan() {
            Some((yes.mean - no.mean) / no.std)
        } else {
            None
        };

        let (p_value, is_significant) = if !yes_values.is_empty() && !no_values.is_empty() {
            let (p, sig) = Self::perform_ttest(&yes_values, &no_values);
            (Some(p), sig)
        } else {
            (None, false)
        };

        Ok(MetricComparison {
            column: metric_column.to_string(),
            yes,
            no,
            std_diff,
            p_value,
            is_significant,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_descriptive_stats() {
        let stats = StatsCalculator::compute_descriptive_stats(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.variance - 5.0 / 3.0).abs() < 1e-12);
        // numpy.percentile([1,2,3,4], 95) == 3.85
        assert!((stats.p95 - 3.85).abs() < 1e-12);
        assert!((stats.p05 - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_empty_stats_are_nan() {
        let stats = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
    }

    #[test]
    fn test_ttest_detects_shift() {
        let a: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let b: Vec<f64> = (0..30).map(|i| 10.0 + (i % 5) as f64).collect();
        let (p, sig) = StatsCalculator::perform_ttest(&a, &b);
        assert!(p < 0.001);
        assert!(sig);

        let (p, sig) = StatsCalculator::perform_ttest(&a, &a);
        assert!(p > 0.5);
        assert!(!sig);
    }

    #[test]
    fn test_ttest_needs_two_samples() {
        let (p, sig) = StatsCalculator::perform_ttest(&[1.0], &[1.0, 2.0]);
        assert!(p.is_nan());
        assert!(!sig);
    }

    #[test]
    fn test_compare_metric_skips_non_numeric() {
        let df = df!(
            "pledged" => ["100", "300", "unknown", "10", "20", "abc"],
            "funded" => ["yes", "yes", "yes", "no", "no", "no"]
        )
        .unwrap();
        let ds = Dataset::new(df, "date");
        let cmp = StatsCalculator::compare_metric(&ds, "pledged", "funded").unwrap();
        assert_eq!(cmp.skipped, 2);
        assert_eq!(cmp.yes.count, 2);
        assert!((cmp.yes.mean - 200.0).abs() < 1e-12);
        assert!((cmp.no.mean - 15.0).abs() < 1e-12);
        assert!(cmp.p_value.is_some());
        assert!(cmp.std_diff.unwrap() > 0.0);
    }
}
