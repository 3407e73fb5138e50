//! Classifier Module
//! Labels each row "yes" when its category is allow-listed and its secondary
//! field is not deny-listed.

use crate::config::DatasetProfile;
use crate::data::dataset::{Dataset, DatasetError};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Classification result. Every (category, secondary) pair maps to one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Yes,
    No,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Yes => "yes",
            Label::No => "no",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl Classifier {
    /// List entries are case-folded to match normalized cells.
    pub fn new<A, D>(allow: A, deny: D) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            allow: allow
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
            deny: deny
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_profile(profile: &DatasetProfile) -> Self {
        Self::new(&profile.allow_list, &profile.deny_list)
    }

    pub fn classify(&self, category: &str, secondary: &str) -> Label {
        if self.allow.contains(category) && !self.deny.contains(secondary) {
            Label::Yes
        } else {
            Label::No
        }
    }

    /// Add `label_column` computed from the category and secondary columns.
    pub fn label_dataset(
        &self,
        dataset: Dataset,
        category_column: &str,
        secondary_column: &str,
        label_column: &str,
    ) -> Result<Dataset, DatasetError> {
        let categories = dataset.strings(category_column, "")?;
        let secondaries = dataset.strings(secondary_column, "")?;
        let labels: Vec<String> = categories
            .iter()
            .zip(secondaries.iter())
            .map(|(c, s)| self.classify(c, s).as_str().to_string())
            .collect();
        dataset.with_string_column(label_column, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn assault_classifier() -> Classifier {
        Classifier::new(["Assault Offenses"], ["simple assault"])
    }

    #[test]
    fn test_deny_list_on_secondary() {
        let c = assault_classifier();
        assert_eq!(c.classify("assault offenses", "simple assault"), Label::No);
        assert_eq!(
            c.classify("assault offenses", "aggravated assault"),
            Label::Yes
        );
    }

    #[test]
    fn test_unlisted_category_is_no() {
        let c = assault_classifier();
        assert_eq!(c.classify("larceny-theft", "shoplifting"), Label::No);
        assert_eq!(c.classify("unknown", "unknown"), Label::No);
        assert_eq!(c.classify("", ""), Label::No);
    }

    #[test]
    fn test_deterministic() {
        let c = Classifier::from_profile(&DatasetProfile::crime());
        let first = c.classify("robbery", "robbery");
        for _ in 0..10 {
            assert_eq!(c.classify("robbery", "robbery"), first);
        }
        assert_eq!(first, Label::Yes);
    }

    #[test]
    fn test_label_dataset_adds_column() {
        let df = df!(
            "group" => ["assault offenses", "assault offenses", "fraud offenses"],
            "offense" => ["simple assault", "aggravated assault", "identity theft"]
        )
        .unwrap();
        let ds = Dataset::new(df, "date");
        let labelled = assault_classifier()
            .label_dataset(ds, "group", "offense", "serious")
            .unwrap();
        assert_eq!(
            labelled.strings("serious", "?").unwrap(),
            vec!["no", "yes", "no"]
        );
    }
}
