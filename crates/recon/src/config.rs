use serde::Deserialize;

use crate::columns::ColumnResolver;
use crate::error::ReconError;
use crate::matcher::{validate_threshold, DEFAULT_FUZZY_THRESHOLD};
use crate::reconcile::{DEFAULT_LEFT_SUFFIX, DEFAULT_RIGHT_SUFFIX, NORMALIZED_NAME_COLUMN};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A pay-period run: last period's history against the current roster.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    pub history: DatasetConfig,
    pub current: DatasetConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Path to a CSV or spreadsheet, relative to the config file.
    pub file: String,
    /// Worksheet name; the first sheet when absent.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Exact header of the name column.
    #[serde(default)]
    pub name_column: Option<String>,
    /// Ranked header rules, used when `name_column` is absent.
    #[serde(default)]
    pub name_rules: Option<ColumnResolver>,
    #[serde(default = "default_compliance_column")]
    pub compliance_column: String,
}

fn default_compliance_column() -> String {
    "Compliance".into()
}

impl DatasetConfig {
    /// `name_column` wins over `name_rules`; with neither, the built-in
    /// employee-name heuristics apply.
    pub fn name_resolver(&self) -> ColumnResolver {
        match (&self.name_column, &self.name_rules) {
            (Some(col), _) => ColumnResolver::exact(col.clone()),
            (None, Some(rules)) => rules.clone(),
            (None, None) => ColumnResolver::employee_name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matching + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    #[serde(default = "default_threshold")]
    pub fuzzy_threshold: i64,
}

fn default_threshold() -> i64 {
    i64::from(DEFAULT_FUZZY_THRESHOLD)
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Report directory, relative to the config file.
    #[serde(default)]
    pub dir: Option<String>,
    /// Appended to column names present in both datasets.
    #[serde(default = "default_suffixes")]
    pub suffixes: (String, String),
}

fn default_suffixes() -> (String, String) {
    (DEFAULT_LEFT_SUFFIX.into(), DEFAULT_RIGHT_SUFFIX.into())
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            suffixes: default_suffixes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        validate_threshold(self.matching.fuzzy_threshold)?;

        for (label, dataset) in [("history", &self.history), ("current", &self.current)] {
            if dataset.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "[{label}] file must not be empty"
                )));
            }
            if dataset.compliance_column.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "[{label}] compliance_column must not be empty"
                )));
            }
            if dataset.compliance_column.trim() == NORMALIZED_NAME_COLUMN {
                return Err(ReconError::ConfigValidation(format!(
                    "[{label}] compliance_column cannot be '{NORMALIZED_NAME_COLUMN}'"
                )));
            }
            if let Some(rules) = &dataset.name_rules {
                if rules.rules().is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "[{label}] name_rules must list at least one rule"
                    )));
                }
            }
        }

        let (left, right) = &self.output.suffixes;
        if left.is_empty() || right.is_empty() {
            return Err(ReconError::ConfigValidation(
                "output suffixes must not be empty".into(),
            ));
        }
        if left == right {
            return Err(ReconError::ConfigValidation(format!(
                "output suffixes must differ, both are '{left}'"
            )));
        }

        Ok(())
    }

    /// Threshold as validated by [`ReconConfig::validate`].
    pub fn fuzzy_threshold(&self) -> Result<u8, ReconError> {
        validate_threshold(self.matching.fuzzy_threshold)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
