use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::normalize::NormalizedName;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single cell value from a loaded spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Empty,
}

impl FieldValue {
    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
            Self::Empty => true,
        }
    }

    /// Trimmed textual form, `None` when blank. Whole numbers render without a
    /// fractional part so numeric IDs read back as `1042`, not `1042.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Self::Number(n) => Some(render_number(*n)),
            Self::Empty => None,
        }
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{}", render_number(*n)),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Empty)
    }
}

/// Tabular records: ordered column names plus rows holding one value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<FieldValue>>,
}

impl Table {
    /// Column names are stored trimmed.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|c| c.into().trim().to_string())
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[FieldValue]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row. Short rows are padded with `Empty`, long rows truncated.
    pub fn push_row(&mut self, mut values: Vec<FieldValue>) {
        values.resize(self.columns.len(), FieldValue::Empty);
        self.rows.push(values);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn text(&self, row: usize, column: &str) -> Option<String> {
        self.value(row, column).and_then(FieldValue::as_text)
    }

    /// Insert a column at position `at` (clamped to the end). `values` is
    /// padded with `Empty` when shorter than the row count.
    pub fn insert_column(&mut self, at: usize, name: impl Into<String>, values: Vec<FieldValue>) {
        let at = at.min(self.columns.len());
        self.columns.insert(at, name.into().trim().to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(at, values.next().unwrap_or(FieldValue::Empty));
        }
    }

    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<FieldValue>) {
        let at = self.columns.len();
        self.insert_column(at, name, values);
    }

    /// Replace the value of an existing cell. Returns false when out of range.
    pub fn set_value(&mut self, row: usize, column: usize, value: FieldValue) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// New table with the same columns holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup + matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRecord {
    pub normalized_name: NormalizedName,
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    AlreadyHadId,
    ExactMatch,
    FuzzyMatch,
    NoMatch,
    InvalidName,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyHadId => write!(f, "already_had_id"),
            Self::ExactMatch => write!(f, "exact_match"),
            Self::FuzzyMatch => write!(f, "fuzzy_match"),
            Self::NoMatch => write!(f, "no_match"),
            Self::InvalidName => write!(f, "invalid_name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched_id: Option<String>,
    pub status: MatchStatus,
    /// 0..=100
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStatistics {
    pub exact: usize,
    pub fuzzy: usize,
    pub no_match: usize,
    pub already_had_id: usize,
}

impl MatchStatistics {
    pub fn total(&self) -> usize {
        self.exact + self.fuzzy + self.no_match + self.already_had_id
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Where each input column ended up in the matched table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMap {
    pub left: BTreeMap<String, String>,
    pub right: BTreeMap<String, String>,
}

impl ColumnMap {
    pub fn output_name(&self, side: Side, column: &str) -> Option<&str> {
        let map = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        map.get(column.trim()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub matched: Table,
    pub only_in_left: Table,
    pub only_in_right: Table,
    /// Source (left, right) row indices for each row of `matched`.
    pub pairs: Vec<(usize, usize)>,
    pub left_only_rows: Vec<usize>,
    pub right_only_rows: Vec<usize>,
    pub columns: ColumnMap,
}

// ---------------------------------------------------------------------------
// Compliance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceBucket {
    Improved,
    Declined,
    Unchanged,
}

impl fmt::Display for ComplianceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Improved => write!(f, "improved"),
            Self::Declined => write!(f, "declined"),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceDelta {
    /// Row index in the classified table.
    pub row: usize,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    pub bucket: ComplianceBucket,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub improved: Vec<ComplianceDelta>,
    pub declined: Vec<ComplianceDelta>,
    pub unchanged: Vec<ComplianceDelta>,
    /// Rows where either value failed numeric coercion.
    pub skipped: usize,
}

impl ComplianceReport {
    pub fn bucket(&self, bucket: ComplianceBucket) -> &[ComplianceDelta] {
        match bucket {
            ComplianceBucket::Improved => &self.improved,
            ComplianceBucket::Declined => &self.declined,
            ComplianceBucket::Unchanged => &self.unchanged,
        }
    }

    pub fn classified(&self) -> usize {
        self.improved.len() + self.declined.len() + self.unchanged.len()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub left_rows: usize,
    pub right_rows: usize,
    pub matched: usize,
    pub only_left: usize,
    pub only_right: usize,
    pub improved: usize,
    pub declined: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub near_misses: usize,
}

/// An unmatched history row whose name is close to an unmatched current row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMiss {
    /// Row index in the history input.
    pub history_row: usize,
    /// Row index in the current input.
    pub current_row: usize,
    pub history_name: String,
    pub current_name: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayPeriodReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// Output name of the history compliance column in `reconciliation.matched`.
    pub before_column: String,
    /// Output name of the current compliance column in `reconciliation.matched`.
    pub after_column: String,
    pub reconciliation: ReconciliationResult,
    pub compliance: ComplianceReport,
    pub near_misses: Vec<NearMiss>,
}
