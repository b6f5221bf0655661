// Set reconciliation: two datasets in, matched / left-only / right-only out.
// Pure functions. No IO, no formatting.

use std::collections::{HashMap, HashSet};

use crate::error::ReconError;
use crate::model::{ColumnMap, FieldValue, ReconciliationResult, Table};
use crate::normalize::{normalize, NormalizedName};

/// Column holding the normalized name in every reconciliation output table.
pub const NORMALIZED_NAME_COLUMN: &str = "Name_Standard";

pub const DEFAULT_LEFT_SUFFIX: &str = "_hist";
pub const DEFAULT_RIGHT_SUFFIX: &str = "_emp";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub left_dataset: String,
    pub right_dataset: String,
    pub left_name_column: String,
    pub right_name_column: String,
    /// Appended to column names present on both sides.
    pub suffixes: (String, String),
}

impl ReconcileOptions {
    pub fn new(left_name_column: impl Into<String>, right_name_column: impl Into<String>) -> Self {
        Self {
            left_dataset: "left".into(),
            right_dataset: "right".into(),
            left_name_column: left_name_column.into(),
            right_name_column: right_name_column.into(),
            suffixes: (DEFAULT_LEFT_SUFFIX.into(), DEFAULT_RIGHT_SUFFIX.into()),
        }
    }

    pub fn datasets(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_dataset = left.into();
        self.right_dataset = right.into();
        self
    }

    pub fn suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.suffixes = (left.into(), right.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Core reconciliation
// ---------------------------------------------------------------------------

/// Join `left` and `right` on normalized name.
///
/// `matched` is the full inner join: a key appearing `m` times on the left and
/// `n` times on the right yields `m * n` rows, ordered by left row then right
/// row. A row whose name normalizes to empty never matches. The only-in tables
/// keep source order.
pub fn reconcile(
    left: &Table,
    right: &Table,
    options: &ReconcileOptions,
) -> Result<ReconciliationResult, ReconError> {
    let left_keys = row_keys(left, &options.left_dataset, &options.left_name_column)?;
    let right_keys = row_keys(right, &options.right_dataset, &options.right_name_column)?;

    let mut right_by_key: HashMap<&NormalizedName, Vec<usize>> = HashMap::new();
    for (ri, key) in right_keys.iter().enumerate() {
        if !key.is_empty() {
            right_by_key.entry(key).or_default().push(ri);
        }
    }
    let left_key_set: HashSet<&NormalizedName> =
        left_keys.iter().filter(|k| !k.is_empty()).collect();

    let left_cols = carried_columns(left);
    let right_cols = carried_columns(right);
    let shared: HashSet<&str> = left_cols
        .iter()
        .map(|&i| left.columns()[i].as_str())
        .filter(|name| right_cols.iter().any(|&j| right.columns()[j] == *name))
        .collect();

    let mut columns = ColumnMap::default();
    let mut matched_headers = Vec::with_capacity(left_cols.len() + right_cols.len() + 1);
    for &i in &left_cols {
        let name = &left.columns()[i];
        let out = output_name(name, &shared, &options.suffixes.0);
        columns.left.insert(name.clone(), out.clone());
        matched_headers.push(out);
    }
    matched_headers.push(NORMALIZED_NAME_COLUMN.to_string());
    for &j in &right_cols {
        let name = &right.columns()[j];
        let out = output_name(name, &shared, &options.suffixes.1);
        columns.right.insert(name.clone(), out.clone());
        matched_headers.push(out);
    }

    let mut matched = Table::new(matched_headers);
    let mut pairs = Vec::new();
    let mut left_only_rows = Vec::new();

    for (li, key) in left_keys.iter().enumerate() {
        let partners = if key.is_empty() { None } else { right_by_key.get(key) };
        match partners {
            Some(rows) => {
                for &ri in rows {
                    let mut values = pick(left, li, &left_cols);
                    values.push(key_value(key));
                    values.extend(pick(right, ri, &right_cols));
                    matched.push_row(values);
                    pairs.push((li, ri));
                }
            }
            None => left_only_rows.push(li),
        }
    }

    let right_only_rows: Vec<usize> = right_keys
        .iter()
        .enumerate()
        .filter(|(_, key)| key.is_empty() || !left_key_set.contains(key))
        .map(|(ri, _)| ri)
        .collect();

    let only_in_left = with_key_column(left, &left_cols, &left_keys, &left_only_rows);
    let only_in_right = with_key_column(right, &right_cols, &right_keys, &right_only_rows);

    log::debug!(
        "reconciled {} x {} rows: {} matched, {} left only, {} right only",
        left.len(),
        right.len(),
        matched.len(),
        left_only_rows.len(),
        right_only_rows.len()
    );

    Ok(ReconciliationResult {
        matched,
        only_in_left,
        only_in_right,
        pairs,
        left_only_rows,
        right_only_rows,
        columns,
    })
}

/// Normalized key per row. An empty table may lack the name column.
fn row_keys(table: &Table, dataset: &str, name_column: &str) -> Result<Vec<NormalizedName>, ReconError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let idx = table
        .column_index(name_column)
        .ok_or_else(|| ReconError::missing_column(dataset, name_column))?;
    Ok(table
        .rows()
        .iter()
        .map(|row| normalize(row.get(idx).and_then(FieldValue::as_text).as_deref()))
        .collect())
}

/// Indices of input columns copied to the output. A pre-existing key column
/// is dropped and recomputed.
fn carried_columns(table: &Table) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != NORMALIZED_NAME_COLUMN)
        .map(|(i, _)| i)
        .collect()
}

fn output_name(name: &str, shared: &HashSet<&str>, suffix: &str) -> String {
    if shared.contains(name) {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    }
}

fn pick(table: &Table, row: usize, cols: &[usize]) -> Vec<FieldValue> {
    let source = table.row(row).unwrap_or(&[]);
    cols.iter()
        .map(|&c| source.get(c).cloned().unwrap_or(FieldValue::Empty))
        .collect()
}

fn key_value(key: &NormalizedName) -> FieldValue {
    if key.is_empty() {
        FieldValue::Empty
    } else {
        FieldValue::Text(key.as_str().to_string())
    }
}

fn with_key_column(table: &Table, cols: &[usize], keys: &[NormalizedName], rows: &[usize]) -> Table {
    let mut headers: Vec<String> = cols.iter().map(|&c| table.columns()[c].clone()).collect();
    headers.push(NORMALIZED_NAME_COLUMN.to_string());
    let mut out = Table::new(headers);
    for &r in rows {
        let mut values = pick(table, r, cols);
        values.push(keys.get(r).map(key_value).unwrap_or(FieldValue::Empty));
        out.push_row(values);
    }
    out
}
