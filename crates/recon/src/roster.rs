// ID assignment over whole rosters: annotate a name list against a reference
// index, or left-join a pay-period history onto the employee roster.

use crate::columns::ColumnResolver;
use crate::error::ReconError;
use crate::lookup::LookupIndex;
use crate::matcher::MatchingEngine;
use crate::model::{FieldValue, MatchStatus, Table};
use crate::normalize::normalize;

pub const EMPLOYEE_ID_COLUMN: &str = "Employee ID";
pub const MATCH_STATUS_COLUMN: &str = "Match Status";
pub const MATCH_CONFIDENCE_COLUMN: &str = "Match Confidence";

// ---------------------------------------------------------------------------
// Roster annotation
// ---------------------------------------------------------------------------

/// Run every row of `table` through `engine` and return an annotated copy.
///
/// The id lands in `id_column` when given (rows that already carry an id keep
/// their cell untouched), otherwise in an `Employee ID` column right after the
/// name column. `Match Status` and `Match Confidence` are appended, or
/// overwritten when the roster was annotated before.
pub fn annotate_roster(
    engine: &mut MatchingEngine,
    table: &Table,
    name_column: &str,
    id_column: Option<&str>,
) -> Result<Table, ReconError> {
    let name_idx = table
        .column_index(name_column)
        .ok_or_else(|| ReconError::missing_column("roster", name_column))?;
    let id_idx = match id_column {
        Some(col) => Some(
            table
                .column_index(col)
                .ok_or_else(|| ReconError::missing_column("roster", col))?,
        ),
        None => None,
    };

    let mut ids = Vec::with_capacity(table.len());
    let mut statuses = Vec::with_capacity(table.len());
    let mut confidences = Vec::with_capacity(table.len());

    for row in table.rows() {
        let name = row.get(name_idx).and_then(FieldValue::as_text);
        let existing = id_idx.and_then(|i| row.get(i)).and_then(FieldValue::as_text);
        let result = engine.match_name(name.as_deref(), existing.as_deref());

        ids.push(if result.status == MatchStatus::AlreadyHadId {
            id_idx.and_then(|i| row.get(i).cloned()).unwrap_or(FieldValue::Empty)
        } else {
            result.matched_id.into()
        });
        statuses.push(FieldValue::Text(result.status.to_string()));
        confidences.push(FieldValue::Number(f64::from(result.confidence)));
    }

    let mut out = table.clone();
    match id_idx {
        Some(i) => overwrite_column(&mut out, i, ids),
        None => upsert_column(&mut out, name_idx + 1, EMPLOYEE_ID_COLUMN, ids),
    }
    let end = out.columns().len();
    upsert_column(&mut out, end, MATCH_STATUS_COLUMN, statuses);
    let end = out.columns().len();
    upsert_column(&mut out, end, MATCH_CONFIDENCE_COLUMN, confidences);

    let stats = engine.statistics();
    log::info!(
        "annotated {} roster rows: {} exact, {} fuzzy, {} unmatched, {} kept existing id",
        table.len(),
        stats.exact,
        stats.fuzzy,
        stats.no_match,
        stats.already_had_id
    );
    Ok(out)
}

fn overwrite_column(table: &mut Table, column: usize, values: Vec<FieldValue>) {
    for (row, value) in values.into_iter().enumerate() {
        table.set_value(row, column, value);
    }
}

/// Replace the named column's values, or insert it at `at` when absent.
fn upsert_column(table: &mut Table, at: usize, name: &str, values: Vec<FieldValue>) {
    match table.column_index(name) {
        Some(i) => overwrite_column(table, i, values),
        None => table.insert_column(at, name, values),
    }
}

// ---------------------------------------------------------------------------
// History / employee merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub history_name: ColumnResolver,
    pub employee_name: ColumnResolver,
    pub employee_id_column: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            history_name: ColumnResolver::employee_name(),
            employee_name: ColumnResolver::employee_name(),
            employee_id_column: EMPLOYEE_ID_COLUMN.to_string(),
        }
    }
}

/// Left join `history` onto the `employees` roster by normalized name.
///
/// Every history row is kept, in order. `Employee ID` goes right after the
/// history name column (replacing any stale one) followed by a
/// `<name column> Duplicate` copy of the name for eyeballing the result.
/// Duplicate employee names resolve to the last roster row.
pub fn merge_ids(
    history: &Table,
    employees: &Table,
    options: &MergeOptions,
) -> Result<Table, ReconError> {
    let history_name = options.history_name.require("history", history)?;
    let employee_name = options.employee_name.require("employees", employees)?;
    let index = LookupIndex::build(
        "employees",
        employees,
        &employee_name,
        &options.employee_id_column,
    )?;

    let duplicate_column = format!("{history_name} Duplicate");
    let mut out = drop_columns(history, &[EMPLOYEE_ID_COLUMN, duplicate_column.as_str()]);
    let name_idx = out
        .column_index(&history_name)
        .ok_or_else(|| ReconError::missing_column("history", &history_name))?;

    let mut ids = Vec::with_capacity(out.len());
    let mut names = Vec::with_capacity(out.len());
    let mut unmatched = 0usize;
    for row in out.rows() {
        let name = row.get(name_idx).cloned().unwrap_or(FieldValue::Empty);
        let key = normalize(name.as_text().as_deref());
        let id = if key.is_empty() { None } else { index.lookup(&key) };
        match id {
            Some(record) => ids.push(FieldValue::Text(record.id.clone())),
            None => {
                unmatched += 1;
                ids.push(FieldValue::Empty);
            }
        }
        names.push(name);
    }

    out.insert_column(name_idx + 1, EMPLOYEE_ID_COLUMN, ids);
    out.insert_column(name_idx + 2, duplicate_column, names);

    if unmatched > 0 {
        log::warn!("{unmatched} of {} history rows have no employee id", out.len());
    }
    Ok(out)
}

fn drop_columns(table: &Table, names: &[&str]) -> Table {
    let keep: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !names.contains(&c.as_str()))
        .map(|(i, _)| i)
        .collect();
    if keep.len() == table.columns().len() {
        return table.clone();
    }

    let mut out = Table::new(keep.iter().map(|&i| table.columns()[i].clone()));
    for row in table.rows() {
        out.push_row(keep.iter().map(|&i| row[i].clone()).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> LookupIndex {
        LookupIndex::from_records([
            (Some("John Smith"), Some("E1")),
            (Some("Maria Garcia"), Some("E2")),
        ])
    }

    #[test]
    fn annotate_inserts_id_after_name() {
        let mut t = Table::new(["Name", "Dept"]);
        t.push_row(vec!["smith, john".into(), "Ops".into()]);
        t.push_row(vec!["Nobody".into(), "Ops".into()]);
        t.push_row(vec!["".into(), "Ops".into()]);

        let mut engine = MatchingEngine::new(reference());
        let out = annotate_roster(&mut engine, &t, "Name", None).unwrap();

        assert_eq!(
            out.columns(),
            &["Name", "Employee ID", "Dept", "Match Status", "Match Confidence"]
        );
        assert_eq!(out.text(0, EMPLOYEE_ID_COLUMN).as_deref(), Some("E1"));
        assert_eq!(out.text(0, MATCH_STATUS_COLUMN).as_deref(), Some("exact_match"));
        assert_eq!(out.text(0, MATCH_CONFIDENCE_COLUMN).as_deref(), Some("100"));
        assert_eq!(out.value(1, EMPLOYEE_ID_COLUMN), Some(&FieldValue::Empty));
        assert_eq!(out.text(1, MATCH_STATUS_COLUMN).as_deref(), Some("no_match"));
        assert_eq!(out.text(2, MATCH_STATUS_COLUMN).as_deref(), Some("invalid_name"));
        assert_eq!(engine.statistics().total(), 3);
    }

    #[test]
    fn annotate_keeps_existing_ids() {
        let mut t = Table::new(["Name", "Employee ID"]);
        t.push_row(vec!["John Smith".into(), FieldValue::Number(77.0)]);
        t.push_row(vec!["Maria Garcia".into(), FieldValue::Empty]);

        let mut engine = MatchingEngine::new(reference());
        let out = annotate_roster(&mut engine, &t, "Name", Some("Employee ID")).unwrap();

        assert_eq!(out.columns().len(), 4);
        assert_eq!(out.value(0, EMPLOYEE_ID_COLUMN), Some(&FieldValue::Number(77.0)));
        assert_eq!(out.text(0, MATCH_STATUS_COLUMN).as_deref(), Some("already_had_id"));
        assert_eq!(out.text(1, EMPLOYEE_ID_COLUMN).as_deref(), Some("E2"));
    }

    #[test]
    fn annotate_twice_overwrites_status_columns() {
        let mut t = Table::new(["Name"]);
        t.push_row(vec!["John Smith".into()]);
        let mut engine = MatchingEngine::new(reference());
        let once = annotate_roster(&mut engine, &t, "Name", None).unwrap();
        let twice = annotate_roster(&mut engine, &once, "Name", Some("Employee ID")).unwrap();
        assert_eq!(twice.columns(), once.columns());
        assert_eq!(twice.text(0, MATCH_STATUS_COLUMN).as_deref(), Some("already_had_id"));
    }

    #[test]
    fn annotate_requires_name_column() {
        let t = Table::new(["Dept"]);
        let mut engine = MatchingEngine::new(reference());
        let err = annotate_roster(&mut engine, &t, "Name", None).unwrap_err();
        assert_eq!(err.to_string(), "dataset 'roster': missing column 'Name'");
    }

    fn history() -> Table {
        let mut t = Table::new(["Timesheet Owner Name", "Hours"]);
        t.push_row(vec!["John Smith ".into(), 40.0.into()]);
        t.push_row(vec!["Garcia, Maria".into(), 38.0.into()]);
        t.push_row(vec!["Unknown Person".into(), 12.0.into()]);
        t
    }

    #[test]
    fn merge_inserts_id_and_duplicate() {
        let mut employees = Table::new(["Employee Name", "Employee ID"]);
        employees.push_row(vec!["JOHN SMITH".into(), "E1".into()]);
        employees.push_row(vec!["Maria Garcia".into(), FieldValue::Number(2.0)]);

        let out = merge_ids(&history(), &employees, &MergeOptions::default()).unwrap();
        assert_eq!(
            out.columns(),
            &["Timesheet Owner Name", "Employee ID", "Timesheet Owner Name Duplicate", "Hours"]
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out.text(0, "Employee ID").as_deref(), Some("E1"));
        assert_eq!(out.text(1, "Employee ID").as_deref(), Some("2"));
        assert_eq!(out.value(2, "Employee ID"), Some(&FieldValue::Empty));
        assert_eq!(
            out.text(1, "Timesheet Owner Name Duplicate").as_deref(),
            Some("Garcia, Maria")
        );
    }

    #[test]
    fn merge_replaces_stale_id_column() {
        let mut h = Table::new(["Employee ID", "Timesheet Owner Name"]);
        h.push_row(vec!["old".into(), "John Smith".into()]);
        let mut employees = Table::new(["Timesheet Owner Name", "Employee ID"]);
        employees.push_row(vec!["John Smith".into(), "E1".into()]);

        let out = merge_ids(&h, &employees, &MergeOptions::default()).unwrap();
        assert_eq!(
            out.columns(),
            &["Timesheet Owner Name", "Employee ID", "Timesheet Owner Name Duplicate"]
        );
        assert_eq!(out.text(0, "Employee ID").as_deref(), Some("E1"));
    }

    #[test]
    fn merge_requires_employee_id_column() {
        let mut employees = Table::new(["Employee Name", "Badge"]);
        employees.push_row(vec!["John Smith".into(), "B1".into()]);
        let err = merge_ids(&history(), &employees, &MergeOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "dataset 'employees': missing column 'Employee ID'");
    }
}
