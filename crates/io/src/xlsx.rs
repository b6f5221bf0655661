// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import reads one worksheet into a Table: first non-blank row is the header.
// Export writes one worksheet per table with a bold header row.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use rollcall_recon::model::{FieldValue, Table};

use crate::table_from_records;

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME: usize = 31;

/// Import one worksheet. `sheet` selects by name; `None` takes the first sheet.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|name| name.as_str() == wanted)
            .or_else(|| sheet_names.iter().find(|name| name.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| {
                format!(
                    "Sheet '{}' not found (available: {})",
                    wanted,
                    sheet_names.join(", ")
                )
            })?
            .clone(),
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| "Excel file contains no sheets".to_string())?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    let records: Vec<Vec<FieldValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    log::debug!(
        "'{}' sheet '{}': {} raw rows",
        path.display(),
        sheet_name,
        records.len()
    );
    Ok(table_from_records(records))
}

fn cell_value(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty => FieldValue::Empty,
        Data::String(s) if s.trim().is_empty() => FieldValue::Empty,
        Data::String(s) => FieldValue::Text(s.clone()),
        Data::Float(n) => FieldValue::Number(*n),
        Data::Int(n) => FieldValue::Number(*n as f64),
        Data::Bool(b) => FieldValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => FieldValue::Text(format!("#{:?}", e)),
        // Excel serial number; nothing downstream reads dates.
        Data::DateTime(dt) => FieldValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => FieldValue::Text(s.clone()),
    }
}

/// Write `sheets` as worksheets of a new workbook at `path`.
pub fn export(sheets: &[(&str, &Table)], path: &Path) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (name, table) in sheets {
        let sheet_name: String = name.chars().take(MAX_SHEET_NAME).collect();
        let worksheet = workbook
            .add_worksheet()
            .set_name(&sheet_name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", sheet_name, e))?;
        write_table(worksheet, table, &header_format)?;
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &Table, header_format: &Format) -> Result<(), String> {
    for (col, name) in table.columns().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col16 = col as u16;
            match value {
                FieldValue::Empty => {}
                FieldValue::Text(s) => {
                    worksheet
                        .write_string(row32, col16, s)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
                }
                FieldValue::Number(n) => {
                    worksheet
                        .write_number(row32, col16, *n)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col, e))?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn roster() -> Table {
        let mut t = Table::new(["Timesheet Owner Name", "Employee ID", "Compliance"]);
        t.push_row(vec!["Lee, Ann".into(), "E002".into(), 85.0.into()]);
        t.push_row(vec!["Bo Chan".into(), FieldValue::Empty, 90.5.into()]);
        t
    }

    #[test]
    fn test_export_import_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        let table = roster();

        export(&[("Roster", &table)], &path).unwrap();
        let imported = import(&path, None).unwrap();
        assert_eq!(imported, table);
    }

    #[test]
    fn test_sheet_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let table = roster();
        let mut other = Table::new(["Name"]);
        other.push_row(vec!["Zed Young".into()]);

        export(&[("Matched_Employees", &table), ("Declined_Compliance", &other)], &path).unwrap();

        let declined = import(&path, Some("declined_compliance")).unwrap();
        assert_eq!(declined.text(0, "Name").as_deref(), Some("Zed Young"));

        let err = import(&path, Some("Nope")).unwrap_err();
        assert!(err.contains("Matched_Employees"), "{err}");
    }

    #[test]
    fn test_long_sheet_names_are_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.xlsx");
        let name = "A sheet name that is far too long for Excel";
        export(&[(name, &roster())], &path).unwrap();
        let imported = import(&path, Some(&name[..MAX_SHEET_NAME])).unwrap();
        assert_eq!(imported.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = import(Path::new("/definitely/not/here.xlsx"), None).unwrap_err();
        assert!(err.starts_with("Failed to open Excel file"), "{err}");
    }
}
