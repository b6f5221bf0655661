// Roster file I/O: CSV and Excel in, CSV and Excel out.

pub mod csv;
pub mod filename;
pub mod xlsx;

use std::collections::HashSet;
use std::path::Path;

use rollcall_recon::model::{FieldValue, Table};

/// Input formats, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Excel,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "tsv" | "tab" => Some(Self::Tsv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Load a table from `path`, picking the reader by extension. `sheet` only
/// applies to spreadsheets.
pub fn load_table(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let format = TableFormat::from_path(path).ok_or_else(|| {
        format!(
            "Unsupported file type '{}': expected .csv, .tsv, .txt, .xlsx, .xls, .xlsm, .xlsb or .ods",
            path.display()
        )
    })?;

    let table = match format {
        TableFormat::Csv => crate::csv::import(path)?,
        TableFormat::Tsv => crate::csv::import_with_delimiter(path, b'\t')?,
        TableFormat::Excel => xlsx::import(path, sheet)?,
    };
    if sheet.is_some() && format != TableFormat::Excel {
        log::warn!("'{}': sheet selection ignored for delimited files", path.display());
    }

    log::info!(
        "loaded '{}': {} rows, {} columns",
        path.display(),
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Build a table from raw records. The first non-blank record is the header;
/// blank records are dropped. Blank headers become `Unnamed: <index>` and
/// repeated ones get `.1`, `.2`, ... so every column stays addressable.
pub(crate) fn table_from_records(records: Vec<Vec<FieldValue>>) -> Table {
    let mut rows = records
        .into_iter()
        .filter(|r| r.iter().any(|v| !v.is_blank()));

    let Some(header) = rows.next() else {
        return Table::default();
    };
    let body: Vec<Vec<FieldValue>> = rows.collect();
    let width = body.iter().map(Vec::len).fold(header.len(), usize::max);

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(width);
    for i in 0..width {
        let base = header
            .get(i)
            .and_then(FieldValue::as_text)
            .unwrap_or_else(|| format!("Unnamed: {i}"));
        let mut name = base.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }

    let mut table = Table::new(names);
    for row in body {
        table.push_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.into())
    }

    #[test]
    fn header_is_first_non_blank_record() {
        let table = table_from_records(vec![
            vec![FieldValue::Empty, text("  ")],
            vec![text(" Name "), text("ID")],
            vec![text("Ann Lee"), text("E1")],
            vec![FieldValue::Empty, FieldValue::Empty],
            vec![text("Bo Chan"), text("E2")],
        ]);
        assert_eq!(table.columns(), &["Name", "ID"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn headers_are_made_unique() {
        let table = table_from_records(vec![
            vec![text("Name"), FieldValue::Empty, text("Name"), text("Name")],
            vec![text("a"), text("b"), text("c"), text("d"), text("e")],
        ]);
        assert_eq!(
            table.columns(),
            &["Name", "Unnamed: 1", "Name.1", "Name.2", "Unnamed: 4"]
        );
        assert_eq!(table.text(0, "Unnamed: 4").as_deref(), Some("e"));
    }

    #[test]
    fn empty_input_is_empty_table() {
        assert_eq!(table_from_records(Vec::new()), Table::default());
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.CSV")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_path(Path::new("a.tsv")), Some(TableFormat::Tsv));
        assert_eq!(TableFormat::from_path(Path::new("a.xlsm")), Some(TableFormat::Excel));
        assert_eq!(TableFormat::from_path(Path::new("a.pdf")), None);
        assert_eq!(TableFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn load_table_dispatches() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("h.csv");
        std::fs::write(&csv_path, "Name;Compliance\nAnn Lee;85\n").unwrap();
        let table = load_table(&csv_path, None).unwrap();
        assert_eq!(table.value(0, "Compliance"), Some(&FieldValue::Number(85.0)));

        let xlsx_path = dir.path().join("h.xlsx");
        xlsx::export(&[("Sheet1", &table)], &xlsx_path).unwrap();
        assert_eq!(load_table(&xlsx_path, Some("Sheet1")).unwrap(), table);

        let err = load_table(&dir.path().join("h.pdf"), None).unwrap_err();
        assert!(err.starts_with("Unsupported file type"), "{err}");
    }
}
