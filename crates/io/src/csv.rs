// CSV/TSV import/export

use std::io::Read;
use std::path::Path;

use rollcall_recon::model::{FieldValue, Table};

use crate::table_from_records;

pub fn import(path: &Path) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

pub fn import_with_delimiter(path: &Path, delimiter: u8) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count.
        let consistent = counts.iter().filter(|&&c| c == target).count();
        let score = consistent * target;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read a file as UTF-8, falling back to Windows-1252 (common for Excel-exported CSVs).
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            log::debug!("'{}' is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Parse delimited text. The first non-blank record is the header row.
pub fn import_from_string(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.map_err(|e| format!("CSV parse error near record {}: {}", line + 1, e))?;
        records.push(record.iter().map(parse_field).collect::<Vec<_>>());
    }

    Ok(table_from_records(records))
}

/// Empty fields are `Empty`; plain decimal numbers are `Number`; the rest is text.
/// Numbers with leading zeros (`00123`) stay text so IDs survive.
pub(crate) fn parse_field(field: &str) -> FieldValue {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return FieldValue::Empty;
    }
    if looks_numeric(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return FieldValue::Number(n);
            }
        }
    }
    FieldValue::Text(field.to_string())
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let int_ok = !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && (int == "0" || !int.starts_with('0'));
    let frac_ok = frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    int_ok && frac_ok
}

pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b',')
}

pub fn export_tsv(table: &Table, path: &Path) -> Result<(), String> {
    export_with_delimiter(table, path, b'\t')
}

fn export_with_delimiter(table: &Table, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;

    writer.write_record(table.columns()).map_err(|e| e.to_string())?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "Name|Age|City\nAlice|30|Paris\nBob|25|London\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_sniff_comma_with_quoted_names() {
        // "Last, First" names must not push the sniffer off commas.
        let content = "Employee Name,Employee ID\n\"Lee, Ann\",E1\n\"Chan, Bo\",E2\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_empty_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_import_types_cells() {
        let table = import_from_string(
            "Name,Employee ID,Compliance\nAnn Lee,00123,85\nBo Chan,,90.5\n",
            b',',
        )
        .unwrap();
        assert_eq!(table.columns(), &["Name", "Employee ID", "Compliance"]);
        assert_eq!(table.value(0, "Employee ID"), Some(&FieldValue::Text("00123".into())));
        assert_eq!(table.value(0, "Compliance"), Some(&FieldValue::Number(85.0)));
        assert_eq!(table.value(1, "Employee ID"), Some(&FieldValue::Empty));
        assert_eq!(table.value(1, "Compliance"), Some(&FieldValue::Number(90.5)));
    }

    #[test]
    fn test_numeric_detection() {
        assert!(looks_numeric("0"));
        assert!(looks_numeric("-12.50"));
        assert!(looks_numeric("0.5"));
        assert!(!looks_numeric("007"));
        assert!(!looks_numeric("1e3"));
        assert!(!looks_numeric("85%"));
        assert!(!looks_numeric("1."));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "José" with é as 0xE9
        fs::write(&path, b"Name,ID\nJos\xe9 Ortiz,E9\n").unwrap();
        let table = import(&path).unwrap();
        assert_eq!(table.text(0, "Name").as_deref(), Some("José Ortiz"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}Name,ID\nAnn,1\n").unwrap();
        let table = import(&path).unwrap();
        assert_eq!(table.columns()[0], "Name");
    }

    #[test]
    fn test_tsv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.tsv");

        let mut table = Table::new(["Name", "Compliance"]);
        table.push_row(vec!["Lee, Ann".into(), 85.0.into()]);
        table.push_row(vec!["Bo Chan".into(), FieldValue::Empty]);
        export_tsv(&table, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\t'));

        let imported = import(&path).unwrap();
        assert_eq!(imported, table);
    }

    #[test]
    fn test_missing_file_message() {
        let err = import(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(err.starts_with("Failed to open"), "{err}");
    }
}
