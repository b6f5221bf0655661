use crate::error::ReconError;
use crate::model::{ComplianceBucket, ComplianceDelta, ComplianceReport, FieldValue, Table};

/// Column appended to bucket tables holding `after - before`.
pub const COMPLIANCE_CHANGE_COLUMN: &str = "Compliance Change";

/// Classify each row of `table` by the sign of `after - before`.
///
/// Rows where either value fails numeric coercion land in no bucket and are
/// counted in `skipped`, so `improved + declined + unchanged + skipped` always
/// equals the row count.
pub fn classify(
    table: &Table,
    before_column: &str,
    after_column: &str,
) -> Result<ComplianceReport, ReconError> {
    let mut report = ComplianceReport::default();
    if table.is_empty() {
        return Ok(report);
    }

    let before_idx = table
        .column_index(before_column)
        .ok_or_else(|| ReconError::missing_column("matched", before_column))?;
    let after_idx = table
        .column_index(after_column)
        .ok_or_else(|| ReconError::missing_column("matched", after_column))?;

    for (row, values) in table.rows().iter().enumerate() {
        let before = values.get(before_idx).and_then(coerce_number);
        let after = values.get(after_idx).and_then(coerce_number);
        let (Some(before), Some(after)) = (before, after) else {
            report.skipped += 1;
            continue;
        };

        let delta = after - before;
        let bucket = if delta > 0.0 {
            ComplianceBucket::Improved
        } else if delta < 0.0 {
            ComplianceBucket::Declined
        } else {
            ComplianceBucket::Unchanged
        };

        let entry = ComplianceDelta { row, before, after, delta, bucket };
        match bucket {
            ComplianceBucket::Improved => report.improved.push(entry),
            ComplianceBucket::Declined => report.declined.push(entry),
            ComplianceBucket::Unchanged => report.unchanged.push(entry),
        }
    }

    if report.skipped > 0 {
        log::warn!(
            "{} of {} matched rows skipped: non-numeric '{before_column}' or '{after_column}'",
            report.skipped,
            table.len()
        );
    }

    Ok(report)
}

impl ComplianceReport {
    /// Rows of one bucket as a table, with the delta appended.
    pub fn bucket_table(&self, source: &Table, bucket: ComplianceBucket) -> Table {
        let entries = self.bucket(bucket);
        let rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        let mut table = source.select_rows(&rows);
        table.push_column(
            COMPLIANCE_CHANGE_COLUMN,
            entries.iter().map(|e| FieldValue::Number(e.delta)).collect(),
        );
        table
    }
}

/// Coerce a cell to a finite number.
///
/// Text may carry `%`, `$`, thousands separators, surrounding whitespace, or
/// accounting-style parentheses for negatives: `(12.5)` → `-12.5`.
pub fn coerce_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) if n.is_finite() => Some(*n),
        FieldValue::Number(_) | FieldValue::Empty => None,
        FieldValue::Text(s) => parse_number_text(s),
    }
}

fn parse_number_text(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    // Digits, '.', thousands commas, a leading sign and an exponent.
    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' | ',' | 'e' | 'E' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            '-' | '+' if i > 0 => {}
            _ => return None,
        }
    }
    let cleaned = strip_thousands_separators(&cleaned)?;

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if is_negative { -value } else { value })
}

/// Commas are only accepted between groups of three integer digits:
/// `1,200` but not `1,2,3` or `1.5,0`.
fn strip_thousands_separators(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let unsigned = s.trim_start_matches(['-', '+']);
    let sign = &s[..s.len() - unsigned.len()];
    let int_end = unsigned
        .find(|c| matches!(c, '.' | 'e' | 'E'))
        .unwrap_or(unsigned.len());
    let (int_part, rest) = unsigned.split_at(int_end);
    if rest.contains(',') {
        return None;
    }

    let mut groups = int_part.split(',');
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || !groups.all(|g| g.len() == 3) {
        return None;
    }
    Some(format!("{sign}{}{rest}", int_part.replace(',', "")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matched(rows: &[(FieldValue, FieldValue)]) -> Table {
        let mut t = Table::new(["Name", "Compliance_hist", "Compliance_emp"]);
        for (i, (a, b)) in rows.iter().enumerate() {
            t.push_row(vec![format!("Person {i}").into(), a.clone(), b.clone()]);
        }
        t
    }

    #[test]
    fn buckets_by_sign() {
        let t = matched(&[
            (80.0.into(), 95.0.into()),
            (90.0.into(), 70.0.into()),
            ("85%".into(), "85".into()),
        ]);
        let r = classify(&t, "Compliance_hist", "Compliance_emp").unwrap();
        assert_eq!(r.improved.len(), 1);
        assert_eq!(r.improved[0].delta, 15.0);
        assert_eq!(r.declined.len(), 1);
        assert_eq!(r.declined[0].delta, -20.0);
        assert_eq!(r.unchanged.len(), 1);
        assert_eq!(r.unchanged[0].row, 2);
        assert_eq!(r.skipped, 0);
    }

    #[test]
    fn non_numeric_rows_are_skipped() {
        let t = matched(&[
            ("n/a".into(), 95.0.into()),
            (FieldValue::Empty, 95.0.into()),
            (FieldValue::Number(f64::NAN), 1.0.into()),
            (10.0.into(), 20.0.into()),
        ]);
        let r = classify(&t, "Compliance_hist", "Compliance_emp").unwrap();
        assert_eq!(r.skipped, 3);
        assert_eq!(r.classified(), 1);
    }

    #[test]
    fn missing_column_is_schema_error() {
        let t = matched(&[(1.0.into(), 2.0.into())]);
        let err = classify(&t, "Compliance_hist", "Compliance").unwrap_err();
        assert!(err.to_string().contains("'Compliance'"));
    }

    #[test]
    fn empty_table_classifies_nothing() {
        let r = classify(&Table::default(), "a", "b").unwrap();
        assert_eq!(r, ComplianceReport::default());
    }

    #[test]
    fn coercion_accepts_common_formats() {
        assert_eq!(parse_number_text(" 85 % "), Some(85.0));
        assert_eq!(parse_number_text("$1,200.50"), Some(1200.5));
        assert_eq!(parse_number_text("(12.5)"), Some(-12.5));
        assert_eq!(parse_number_text("-3"), Some(-3.0));
        assert_eq!(parse_number_text("abc"), None);
        assert_eq!(parse_number_text("NaN"), None);
        assert_eq!(parse_number_text("inf"), None);
    }

    #[test]
    fn coercion_accepts_exponents() {
        assert_eq!(parse_number_text("1e2"), Some(100.0));
        assert_eq!(parse_number_text("8.5E-1"), Some(0.85));
        assert_eq!(parse_number_text("1e"), None);
        assert_eq!(parse_number_text("e5"), None);
    }

    #[test]
    fn commas_must_group_thousands() {
        assert_eq!(parse_number_text("12,345,678"), Some(12_345_678.0));
        assert_eq!(parse_number_text("-1,000.25"), Some(-1000.25));
        assert_eq!(parse_number_text("1,2,3"), None);
        assert_eq!(parse_number_text("1234,567"), None);
        assert_eq!(parse_number_text(",100"), None);
        assert_eq!(parse_number_text("1.000,5"), None);
    }

    #[test]
    fn bucket_table_appends_change() {
        let t = matched(&[(80.0.into(), 95.0.into()), (90.0.into(), 70.0.into())]);
        let r = classify(&t, "Compliance_hist", "Compliance_emp").unwrap();
        let improved = r.bucket_table(&t, ComplianceBucket::Improved);
        assert_eq!(improved.len(), 1);
        assert_eq!(improved.text(0, "Name").as_deref(), Some("Person 0"));
        assert_eq!(improved.value(0, COMPLIANCE_CHANGE_COLUMN), Some(&FieldValue::Number(15.0)));
    }

    proptest! {
        #[test]
        fn totals_cover_every_row(
            values in proptest::collection::vec(
                (prop_oneof![Just("x".to_string()), (0u8..=100).prop_map(|v| v.to_string())],
                 prop_oneof![Just(String::new()), (0u8..=100).prop_map(|v| format!("{v}%"))]),
                0..30,
            )
        ) {
            let rows: Vec<(FieldValue, FieldValue)> = values
                .into_iter()
                .map(|(a, b)| (FieldValue::Text(a), FieldValue::Text(b)))
                .collect();
            let t = matched(&rows);
            let r = classify(&t, "Compliance_hist", "Compliance_emp").unwrap();
            prop_assert_eq!(r.classified() + r.skipped, t.len());
            for d in r.improved.iter().chain(&r.declined).chain(&r.unchanged) {
                prop_assert_eq!(d.delta, d.after - d.before);
            }
        }
    }
}
