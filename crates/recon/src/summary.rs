use crate::engine::PayPeriodInput;
use crate::model::{ComplianceReport, ReconSummary, ReconciliationResult};

/// Headline counts for a pay-period run.
pub fn compute_summary(
    input: &PayPeriodInput,
    reconciliation: &ReconciliationResult,
    compliance: &ComplianceReport,
    near_misses: usize,
) -> ReconSummary {
    ReconSummary {
        left_rows: input.history.len(),
        right_rows: input.current.len(),
        matched: reconciliation.matched.len(),
        only_left: reconciliation.only_in_left.len(),
        only_right: reconciliation.only_in_right.len(),
        improved: compliance.improved.len(),
        declined: compliance.declined.len(),
        unchanged: compliance.unchanged.len(),
        skipped: compliance.skipped,
        near_misses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::model::Table;
    use crate::reconcile::{reconcile, ReconcileOptions};

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut t = Table::new(["Name", "Pct"]);
        for (n, p) in rows {
            t.push_row(vec![(*n).into(), (*p).into()]);
        }
        t
    }

    #[test]
    fn summary_counts() {
        let input = PayPeriodInput {
            history: table(&[("Ann Lee", "50"), ("Bo Chan", "70"), ("Cy Dee", "x"), ("Eve Fox", "1")]),
            current: table(&[("Lee, Ann", "60"), ("Bo Chan", "70"), ("Cy Dee", "5"), ("Gus Hill", "2")]),
        };
        let rec = reconcile(&input.history, &input.current, &ReconcileOptions::new("Name", "Name")).unwrap();
        let compliance = classify(&rec.matched, "Pct_hist", "Pct_emp").unwrap();
        let s = compute_summary(&input, &rec, &compliance, 0);

        assert_eq!((s.left_rows, s.right_rows), (4, 4));
        assert_eq!(s.matched, 3);
        assert_eq!((s.only_left, s.only_right), (1, 1));
        assert_eq!((s.improved, s.declined, s.unchanged, s.skipped), (1, 0, 1, 1));
    }
}
