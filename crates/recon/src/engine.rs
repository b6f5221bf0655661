use crate::classify::classify;
use crate::config::{DatasetConfig, ReconConfig};
use crate::error::ReconError;
use crate::lookup::LookupIndex;
use crate::matcher::MatchingEngine;
use crate::model::{
    FieldValue, NearMiss, PayPeriodReport, ReconMeta, ReconciliationResult, Side, Table,
};
use crate::normalize::normalize;
use crate::reconcile::{reconcile, ReconcileOptions, NORMALIZED_NAME_COLUMN};
use crate::summary::compute_summary;

/// Pre-loaded datasets for one pay-period run.
#[derive(Debug, Clone, Default)]
pub struct PayPeriodInput {
    pub history: Table,
    pub current: Table,
}

/// Run a pay-period reconciliation per config: join history to the current
/// roster on normalized name, then bucket matched rows by compliance change.
pub fn run(config: &ReconConfig, input: &PayPeriodInput) -> Result<PayPeriodReport, ReconError> {
    let threshold = config.fuzzy_threshold()?;

    let history_name = name_column("history", &config.history, &input.history)?;
    let current_name = name_column("current", &config.current, &input.current)?;
    log::debug!("name columns: history '{history_name}', current '{current_name}'");

    let (left_suffix, right_suffix) = &config.output.suffixes;
    let options = ReconcileOptions::new(&history_name, &current_name)
        .datasets("history", "current")
        .suffixes(left_suffix, right_suffix);
    let reconciliation = reconcile(&input.history, &input.current, &options)?;

    let before_column = compliance_column(
        &reconciliation,
        Side::Left,
        "history",
        &config.history.compliance_column,
        &input.history,
    )?;
    let after_column = compliance_column(
        &reconciliation,
        Side::Right,
        "current",
        &config.current.compliance_column,
        &input.current,
    )?;
    let compliance = classify(&reconciliation.matched, &before_column, &after_column)?;

    let near_misses = near_misses(&reconciliation, &history_name, &current_name, threshold)?;
    let summary = compute_summary(input, &reconciliation, &compliance, near_misses.len());

    log::info!(
        "pay period '{}': {} matched, {} history only, {} current only",
        config.name,
        summary.matched,
        summary.only_left,
        summary.only_right
    );

    Ok(PayPeriodReport {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            fuzzy_threshold: threshold,
        },
        summary,
        before_column,
        after_column,
        reconciliation,
        compliance,
        near_misses,
    })
}

/// An empty dataset may come from a header-less export, so its name column
/// is allowed to be unresolvable.
fn name_column(dataset: &str, config: &DatasetConfig, table: &Table) -> Result<String, ReconError> {
    match config.name_resolver().require(dataset, table) {
        Ok(column) => Ok(column),
        Err(_) if table.is_empty() => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// Where an input compliance column ended up in the matched table.
fn compliance_column(
    reconciliation: &ReconciliationResult,
    side: Side,
    dataset: &str,
    column: &str,
    source: &Table,
) -> Result<String, ReconError> {
    match reconciliation.columns.output_name(side, column) {
        Some(name) => Ok(name.to_string()),
        None if source.is_empty() => Ok(column.trim().to_string()),
        None => Err(ReconError::missing_column(dataset, column.trim())),
    }
}

/// Pair each history-only row with the closest current-only name scoring at
/// least `threshold`. These are suggestions for a human; they never join.
fn near_misses(
    reconciliation: &ReconciliationResult,
    history_name: &str,
    current_name: &str,
    threshold: u8,
) -> Result<Vec<NearMiss>, ReconError> {
    let left = &reconciliation.only_in_left;
    let right = &reconciliation.only_in_right;
    if left.is_empty() || right.is_empty() {
        return Ok(Vec::new());
    }

    let index = LookupIndex::from_records((0..right.len()).map(|r| {
        (right.text(r, current_name), Some(r.to_string()))
    }));
    let engine = MatchingEngine::with_threshold(index, i64::from(threshold))?;

    let mut out = Vec::new();
    for row in 0..left.len() {
        let Some(FieldValue::Text(key)) = left.value(row, NORMALIZED_NAME_COLUMN) else {
            continue;
        };
        let key = normalize(Some(key.as_str()));
        let Some((record, score)) = engine.best_candidate(&key) else {
            continue;
        };
        if score < engine.threshold() {
            continue;
        }
        let Ok(right_row) = record.id.parse::<usize>() else {
            continue;
        };
        out.push(NearMiss {
            history_row: reconciliation.left_only_rows.get(row).copied().unwrap_or(row),
            current_row: reconciliation.right_only_rows.get(right_row).copied().unwrap_or(right_row),
            history_name: left.text(row, history_name).unwrap_or_default(),
            current_name: record.display_name.clone(),
            score,
        });
    }
    if !out.is_empty() {
        log::info!("{} unmatched history rows have a close current name", out.len());
    }
    Ok(out)
}
