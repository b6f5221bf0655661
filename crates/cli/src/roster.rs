// `rollcall match` and `rollcall merge`: whole-roster ID assignment.

use std::path::PathBuf;

use rollcall_config::Settings;
use rollcall_io::filename::timestamp_now;
use rollcall_recon::roster::{annotate_roster, merge_ids, MergeOptions, EMPLOYEE_ID_COLUMN};
use rollcall_recon::{worker, ColumnResolver, LookupIndex, MatchingEngine, ReconError};

use crate::util::{load_input, print_json, timestamped_path, write_tables};
use crate::CliError;

// ============================================================================
// match
// ============================================================================

pub struct MatchArgs {
    pub roster: PathBuf,
    pub reference: PathBuf,
    pub sheet: Option<String>,
    pub reference_sheet: Option<String>,
    pub threshold: Option<i64>,
    pub name_column: Option<String>,
    pub id_column: Option<String>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

pub fn cmd_match(args: MatchArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let threshold = args.threshold.unwrap_or_else(|| i64::from(settings.fuzzy_threshold));

    let reference = load_input(&args.reference, args.reference_sheet.as_deref())?;
    let roster = load_input(&args.roster, args.sheet.as_deref())?;

    let ref_name = ColumnResolver::employee_name().require("reference", &reference)?;
    let ref_id = ColumnResolver::employee_id().require("reference", &reference)?;
    let name_column = match args.name_column {
        Some(col) => col,
        None => ColumnResolver::employee_name().require("roster", &roster)?,
    };
    log::debug!("reference columns '{ref_name}' / '{ref_id}', roster column '{name_column}'");

    let index = LookupIndex::build("reference", &reference, &ref_name, &ref_id)?;
    let engine = MatchingEngine::with_threshold(index, threshold)?;
    let id_column = args.id_column;

    let handle = worker::spawn("match", move || {
        let mut engine = engine;
        let table = annotate_roster(&mut engine, &roster, &name_column, id_column.as_deref())?;
        Ok::<_, ReconError>((table, engine.statistics(), engine.threshold()))
    })?;
    let (annotated, stats, threshold) = handle.wait()??;

    let output = match args.output {
        Some(path) => path,
        None => timestamped_path(&settings.output_dir(), "master_names_with_ids", "xlsx", &timestamp_now()),
    };
    write_tables(&[("Master_Names", &annotated)], &output)?;

    eprintln!(
        "{} names: {} exact, {} fuzzy, {} no match, {} already had an ID (threshold {})",
        stats.total(),
        stats.exact,
        stats.fuzzy,
        stats.no_match,
        stats.already_had_id,
        threshold
    );

    if args.json {
        print_json(&serde_json::json!({
            "output": output.display().to_string(),
            "fuzzy_threshold": threshold,
            "statistics": stats,
        }))?;
    }
    Ok(())
}

// ============================================================================
// merge
// ============================================================================

pub fn cmd_merge(
    history_path: PathBuf,
    employees_path: PathBuf,
    history_sheet: Option<String>,
    employees_sheet: Option<String>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let history = load_input(&history_path, history_sheet.as_deref())?;
    let employees = load_input(&employees_path, employees_sheet.as_deref())?;

    let handle = worker::spawn("merge", move || {
        merge_ids(&history, &employees, &MergeOptions::default())
    })?;
    let merged = handle.wait()??;
    let without_id = (0..merged.len())
        .filter(|&row| {
            merged
                .value(row, EMPLOYEE_ID_COLUMN)
                .map_or(true, |v| v.is_blank())
        })
        .count();

    let output = match output {
        Some(path) => path,
        None => timestamped_path(&Settings::load().output_dir(), "merged_history", "xlsx", &timestamp_now()),
    };
    write_tables(&[("Merged_History", &merged)], &output)?;

    eprintln!(
        "{} history rows, {} with an Employee ID, {} without",
        merged.len(),
        merged.len() - without_id,
        without_id
    );

    if json {
        print_json(&serde_json::json!({
            "output": output.display().to_string(),
            "rows": merged.len(),
            "with_id": merged.len() - without_id,
            "without_id": without_id,
        }))?;
    }
    Ok(())
}
