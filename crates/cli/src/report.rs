// `rollcall report` and `rollcall validate`: pay-period runs from a TOML config.

use std::path::{Path, PathBuf};

use rollcall_config::Settings;
use rollcall_io::filename::timestamp_now;
use rollcall_recon::classify::COMPLIANCE_CHANGE_COLUMN;
use rollcall_recon::config::{DatasetConfig, ReconConfig};
use rollcall_recon::model::{ComplianceBucket, FieldValue, NearMiss, PayPeriodReport, Table};
use rollcall_recon::{run, worker, PayPeriodInput, ReconError};

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::util::{load_input, print_json, timestamped_path, write_tables};
use crate::CliError;

pub const MATCHED_SHEET: &str = "Matched_Employees";
pub const IMPROVED_SHEET: &str = "Improved_Compliance";
pub const DECLINED_SHEET: &str = "Declined_Compliance";
pub const POSSIBLE_MATCHES_SHEET: &str = "Possible_Matches";

fn load_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config '{}': {e}", config_path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", config_path.display()))
            .with_hint("run `rollcall validate` on the config for details")
    })
}

/// Dataset paths are relative to the config file.
fn config_base(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn load_dataset(base: &Path, dataset: &DatasetConfig) -> Result<Table, CliError> {
    load_input(&base.join(&dataset.file), dataset.sheet.as_deref())
}

// ============================================================================
// report
// ============================================================================

pub fn cmd_report(
    config_path: PathBuf,
    json_output: bool,
    output_dir: Option<PathBuf>,
    no_write: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = config_base(&config_path);

    let input = PayPeriodInput {
        history: load_dataset(&base, &config.history)?,
        current: load_dataset(&base, &config.current)?,
    };

    let out_dir = match (&output_dir, &config.output.dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => base.join(dir),
        (None, None) => Settings::load().output_dir(),
    };

    let handle = worker::spawn("report", move || run(&config, &input))?;
    let report = handle.wait()??;

    if !no_write {
        write_report(&report, &out_dir, &timestamp_now())?;
    }

    print_summary(&report);

    if json_output {
        print_json(&report)?;
    }
    Ok(())
}

/// The three report workbooks, sharing one timestamp.
fn write_report(report: &PayPeriodReport, dir: &Path, timestamp: &str) -> Result<(), CliError> {
    let matched = &report.reconciliation.matched;
    let improved = report.compliance.bucket_table(matched, ComplianceBucket::Improved);
    let declined = report.compliance.bucket_table(matched, ComplianceBucket::Declined);
    let possible = near_miss_table(&report.near_misses);

    let mut sheets: Vec<(&str, &Table)> = vec![
        (MATCHED_SHEET, matched),
        (IMPROVED_SHEET, &improved),
        (DECLINED_SHEET, &declined),
    ];
    if !possible.is_empty() {
        sheets.push((POSSIBLE_MATCHES_SHEET, &possible));
    }

    write_tables(&sheets, &timestamped_path(dir, "matched_report", "xlsx", timestamp))?;
    write_tables(
        &[("Unmatched_History", &report.reconciliation.only_in_left)],
        &timestamped_path(dir, "unmatched_history", "xlsx", timestamp),
    )?;
    write_tables(
        &[("Unmatched_Employees", &report.reconciliation.only_in_right)],
        &timestamped_path(dir, "unmatched_employee", "xlsx", timestamp),
    )?;
    Ok(())
}

/// Row numbers are 1-based data rows, as a spreadsheet user counts them.
fn near_miss_table(near_misses: &[NearMiss]) -> Table {
    let mut table = Table::new(["History Row", "History Name", "Current Row", "Current Name", "Similarity"]);
    for miss in near_misses {
        table.push_row(vec![
            FieldValue::Number((miss.history_row + 1) as f64),
            miss.history_name.clone().into(),
            FieldValue::Number((miss.current_row + 1) as f64),
            miss.current_name.clone().into(),
            FieldValue::Number(f64::from(miss.score)),
        ]);
    }
    table
}

fn print_summary(report: &PayPeriodReport) {
    let s = &report.summary;
    eprintln!("{}", report.meta.config_name);
    eprintln!("  history rows:   {}", s.left_rows);
    eprintln!("  current rows:   {}", s.right_rows);
    eprintln!("  matched:        {}", s.matched);
    eprintln!("  history only:   {}", s.only_left);
    eprintln!("  current only:   {}", s.only_right);
    eprintln!(
        "  compliance:     {} improved, {} declined, {} unchanged, {} skipped",
        s.improved, s.declined, s.unchanged, s.skipped
    );
    if s.near_misses > 0 {
        eprintln!(
            "  possible matches: {} (see {POSSIBLE_MATCHES_SHEET}, threshold {})",
            s.near_misses, report.meta.fuzzy_threshold
        );
    }
    if s.skipped > 0 {
        eprintln!(
            "  note: {} matched rows have a non-numeric '{}' or '{}' and no {}",
            s.skipped, report.before_column, report.after_column, COMPLIANCE_CHANGE_COLUMN
        );
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let base = config_base(&config_path);

    for (label, dataset) in [("history", &config.history), ("current", &config.current)] {
        let table = load_dataset(&base, dataset)?;
        if table.is_empty() {
            log::warn!("[{label}] '{}' has no data rows", dataset.file);
            continue;
        }
        let name = dataset.name_resolver().require(label, &table)?;
        if !table.has_column(dataset.compliance_column.trim()) {
            return Err(ReconError::missing_column(label, dataset.compliance_column.trim()).into());
        }
        eprintln!(
            "[{label}] {}: {} rows, name column '{name}', compliance column '{}'",
            dataset.file,
            table.len(),
            dataset.compliance_column.trim()
        );
    }

    eprintln!(
        "config '{}' is valid (fuzzy threshold {})",
        config.name,
        config.fuzzy_threshold()?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_miss_rows_are_one_based() {
        let table = near_miss_table(&[NearMiss {
            history_row: 3,
            current_row: 0,
            history_name: "Jonathan Reyes".into(),
            current_name: "Jonathon Reyes".into(),
            score: 93,
        }]);
        assert_eq!(table.value(0, "History Row"), Some(&FieldValue::Number(4.0)));
        assert_eq!(table.value(0, "Current Row"), Some(&FieldValue::Number(1.0)));
        assert_eq!(table.text(0, "Current Name").as_deref(), Some("Jonathon Reyes"));
    }

    #[test]
    fn config_base_of_bare_file_is_cwd() {
        assert_eq!(config_base(Path::new("run.toml")), PathBuf::from(""));
        assert_eq!(config_base(Path::new("cfg/run.toml")), PathBuf::from("cfg"));
    }
}
