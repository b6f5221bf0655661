// Shared file plumbing for the subcommands.

use std::path::{Path, PathBuf};

use rollcall_io::filename::format_output_filename;
use rollcall_io::TableFormat;
use rollcall_recon::model::Table;

use crate::CliError;

/// Load an input table, telling unsupported formats (usage) apart from read
/// failures (I/O).
pub fn load_input(path: &Path, sheet: Option<&str>) -> Result<Table, CliError> {
    if TableFormat::from_path(path).is_none() {
        return Err(CliError::usage(format!("unsupported input '{}'", path.display()))
            .with_hint("inputs must be .csv, .tsv, .txt, .xlsx, .xls, .xlsm, .xlsb or .ods"));
    }
    rollcall_io::load_table(path, sheet).map_err(CliError::io)
}

/// `<dir>/<prefix>_<timestamp>.<ext>`.
pub fn timestamped_path(dir: &Path, prefix: &str, extension: &str, timestamp: &str) -> PathBuf {
    dir.join(format_output_filename(prefix, extension, Some(timestamp)))
}

/// Write one or more named tables. Workbooks get one sheet per table;
/// delimited formats can only hold the first.
pub fn write_tables(sheets: &[(&str, &Table)], path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CliError::io(format!("cannot create '{}': {e}", parent.display())))?;
    }

    let format = TableFormat::from_path(path).ok_or_else(|| {
        CliError::usage(format!("unsupported output '{}'", path.display()))
            .with_hint("write to .xlsx, .csv or .tsv")
    })?;

    match format {
        TableFormat::Excel => rollcall_io::xlsx::export(sheets, path).map_err(CliError::io)?,
        TableFormat::Csv | TableFormat::Tsv => {
            let Some((_, table)) = sheets.first() else {
                return Ok(());
            };
            if sheets.len() > 1 {
                log::warn!(
                    "'{}' holds one table; {} more sheets not written",
                    path.display(),
                    sheets.len() - 1
                );
            }
            if format == TableFormat::Csv {
                rollcall_io::csv::export(table, path).map_err(CliError::io)?;
            } else {
                rollcall_io::csv::export_tsv(table, path).map_err(CliError::io)?;
            }
        }
    }

    eprintln!("wrote {}", path.display());
    Ok(())
}

/// Pretty JSON on stdout; nothing else may go to stdout with `--json`.
pub fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, format!("JSON serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}
