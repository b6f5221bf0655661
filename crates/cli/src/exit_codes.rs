//! CLI Exit Code Registry
//!
//! Single source of truth for `rollcall` exit codes. Payroll scripts branch
//! on these, so treat them as part of the shell contract.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified, batch panicked)          |
//! | 2    | CLI usage error (bad args, unsupported file type)    |
//! | 3    | I/O error (unreadable input, unwritable report)      |
//! | 4    | Schema error (required column missing from a file)   |
//! | 5    | Invalid run config (TOML syntax, threshold, suffixes)|
//!
//! Unmatched names are not errors: `match` and `report` exit 0 and report
//! them in their output.
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Update the table above
//! 3. Map it in [`recon_exit_code`] if it comes from the engine

use rollcall_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unsupported input format.
/// Matches clap's own exit code for argument errors.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Data (3-5)
// =============================================================================

/// An input file could not be read or an output file could not be written.
pub const EXIT_IO: u8 = 3;

/// A required column (name, id, compliance) is missing from an input.
pub const EXIT_SCHEMA: u8 = 4;

/// Run config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 5;

// =============================================================================
// Mapping
// =============================================================================

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::InvalidThreshold(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingColumn { .. } => EXIT_SCHEMA,
        ReconError::Io(_) => EXIT_IO,
        ReconError::WorkerPanicked(_) => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_codes() {
        assert_eq!(recon_exit_code(&ReconError::InvalidThreshold(120)), EXIT_INVALID_CONFIG);
        assert_eq!(
            recon_exit_code(&ReconError::missing_column("history", "Compliance")),
            EXIT_SCHEMA
        );
        assert_eq!(recon_exit_code(&ReconError::Io("disk".into())), EXIT_IO);
        assert_eq!(recon_exit_code(&ReconError::WorkerPanicked("report".into())), EXIT_ERROR);
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_IO, EXIT_SCHEMA, EXIT_INVALID_CONFIG];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
