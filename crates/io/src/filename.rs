// Timestamped report names: `<prefix>_<YYYYMMDDTHHMMSS>.<ext>`

use std::sync::OnceLock;

use regex::Regex;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"))
}

/// Local time in [`TIMESTAMP_FORMAT`].
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Build a filesystem-friendly output name.
///
/// The prefix is trimmed, every run of characters outside `[A-Za-z0-9_-]`
/// becomes one `_`, and the result is lowercased. Leading dots are stripped
/// from the extension. `timestamp` defaults to the current local time.
pub fn format_output_filename(prefix: &str, extension: &str, timestamp: Option<&str>) -> String {
    let safe_prefix = unsafe_chars().replace_all(prefix.trim(), "_").to_lowercase();
    let timestamp = match timestamp {
        Some(ts) => ts.to_string(),
        None => timestamp_now(),
    };
    format!("{safe_prefix}_{timestamp}.{}", extension.trim_start_matches('.'))
}
