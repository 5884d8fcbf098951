//! Error-signature extraction (spec §4.F): two-stage line filtering over a
//! loop's raw output, producing the signature the breaker compares across
//! consecutive loops.

use once_cell::sync::Lazy;
use regex::Regex;

/// Stage 1: drop lines that look like a JSON field name containing "error"
/// (`"someError":`, `"error_code":`), which are structural, not diagnostic.
static JSON_ERROR_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"\w*error\w*"\s*:"#).unwrap());

/// Stage 2: retain only lines that look like an actual error report.
static ERROR_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Error:|ERROR:|Exception|Fatal|failed:)").unwrap());

/// Extracts the error signature from a loop's raw output: drop JSON-field-name
/// noise, then keep lines that look like real error reports, concatenated in
/// order. Returns `None` if no error-like lines remain.
pub fn extract_error_signature(text: &str) -> Option<String> {
    let retained: Vec<&str> = text
        .lines()
        .filter(|line| !JSON_ERROR_FIELD.is_match(line))
        .filter(|line| ERROR_LINE.is_match(line.trim_start()))
        .collect();

    if retained.is_empty() {
        None
    } else {
        Some(retained.join("\n"))
    }
}
