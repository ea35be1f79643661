//! Filename normalization for grouping comparisons.

use std::sync::LazyLock;

use regex::Regex;

/// Regex to match runs of digits, whitespace, and filename punctuation.
/// Every maximal run collapses to a single space when normalizing.
static RE_SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\d_\s()\[\]@#$%^&*!~+=|{}:;'"<>?/,-]+"#).expect("Invalid separator regex"));

/// Extract the base name of a filename without its extension.
///
/// Only the part after the final dot counts as an extension, and a leading dot
/// does not start one, so "archive.tar.gz" gives "archive.tar" and ".config"
/// stays ".config".
#[must_use]
pub fn base_name(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(index) => &filename[..index],
    }
}

/// Reduce a filename to its canonical comparison key.
///
/// Strips the extension, lower-cases the rest, collapses every run of digits,
/// whitespace and punctuation into a single space, and trims. Filenames that
/// differ only in casing, numbering, or punctuation share a key: both
/// "Report_2023.pdf" and "REPORT (2).pdf" normalize to "report". An empty key
/// is a valid result and signals that the filename has no reliable base name.
#[must_use]
pub fn normalized_key(filename: &str) -> String {
    let base = base_name(filename).to_lowercase();
    RE_SEPARATOR_RUNS.replace_all(&base, " ").trim().to_string()
}
