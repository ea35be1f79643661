//! Folder-name generation for file groups.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::grouping::cluster::Cluster;
use crate::grouping::normalize::base_name;

/// Regex to match characters that are not allowed in generated folder names.
static RE_NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("Invalid sanitize regex"));

/// Regex to match runs of whitespace.
static RE_WHITESPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Regex to match the digit and punctuation runs stripped when tokenizing
/// filenames for descriptive labels.
static RE_LABEL_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d_\s()-]+").expect("Invalid label separator regex"));

/// Maximum length for a sanitized folder name before falling back.
const MAX_NAME_LENGTH: usize = 255;

/// Maximum length for a descriptive label built from cluster tokens.
const MAX_LABEL_LENGTH: usize = 50;

/// Maximum length for the representative-based label fallback.
const MAX_FALLBACK_LABEL_LENGTH: usize = 30;

/// Convert a group key into a human-readable, filesystem-safe folder name.
///
/// Replaces everything outside letters, digits and whitespace with a space,
/// collapses whitespace runs, trims, and capitalizes each word. An empty or
/// overlong result falls back to a synthetic "Group NNNN" name derived from a
/// hash of the original key; the hash is not reversible and uniqueness is only
/// as good as practical collision improbability.
#[must_use]
pub fn sanitize_group_name(key: &str) -> String {
    let replaced = RE_NON_ALPHANUMERIC.replace_all(key, " ");
    let collapsed = RE_WHITESPACE_RUNS.replace_all(&replaced, " ");
    let name = collapsed.trim().split(' ').filter(|word| !word.is_empty()).map(capitalize).join(" ");

    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        fallback_group_name(key)
    } else {
        name
    }
}

/// Synthetic name for keys that sanitize to nothing usable.
fn fallback_group_name(key: &str) -> String {
    let digest = Sha1::digest(key.as_bytes());
    let number = u16::from_be_bytes([digest[0], digest[1]]) % 10_000;
    format!("Group {number}")
}

/// Derive a descriptive label for a cluster from its most frequent name tokens.
///
/// Tokenizes each member's base name with digit and punctuation runs stripped,
/// counts tokens of at least three characters case-insensitively, and joins
/// the top three by frequency (ties keep first-appearance order). Falls back
/// to the representative's base name when no token qualifies.
#[must_use]
pub fn descriptive_label(cluster: &Cluster) -> String {
    let mut token_counts: Vec<(String, usize)> = Vec::new();
    for file in &cluster.files {
        let cleaned = RE_LABEL_SEPARATORS.replace_all(base_name(file), " ");
        for token in cleaned.split_whitespace() {
            if token.chars().count() < 3 {
                continue;
            }
            let token = token.to_lowercase();
            match token_counts.iter_mut().find(|(existing, _)| *existing == token) {
                Some((_, count)) => *count += 1,
                None => token_counts.push((token, 1)),
            }
        }
    }

    if token_counts.is_empty() {
        return truncate_chars(base_name(&cluster.representative), MAX_FALLBACK_LABEL_LENGTH);
    }

    // Stable sort keeps first-appearance order for equal counts.
    token_counts.sort_by(|a, b| b.1.cmp(&a.1));
    let label = token_counts
        .iter()
        .take(3)
        .map(|(token, _)| capitalize(token))
        .join(" ");
    truncate_chars(&label, MAX_LABEL_LENGTH)
}

/// Append " 2", " 3", … to later occurrences of duplicate group names so the
/// final mapping has exactly one entry per name.
#[must_use]
pub fn disambiguate_names(groups: Vec<(String, Vec<String>)>) -> Vec<(String, Vec<String>)> {
    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    groups
        .into_iter()
        .map(|(name, files)| {
            let counter = counters.entry(name.clone()).or_insert(1);
            let mut unique = name.clone();
            while !used.insert(unique.clone()) {
                *counter += 1;
                unique = format!("{name} {counter}");
            }
            (unique, files)
        })
        .collect()
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
    })
}

/// Truncate a string to at most `limit` characters on a char boundary.
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
