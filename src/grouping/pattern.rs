//! Shared-pattern mining for files left over after clustering.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;

use crate::grouping::naming::sanitize_group_name;
use crate::grouping::normalize::base_name;

/// Regex to match word tokens (letters, digits, underscore).
static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("Invalid word regex"));

/// Regex to match plain alphanumeric segments for separator-joined sequences.
static RE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("Invalid segment regex"));

/// A substring or phrase mined from multiple filenames.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// The mined text, lower-cased.
    pub text: String,
    /// Number of filenames containing the text.
    pub frequency: usize,
    /// Specificity × capped frequency score used to rank patterns.
    pub relevance: f64,
}

/// Mine candidate patterns from the given filenames and rank them by relevance.
///
/// Candidates come from each file's extension-stripped, lower-cased base name:
/// individual word tokens of at least `min_pattern_length` characters,
/// contiguous phrases of 2–4 whitespace-separated words, and separator-joined
/// alphanumeric sequences of 2–4 segments. A candidate counts at most once per
/// filename; candidates found in fewer than two filenames are discarded.
/// Relevance is `(len / 20) × min(frequency / files, 0.5) × frequency`, ranked
/// descending with the pattern text as the tie-break.
#[must_use]
pub fn mine_patterns(files: &[String], min_pattern_length: usize) -> Vec<Pattern> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in files {
        let base = base_name(file).to_lowercase();
        for candidate in candidate_patterns(&base, min_pattern_length) {
            *counts.entry(candidate).or_insert(0) += 1;
        }
    }

    let total_files = files.len();
    let mut patterns: Vec<Pattern> = counts
        .into_iter()
        .filter(|(text, count)| *count >= 2 && text.chars().count() >= min_pattern_length)
        .map(|(text, count)| {
            let specificity = text.chars().count() as f64 / 20.0;
            let frequency_share = (count as f64 / total_files as f64).min(0.5);
            Pattern {
                relevance: specificity * frequency_share * count as f64,
                frequency: count,
                text,
            }
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.text.cmp(&b.text))
    });
    patterns
}

/// Extract the distinct pattern candidates from one lower-cased base name.
fn candidate_patterns(base: &str, min_pattern_length: usize) -> HashSet<String> {
    let mut candidates = HashSet::new();

    // Individual word tokens.
    let words: Vec<regex::Match<'_>> = RE_WORD.find_iter(base).collect();
    for word in &words {
        if word.as_str().chars().count() >= min_pattern_length {
            candidates.insert(word.as_str().to_string());
        }
    }

    // Contiguous phrases of 2-4 words. Words only join across pure-whitespace
    // gaps, so "foo-bar" does not yield the phrase "foo bar".
    for start in 0..words.len() {
        for length in 2..=4 {
            let end = start + length;
            if end > words.len() {
                break;
            }
            let joined_by_whitespace = (start..end - 1).all(|index| {
                let gap = &base[words[index].end()..words[index + 1].start()];
                !gap.is_empty() && gap.chars().all(char::is_whitespace)
            });
            if !joined_by_whitespace {
                continue;
            }
            let phrase = words[start..end].iter().map(|word| word.as_str()).join(" ");
            if phrase.chars().count() >= min_pattern_length {
                candidates.insert(phrase);
            }
        }
    }

    // Separator-joined sequences of 2-4 alphanumeric segments, kept with their
    // original separators so they can be matched back against the filename.
    let segments: Vec<regex::Match<'_>> = RE_SEGMENT.find_iter(base).collect();
    for start in 0..segments.len() {
        if segments[start].as_str().chars().count() < min_pattern_length {
            continue;
        }
        for length in 2..=4 {
            let end = start + length;
            if end > segments.len() {
                break;
            }
            let joined_by_separators = (start..end - 1).all(|index| {
                let gap = &base[segments[index].end()..segments[index + 1].start()];
                !gap.is_empty() && gap.chars().all(|c| c == '_' || c == '-' || c.is_whitespace())
            });
            if !joined_by_separators {
                continue;
            }
            candidates.insert(base[segments[start].start()..segments[end - 1].end()].to_string());
        }
    }

    candidates
}

/// Assign files to the highest-ranked matching patterns.
///
/// Iterates up to `max_groups` patterns in relevance order; each still
/// unassigned file joins the first pattern whose text occurs
/// (case-insensitively) in the filename. Groups are keyed by the sanitized
/// pattern name, so two patterns sanitizing identically share a group. Groups
/// below `min_files_per_group` are dropped and their files returned with the
/// rest of the unplaced files, preserving input order.
#[must_use]
pub fn assign_to_patterns(
    files: &[String],
    patterns: &[Pattern],
    max_groups: usize,
    min_files_per_group: usize,
) -> (Vec<(String, Vec<String>)>, Vec<String>) {
    let lowered: Vec<String> = files.iter().map(|file| file.to_lowercase()).collect();
    let mut membership: Vec<Option<usize>> = vec![None; files.len()];
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for pattern in patterns.iter().take(max_groups) {
        let name = sanitize_group_name(&pattern.text);
        // Two patterns can sanitize to the same name and then share a group.
        let mut group_index = groups.iter().position(|(existing, _)| *existing == name);
        for (index, file) in files.iter().enumerate() {
            if membership[index].is_some() {
                continue;
            }
            if !lowered[index].contains(&pattern.text) {
                continue;
            }
            let target = match group_index {
                Some(target) => target,
                None => {
                    groups.push((name.clone(), Vec::new()));
                    group_index = Some(groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[target].1.push(file.clone());
            membership[index] = Some(target);
        }
    }

    let keep: Vec<bool> = groups
        .iter()
        .map(|(_, members)| members.len() >= min_files_per_group)
        .collect();

    let kept_groups = groups
        .iter()
        .enumerate()
        .filter(|(index, _)| keep[*index])
        .map(|(_, group)| group.clone())
        .collect();

    let remaining = files
        .iter()
        .enumerate()
        .filter(|(index, _)| membership[*index].is_none_or(|group| !keep[group]))
        .map(|(_, file)| file.clone())
        .collect();

    (kept_groups, remaining)
}
