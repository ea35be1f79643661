//! Exact-key and fuzzy clustering passes.

use std::collections::HashMap;

use crate::grouping::normalize::normalized_key;
use crate::grouping::similarity::similarity_ratio;

/// A set of filenames judged to belong to one semantic group, before naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Lexicographically smallest member, used as the naming and tie-break anchor.
    pub representative: String,
    /// Member filenames in the order they were clustered.
    pub files: Vec<String>,
}

impl Cluster {
    fn new(files: Vec<String>) -> Self {
        let representative = files.iter().min().cloned().unwrap_or_default();
        Self { representative, files }
    }
}

/// Bucket files whose normalized keys match exactly.
///
/// Non-empty keys shared by two or more filenames become clusters, emitted in
/// the order each key was first seen in the input. Files with unique or empty
/// keys are returned as unplaced, preserving their input order.
#[must_use]
pub fn exact_key_clusters(files: &[String]) -> (Vec<Cluster>, Vec<String>) {
    let keys: Vec<String> = files.iter().map(|file| normalized_key(file)).collect();

    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut key_order: Vec<&str> = Vec::new();
    for (index, key) in keys.iter().enumerate() {
        if key.is_empty() {
            continue;
        }
        let bucket = buckets.entry(key).or_default();
        if bucket.is_empty() {
            key_order.push(key);
        }
        bucket.push(index);
    }

    let mut placed = vec![false; files.len()];
    let mut clusters = Vec::new();
    for key in key_order {
        let Some(indices) = buckets.get(key) else { continue };
        if indices.len() >= 2 {
            for &index in indices {
                placed[index] = true;
            }
            clusters.push(Cluster::new(indices.iter().map(|&index| files[index].clone()).collect()));
        }
    }

    let remaining = files
        .iter()
        .enumerate()
        .filter(|(index, _)| !placed[*index])
        .map(|(_, file)| file.clone())
        .collect();

    (clusters, remaining)
}

/// Cluster files whose normalized keys are similar above `threshold`.
///
/// Single greedy left-to-right pass in listing order: each unconsumed file
/// opens a cluster and claims every later unconsumed file whose key scores at
/// or above the threshold. Clusters are never re-merged, so the outcome
/// depends on the input order. Pairs whose key lengths differ by more than the
/// shorter key's length are skipped without scoring.
#[must_use]
pub fn fuzzy_clusters(files: &[String], threshold: f64) -> (Vec<Cluster>, Vec<String>) {
    let keys: Vec<String> = files.iter().map(|file| normalized_key(file)).collect();
    let key_lengths: Vec<usize> = keys.iter().map(|key| key.chars().count()).collect();

    let mut consumed = vec![false; files.len()];
    let mut clusters = Vec::new();

    for first in 0..files.len() {
        if consumed[first] {
            continue;
        }
        let mut members = vec![first];
        for second in first + 1..files.len() {
            if consumed[second] {
                continue;
            }
            let (len_a, len_b) = (key_lengths[first], key_lengths[second]);
            if len_a.abs_diff(len_b) > len_a.min(len_b) {
                continue;
            }
            if similarity_ratio(&keys[first], &keys[second]) >= threshold {
                members.push(second);
                consumed[second] = true;
            }
        }
        if members.len() >= 2 {
            consumed[first] = true;
            clusters.push(Cluster::new(members.into_iter().map(|index| files[index].clone()).collect()));
        }
    }

    let remaining = files
        .iter()
        .enumerate()
        .filter(|(index, _)| !consumed[*index])
        .map(|(_, file)| file.clone())
        .collect();

    (clusters, remaining)
}
