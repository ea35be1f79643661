//! The full grouping pipeline from filenames to a named group mapping.

use std::collections::HashSet;

use anyhow::Result;

use crate::grouping::cluster::{exact_key_clusters, fuzzy_clusters};
use crate::grouping::naming::{descriptive_label, disambiguate_names, sanitize_group_name};
use crate::grouping::pattern::{assign_to_patterns, mine_patterns};

/// Name of the catch-all group for files matched by no cluster or pattern.
pub const MISCELLANEOUS_GROUP: &str = "Miscellaneous";

/// Tuning parameters for the grouping pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingOptions {
    /// Minimum similarity score for fuzzy matches, in (0, 1].
    pub similarity_threshold: f64,
    /// Minimum character length for mined name patterns.
    pub min_pattern_length: usize,
    /// Maximum number of pattern groups to create.
    pub max_groups: usize,
    /// Minimum number of files required for a group to survive.
    pub min_files_per_group: usize,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            min_pattern_length: 3,
            max_groups: 50,
            min_files_per_group: 2,
        }
    }
}

impl GroupingOptions {
    /// Check that all options are within their valid ranges.
    ///
    /// # Errors
    /// Returns an error describing the first invalid option.
    pub fn validate(&self) -> Result<()> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            anyhow::bail!(
                "Similarity threshold must be in (0, 1], got {}",
                self.similarity_threshold
            );
        }
        if self.min_pattern_length == 0 {
            anyhow::bail!("Minimum pattern length must be at least 1");
        }
        if self.max_groups == 0 {
            anyhow::bail!("Maximum group count must be at least 1");
        }
        if self.min_files_per_group < 2 {
            anyhow::bail!("Minimum files per group must be at least 2");
        }
        Ok(())
    }
}

/// Progress event emitted by the grouping pipeline.
///
/// The pipeline itself performs no output; front-ends receive these through a
/// callback and render them however they like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// Grouping started over the given number of files.
    Started { files: usize },
    /// Exact-key matching finished.
    ExactMatched { clusters: usize, remaining: usize },
    /// Fuzzy similarity matching finished.
    FuzzyMatched { clusters: usize, remaining: usize },
    /// Pattern mining and assignment finished.
    PatternsMined { groups: usize, remaining: usize },
    /// The final mapping is assembled.
    Finished { groups: usize, miscellaneous: usize },
}

/// A named group of files in the final mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub name: String,
    pub files: Vec<String>,
}

/// Group the given filenames, discarding progress events.
///
/// # Errors
/// Returns an error if the options are out of range.
pub fn group_files(files: &[String], options: &GroupingOptions) -> Result<Vec<FileGroup>> {
    group_files_with_status(files, options, &mut |_| {})
}

/// Group the given filenames into named groups.
///
/// Files are bucketed by exact normalized-key match, then by fuzzy key
/// similarity, then by mined name patterns; whatever remains lands in the
/// trailing "Miscellaneous" group. Every input filename appears in exactly one
/// group and group names are unique. The result is deterministic for a given
/// input order.
///
/// # Errors
/// Returns an error if the options are out of range.
pub fn group_files_with_status(
    files: &[String],
    options: &GroupingOptions,
    status: &mut dyn FnMut(StatusEvent),
) -> Result<Vec<FileGroup>> {
    options.validate()?;
    status(StatusEvent::Started { files: files.len() });

    let (exact, remaining) = exact_key_clusters(files);
    status(StatusEvent::ExactMatched {
        clusters: exact.len(),
        remaining: remaining.len(),
    });

    let (fuzzy, remaining) = fuzzy_clusters(&remaining, options.similarity_threshold);
    status(StatusEvent::FuzzyMatched {
        clusters: fuzzy.len(),
        remaining: remaining.len(),
    });

    let patterns = mine_patterns(&remaining, options.min_pattern_length);
    let (pattern_groups, unplaced) =
        assign_to_patterns(&remaining, &patterns, options.max_groups, options.min_files_per_group);
    status(StatusEvent::PatternsMined {
        groups: pattern_groups.len(),
        remaining: unplaced.len(),
    });

    // Assemble in production order: exact clusters, fuzzy clusters, pattern
    // groups, catch-all. The size floor applies to every cluster here; files
    // from dropped clusters fall through to Miscellaneous.
    let mut named: Vec<(String, Vec<String>)> = Vec::new();
    for cluster in exact.into_iter().chain(fuzzy) {
        if cluster.files.len() < options.min_files_per_group {
            continue;
        }
        let name = sanitize_group_name(&descriptive_label(&cluster));
        named.push((name, cluster.files));
    }
    named.extend(pattern_groups);

    let placed: HashSet<&String> = named.iter().flat_map(|(_, group_files)| group_files).collect();
    let miscellaneous: Vec<String> = files.iter().filter(|file| !placed.contains(file)).cloned().collect();
    let miscellaneous_count = miscellaneous.len();
    if !miscellaneous.is_empty() {
        named.push((MISCELLANEOUS_GROUP.to_string(), miscellaneous));
    }

    let groups: Vec<FileGroup> = disambiguate_names(named)
        .into_iter()
        .map(|(name, group_files)| FileGroup { name, files: group_files })
        .collect();

    status(StatusEvent::Finished {
        groups: groups.len(),
        miscellaneous: miscellaneous_count,
    });
    Ok(groups)
}
