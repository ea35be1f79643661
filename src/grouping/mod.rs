//! Filename-similarity grouping.
//!
//! Infers semantic groups from a flat list of filenames: files are bucketed by
//! exact normalized-name match, then by fuzzy string similarity, and finally by
//! shared name patterns mined from whatever is left. The result is an ordered
//! mapping from unique group names to the files that belong in them, with a
//! trailing "Miscellaneous" catch-all so every input file lands in exactly one
//! group. The pipeline is pure computation with no filesystem access; a status
//! callback lets any front-end surface progress.

mod cluster;
mod naming;
mod normalize;
mod pattern;
mod pipeline;
mod similarity;

pub use cluster::{Cluster, exact_key_clusters, fuzzy_clusters};
pub use naming::{descriptive_label, disambiguate_names, sanitize_group_name};
pub use normalize::{base_name, normalized_key};
pub use pattern::{Pattern, assign_to_patterns, mine_patterns};
pub use pipeline::{
    FileGroup, GroupingOptions, MISCELLANEOUS_GROUP, StatusEvent, group_files, group_files_with_status,
};
pub use similarity::similarity_ratio;
