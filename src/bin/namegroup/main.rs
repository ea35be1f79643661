mod config;
mod namegroup;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::namegroup::NameGroup;

#[derive(Parser)]
#[command(author, version, name = env!("CARGO_BIN_NAME"), about = "Group files into directories based on filename similarity")]
struct Args {
    /// Optional input directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Auto-confirm the grouping plan without asking
    #[arg(short, long)]
    auto: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Group files into extension categories instead of name similarity
    #[arg(short = 'x', long)]
    extension: bool,

    /// Move files from subdirectories back to the root and remove emptied directories
    #[arg(short, long)]
    flatten: bool,

    /// Minimum number of files required to form a group
    #[arg(short, long, name = "COUNT", default_value_t = 2)]
    group: usize,

    /// Maximum number of pattern groups to create
    #[arg(short, long, name = "MAX", default_value_t = 50)]
    max_groups: usize,

    /// Minimum character length for mined name patterns
    #[arg(short = 'n', long, name = "LENGTH", default_value_t = 3)]
    min_length: usize,

    /// Only print changes without moving files
    #[arg(short, long)]
    print: bool,

    /// Similarity threshold for fuzzy name matching, in (0,1]
    #[arg(short, long, name = "THRESHOLD", default_value_t = 0.7)]
    similarity: f64,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        name_group::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        NameGroup::new(args)?.run()
    }
}
