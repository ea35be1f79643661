//! File grouping orchestration: plan display and filesystem moves.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
#[cfg(not(test))]
use indicatif::ProgressStyle;
use indicatif::{ParallelProgressIterator, ProgressBar};
use itertools::Itertools;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use name_group::grouping::{self, FileGroup, MISCELLANEOUS_GROUP, StatusEvent};
use name_group::{print_bold, print_error, print_warning};

use crate::Args;
use crate::config::Config;

#[cfg(not(test))]
const PROGRESS_BAR_CHARS: &str = "=>-";
#[cfg(not(test))]
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.magenta/blue} {pos}/{len} {percent}%";

/// Extension categories used by the extension grouping mode.
const EXTENSION_CATEGORIES: &[(&str, &[&str])] = &[
    ("Documents", &["pdf", "doc", "docx", "odt", "rtf", "txt", "md", "tex"]),
    ("Images", &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg", "heic"]),
    ("Audio", &["mp3", "wav", "flac", "aac", "ogg", "m4a", "aif", "aiff"]),
    ("Video", &["mp4", "mkv", "wmv", "flv", "m4v", "ts", "mpg", "avi", "mov", "webm"]),
    ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
    ("Spreadsheets", &["xls", "xlsx", "csv", "ods"]),
    ("Code", &["py", "rs", "js", "ts", "c", "cpp", "h", "java", "sh", "rb", "go"]),
];

pub struct NameGroup {
    root: PathBuf,
    config: Config,
}

/// A single pending file move into a group directory.
struct MoveJob {
    source: PathBuf,
    group_dir: PathBuf,
    file_name: String,
}

impl NameGroup {
    pub fn new(args: Args) -> Result<Self> {
        let root = name_group::resolve_input_path(args.path.as_deref())?;
        if !root.is_dir() {
            anyhow::bail!("Input path is not a directory: '{}'", root.display());
        }
        let config = Config::from_args(args)?;
        if config.debug {
            eprintln!("Config: {config:#?}");
            eprintln!("Root: {}", root.display());
        }
        Ok(Self { root, config })
    }

    pub fn run(&self) -> Result<()> {
        if self.config.flatten {
            return self.flatten_subdirectories();
        }

        let files = self.collect_file_names()?;
        if files.is_empty() {
            println!("No files found in {}", name_group::path_to_string(&self.root));
            return Ok(());
        }

        let groups = if self.config.extension_mode {
            Self::extension_groups(&files)
        } else {
            self.similarity_groups(&files)?
        };

        if groups.len() == 1 && groups[0].name == MISCELLANEOUS_GROUP {
            print_warning!("No name groups found, every file goes to '{MISCELLANEOUS_GROUP}'");
        }

        self.place_groups(&groups)
    }

    /// Collect the names of all files directly inside the root directory,
    /// in directory listing order.
    fn collect_file_names(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let entries =
            fs::read_dir(&self.root).with_context(|| format!("Failed to read directory '{}'", self.root.display()))?;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(name_group::normalized_file_name(&entry.path())?);
            }
        }
        Ok(files)
    }

    /// Run the grouping pipeline, printing progress when verbose.
    fn similarity_groups(&self, files: &[String]) -> Result<Vec<FileGroup>> {
        let verbose = self.config.verbose;
        grouping::group_files_with_status(files, &self.config.options, &mut |event| {
            if !verbose {
                return;
            }
            match event {
                StatusEvent::Started { files } => println!("Grouping {files} files by name..."),
                StatusEvent::ExactMatched { clusters, remaining } => {
                    println!("Exact name matches: {clusters} groups, {remaining} files left");
                }
                StatusEvent::FuzzyMatched { clusters, remaining } => {
                    println!("Fuzzy name matches: {clusters} groups, {remaining} files left");
                }
                StatusEvent::PatternsMined { groups, remaining } => {
                    println!("Shared name patterns: {groups} groups, {remaining} files left");
                }
                StatusEvent::Finished { groups, miscellaneous } => {
                    println!("Created {groups} groups ({miscellaneous} files in {MISCELLANEOUS_GROUP})");
                }
            }
        })
    }

    /// Group files into fixed extension categories.
    fn extension_groups(files: &[String]) -> Vec<FileGroup> {
        let mut groups: Vec<FileGroup> = EXTENSION_CATEGORIES
            .iter()
            .map(|(name, _)| FileGroup {
                name: (*name).to_string(),
                files: Vec::new(),
            })
            .collect();
        let mut miscellaneous = Vec::new();

        for file in files {
            let extension = Path::new(file)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default();
            match EXTENSION_CATEGORIES
                .iter()
                .position(|(_, extensions)| extensions.contains(&extension.as_str()))
            {
                Some(index) => groups[index].files.push(file.clone()),
                None => miscellaneous.push(file.clone()),
            }
        }

        if !miscellaneous.is_empty() {
            groups.push(FileGroup {
                name: MISCELLANEOUS_GROUP.to_string(),
                files: miscellaneous,
            });
        }
        groups.retain(|group| !group.files.is_empty());
        groups
    }

    /// Show the plan, create group directories, and move the files.
    fn place_groups(&self, groups: &[FileGroup]) -> Result<()> {
        let start_time = Instant::now();
        self.print_plan(groups);

        if self.config.dryrun {
            println!("\n{}", "Dry run: no files were moved".yellow());
            return Ok(());
        }

        if !self.confirm("Create group directories and move files? (y/n): ")? {
            println!("Aborted");
            return Ok(());
        }

        // All directories are created up front in one thread; only the moves
        // themselves run in parallel.
        for group in groups {
            let group_dir = self.root.join(&group.name);
            if !group_dir.exists() {
                fs::create_dir(&group_dir)
                    .with_context(|| format!("Failed to create directory '{}'", group_dir.display()))?;
            }
        }

        let jobs: Vec<MoveJob> = groups
            .iter()
            .flat_map(|group| {
                let group_dir = self.root.join(&group.name);
                group.files.iter().map(move |file| MoveJob {
                    source: self.root.join(file),
                    group_dir: group_dir.clone(),
                    file_name: file.clone(),
                })
            })
            .collect();

        #[cfg(test)]
        let progress_bar = ProgressBar::hidden();
        #[cfg(not(test))]
        let progress_bar = {
            let pb = ProgressBar::new(jobs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(PROGRESS_BAR_TEMPLATE)
                    .expect("Failed to set progress bar template")
                    .progress_chars(PROGRESS_BAR_CHARS),
            );
            pb
        };

        let reserved: Mutex<HashSet<PathBuf>> = Mutex::new(HashSet::new());
        let results: Vec<bool> = jobs
            .par_iter()
            .progress_with(progress_bar)
            .map(|job| self.move_file(job, &reserved))
            .collect();

        let moved = results.iter().filter(|ok| **ok).count();
        let failed = results.len() - moved;

        let group_count = groups.iter().filter(|group| group.name != MISCELLANEOUS_GROUP).count();
        let miscellaneous_count = groups
            .iter()
            .find(|group| group.name == MISCELLANEOUS_GROUP)
            .map_or(0, |group| group.files.len());

        println!();
        print_bold!("Moved {moved} files into {group_count} groups");
        if miscellaneous_count > 0 {
            println!("{miscellaneous_count} files placed in '{MISCELLANEOUS_GROUP}'");
        }
        if failed > 0 {
            println!("{}", format!("{failed} files could not be moved").red());
        }
        if self.config.verbose {
            println!("Time: {}", name_group::format_duration(start_time.elapsed()));
        }

        Ok(())
    }

    /// Print the proposed grouping, largest groups first.
    fn print_plan(&self, groups: &[FileGroup]) {
        print_bold!(
            "Proposed grouping for {} ({} groups):",
            name_group::path_to_string(&self.root),
            groups.len()
        );
        for group in groups.iter().sorted_by_key(|group| std::cmp::Reverse(group.files.len())) {
            println!("\n{} ({} files)", group.name.cyan().bold(), group.files.len());
            for file in group.files.iter().take(3) {
                println!("  {file}");
            }
            if group.files.len() > 3 {
                println!("  ... and {} more", group.files.len() - 3);
            }
        }
    }

    /// Ask the user for confirmation unless auto-confirm is enabled.
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.config.auto {
            return Ok(true);
        }
        print!("{}", prompt.magenta());
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }

    /// Move a single file into its group directory.
    ///
    /// Destination collisions get an incrementing " (n)" suffix; the reserved
    /// set keeps two workers from picking the same suffix for one path.
    fn move_file(&self, job: &MoveJob, reserved: &Mutex<HashSet<PathBuf>>) -> bool {
        let destination = {
            let Ok(mut reserved) = reserved.lock() else {
                print_error!("Failed to lock destination reservations");
                return false;
            };
            let destination =
                name_group::unique_destination_path(&job.group_dir, &job.file_name, |path| {
                    path.exists() || reserved.contains(path)
                });
            reserved.insert(destination.clone());
            destination
        };

        match fs::rename(&job.source, &destination) {
            Ok(()) => {
                if self.config.verbose {
                    println!(
                        "Moved: {} -> {}",
                        job.file_name,
                        name_group::path_to_string_relative(&destination)
                    );
                }
                true
            }
            Err(error) => {
                print_error!("Failed to move {}: {error}", job.source.display());
                false
            }
        }
    }

    /// Move files from immediate subdirectories back into the root and remove
    /// directories that end up empty.
    fn flatten_subdirectories(&self) -> Result<()> {
        let mut moved = 0_usize;
        let mut failed = 0_usize;
        let mut removed_dirs = 0_usize;

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let subdir = entry.path();

            for sub_entry in fs::read_dir(&subdir)? {
                let sub_entry = sub_entry?;
                if !sub_entry.file_type()?.is_file() {
                    continue;
                }
                let file_name = name_group::path_to_filename_string(&sub_entry.path());
                if self.config.dryrun {
                    println!(
                        "Would move: {} -> {}",
                        name_group::path_to_string_relative(&sub_entry.path()),
                        file_name
                    );
                    continue;
                }
                let destination = name_group::unique_destination_path(&self.root, &file_name, |path| path.exists());
                match fs::rename(sub_entry.path(), &destination) {
                    Ok(()) => {
                        if self.config.verbose {
                            println!("Moved: {} -> {}", file_name, name_group::path_to_string_relative(&destination));
                        }
                        moved += 1;
                    }
                    Err(error) => {
                        print_error!("Failed to move {}: {error}", sub_entry.path().display());
                        failed += 1;
                    }
                }
            }

            if !self.config.dryrun && name_group::is_directory_empty(&subdir) {
                match fs::remove_dir(&subdir) {
                    Ok(()) => {
                        if self.config.verbose {
                            println!("Removed empty directory: {}", name_group::path_to_string_relative(&subdir));
                        }
                        removed_dirs += 1;
                    }
                    Err(error) => print_error!("Failed to remove {}: {error}", subdir.display()),
                }
            }
        }

        if self.config.dryrun {
            println!("\n{}", "Dry run: no files were moved".yellow());
        } else {
            print_bold!("Moved {moved} files to root, removed {removed_dirs} empty directories");
            if failed > 0 {
                println!("{}", format!("{failed} files could not be moved").red());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod namegroup_tests {
    use super::*;

    use std::fs::File;

    use name_group::grouping::GroupingOptions;
    use tempfile::{TempDir, tempdir};

    fn make_test_config(dryrun: bool) -> Config {
        Config {
            auto: true,
            debug: false,
            dryrun,
            extension_mode: false,
            flatten: false,
            options: GroupingOptions::default(),
            verbose: false,
        }
    }

    fn make_namegroup(root: &TempDir, dryrun: bool) -> NameGroup {
        NameGroup {
            root: root.path().to_path_buf(),
            config: make_test_config(dryrun),
        }
    }

    fn create_files(dir: &Path, names: &[&str]) {
        for name in names {
            File::create(dir.join(name)).expect("Failed to create file");
        }
    }

    #[test]
    fn organizes_files_into_group_directories() {
        let dir = tempdir().expect("Failed to create temp dir");
        create_files(
            dir.path(),
            &[
                "vacation_photo1.jpg",
                "vacation_photo2.jpg",
                "invoice_2023.pdf",
                "invoice_2024.pdf",
                "random.txt",
            ],
        );

        let namegroup = make_namegroup(&dir, false);
        namegroup.run().expect("run should succeed");

        assert!(dir.path().join("Vacation Photo").join("vacation_photo1.jpg").is_file());
        assert!(dir.path().join("Vacation Photo").join("vacation_photo2.jpg").is_file());
        assert!(dir.path().join("Invoice").join("invoice_2023.pdf").is_file());
        assert!(dir.path().join("Invoice").join("invoice_2024.pdf").is_file());
        assert!(dir.path().join(MISCELLANEOUS_GROUP).join("random.txt").is_file());
        assert!(!dir.path().join("random.txt").exists());
    }

    #[test]
    fn dry_run_leaves_filesystem_unchanged() {
        let dir = tempdir().expect("Failed to create temp dir");
        create_files(dir.path(), &["invoice_2023.pdf", "invoice_2024.pdf", "random.txt"]);

        let namegroup = make_namegroup(&dir, true);
        namegroup.run().expect("run should succeed");

        assert!(dir.path().join("invoice_2023.pdf").is_file());
        assert!(dir.path().join("invoice_2024.pdf").is_file());
        assert!(dir.path().join("random.txt").is_file());
        assert!(!dir.path().join("Invoice").exists());
        assert!(!dir.path().join(MISCELLANEOUS_GROUP).exists());
    }

    #[test]
    fn empty_directory_is_a_no_op() {
        let dir = tempdir().expect("Failed to create temp dir");
        let namegroup = make_namegroup(&dir, false);
        namegroup.run().expect("run should succeed");
        assert!(name_group::is_directory_empty(dir.path()));
    }

    #[test]
    fn destination_collisions_get_suffixes() {
        let dir = tempdir().expect("Failed to create temp dir");
        create_files(dir.path(), &["report_1.pdf", "report_2.pdf"]);
        // Pre-existing group directory already containing one of the names.
        fs::create_dir(dir.path().join("Report")).expect("Failed to create dir");
        File::create(dir.path().join("Report").join("report_1.pdf")).expect("Failed to create file");

        let namegroup = make_namegroup(&dir, false);
        let groups = vec![FileGroup {
            name: "Report".to_string(),
            files: vec!["report_1.pdf".to_string(), "report_2.pdf".to_string()],
        }];
        namegroup.place_groups(&groups).expect("placement should succeed");

        assert!(dir.path().join("Report").join("report_1.pdf").is_file());
        assert!(dir.path().join("Report").join("report_1 (1).pdf").is_file());
        assert!(dir.path().join("Report").join("report_2.pdf").is_file());
        assert!(!dir.path().join("report_1.pdf").exists());
        assert!(!dir.path().join("report_2.pdf").exists());
    }

    #[test]
    fn collect_file_names_skips_directories() {
        let dir = tempdir().expect("Failed to create temp dir");
        create_files(dir.path(), &["a.txt", "b.txt"]);
        fs::create_dir(dir.path().join("subdir")).expect("Failed to create dir");

        let namegroup = make_namegroup(&dir, false);
        let mut files = namegroup.collect_file_names().expect("should collect");
        files.sort();
        assert_eq!(files, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn extension_groups_categorize_known_extensions() {
        let files: Vec<String> = ["photo.JPG", "song.mp3", "notes.txt", "data.xyz"]
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let groups = NameGroup::extension_groups(&files);

        let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["Documents", "Images", "Audio", MISCELLANEOUS_GROUP]);
        assert_eq!(groups[0].files, vec!["notes.txt".to_string()]);
        assert_eq!(groups[1].files, vec!["photo.JPG".to_string()]);
        assert_eq!(groups[2].files, vec!["song.mp3".to_string()]);
        assert_eq!(groups[3].files, vec!["data.xyz".to_string()]);
    }

    #[test]
    fn flatten_moves_files_up_and_removes_empty_directories() {
        let dir = tempdir().expect("Failed to create temp dir");
        let subdir = dir.path().join("Old Group");
        fs::create_dir(&subdir).expect("Failed to create dir");
        create_files(&subdir, &["one.txt", "two.txt"]);

        let mut namegroup = make_namegroup(&dir, false);
        namegroup.config.flatten = true;
        namegroup.run().expect("run should succeed");

        assert!(dir.path().join("one.txt").is_file());
        assert!(dir.path().join("two.txt").is_file());
        assert!(!subdir.exists());
    }

    #[test]
    fn flatten_resolves_name_collisions() {
        let dir = tempdir().expect("Failed to create temp dir");
        create_files(dir.path(), &["notes.txt"]);
        let subdir = dir.path().join("Notes");
        fs::create_dir(&subdir).expect("Failed to create dir");
        create_files(&subdir, &["notes.txt"]);

        let mut namegroup = make_namegroup(&dir, false);
        namegroup.config.flatten = true;
        namegroup.run().expect("run should succeed");

        assert!(dir.path().join("notes.txt").is_file());
        assert!(dir.path().join("notes (1).txt").is_file());
        assert!(!subdir.exists());
    }

    #[test]
    fn flatten_dry_run_leaves_filesystem_unchanged() {
        let dir = tempdir().expect("Failed to create temp dir");
        let subdir = dir.path().join("Old Group");
        fs::create_dir(&subdir).expect("Failed to create dir");
        create_files(&subdir, &["one.txt"]);

        let mut namegroup = make_namegroup(&dir, true);
        namegroup.config.flatten = true;
        namegroup.run().expect("run should succeed");

        assert!(subdir.join("one.txt").is_file());
        assert!(!dir.path().join("one.txt").exists());
    }

    #[test]
    fn flatten_keeps_non_empty_directories() {
        let dir = tempdir().expect("Failed to create temp dir");
        let subdir = dir.path().join("Mixed");
        fs::create_dir(&subdir).expect("Failed to create dir");
        create_files(&subdir, &["file.txt"]);
        fs::create_dir(subdir.join("nested")).expect("Failed to create dir");

        let mut namegroup = make_namegroup(&dir, false);
        namegroup.config.flatten = true;
        namegroup.run().expect("run should succeed");

        assert!(dir.path().join("file.txt").is_file());
        // The nested directory keeps the subdirectory alive.
        assert!(subdir.exists());
    }
}
