//! Configuration for `NameGroup`.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::fs;

use anyhow::Result;
use serde::Deserialize;

use name_group::grouping::GroupingOptions;

use crate::Args;

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct UserFileConfig {
    #[serde(default)]
    auto: bool,
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    max_groups: Option<usize>,
    #[serde(default)]
    min_files_per_group: Option<usize>,
    #[serde(default)]
    min_pattern_length: Option<usize>,
    #[serde(default)]
    similarity_threshold: Option<f64>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    namegroup: UserFileConfig,
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    pub(crate) auto: bool,
    pub(crate) debug: bool,
    pub(crate) dryrun: bool,
    pub(crate) extension_mode: bool,
    pub(crate) flatten: bool,
    pub(crate) options: GroupingOptions,
    pub(crate) verbose: bool,
}

impl UserFileConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub(crate) fn get_user_config() -> Result<Self> {
        let Some(path) = name_group::config::CONFIG_PATH.as_deref() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.namegroup)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {e}"))
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed,
    /// or if the combined grouping options are out of range.
    pub fn from_args(args: Args) -> Result<Self> {
        let user_config = UserFileConfig::get_user_config()?;

        let options = GroupingOptions {
            similarity_threshold: user_config.similarity_threshold.unwrap_or(args.similarity),
            min_pattern_length: user_config.min_pattern_length.unwrap_or(args.min_length),
            max_groups: user_config.max_groups.unwrap_or(args.max_groups),
            min_files_per_group: user_config.min_files_per_group.unwrap_or(args.group),
        };
        options.validate()?;

        Ok(Self {
            auto: args.auto || user_config.auto,
            debug: args.debug || user_config.debug,
            dryrun: args.print || user_config.dryrun,
            extension_mode: args.extension,
            flatten: args.flatten,
            options,
            verbose: args.verbose || user_config.verbose,
        })
    }
}

#[cfg(test)]
mod namegroup_config_tests {
    use super::*;

    #[test]
    fn from_toml_str_parses_empty_config() {
        let toml = "";
        let config = UserFileConfig::from_toml_str(toml).expect("should parse empty config");
        assert!(!config.auto);
        assert!(!config.debug);
        assert!(!config.dryrun);
        assert!(!config.verbose);
        assert!(config.max_groups.is_none());
        assert!(config.min_files_per_group.is_none());
        assert!(config.min_pattern_length.is_none());
        assert!(config.similarity_threshold.is_none());
    }

    #[test]
    fn from_toml_str_parses_namegroup_section() {
        let toml = r"
[namegroup]
auto = true
debug = true
dryrun = true
verbose = true
";
        let config = UserFileConfig::from_toml_str(toml).expect("should parse config");
        assert!(config.auto);
        assert!(config.debug);
        assert!(config.dryrun);
        assert!(config.verbose);
    }

    #[test]
    fn from_toml_str_parses_grouping_values() {
        let toml = r"
[namegroup]
similarity_threshold = 0.8
min_pattern_length = 4
max_groups = 20
min_files_per_group = 3
";
        let config = UserFileConfig::from_toml_str(toml).expect("should parse config");
        assert_eq!(config.similarity_threshold, Some(0.8));
        assert_eq!(config.min_pattern_length, Some(4));
        assert_eq!(config.max_groups, Some(20));
        assert_eq!(config.min_files_per_group, Some(3));
    }

    #[test]
    fn from_toml_str_invalid_toml_returns_error() {
        let toml = "this is not valid toml {{{";
        let result = UserFileConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn from_toml_str_ignores_other_sections() {
        let toml = r"
[other_section]
some_value = true

[namegroup]
verbose = true
";
        let config = UserFileConfig::from_toml_str(toml).expect("should parse config");
        assert!(config.verbose);
        assert!(!config.auto);
    }
}

#[cfg(test)]
mod config_from_args_tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn config_print_enables_dryrun() {
        let args = Args::try_parse_from(["test", "-p"]).expect("should parse");
        let config = Config::from_args(args).expect("should create config");
        assert!(config.dryrun);
    }

    #[test]
    fn config_carries_grouping_options() {
        let args = Args::try_parse_from(["test", "-s", "0.9", "-g", "3"]).expect("should parse");
        let config = Config::from_args(args).expect("should create config");
        assert!((config.options.similarity_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.options.min_files_per_group, 3);
    }

    #[test]
    fn config_rejects_invalid_threshold() {
        let args = Args::try_parse_from(["test", "-s", "1.5"]).expect("should parse");
        let result = Config::from_args(args);
        assert!(result.is_err());
    }

    #[test]
    fn config_rejects_too_small_group_size() {
        let args = Args::try_parse_from(["test", "-g", "1"]).expect("should parse");
        let result = Config::from_args(args);
        assert!(result.is_err());
    }

    #[test]
    fn config_mode_flags_pass_through() {
        let args = Args::try_parse_from(["test", "-x"]).expect("should parse");
        let config = Config::from_args(args).expect("should create config");
        assert!(config.extension_mode);
        assert!(!config.flatten);
    }
}
