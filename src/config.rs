//! Configuration resolution.
//!
//! Values are taken from CLI flags and environment variables (merged by
//! clap), falling back to an optional YAML config file, then to built-in
//! defaults. All validation happens here, before any I/O.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Args;
use crate::error::{Error, Result};

/// The name of the package, used for config directory naming
const PKG_NAME: &str = "release-check";

pub const DEFAULT_EXCLUDE_PATTERN: &str = "(NO-TASK)";

/// Fully resolved, validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub jira_api_domain: String,
    pub jira_api_email: String,
    pub jira_api_token: String,
    pub repositories: Vec<String>,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub fix_version: String,
    pub include_subtasks: bool,
    pub log_urls: bool,
    pub log_tickets: bool,
    pub log_summaries: bool,
    pub log_commits: bool,
    pub log_authors: bool,
    pub exclude_pattern: String,
}

/// Defaults read from the YAML config file. Every field is optional; flags
/// and environment variables take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub jira_api_domain: Option<String>,
    pub jira_api_email: Option<String>,
    pub jira_api_token: Option<String>,
    pub repositories: Option<Vec<String>>,
    pub include_subtasks: Option<bool>,
    pub exclude_pattern: Option<String>,
}

impl FileConfig {
    /// Load the file at `path`. A missing file is fine and yields defaults;
    /// a file that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Default config file location: `~/.config/release-check/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(PKG_NAME)
            .join("config.yaml")
    })
}

impl Config {
    pub fn resolve(args: &Args) -> Result<Self> {
        let file = match args.config.clone().or_else(default_config_path) {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };

        let from = split_list(args.from.as_deref().unwrap_or_default());
        if from.is_empty() {
            return Err(Error::Config(
                "Please specify the starting version/tag/branch by passing \"--from\".".into(),
            ));
        }

        let to = split_list(args.to.as_deref().unwrap_or_default());
        if to.is_empty() {
            return Err(Error::Config(
                "Please specify the ending version/tag/branch by passing \"--to\".".into(),
            ));
        }

        let fix_version = match args.fix_version.as_deref() {
            Some(version) if !version.trim().is_empty() => version.trim().to_string(),
            _ => {
                return Err(Error::Config(
                    "Please specify the fixVersion to check by passing \"--fix-version\".".into(),
                ))
            }
        };

        let repositories = match args.repositories.as_deref() {
            Some(raw) => split_list(raw),
            None => file.repositories.clone().unwrap_or_default(),
        };
        if repositories.is_empty() {
            return Err(Error::Config(
                "Please specify at least one repository path via PATHS_TO_PROJECTS or --repositories.".into(),
            ));
        }

        if from.len() > 1 && from.len() != repositories.len() {
            return Err(Error::Config(format!(
                "Number of --from values ({}) must match number of repositories ({}) or be a single value.",
                from.len(),
                repositories.len()
            )));
        }
        if to.len() > 1 && to.len() != repositories.len() {
            return Err(Error::Config(format!(
                "Number of --to values ({}) must match number of repositories ({}) or be a single value.",
                to.len(),
                repositories.len()
            )));
        }

        Ok(Self {
            jira_api_domain: args
                .jira_api_domain
                .clone()
                .or(file.jira_api_domain)
                .unwrap_or_default(),
            jira_api_email: args
                .jira_api_email
                .clone()
                .or(file.jira_api_email)
                .unwrap_or_default(),
            jira_api_token: args
                .jira_api_token
                .clone()
                .or(file.jira_api_token)
                .unwrap_or_default(),
            repositories,
            from,
            to,
            fix_version,
            include_subtasks: args.include_subtasks || file.include_subtasks.unwrap_or(false),
            log_urls: args.log_urls,
            log_tickets: args.log_tickets,
            log_summaries: args.log_summaries,
            log_commits: args.log_commits,
            log_authors: args.log_authors,
            exclude_pattern: args
                .exclude_pattern
                .clone()
                .or(file.exclude_pattern)
                .unwrap_or_else(|| DEFAULT_EXCLUDE_PATTERN.to_string()),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect()
}
