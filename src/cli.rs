use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Starting version/tag/branch; comma-separated for one value per repository
    #[clap(long)]
    pub from: Option<String>,

    /// Ending version/tag/branch; comma-separated for one value per repository
    #[clap(long)]
    pub to: Option<String>,

    /// Jira fixVersion the release is audited against
    #[clap(long)]
    pub fix_version: Option<String>,

    /// Fold subtasks into their parent tickets
    #[clap(long, default_value_t = false)]
    pub include_subtasks: bool,

    /// Show a browse URL per ticket
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub log_urls: bool,

    /// Show ticket keys
    #[clap(long, default_value_t = false)]
    pub log_tickets: bool,

    /// Show ticket summaries
    #[clap(long, default_value_t = false)]
    pub log_summaries: bool,

    /// List every feature commit in the range
    #[clap(long, default_value_t = false)]
    pub log_commits: bool,

    /// Show commit authors in commit listings
    #[clap(long, default_value_t = false)]
    pub log_authors: bool,

    /// Commits matching this pattern (case-insensitive) are ignored entirely
    #[clap(long)]
    pub exclude_pattern: Option<String>,

    /// Comma-separated repository paths to scan
    #[clap(long, env = "PATHS_TO_PROJECTS", hide_env_values = true)]
    pub repositories: Option<String>,

    /// Jira site domain, as in {domain}.atlassian.net
    #[clap(long, env = "JIRA_API_DOMAIN")]
    pub jira_api_domain: Option<String>,

    /// Jira account email
    #[clap(long, env = "JIRA_API_EMAIL")]
    pub jira_api_email: Option<String>,

    /// Jira API token
    #[clap(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub jira_api_token: Option<String>,

    /// Path to the YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,
}
