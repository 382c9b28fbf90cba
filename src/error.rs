use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not a git repository: {0}")]
    NotAGitRepo(String),

    #[error("git log failed in {repo}: {stderr}")]
    GitLog { repo: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira request failed with 401 - check if credentials are valid")]
    JiraAuth,

    #[error("Jira request failed with HTTP {status}: {body}")]
    JiraApi { status: u16, body: String },

    #[error("Invalid exclude pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
