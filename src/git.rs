//! Commit collection.
//!
//! Commits are listed by shelling out to the `git` binary with a custom
//! pretty-format and parsed back into [`Commit`] records. The repository path
//! is opened through libgit2 first so a bad path fails with a clear error
//! instead of a git-log usage message.

use std::collections::HashSet;
use std::process::Command;

use git2::Repository;

use crate::error::{Error, Result};
use crate::extract::TicketExtractor;

/// Field separator for the git-log pretty format. Unlikely to appear in
/// commit metadata, which is all that matters for parsing.
const SEPARATOR: &str = "|||";

/// A single commit as taken from git log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    /// Full commit message, subject and body.
    pub message: String,
    pub first_line: String,
    /// Short label of the repository the commit came from.
    pub repository: String,
}

/// Everything the audit needs from the scanned repositories.
#[derive(Debug)]
pub struct RepositoryScan {
    /// Unique ticket keys, in order of first appearance.
    pub ticket_numbers: Vec<String>,
    /// All feature commits across every repository.
    pub commits: Vec<Commit>,
    /// Feature commits with no extractable ticket reference.
    pub without_tickets: Vec<Commit>,
}

/// Run `git log` for the commit range `from...to` and return its raw output.
pub fn fetch_commits(repo_path: &str, from: &str, to: &str) -> Result<String> {
    Repository::open(repo_path).map_err(|_| Error::NotAGitRepo(repo_path.to_string()))?;

    // %H = commit hash, %an = author name, %B = raw body
    let output = Command::new("git")
        .args([
            "log",
            &format!("--pretty=format:%H{}%an{}%B", SEPARATOR, SEPARATOR),
            "--no-merges",
            &format!("{}...{}", from, to),
        ])
        .current_dir(repo_path)
        .output()?;

    if !output.status.success() {
        return Err(Error::GitLog {
            repo: repo_path.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse raw git-log output into commits.
///
/// A record starts on a line containing the separator; any following lines
/// without one belong to the message body. Records with an empty hash or an
/// empty message are skipped, and malformed or blank input yields an empty
/// list rather than an error.
pub fn parse_commits(raw: &str, repository: &str) -> Vec<Commit> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = raw.split('\n').collect();
    let mut commits = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].contains(SEPARATOR) {
            let mut parts = lines[i].splitn(3, SEPARATOR);
            let hash = parts.next().unwrap_or("").trim();
            let author = parts.next().unwrap_or("").trim();
            let head = parts.next().unwrap_or("");

            let mut message_lines = vec![head.to_string()];
            while i + 1 < lines.len() && !lines[i + 1].contains(SEPARATOR) {
                i += 1;
                message_lines.push(lines[i].to_string());
            }

            let message = message_lines.join("\n").trim().to_string();
            let first_line = message_lines[0].trim().to_string();

            if !hash.is_empty() && !message.is_empty() {
                commits.push(Commit {
                    hash: hash.to_string(),
                    author: author.to_string(),
                    message,
                    first_line,
                    repository: repository.to_string(),
                });
            }
        }
        i += 1;
    }

    commits
}

/// Drop housekeeping commits, keeping only those eligible for ticket
/// extraction. Order is preserved.
pub fn filter_feature_commits(commits: Vec<Commit>) -> Vec<Commit> {
    commits
        .into_iter()
        .filter(|commit| {
            !commit.first_line.starts_with("Merged ")
                && !commit.first_line.starts_with("Merge branch ")
                && !commit.first_line.starts_with("Revert ")
                && !commit.message.is_empty()
        })
        .collect()
}

/// Short display label for a repository path: its last path segment, or the
/// full path when there is none.
pub fn repository_label(path: &str) -> &str {
    path.split('/')
        .next_back()
        .filter(|label| !label.is_empty())
        .unwrap_or(path)
}

/// Pick the selector for repository `index`: positional when one value was
/// given per repository, shared otherwise.
pub fn select_value(values: &[String], index: usize) -> &str {
    if values.len() > 1 {
        &values[index]
    } else {
        &values[0]
    }
}

/// Collect commits from every repository, filter them down to feature
/// commits and extract the referenced ticket keys.
///
/// Repositories are scanned in configuration order and their commits
/// concatenated. Ticket keys are deduplicated across the whole set, keeping
/// the order of first appearance.
pub fn scan_repositories(
    repositories: &[String],
    from_values: &[String],
    to_values: &[String],
    extractor: &TicketExtractor,
) -> Result<RepositoryScan> {
    let mut all_commits = Vec::new();

    for (index, repo_path) in repositories.iter().enumerate() {
        let from = select_value(from_values, index);
        let to = select_value(to_values, index);

        let raw = fetch_commits(repo_path, from, to)?;
        all_commits.extend(parse_commits(&raw, repository_label(repo_path)));
    }

    Ok(collect_tickets(all_commits, extractor))
}

fn collect_tickets(all_commits: Vec<Commit>, extractor: &TicketExtractor) -> RepositoryScan {
    let commits = filter_feature_commits(all_commits);
    let extraction = extractor.extract(&commits);

    let mut seen = HashSet::new();
    let ticket_numbers = extraction
        .ticket_numbers
        .into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect();

    RepositoryScan {
        ticket_numbers,
        commits,
        without_tickets: extraction.without_tickets,
    }
}
