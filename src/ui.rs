//! Terminal reporting.
//!
//! All audit output goes through [`Reporter`], configured with the display
//! toggles so callers never branch on them.

use colored::Colorize;

use crate::aggregate::{IssueData, IssueMap, SubtaskRef};
use crate::config::Config;
use crate::git::{self, Commit};
use crate::reconcile::{MismatchReport, Reconciliation};
use crate::version;

const RULE_WIDTH: usize = 80;

pub struct Reporter {
    log_commits: bool,
    log_authors: bool,
    log_ticket_keys: bool,
    log_summaries: bool,
    log_urls: bool,
    api_domain: String,
}

struct ColumnWidths {
    issue_type: usize,
    key: usize,
}

impl ColumnWidths {
    fn of<'a>(entries: impl Iterator<Item = (&'a str, &'a IssueData)>) -> Self {
        let mut widths = Self {
            issue_type: 0,
            key: 0,
        };
        for (key, data) in entries {
            widths.issue_type = widths.issue_type.max(data.issue_type.len());
            widths.key = widths.key.max(key.len());
        }
        widths
    }
}

impl Reporter {
    pub fn new(config: &Config) -> Self {
        Self {
            log_commits: config.log_commits,
            log_authors: config.log_authors,
            log_ticket_keys: config.log_tickets,
            log_summaries: config.log_summaries,
            log_urls: config.log_urls,
            api_domain: config.jira_api_domain.clone(),
        }
    }

    pub fn header(&self) {
        println!("\n{}", rule('='));
        println!("{}", "Jira Release Compliance Check".cyan().bold());
        println!("{}", rule('='));
    }

    pub fn version_ranges(&self, repositories: &[String], from: &[String], to: &[String]) {
        println!("{}", "Version ranges per repository:".blue());
        for (index, repo) in repositories.iter().enumerate() {
            println!(
                "  {} {}: {} -> {}",
                ">".dimmed(),
                git::repository_label(repo),
                git::select_value(from, index).green(),
                git::select_value(to, index).green(),
            );
        }
        println!("{}\n", rule('='));
    }

    pub fn summary(&self, ticket_count: usize, commit_count: usize) {
        println!(
            "{} Found {} unique ticket(s) in {} commit(s)\n",
            "+".bright_green(),
            ticket_count.to_string().blue().bold(),
            commit_count
        );
    }

    fn commit_line(&self, commit: &Commit, include_author: bool) -> String {
        let hash = commit.hash.get(..7).unwrap_or(&commit.hash);
        let author = if include_author && self.log_authors && !commit.author.is_empty() {
            format!(" ({})", commit.author).dimmed().to_string()
        } else {
            String::new()
        };

        format!(
            "  {}  {}  {}{}",
            hash.dimmed(),
            format!("[{}]", commit.repository).dimmed(),
            commit.first_line,
            author
        )
    }

    pub fn all_commits(&self, commits: &[Commit]) {
        if !self.log_commits {
            return;
        }

        println!("\n{}", "All commits:".blue());
        println!("{}", rule('-').dimmed());
        for commit in commits {
            println!("{}", self.commit_line(commit, false));
        }
        println!();
    }

    pub fn commits_without_tickets(&self, commits: &[Commit]) {
        if commits.is_empty() {
            return;
        }

        println!(
            "\n{}",
            format!(
                "! WARNING: {} commit(s) without ticket numbers",
                commits.len()
            )
            .yellow()
        );
        println!("{}", rule('-').dimmed());
        for commit in commits {
            println!("{}", self.commit_line(commit, true));
        }
        println!();
    }

    pub fn fix_version_check_header(&self, fix_version: &str) {
        println!(
            "\n{} {}",
            "Checking fixVersion compliance:".cyan().bold(),
            fix_version.green()
        );
        println!("{}", rule('-').dimmed());
    }

    pub fn fix_version_check_results(
        &self,
        fix_version: &str,
        reconciliation: &Reconciliation,
        missing_data: &IssueMap,
    ) {
        let found = reconciliation.found.len();
        let missing = reconciliation.missing.len();

        println!(
            "  {}",
            format!(
                "Total tasks with fixVersion \"{}\": {}",
                fix_version,
                found + missing
            )
            .blue()
        );
        println!("  {}", format!("+ Found in commits: {}", found).green());

        if missing == 0 {
            println!(
                "  {}\n",
                format!(
                    "+ All tasks with fixVersion \"{}\" are included in commits",
                    fix_version
                )
                .green()
            );
            return;
        }

        println!(
            "  {}\n",
            format!("x Missing from commits: {}", missing).red()
        );
        println!(
            "{}",
            format!(
                "! WARNING: {} task(s) with fixVersion \"{}\" are NOT in commits",
                missing, fix_version
            )
            .yellow()
        );
        println!("{}", rule('-').dimmed());

        let widths = ColumnWidths::of(missing_data.iter());
        for (key, data) in missing_data.iter() {
            println!("{}", self.ticket_line(key, data, &widths, None));
            self.subtask_lines(&data.subtasks);
        }
        println!();
    }

    pub fn version_mismatches(&self, report: &MismatchReport, expected_version: &str) {
        if report.is_empty() {
            return;
        }

        if report.is_error() {
            println!(
                "\n{}",
                format!(
                    "x ERROR: {} task(s) found in commits with non matching fixVersion ({} with HIGHER version):",
                    report.entries.len(),
                    report.higher_version_count
                )
                .red()
            );
        } else {
            println!(
                "\n{}",
                format!(
                    "! WARNING: {} task(s) found in commits with non matching fixVersion:",
                    report.entries.len()
                )
                .yellow()
            );
        }
        println!("{}", rule('-').dimmed());

        let widths = ColumnWidths::of(report.entries.iter().map(|(key, data)| (*key, *data)));
        for (key, data) in &report.entries {
            println!(
                "{}",
                self.ticket_line(key, data, &widths, Some(expected_version))
            );
            self.subtask_lines(&data.subtasks);
        }
        println!();
    }

    /// One aligned ticket row. With an expected version, each fix version is
    /// painted red when it orders above it.
    fn ticket_line(
        &self,
        key: &str,
        data: &IssueData,
        widths: &ColumnWidths,
        expected_version: Option<&str>,
    ) -> String {
        let versions = if data.fix_versions.is_empty() {
            "----".dimmed().to_string()
        } else {
            match expected_version {
                Some(expected) => data
                    .fix_versions
                    .iter()
                    .map(|v| {
                        if version::is_higher(v, expected) {
                            v.red().to_string()
                        } else {
                            v.green().to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                None => data.fix_versions.join(", ").green().to_string(),
            }
        };

        // Pad before coloring, the escape codes would skew the width
        let issue_type = format!(
            "{}{}",
            format!("[{}]", data.issue_type).dimmed(),
            " ".repeat(widths.issue_type.saturating_sub(data.issue_type.len()))
        );

        let mut parts = vec![versions, issue_type];
        if self.log_ticket_keys {
            parts.push(pad(key, widths.key).blue().bold().to_string());
        }
        if self.log_summaries {
            parts.push(data.summary.clone());
        }
        if self.log_urls {
            parts.push(
                format!(
                    "https://{}.atlassian.net/browse/{}",
                    self.api_domain, key
                )
                .dimmed()
                .to_string(),
            );
        }

        format!("  {}", parts.join(" "))
    }

    fn subtask_lines(&self, subtasks: &[SubtaskRef]) {
        for subtask in subtasks {
            let mut parts = vec!["->".dimmed().to_string()];
            if self.log_ticket_keys {
                parts.push(subtask.key.dimmed().to_string());
            }
            parts.push("[Subtask]".dimmed().to_string());
            if self.log_summaries {
                parts.push(subtask.summary.dimmed().to_string());
            }
            println!("    {}", parts.join(" "));
        }
    }

    pub fn complete(&self) {
        println!("\n{}", rule('='));
        println!("{}", "+ Complete".green());
        println!("{}\n", rule('='));
    }
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn pad(value: &str, width: usize) -> String {
    if value.len() >= width {
        value.to_string()
    } else {
        format!("{}{}", value, " ".repeat(width - value.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(issue_type: &str) -> IssueData {
        IssueData {
            summary: "Summary".to_string(),
            issue_type: issue_type.to_string(),
            fix_versions: vec!["6.15".to_string()],
            subtasks: Vec::new(),
            needs_fetch: false,
        }
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ABC-1", 8), "ABC-1   ");
        assert_eq!(pad("ABC-1234", 8), "ABC-1234");
        assert_eq!(pad("ABC-12345", 8), "ABC-12345");
    }

    #[test]
    fn test_column_widths() {
        let bug = data("Bug");
        let story = data("Story");
        let entries = vec![("ABC-1", &bug), ("ABC-1234", &story)];

        let widths = ColumnWidths::of(entries.into_iter());

        assert_eq!(widths.issue_type, "Story".len());
        assert_eq!(widths.key, "ABC-1234".len());
    }
}
