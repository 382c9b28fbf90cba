//! Reconciliation of release-scoped tickets against commit history.

use std::collections::HashSet;

use crate::aggregate::{IssueData, IssueMap};
use crate::jira::Issue;
use crate::version;

/// Partition of the release-scoped ticket set.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Release tickets evidenced by commits.
    pub found: Vec<Issue>,
    /// Release tickets with no trace in commits.
    pub missing: Vec<Issue>,
}

impl Reconciliation {
    /// Keys of the found tickets, for membership checks.
    pub fn found_keys(&self) -> HashSet<&str> {
        self.found.iter().map(|task| task.key.as_str()).collect()
    }
}

/// Split the release-scoped tasks into found and missing.
///
/// A task counts as found when its key appears in commits directly, when a
/// commit-referenced subtask points at it as parent, or when it is itself a
/// subtask whose parent key appears in commits. Work is considered delivered
/// at either the story or the subtask granularity. Epics are skipped
/// entirely and appear in neither bucket.
pub fn categorize(release_tasks: &[Issue], tickets_in_commits: &[Issue]) -> Reconciliation {
    let commit_keys: HashSet<&str> = tickets_in_commits
        .iter()
        .map(|ticket| ticket.key.as_str())
        .collect();

    let mut parents_of_commit_subtasks: HashSet<&str> = HashSet::new();
    for ticket in tickets_in_commits {
        if ticket.is_subtask() {
            if let Some(parent_key) = ticket.parent_key() {
                parents_of_commit_subtasks.insert(parent_key);
            }
        }
    }

    let mut tasks_with_parent_in_commits: HashSet<&str> = HashSet::new();
    for task in release_tasks {
        if task.is_subtask() {
            if let Some(parent_key) = task.parent_key() {
                if commit_keys.contains(parent_key) {
                    tasks_with_parent_in_commits.insert(task.key.as_str());
                }
            }
        }
    }

    let mut reconciliation = Reconciliation::default();

    for task in release_tasks {
        if task.issue_type() == "Epic" {
            continue;
        }

        let key = task.key.as_str();
        let found = commit_keys.contains(key)
            || parents_of_commit_subtasks.contains(key)
            || tasks_with_parent_in_commits.contains(key);

        if found {
            reconciliation.found.push(task.clone());
        } else {
            reconciliation.missing.push(task.clone());
        }
    }

    reconciliation
}

/// Commit-referenced tickets whose fix versions miss the expected release.
#[derive(Debug)]
pub struct MismatchReport<'a> {
    /// Aggregated entries, in first-encounter order.
    pub entries: Vec<(&'a str, &'a IssueData)>,
    /// How many entries carry a version strictly above the expected one.
    pub higher_version_count: usize,
}

impl MismatchReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A higher version on any entry escalates the report: the ticket looks
    /// scheduled for a later release than the one shipping these commits.
    pub fn is_error(&self) -> bool {
        self.higher_version_count > 0
    }
}

/// Select aggregated tickets that neither carry the expected fix version nor
/// were matched as found release tasks. The severity split is a label only;
/// every mismatching entry stays in the report.
pub fn version_mismatches<'a>(
    tickets_data: &'a IssueMap,
    expected_version: &str,
    found_keys: &HashSet<&str>,
) -> MismatchReport<'a> {
    let entries: Vec<(&str, &IssueData)> = tickets_data
        .iter()
        .filter(|(key, data)| {
            !data.fix_versions.iter().any(|v| v == expected_version) && !found_keys.contains(key)
        })
        .collect();

    let higher_version_count = entries
        .iter()
        .filter(|(_, data)| {
            data.fix_versions
                .iter()
                .any(|v| version::is_higher(v, expected_version))
        })
        .count();

    MismatchReport {
        entries,
        higher_version_count,
    }
}
