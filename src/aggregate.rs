//! Aggregation of raw Jira issues into per-ticket summaries.
//!
//! Subtask records fold into their parent ticket. When a parent shows up
//! only inside a subtask payload it is synthesized from that payload; if the
//! payload carried no fix versions the entry is marked `needs_fetch` so the
//! caller can fetch the parent directly and patch it before the map is used.

use std::collections::HashMap;

use crate::jira::Issue;

/// A subtask attached to an aggregated parent entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskRef {
    pub key: String,
    pub summary: String,
    pub issue_type: String,
}

/// Aggregated view of one regular ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueData {
    pub summary: String,
    pub issue_type: String,
    /// Distinct fix versions, in insertion order.
    pub fix_versions: Vec<String>,
    pub subtasks: Vec<SubtaskRef>,
    /// Set when the entry was synthesized from a subtask payload that did not
    /// include the parent's fix versions. Cleared by the caller's follow-up
    /// fetch; never visible in a finalized map.
    pub needs_fetch: bool,
}

/// Map of ticket key to aggregated data, iterated in first-encounter order.
#[derive(Debug, Default)]
pub struct IssueMap {
    entries: HashMap<String, IssueData>,
    order: Vec<String>,
}

impl IssueMap {
    pub fn insert(&mut self, key: String, data: IssueData) {
        if self.entries.insert(key.clone(), data).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&IssueData> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut IssueData> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in the order their keys were first seen.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IssueData)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|data| (key.as_str(), data)))
    }

    /// Keys whose entries still await an authoritative parent fetch.
    pub fn keys_needing_fetch(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, data)| data.needs_fetch)
            .map(|(key, _)| key.to_string())
            .collect()
    }

    /// Drop any remaining fetch markers, e.g. for parents the tracker did
    /// not return in the follow-up fetch.
    pub fn clear_fetch_markers(&mut self) {
        for data in self.entries.values_mut() {
            data.needs_fetch = false;
        }
    }
}

/// Fold raw issues into an [`IssueMap`], in input order.
///
/// Regular tickets insert once; later duplicates (from overlapping queries)
/// are ignored. Subtasks are attributed to their parent, or dropped when the
/// payload names none.
pub fn aggregate_issues(issues: &[Issue], include_subtasks: bool) -> IssueMap {
    let mut map = IssueMap::default();

    for issue in issues {
        if issue.has_subtask_flag() {
            process_subtask(&mut map, issue, include_subtasks);
        } else {
            process_regular(&mut map, issue);
        }
    }

    map
}

fn process_regular(map: &mut IssueMap, issue: &Issue) {
    // First occurrence wins
    if map.contains_key(&issue.key) {
        return;
    }

    map.insert(
        issue.key.clone(),
        IssueData {
            summary: issue.summary().to_string(),
            issue_type: issue.issue_type().to_string(),
            fix_versions: issue.fix_version_names(),
            subtasks: Vec::new(),
            needs_fetch: false,
        },
    );
}

fn process_subtask(map: &mut IssueMap, issue: &Issue, include_subtasks: bool) {
    let Some(parent) = issue.fields.parent.as_deref() else {
        // No parent reference, nothing to attribute the subtask to
        return;
    };

    let subtask = SubtaskRef {
        key: issue.key.clone(),
        summary: issue.summary().to_string(),
        issue_type: issue.issue_type().to_string(),
    };

    if let Some(entry) = map.get_mut(&parent.key) {
        if include_subtasks {
            for name in parent.fix_version_names() {
                if !entry.fix_versions.contains(&name) {
                    entry.fix_versions.push(name);
                }
            }
            entry.summary = parent.summary().to_string();
            entry.issue_type = parent.issue_type().to_string();
            entry.subtasks.push(subtask);
            if parent.fields.fix_versions.is_some() {
                entry.needs_fetch = false;
            }
        }
        return;
    }

    map.insert(
        parent.key.clone(),
        IssueData {
            summary: parent.summary().to_string(),
            issue_type: parent.issue_type().to_string(),
            fix_versions: parent.fix_version_names(),
            subtasks: if include_subtasks {
                vec![subtask]
            } else {
                Vec::new()
            },
            needs_fetch: parent.fields.fix_versions.is_none(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::{Fields, FixVersion, IssueType};

    fn issue_type(name: &str, subtask: bool) -> Option<IssueType> {
        Some(IssueType {
            name: name.to_string(),
            subtask,
        })
    }

    fn fix_versions(names: &[&str]) -> Option<Vec<FixVersion>> {
        Some(
            names
                .iter()
                .map(|name| FixVersion {
                    name: name.to_string(),
                })
                .collect(),
        )
    }

    fn story(key: &str, summary: &str, versions: &[&str]) -> Issue {
        Issue {
            key: key.to_string(),
            fields: Fields {
                summary: Some(summary.to_string()),
                issuetype: issue_type("Story", false),
                fix_versions: fix_versions(versions),
                parent: None,
            },
        }
    }

    fn subtask_of(key: &str, summary: &str, parent: Issue) -> Issue {
        Issue {
            key: key.to_string(),
            fields: Fields {
                summary: Some(summary.to_string()),
                issuetype: issue_type("Subtask", true),
                fix_versions: fix_versions(&["6.15"]),
                parent: Some(Box::new(parent)),
            },
        }
    }

    /// Parent payload as embedded in a subtask record, with fix versions
    /// omitted entirely.
    fn bare_parent(key: &str, summary: &str) -> Issue {
        Issue {
            key: key.to_string(),
            fields: Fields {
                summary: Some(summary.to_string()),
                issuetype: issue_type("Story", false),
                fix_versions: None,
                parent: None,
            },
        }
    }

    #[test]
    fn test_regular_ticket() {
        let map = aggregate_issues(&[story("DMAP-1234", "Fix login issue", &["6.15"])], false);

        let data = map.get("DMAP-1234").unwrap();
        assert_eq!(data.summary, "Fix login issue");
        assert_eq!(data.issue_type, "Story");
        assert_eq!(data.fix_versions, vec!["6.15"]);
        assert!(data.subtasks.is_empty());
        assert!(!data.needs_fetch);
    }

    #[test]
    fn test_duplicate_regular_ticket_first_wins() {
        let map = aggregate_issues(
            &[
                story("DMAP-1", "First summary", &["6.15"]),
                story("DMAP-1", "Second summary", &["6.16"]),
            ],
            false,
        );

        assert_eq!(map.len(), 1);
        let data = map.get("DMAP-1").unwrap();
        assert_eq!(data.summary, "First summary");
        assert_eq!(data.fix_versions, vec!["6.15"]);
    }

    #[test]
    fn test_subtask_without_parent_is_dropped() {
        let orphan = Issue {
            key: "DMAP-9-1".to_string(),
            fields: Fields {
                summary: Some("Orphan".to_string()),
                issuetype: issue_type("Subtask", true),
                fix_versions: None,
                parent: None,
            },
        };

        let map = aggregate_issues(&[orphan], true);

        assert!(map.is_empty());
    }

    #[test]
    fn test_subtask_attaches_to_existing_parent() {
        let parent = story("DMAP-1234", "Parent Story", &["6.15"]);
        let sub = subtask_of("DMAP-1234-1", "Subtask", story("DMAP-1234", "Parent Story", &[]));

        let map = aggregate_issues(&[parent, sub], true);

        let data = map.get("DMAP-1234").unwrap();
        assert_eq!(data.subtasks.len(), 1);
        assert_eq!(data.subtasks[0].key, "DMAP-1234-1");
        assert_eq!(data.subtasks[0].summary, "Subtask");
    }

    #[test]
    fn test_subtask_ignored_when_folding_disabled() {
        let parent = story("DMAP-1234", "Parent Story", &["6.15"]);
        let sub = subtask_of("DMAP-1234-1", "Subtask", story("DMAP-1234", "Parent Story", &[]));

        let map = aggregate_issues(&[parent, sub], false);

        let data = map.get("DMAP-1234").unwrap();
        assert!(data.subtasks.is_empty());
        assert_eq!(data.summary, "Parent Story");
    }

    #[test]
    fn test_subtask_synthesizes_missing_parent() {
        let sub = subtask_of(
            "DMAP-1234-1",
            "Subtask",
            story("DMAP-1234", "Parent Story", &["6.15"]),
        );

        let map = aggregate_issues(&[sub], true);

        let data = map.get("DMAP-1234").unwrap();
        assert_eq!(data.summary, "Parent Story");
        assert_eq!(data.fix_versions, vec!["6.15"]);
        assert_eq!(data.subtasks.len(), 1);
        assert!(!data.needs_fetch);
    }

    #[test]
    fn test_synthesized_parent_without_versions_needs_fetch() {
        let sub = subtask_of("DMAP-1234-1", "Subtask", bare_parent("DMAP-1234", "Parent"));

        let map = aggregate_issues(&[sub], true);

        let data = map.get("DMAP-1234").unwrap();
        assert!(data.needs_fetch);
        assert!(data.fix_versions.is_empty());
        assert_eq!(map.keys_needing_fetch(), vec!["DMAP-1234"]);
    }

    #[test]
    fn test_marker_survives_merge_without_versions() {
        // Two subtasks of the same unfetched parent: the second merge must
        // not lose the pending-fetch marker
        let first = subtask_of("DMAP-1-1", "One", bare_parent("DMAP-1", "Parent"));
        let second = subtask_of("DMAP-1-2", "Two", bare_parent("DMAP-1", "Parent"));

        let map = aggregate_issues(&[first, second], true);

        let data = map.get("DMAP-1").unwrap();
        assert_eq!(data.subtasks.len(), 2);
        assert!(data.needs_fetch);
    }

    #[test]
    fn test_merge_with_versions_clears_marker() {
        let first = subtask_of("DMAP-1-1", "One", bare_parent("DMAP-1", "Parent"));
        let second = subtask_of("DMAP-1-2", "Two", story("DMAP-1", "Parent", &["6.15"]));

        let map = aggregate_issues(&[first, second], true);

        let data = map.get("DMAP-1").unwrap();
        assert!(!data.needs_fetch);
        assert_eq!(data.fix_versions, vec!["6.15"]);
    }

    #[test]
    fn test_fix_version_union_has_no_duplicates() {
        let first = subtask_of("DMAP-1-1", "One", story("DMAP-1", "Parent", &["6.15", "6.16"]));
        let second = subtask_of("DMAP-1-2", "Two", story("DMAP-1", "Parent", &["6.16", "6.17"]));

        let map = aggregate_issues(&[first, second], true);

        let data = map.get("DMAP-1").unwrap();
        assert_eq!(data.fix_versions, vec!["6.15", "6.16", "6.17"]);
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let map = aggregate_issues(
            &[
                story("DMAP-3", "c", &[]),
                story("DMAP-1", "a", &[]),
                story("DMAP-2", "b", &[]),
            ],
            false,
        );

        let keys: Vec<&str> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["DMAP-3", "DMAP-1", "DMAP-2"]);
    }

    #[test]
    fn test_clear_fetch_markers() {
        let sub = subtask_of("DMAP-1-1", "One", bare_parent("DMAP-1", "Parent"));
        let mut map = aggregate_issues(&[sub], true);

        assert_eq!(map.keys_needing_fetch().len(), 1);
        map.clear_fetch_markers();
        assert!(map.keys_needing_fetch().is_empty());
    }
}
