//! Jira REST API client.
//!
//! Talks to the `/rest/api/3/search/jql` endpoint of a Jira Cloud site with
//! basic auth. All fetches are synchronous and paginated; a non-success
//! response aborts the whole run.

use colored::Colorize;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, IssueMap};
use crate::config::Config;
use crate::error::{Error, Result};

/// Jira caps search pages at 100 issues.
const MAX_RESULTS: &str = "100";

/// Key lists are batched to keep the JQL below the query-length limit.
const KEY_CHUNK_SIZE: usize = 20;

// parent.fields.fixVersions is requested explicitly so subtask payloads carry
// their parent's fix versions when Jira has them.
const KEY_SEARCH_FIELDS: &str = "summary,fixVersions,issuetype,parent,\
                                 parent.fields.summary,parent.fields.issuetype,\
                                 parent.fields.fixVersions";

const FIX_VERSION_FIELDS: &str = "key,summary,issuetype,fixVersions,parent";

/// A Jira issue as returned by the search API.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub fields: Fields,
}

/// Issue fields. Everything is optional: a parent embedded in a subtask
/// payload only carries the fields the search requested, and may omit
/// fixVersions entirely - that absence is meaningful downstream.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Fields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub issuetype: Option<IssueType>,
    #[serde(default, alias = "fixVersions")]
    pub fix_versions: Option<Vec<FixVersion>>,
    #[serde(default)]
    pub parent: Option<Box<Issue>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct IssueType {
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FixVersion {
    pub name: String,
}

#[derive(Deserialize, Debug)]
struct SearchResults {
    #[serde(alias = "isLast")]
    is_last: bool,
    #[serde(default, alias = "nextPageToken")]
    next_page_token: Option<String>,
    #[serde(default)]
    issues: Vec<Issue>,
    #[serde(default, alias = "warningMessages")]
    warning_messages: Vec<String>,
}

impl Issue {
    pub fn summary(&self) -> &str {
        self.fields.summary.as_deref().unwrap_or("Unknown")
    }

    pub fn issue_type(&self) -> &str {
        self.fields
            .issuetype
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("Unknown")
    }

    /// The explicit subtask flag on the issue type.
    pub fn has_subtask_flag(&self) -> bool {
        self.fields.issuetype.as_ref().is_some_and(|t| t.subtask)
    }

    /// Subtask by flag or by issue-type name. Some Jira configurations only
    /// expose the name.
    pub fn is_subtask(&self) -> bool {
        self.has_subtask_flag() || self.issue_type() == "Sub-task"
    }

    pub fn fix_version_names(&self) -> Vec<String> {
        self.fields
            .fix_versions
            .as_ref()
            .map(|versions| versions.iter().map(|v| v.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.fields.parent.as_deref().map(|parent| parent.key.as_str())
    }
}

/// Synchronous Jira client scoped to one site.
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    token: String,
    include_subtasks: bool,
}

impl JiraClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("https://{}.atlassian.net", config.jira_api_domain),
            email: config.jira_api_email.clone(),
            token: config.jira_api_token.clone(),
            include_subtasks: config.include_subtasks,
        }
    }

    /// Run a JQL search, following `nextPageToken` pagination until the last
    /// page. Warning messages in a response are printed and otherwise
    /// ignored.
    fn search(&self, jql: &str, fields: &str) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(format!("{}/rest/api/3/search/jql", self.base_url))
                .basic_auth(&self.email, Some(&self.token))
                .header(reqwest::header::ACCEPT, "application/json")
                .query(&[("jql", jql), ("maxResults", MAX_RESULTS), ("fields", fields)]);

            if let Some(token) = next_page_token.as_deref() {
                request = request.query(&[("nextPageToken", token)]);
            }

            let response = request.send()?;
            let status = response.status();

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(Error::JiraAuth);
            }
            if !status.is_success() {
                return Err(Error::JiraApi {
                    status: status.as_u16(),
                    body: response.text().unwrap_or_default(),
                });
            }

            let page: SearchResults = serde_json::from_slice(&response.bytes()?)?;

            for warning in &page.warning_messages {
                eprintln!("{} Jira response has warnings: {}", "!".yellow(), warning);
            }

            issues.extend(page.issues);

            if page.is_last {
                return Ok(issues);
            }
            next_page_token = page.next_page_token;
        }
    }

    /// Fetch issues by key, in batches of [`KEY_CHUNK_SIZE`]. Batches are
    /// fetched sequentially and concatenated in batch order, which keeps
    /// downstream first-occurrence aggregation deterministic.
    pub fn fetch_by_keys(&self, keys: &[String]) -> Result<Vec<Issue>> {
        let mut issues = Vec::new();

        for chunk in keys.chunks(KEY_CHUNK_SIZE) {
            let jql = format!("key IN ({})", chunk.join(","));
            issues.extend(self.search(&jql, KEY_SEARCH_FIELDS)?);
        }

        Ok(issues)
    }

    /// Fetch every issue carrying the given fix version, ordered by key.
    pub fn fetch_by_fix_version(&self, fix_version: &str) -> Result<Vec<Issue>> {
        let jql = format!("fixVersion = \"{}\" ORDER BY key ASC", fix_version);
        self.search(&jql, FIX_VERSION_FIELDS)
    }

    /// Fetch the given tickets and aggregate them into per-ticket summaries.
    ///
    /// Two passes: the first aggregates whatever the search returned; parents
    /// synthesized from subtask payloads without authoritative fix versions
    /// are then re-fetched directly and patched in place. No entry leaves
    /// here with its fetch marker still set.
    pub fn fetch_and_process_tickets(
        &self,
        ticket_numbers: &[String],
    ) -> Result<(IssueMap, Vec<Issue>)> {
        let raw_tickets = self.fetch_by_keys(ticket_numbers)?;
        let mut tickets_data = aggregate::aggregate_issues(&raw_tickets, self.include_subtasks);

        let parents_to_fetch = tickets_data.keys_needing_fetch();
        if !parents_to_fetch.is_empty() {
            for parent in self.fetch_by_keys(&parents_to_fetch)? {
                if let Some(entry) = tickets_data.get_mut(&parent.key) {
                    entry.summary = parent.summary().to_string();
                    entry.issue_type = parent.issue_type().to_string();
                    entry.fix_versions = parent.fix_version_names();
                    entry.needs_fetch = false;
                }
            }
        }

        tickets_data.clear_fetch_markers();

        Ok((tickets_data, raw_tickets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_search_results() {
        let payload = r#"{
            "isLast": false,
            "nextPageToken": "tok-2",
            "warningMessages": ["field 'foo' ignored"],
            "issues": [
                {
                    "key": "DMAP-1234",
                    "fields": {
                        "summary": "Fix login issue",
                        "issuetype": { "name": "Story", "subtask": false },
                        "fixVersions": [{ "name": "6.15" }]
                    }
                }
            ]
        }"#;

        let results: SearchResults = serde_json::from_str(payload).unwrap();

        assert!(!results.is_last);
        assert_eq!(results.next_page_token.as_deref(), Some("tok-2"));
        assert_eq!(results.warning_messages.len(), 1);
        assert_eq!(results.issues.len(), 1);
        assert_eq!(results.issues[0].key, "DMAP-1234");
        assert_eq!(results.issues[0].summary(), "Fix login issue");
        assert_eq!(results.issues[0].fix_version_names(), vec!["6.15"]);
    }

    #[test]
    fn test_deserialize_subtask_with_partial_parent() {
        // A parent embedded in a subtask payload may omit fixVersions
        let payload = r#"{
            "key": "DMAP-1234-1",
            "fields": {
                "summary": "Subtask",
                "issuetype": { "name": "Sub-task", "subtask": true },
                "parent": {
                    "key": "DMAP-1234",
                    "fields": {
                        "summary": "Parent Story",
                        "issuetype": { "name": "Story", "subtask": false }
                    }
                }
            }
        }"#;

        let issue: Issue = serde_json::from_str(payload).unwrap();

        assert!(issue.has_subtask_flag());
        assert_eq!(issue.parent_key(), Some("DMAP-1234"));

        let parent = issue.fields.parent.as_deref().unwrap();
        assert!(parent.fields.fix_versions.is_none());
        assert!(parent.fix_version_names().is_empty());
    }

    #[test]
    fn test_issue_accessor_fallbacks() {
        let issue: Issue = serde_json::from_str(r#"{ "key": "DMAP-1", "fields": {} }"#).unwrap();

        assert_eq!(issue.summary(), "Unknown");
        assert_eq!(issue.issue_type(), "Unknown");
        assert!(!issue.has_subtask_flag());
        assert!(!issue.is_subtask());
        assert!(issue.parent_key().is_none());
    }

    #[test]
    fn test_subtask_identity_by_name() {
        let payload = r#"{
            "key": "DMAP-2",
            "fields": { "issuetype": { "name": "Sub-task" } }
        }"#;
        let issue: Issue = serde_json::from_str(payload).unwrap();

        // The flag is absent but the issue-type name still marks a subtask
        assert!(!issue.has_subtask_flag());
        assert!(issue.is_subtask());
    }
}
