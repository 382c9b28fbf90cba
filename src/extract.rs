//! Ticket reference extraction from commit messages.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::git::Commit;

lazy_static! {
    /// Ticket key shape: 2-10 uppercase letters, hyphen, number without a
    /// leading zero (e.g. "DMAP-1234").
    static ref TICKET_PATTERN: Regex = Regex::new(r"[A-Z]{2,10}-[1-9][0-9]*").unwrap();
}

/// Result of running extraction over a set of feature commits.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Every extracted key, in encounter order, not yet deduplicated.
    pub ticket_numbers: Vec<String>,
    /// Commits that carried no valid ticket reference.
    pub without_tickets: Vec<Commit>,
}

/// Extracts ticket keys from commit messages, honoring an exclusion pattern.
///
/// A commit whose message matches the exclusion pattern anywhere is skipped
/// entirely: it contributes no keys and is not reported as ticketless either.
#[derive(Debug)]
pub struct TicketExtractor {
    exclude: Regex,
}

impl TicketExtractor {
    /// Compile the configured exclusion pattern, case-insensitively.
    pub fn new(exclude_pattern: &str) -> Result<Self> {
        let exclude = RegexBuilder::new(exclude_pattern)
            .case_insensitive(true)
            .build()?;
        Ok(Self { exclude })
    }

    /// Bucket each commit into extracted keys or the ticketless list.
    ///
    /// All matches in a message are taken, not just the first; individual
    /// matches that themselves hit the exclusion pattern are dropped.
    pub fn extract(&self, commits: &[Commit]) -> Extraction {
        let mut extraction = Extraction::default();

        for commit in commits {
            if self.exclude.is_match(&commit.message) {
                continue;
            }

            let valid: Vec<&str> = TICKET_PATTERN
                .find_iter(&commit.message)
                .map(|m| m.as_str())
                .filter(|key| !self.exclude.is_match(key))
                .collect();

            if valid.is_empty() {
                extraction.without_tickets.push(commit.clone());
            } else {
                extraction
                    .ticket_numbers
                    .extend(valid.into_iter().map(String::from));
            }
        }

        extraction
    }
}
