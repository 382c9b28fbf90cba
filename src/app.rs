//! Audit pipeline.

use crate::aggregate;
use crate::cli::Args;
use crate::config::Config;
use crate::error::Result;
use crate::extract::TicketExtractor;
use crate::git;
use crate::jira::JiraClient;
use crate::reconcile;
use crate::ui::Reporter;

/// Run a full release audit: scan commits, fetch the referenced tickets,
/// reconcile them against the release-scoped ticket set and report.
///
/// Stages run strictly in order and the first failure aborts the run.
pub fn run(args: Args) -> Result<()> {
    let config = Config::resolve(&args)?;
    let extractor = TicketExtractor::new(&config.exclude_pattern)?;
    let jira = JiraClient::new(&config);
    let reporter = Reporter::new(&config);

    reporter.header();
    reporter.version_ranges(&config.repositories, &config.from, &config.to);

    let scan = git::scan_repositories(
        &config.repositories,
        &config.from,
        &config.to,
        &extractor,
    )?;

    reporter.summary(scan.ticket_numbers.len(), scan.commits.len());
    reporter.all_commits(&scan.commits);
    reporter.commits_without_tickets(&scan.without_tickets);

    let (tickets_data, raw_tickets) = jira.fetch_and_process_tickets(&scan.ticket_numbers)?;

    reporter.fix_version_check_header(&config.fix_version);
    let release_tasks = jira.fetch_by_fix_version(&config.fix_version)?;
    let reconciliation = reconcile::categorize(&release_tasks, &raw_tickets);

    let missing_data = aggregate::aggregate_issues(&reconciliation.missing, config.include_subtasks);
    reporter.fix_version_check_results(&config.fix_version, &reconciliation, &missing_data);

    let found_keys = reconciliation.found_keys();
    let mismatches = reconcile::version_mismatches(&tickets_data, &config.fix_version, &found_keys);
    reporter.version_mismatches(&mismatches, &config.fix_version);

    reporter.complete();

    Ok(())
}
