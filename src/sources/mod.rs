//! Per-source audits and the run loop tying them to a sink.
//!
//! Each source turns the shared [`TimeWindow`] into its own query syntax,
//! runs the collection driver and maps accepted records into a [`Report`].
//! Sources run one after another; a failing source is logged and skipped.

mod bitbucket;
mod confluence;
mod jira;

pub use bitbucket::{pull_request_row, report_title, updated_query};
pub use confluence::{cql, page_row};
pub use jira::{issue_row, jql};

use crate::config::ResolvedConfig;
use crate::errors::AppResult;
use crate::export::{RecordSink, Report};
use crate::filter::DepartmentFilter;
use crate::models::SourceKind;
use crate::window::TimeWindow;
use std::time::Duration;
use tracing::{info, warn};

/// Shared inputs for one audit run.
pub struct AuditContext<'a> {
    pub config: &'a ResolvedConfig,
    pub window: &'a TimeWindow,
    pub filter: &'a DepartmentFilter,
    pub client: reqwest::Client,
}

/// Report of one source plus whether every page request succeeded.
#[derive(Debug)]
pub struct SourceRun {
    pub report: Report,
    pub complete: bool,
}

/// Per-source result recorded in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Report written; `complete` is `false` when collection ended early.
    Written { rows: usize, complete: bool },
    /// Nothing written for this source.
    Failed { error: String },
}

#[derive(Debug, Default)]
pub struct AuditSummary {
    pub outcomes: Vec<(SourceKind, SourceOutcome)>,
}

impl AuditSummary {
    pub fn total_rows(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                SourceOutcome::Written { rows, .. } => *rows,
                SourceOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

pub async fn audit_source(kind: SourceKind, ctx: &AuditContext<'_>) -> AppResult<SourceRun> {
    match kind {
        SourceKind::Jira => jira::audit(ctx).await,
        SourceKind::Confluence => confluence::audit(ctx).await,
        SourceKind::Bitbucket => bitbucket::audit(ctx).await,
    }
}

/// Builds the HTTP client with the configured per-request timeout.
pub fn build_client(config: &ResolvedConfig) -> AppResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.requests.timeout_secs))
        .build()?)
}

/// Runs every configured source in order and hands each report to `sink`.
///
/// # Errors
///
/// Only configuration problems detected before the first request are
/// returned (an invalid window, a client that cannot be built). Failures
/// inside a source are logged and recorded in the summary.
pub async fn run_audit(
    config: &ResolvedConfig,
    sink: &mut dyn RecordSink,
) -> AppResult<AuditSummary> {
    let window = config.time_window()?;
    let filter = config.department_filter();
    let ctx = AuditContext {
        config,
        window: &window,
        filter: &filter,
        client: build_client(config)?,
    };

    let mut summary = AuditSummary::default();
    for &kind in &config.sources {
        let outcome = match audit_source(kind, &ctx).await {
            Ok(run) => match sink.write(&run.report) {
                Ok(()) => SourceOutcome::Written {
                    rows: run.report.len(),
                    complete: run.complete,
                },
                Err(e) => {
                    warn!(source = kind.display_name(), error = %e, "Failed to save report");
                    SourceOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(source = kind.display_name(), error = %e, "Audit failed");
                SourceOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        summary.outcomes.push((kind, outcome));
    }

    info!(
        sources = summary.outcomes.len(),
        rows = summary.total_rows(),
        "Audit complete"
    );
    Ok(summary)
}
