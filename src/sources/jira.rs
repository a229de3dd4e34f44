use crate::collector::{collect, HttpSource, TokenCursorFetcher};
use crate::constants::{JIRA_BROWSE_PATH, JIRA_COLUMNS, JIRA_FIELDS, JIRA_SEARCH_PATH, UNASSIGNED};
use crate::errors::AppResult;
use crate::export::Report;
use crate::models::{JiraIssue, SourceKind};
use crate::window::TimeWindow;
use serde_json::{Map, Value};
use tracing::info;
use url::Url;

use super::{AuditContext, SourceRun};

/// JQL bounded by the window's UTC minute range, newest first.
pub fn jql(window: &TimeWindow) -> String {
    let bounds = window.utc_minute_bounds();
    format!(
        r#"updated >= "{}" AND updated <= "{}" ORDER BY updated DESC"#,
        bounds.start_str(),
        bounds.end_str()
    )
}

fn search_body(window: &TimeWindow) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("jql".to_string(), Value::from(jql(window)));
    body.insert("fields".to_string(), Value::from(JIRA_FIELDS.to_vec()));
    body
}

pub fn issue_row(issue: &JiraIssue, site: &str) -> Vec<String> {
    let fields = &issue.fields;
    vec![
        issue.key.clone(),
        fields
            .issuetype
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default(),
        fields.summary.clone().unwrap_or_default(),
        fields
            .assignee
            .as_ref()
            .and_then(|a| a.display_name.clone())
            .unwrap_or_else(|| UNASSIGNED.to_string()),
        fields
            .status
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default(),
        fields.updated.clone().unwrap_or_default(),
        format!("{site}{JIRA_BROWSE_PATH}{}", issue.key),
    ]
}

pub(super) async fn audit(ctx: &AuditContext<'_>) -> AppResult<SourceRun> {
    let config = ctx.config;
    let site = config.atlassian_site();
    let url = Url::parse(&format!("{site}{JIRA_SEARCH_PATH}"))?;
    info!(jql = %jql(ctx.window), "Auditing Jira");

    let http = HttpSource::new(
        ctx.client.clone(),
        &config.atlassian.email,
        &config.atlassian.api_token,
    );
    let fetcher: TokenCursorFetcher<JiraIssue> = TokenCursorFetcher::new(
        http,
        url,
        search_body(ctx.window),
        config.requests.jira_page_size,
        "issues",
    );

    let collection = collect(SourceKind::Jira.display_name(), &fetcher, ctx.filter).await;
    let complete = collection.is_complete();

    let mut report = Report::new(SourceKind::Jira, JIRA_COLUMNS);
    for issue in &collection.records {
        report.push_row(issue_row(issue, &site));
    }
    Ok(SourceRun { report, complete })
}
