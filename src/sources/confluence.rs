use crate::collector::{collect_distinct, HttpSource, LinkCursorFetcher};
use crate::constants::{
    CONFLUENCE_BASE_PATH, CONFLUENCE_COLUMNS, CONFLUENCE_SEARCH_PATH, UNKNOWN_AUTHOR,
};
use crate::errors::AppResult;
use crate::export::Report;
use crate::filter::Authored;
use crate::models::{ConfluencePage, SourceKind};
use crate::window::TimeWindow;
use tracing::info;
use url::Url;

use super::{AuditContext, SourceRun};

/// CQL comparing raw local calendar dates, newest first.
pub fn cql(window: &TimeWindow) -> String {
    let (start, end) = window.local_date_bounds();
    format!(
        r#"lastmodified >= "{start}" AND lastmodified <= "{end}" ORDER BY lastmodified DESC"#
    )
}

fn search_query(window: &TimeWindow, page_size: usize) -> Vec<(String, String)> {
    vec![
        ("cql".to_string(), cql(window)),
        ("limit".to_string(), page_size.to_string()),
        ("expand".to_string(), "history.lastUpdated".to_string()),
    ]
}

pub fn page_row(page: &ConfluencePage, site: &str) -> Vec<String> {
    let when = page
        .last_updated()
        .and_then(|v| v.when.clone())
        .unwrap_or_default();
    let webui = page.links.webui.as_deref().unwrap_or("");
    vec![
        page.id.clone(),
        page.title.clone(),
        page.kind.clone(),
        page.author_name().unwrap_or(UNKNOWN_AUTHOR).to_string(),
        when,
        format!("{site}{CONFLUENCE_BASE_PATH}{webui}"),
    ]
}

pub(super) async fn audit(ctx: &AuditContext<'_>) -> AppResult<SourceRun> {
    let config = ctx.config;
    let site = config.atlassian_site();
    let base = Url::parse(&format!("{site}{CONFLUENCE_BASE_PATH}"))?;
    let url = Url::parse(&format!("{site}{CONFLUENCE_BASE_PATH}{CONFLUENCE_SEARCH_PATH}"))?;
    info!(cql = %cql(ctx.window), "Auditing Confluence");

    let http = HttpSource::new(
        ctx.client.clone(),
        &config.atlassian.email,
        &config.atlassian.api_token,
    );
    let fetcher: LinkCursorFetcher<ConfluencePage> = LinkCursorFetcher::new(
        http,
        url,
        base,
        search_query(ctx.window, config.requests.confluence_page_size),
        "results",
        "/_links/next",
    );

    let filter = ctx.filter;
    let collection = collect_distinct(
        SourceKind::Confluence.display_name(),
        &fetcher,
        |page: &ConfluencePage| filter.matches(page.author_name(), page.author_email()),
        |page: &ConfluencePage| Some(page.id.clone()),
    )
    .await;
    let complete = collection.is_complete();

    let mut report = Report::new(SourceKind::Confluence, CONFLUENCE_COLUMNS);
    for page in &collection.records {
        report.push_row(page_row(page, &site));
    }
    Ok(SourceRun { report, complete })
}
