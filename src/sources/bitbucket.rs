use crate::collector::{collect, collect_with, HttpSource, NextUrlFetcher};
use crate::constants::{BITBUCKET_COLUMNS, PR_TITLE_MAX_CHARS, UNKNOWN_AUTHOR};
use crate::errors::{AppError, AppResult};
use crate::export::Report;
use crate::models::{PullRequest, Repository, SourceKind};
use crate::window::TimeWindow;
use tracing::{info, warn};
use url::Url;

use super::{AuditContext, SourceRun};

/// Pull request query over offset-aware local timestamps.
pub fn updated_query(window: &TimeWindow) -> String {
    let (start, end) = window.offset_timestamps();
    format!(r#"updated_on >= "{start}" AND updated_on <= "{end}""#)
}

fn pull_request_query(window: &TimeWindow, page_size: usize) -> Vec<(String, String)> {
    vec![
        ("q".to_string(), updated_query(window)),
        ("pagelen".to_string(), page_size.to_string()),
        ("state".to_string(), "ALL".to_string()),
    ]
}

/// Newlines become spaces, then the title is cut to 100 characters.
pub fn report_title(title: &str) -> String {
    title
        .replace('\n', " ")
        .chars()
        .take(PR_TITLE_MAX_CHARS)
        .collect()
}

/// `{repos_url}/{slug}/pullrequests`, the slug escaped as a single path segment.
fn pull_requests_url(repos_url: &Url, slug: &str) -> AppResult<Url> {
    let mut url = repos_url.clone();
    url.path_segments_mut()
        .map_err(|()| AppError::UrlError(format!("{repos_url} cannot be a base URL")))?
        .pop_if_empty()
        .push(slug)
        .push("pullrequests");
    Ok(url)
}

pub fn pull_request_row(repo: &Repository, pr: &PullRequest) -> Vec<String> {
    vec![
        repo.name.clone(),
        pr.author
            .as_ref()
            .and_then(|a| a.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        pr.state.clone(),
        pr.updated_on.clone(),
        report_title(&pr.title),
        pr.links
            .html
            .as_ref()
            .map(|h| h.href.clone())
            .unwrap_or_default(),
    ]
}

pub(super) async fn audit(ctx: &AuditContext<'_>) -> AppResult<SourceRun> {
    let config = ctx.config;
    let workspace = config.atlassian.workspace.trim();
    let http = HttpSource::new(
        ctx.client.clone(),
        &config.atlassian.email,
        &config.atlassian.bitbucket_api_token,
    );
    let api_base = config.bitbucket_api_base();
    let repos_url = Url::parse(&format!("{api_base}/repositories/{workspace}"))?;
    info!(workspace = workspace, "Auditing Bitbucket");

    let repo_fetcher: NextUrlFetcher<Repository> =
        NextUrlFetcher::new(http.clone(), repos_url.clone(), Vec::new(), "values", "/next");
    let repo_filter = config.repository_filter();
    let repos = collect_with("Bitbucket repositories", &repo_fetcher, |repo: &Repository| {
        repo_filter.matches(&repo.slug)
    })
    .await;
    let mut complete = repos.is_complete();

    let query = pull_request_query(ctx.window, config.requests.bitbucket_page_size);
    let mut report = Report::new(SourceKind::Bitbucket, BITBUCKET_COLUMNS);

    for repo in &repos.records {
        let pr_url = match pull_requests_url(&repos_url, &repo.slug) {
            Ok(url) => url,
            Err(e) => {
                warn!(repository = %repo.slug, error = %e, "Skipping repository with invalid URL");
                complete = false;
                continue;
            }
        };
        let mut pr_fetcher: NextUrlFetcher<PullRequest> =
            NextUrlFetcher::new(http.clone(), pr_url, query.clone(), "values", "/next");
        if !config.requests.follow_pull_request_pages {
            pr_fetcher = pr_fetcher.single_page();
        }

        let source = format!("Bitbucket {}", repo.slug);
        let prs = collect(&source, &pr_fetcher, ctx.filter).await;
        if !prs.is_complete() {
            warn!(repository = %repo.slug, "Could not access pull requests");
            complete = false;
        }
        if prs.scanned > 0 {
            info!(
                repository = %repo.slug,
                scanned = prs.scanned,
                kept = prs.records.len(),
                "Pull requests found"
            );
        }
        for pr in &prs.records {
            report.push_row(pull_request_row(repo, pr));
        }
    }

    Ok(SourceRun { report, complete })
}
