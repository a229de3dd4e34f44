use crate::config::{OutputFormat, ResolvedConfig};
use crate::constants::{ATLASSIAN_TOKEN_ENV, BITBUCKET_TOKEN_ENV};
use crate::errors::{AppError, AppResult};
use crate::export::FileSink;
use crate::models::SourceKind;
use crate::sources::{run_audit, AuditSummary, SourceOutcome};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{info, warn};

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command tree.
///
/// - `cli`: every setting from flags (tokens from the environment)
/// - `toml`: every setting from a TOML configuration file
pub fn command() -> Command {
    Command::new("activity-audit")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("cli")
                .about("Audit a date range using command-line settings")
                .after_help("Tokens are read from ATLASSIAN_API_TOKEN and BITBUCKET_API_TOKEN.\nExample:\n  activity-audit cli -w acme --email me@acme.com -s 2025-12-01 -e 2026-01-06 --source jira --dept-name Alice")
                .arg(
                    Arg::new("workspace")
                        .short('w')
                        .long("workspace")
                        .help("Workspace identifier (the <workspace> in <workspace>.atlassian.net)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email used for basic authentication")
                        .default_value("")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("start")
                        .short('s')
                        .long("start")
                        .help("First local calendar day (YYYY-MM-DD)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("end")
                        .short('e')
                        .long("end")
                        .help("Last local calendar day, inclusive (YYYY-MM-DD)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .help("Local UTC offset in hours")
                        .value_parser(clap::value_parser!(i32))
                        .allow_negative_numbers(true)
                        .default_value("9")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("source")
                        .long("source")
                        .help("Source to audit: jira, confluence or bitbucket (repeatable, default all)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("dept_email")
                        .long("dept-email")
                        .help("Department member email (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("dept_name")
                        .long("dept-name")
                        .help("Department member display name (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .help("Repository slug to include (repeatable, default all)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory receiving the report files")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help("Report format: csv or parquet")
                        .default_value("csv")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("follow_pr_pages")
                        .long("follow-pr-pages")
                        .help("Follow every page of each repository's pull request listing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("api_token")
                        .long("api-token")
                        .help("Jira / Confluence API token")
                        .env(ATLASSIAN_TOKEN_ENV)
                        .hide_env_values(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("bitbucket_token")
                        .long("bitbucket-token")
                        .help("Bitbucket scoped API token")
                        .env(BITBUCKET_TOKEN_ENV)
                        .hide_env_values(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses command-line arguments and runs the audit.
///
/// Both subcommands resolve a [`ResolvedConfig`], validate it, then run each
/// selected source in order and save one report per source.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration (including a
/// reversed date range). Request failures inside a source are logged and do
/// not fail the run.
pub async fn cli() -> AppResult<()> {
    let cmd = command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    let config = match matches.subcommand() {
        Some(("cli", sub)) => config_from_matches(sub)?,
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .ok_or_else(|| AppError::InvalidInput("config path is required".into()))?;
            ResolvedConfig::from_toml_file(config_path)?
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
            return Ok(());
        }
    };

    run_workflow(&config).await
}

/// Resolves and validates a configuration from `cli` subcommand matches.
pub fn config_from_matches(sub: &ArgMatches) -> AppResult<ResolvedConfig> {
    let required = |name: &str| -> AppResult<String> {
        sub.get_one::<String>(name)
            .cloned()
            .ok_or_else(|| AppError::InvalidInput(format!("--{name} is required")))
    };
    let many = |name: &str| -> Vec<String> {
        sub.get_many::<String>(name)
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    };

    let mut config = ResolvedConfig::new(&required("start")?, &required("end")?);
    config.atlassian.workspace = required("workspace")?;
    config.atlassian.email = sub.get_one::<String>("email").cloned().unwrap_or_default();
    config.atlassian.api_token = sub
        .get_one::<String>("api_token")
        .cloned()
        .unwrap_or_default();
    config.atlassian.bitbucket_api_token = sub
        .get_one::<String>("bitbucket_token")
        .cloned()
        .unwrap_or_default();
    if let Some(&offset) = sub.get_one::<i32>("offset") {
        config.utc_offset_hours = offset;
    }

    let sources = many("source")
        .iter()
        .map(|s| s.parse::<SourceKind>())
        .collect::<AppResult<Vec<_>>>()?;
    if !sources.is_empty() {
        config.sources = sources;
    }

    config.department.emails = many("dept_email");
    config.department.names = many("dept_name");
    config.department.repos = many("repo");

    if let Some(dir) = sub.get_one::<PathBuf>("output_dir") {
        config.output.dir = dir.clone();
    }
    if let Some(format) = sub.get_one::<String>("format") {
        config.output.format = format.parse::<OutputFormat>()?;
    }
    if sub.get_flag("follow_pr_pages") {
        config.requests.follow_pull_request_pages = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run_workflow(config: &ResolvedConfig) -> AppResult<()> {
    print_audit_info(config);

    let mut sink = FileSink::new(&config.output.dir, config.output.format);
    let summary = run_audit(config, &mut sink).await?;
    print_summary(&summary);

    Ok(())
}

fn print_audit_info(config: &ResolvedConfig) {
    let sources: Vec<&str> = config.sources.iter().map(|s| s.display_name()).collect();
    info!(
        workspace = %config.atlassian.workspace,
        start = %config.start,
        end = %config.end,
        utc_offset_hours = config.utc_offset_hours,
        sources = %sources.join(", "),
        department_filter = !config.department_filter().is_empty(),
        "Starting audit"
    );
}

fn print_summary(summary: &AuditSummary) {
    for (kind, outcome) in &summary.outcomes {
        match outcome {
            SourceOutcome::Written { rows, complete } => info!(
                source = kind.display_name(),
                rows = rows,
                complete = complete,
                "Source finished"
            ),
            SourceOutcome::Failed { error } => warn!(
                source = kind.display_name(),
                error = %error,
                "Source produced no report"
            ),
        }
    }
}
