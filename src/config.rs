use crate::constants::{
    ATLASSIAN_HOST_SUFFIX, ATLASSIAN_TOKEN_ENV, BITBUCKET_API_BASE, BITBUCKET_TOKEN_ENV,
};
use crate::errors::{AppError, AppResult};
use crate::filter::{DepartmentFilter, RepositoryFilter};
use crate::models::SourceKind;
use crate::window::TimeWindow;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Tabular format written for each report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => Err(AppError::InvalidInput(format!(
                "Output format must be csv or parquet, got: {other}"
            ))),
        }
    }
}

/// Workspace and credentials. A static credential is assumed valid for the run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtlassianConfig {
    /// Workspace identifier, e.g. `acme` for `acme.atlassian.net`
    pub workspace: String,
    /// Account email used as the basic-auth user name
    pub email: String,
    /// Jira / Confluence API token
    pub api_token: String,
    /// Bitbucket scoped API token
    pub bitbucket_api_token: String,
    /// Jira / Confluence site root; defaults to `https://{workspace}.atlassian.net`
    pub site_url: Option<String>,
    /// Bitbucket REST root; defaults to `https://api.bitbucket.org/2.0`
    pub bitbucket_api_url: Option<String>,
}

impl AtlassianConfig {
    /// Fills empty tokens from `ATLASSIAN_API_TOKEN` / `BITBUCKET_API_TOKEN`.
    pub fn with_env_fallback(mut self) -> Self {
        if self.api_token.is_empty() {
            self.api_token = std::env::var(ATLASSIAN_TOKEN_ENV).unwrap_or_default();
        }
        if self.bitbucket_api_token.is_empty() {
            self.bitbucket_api_token = std::env::var(BITBUCKET_TOKEN_ENV).unwrap_or_default();
        }
        self
    }
}

/// People and repositories the audit is scoped to. Empty lists mean "everyone".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepartmentConfig {
    pub emails: Vec<String>,
    pub names: Vec<String>,
    pub repos: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving the report files
    pub dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// `maxResults` sent to the Jira search
    pub jira_page_size: usize,
    /// `limit` sent to the Confluence content search
    pub confluence_page_size: usize,
    /// `pagelen` sent to the Bitbucket pull request listing
    pub bitbucket_page_size: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Follow `next` links in per-repository pull request listings.
    /// Disabled by default: only the first page per repository is read.
    pub follow_pull_request_pages: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            jira_page_size: 100,
            confluence_page_size: 50,
            bitbucket_page_size: 50,
            timeout_secs: 60,
            follow_pull_request_pages: false,
        }
    }
}

/// Run configuration, built once at startup and passed by reference.
///
/// `start` and `end` are required; every other section falls back to its
/// defaults. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfig {
    /// First local calendar day, `YYYY-MM-DD`
    pub start: String,
    /// Last local calendar day (inclusive), `YYYY-MM-DD`
    pub end: String,
    /// Fixed local offset from UTC in hours
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Sources to audit, run in the listed order
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceKind>,
    #[serde(default)]
    pub atlassian: AtlassianConfig,
    #[serde(default)]
    pub department: DepartmentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub requests: RequestConfig,
}

impl ResolvedConfig {
    /// Configuration for a date range with every other value defaulted.
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            utc_offset_hours: default_utc_offset_hours(),
            sources: default_sources(),
            atlassian: AtlassianConfig::default(),
            department: DepartmentConfig::default(),
            output: OutputConfig::default(),
            requests: RequestConfig::default(),
        }
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// Empty tokens are filled from the environment before validation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, required fields are
    /// missing, unknown keys are present, or a value fails validation, and
    /// `InvalidRange` when `end` precedes `start`.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        config.atlassian = config.atlassian.with_env_fallback();
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML without validating values.
    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        toml::from_str(contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))
    }

    /// Checks every value the audit depends on.
    pub fn validate(&self) -> AppResult<()> {
        if self.atlassian.workspace.trim().is_empty() {
            return Err(AppError::InvalidInput("Workspace must not be empty".into()));
        }
        if self.sources.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one source must be selected".into(),
            ));
        }
        let requests = &self.requests;
        if requests.jira_page_size == 0
            || requests.confluence_page_size == 0
            || requests.bitbucket_page_size == 0
        {
            return Err(AppError::InvalidInput(
                "Page sizes must be greater than 0".into(),
            ));
        }
        if requests.timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0".into(),
            ));
        }
        self.time_window()?;
        Ok(())
    }

    pub fn time_window(&self) -> AppResult<TimeWindow> {
        TimeWindow::parse(&self.start, &self.end, self.utc_offset_hours)
    }

    pub fn department_filter(&self) -> DepartmentFilter {
        DepartmentFilter::new(
            self.department.emails.iter().cloned(),
            self.department.names.iter().cloned(),
        )
    }

    pub fn repository_filter(&self) -> RepositoryFilter {
        RepositoryFilter::new(self.department.repos.iter().cloned())
    }

    /// `https://{workspace}.atlassian.net` unless `site_url` overrides it.
    pub fn atlassian_site(&self) -> String {
        match non_blank(&self.atlassian.site_url) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.{ATLASSIAN_HOST_SUFFIX}",
                self.atlassian.workspace.trim()
            ),
        }
    }

    /// Bitbucket REST root without a trailing slash.
    pub fn bitbucket_api_base(&self) -> String {
        non_blank(&self.atlassian.bitbucket_api_url)
            .unwrap_or(BITBUCKET_API_BASE)
            .trim_end_matches('/')
            .to_string()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_sources() -> Vec<SourceKind> {
    SourceKind::ALL.to_vec()
}
