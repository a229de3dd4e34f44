use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::filter::Authored;
use serde::Deserialize;
use std::str::FromStr;

/// External system being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum SourceKind {
    Jira,
    Confluence,
    Bitbucket,
}

impl SourceKind {
    /// Every source, in the order a full audit runs them.
    pub const ALL: [SourceKind; 3] = [Self::Jira, Self::Confluence, Self::Bitbucket];

    /// Returns a human-readable name for the source.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Jira => "Jira",
            Self::Confluence => "Confluence",
            Self::Bitbucket => "Bitbucket",
        }
    }

    /// Returns the report file stem written for the source.
    pub fn report_name(&self) -> &'static str {
        match self {
            Self::Jira => "audit_jira",
            Self::Confluence => "audit_confluence",
            Self::Bitbucket => "audit_bitbucket",
        }
    }
}

impl FromStr for SourceKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        // Trim whitespace and compare case-insensitively
        let lower = value.trim().to_lowercase();

        if JIRA_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Jira)
        } else if CONFLUENCE_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Confluence)
        } else if BITBUCKET_ALIASES.contains(&lower.as_str()) {
            Ok(Self::Bitbucket)
        } else {
            Err(AppError::InvalidInput(format!(
                "Unknown source '{value}', expected jira, confluence or bitbucket"
            )))
        }
    }
}

impl TryFrom<String> for SourceKind {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        value.parse()
    }
}

/// Object carrying a `name` field (issue type, status).
#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JiraFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub issuetype: Option<Named>,
    #[serde(default)]
    pub status: Option<Named>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub assignee: Option<JiraUser>,
}

/// Issue as returned by the Jira JQL search.
#[derive(Debug, Clone, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    pub fields: JiraFields,
}

impl Authored for JiraIssue {
    fn author_name(&self) -> Option<&str> {
        self.fields.assignee.as_ref()?.display_name.as_deref()
    }

    fn author_email(&self) -> Option<&str> {
        self.fields.assignee.as_ref()?.email_address.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceUser {
    pub display_name: Option<String>,
    /// Hidden by some privacy settings.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfluenceVersion {
    #[serde(default)]
    pub by: Option<ConfluenceUser>,
    #[serde(default)]
    pub when: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfluenceHistory {
    #[serde(default)]
    pub last_updated: Option<ConfluenceVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfluenceLinks {
    #[serde(default)]
    pub webui: Option<String>,
}

/// Content item as returned by the Confluence CQL search.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfluencePage {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub history: Option<ConfluenceHistory>,
    #[serde(rename = "_links", default)]
    pub links: ConfluenceLinks,
}

impl ConfluencePage {
    pub fn last_updated(&self) -> Option<&ConfluenceVersion> {
        self.history.as_ref()?.last_updated.as_ref()
    }

    fn updated_by(&self) -> Option<&ConfluenceUser> {
        self.last_updated()?.by.as_ref()
    }
}

impl Authored for ConfluencePage {
    fn author_name(&self) -> Option<&str> {
        self.updated_by()?.display_name.as_deref()
    }

    fn author_email(&self) -> Option<&str> {
        self.updated_by()?.email.as_deref()
    }
}

/// Repository entry from the Bitbucket workspace listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitbucketUser {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Href {
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestLinks {
    #[serde(default)]
    pub html: Option<Href>,
}

/// Pull request from a repository's pull request listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub title: String,
    pub state: String,
    pub updated_on: String,
    #[serde(default)]
    pub author: Option<BitbucketUser>,
    #[serde(default)]
    pub links: PullRequestLinks,
}

impl Authored for PullRequest {
    fn author_name(&self) -> Option<&str> {
        self.author.as_ref()?.display_name.as_deref()
    }

    // Pull request objects expose no author email.
    fn author_email(&self) -> Option<&str> {
        None
    }
}
