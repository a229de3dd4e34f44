// Endpoint hosts and paths
pub const ATLASSIAN_HOST_SUFFIX: &str = "atlassian.net";
pub const JIRA_SEARCH_PATH: &str = "/rest/api/3/search/jql";
pub const JIRA_BROWSE_PATH: &str = "/browse/";
pub const CONFLUENCE_BASE_PATH: &str = "/wiki";
pub const CONFLUENCE_SEARCH_PATH: &str = "/rest/api/content/search";
pub const BITBUCKET_API_BASE: &str = "https://api.bitbucket.org/2.0";

// Requested Jira issue fields
pub const JIRA_FIELDS: &[&str] = &[
    "summary",
    "issuetype",
    "status",
    "updated",
    "assignee",
    "creator",
];

// Report columns
pub const JIRA_COLUMNS: &[&str] = &[
    "Key",
    "Type",
    "Summary",
    "Assignee",
    "Status",
    "Last Updated",
    "URL",
];
pub const CONFLUENCE_COLUMNS: &[&str] = &["ID", "Title", "Type", "Last Updated By", "Date", "URL"];
pub const BITBUCKET_COLUMNS: &[&str] = &[
    "Repository",
    "Author",
    "State",
    "Last Updated",
    "Title",
    "URL",
];

// Display fallbacks
pub const UNASSIGNED: &str = "Unassigned";
pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const PR_TITLE_MAX_CHARS: usize = 100;

// Source aliases
pub const JIRA_ALIASES: &[&str] = &["jira", "issues"];
pub const CONFLUENCE_ALIASES: &[&str] = &["confluence", "wiki", "pages"];
pub const BITBUCKET_ALIASES: &[&str] = &["bitbucket", "prs", "pull-requests"];

// Environment variables for credentials
pub const ATLASSIAN_TOKEN_ENV: &str = "ATLASSIAN_API_TOKEN";
pub const BITBUCKET_TOKEN_ENV: &str = "BITBUCKET_API_TOKEN";
