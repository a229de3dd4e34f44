use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The configured calendar window ends before it starts
    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange { start: String, end: String },
    /// Network request failed before a response arrived
    #[error("Transport error: {0}")]
    Transport(String),
    /// Server answered with a non-success status
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
    /// Writing a report table failed
    #[error("Export error: {0}")]
    ExportError(String),
}

impl AppError {
    /// Returns `true` for failures that end one source's pagination early
    /// while keeping whatever was already collected.
    pub fn ends_source(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::Api { .. } | AppError::Decode(_)
        )
    }
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => AppError::Api {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => AppError::Transport(err.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for AppError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AppError::ExportError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
