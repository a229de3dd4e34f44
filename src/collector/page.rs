use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Continuation marker handed back by a fetcher and threaded into the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Opaque token echoed back in the next request body.
    Token(String),
    /// Relative or absolute "next" link resolved against a base URL.
    Link(String),
    /// Absolute URL, ready to call as-is.
    Next(String),
}

impl Cursor {
    pub fn as_str(&self) -> &str {
        match self {
            Cursor::Token(value) | Cursor::Link(value) | Cursor::Next(value) => value,
        }
    }

    /// Identity used for loop detection. Tokens are assumed monotonic and
    /// are never loop-checked.
    pub fn loop_key(&self) -> Option<&str> {
        match self {
            Cursor::Token(_) => None,
            Cursor::Link(value) | Cursor::Next(value) => Some(value),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Cursor::Token(_) => "token",
            Cursor::Link(_) => "link",
            Cursor::Next(_) => "next-url",
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.as_str())
    }
}

/// One page of records plus the cursor for the following page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub continuation: Option<Cursor>,
}

impl<R> Page<R> {
    pub fn new(records: Vec<R>, continuation: Option<Cursor>) -> Self {
        Self {
            records,
            continuation,
        }
    }

    /// A page after which nothing more is available.
    pub fn last(records: Vec<R>) -> Self {
        Self::new(records, None)
    }
}

/// Issues one request per page.
///
/// Implementations are stateless between calls; the caller owns the cursor.
/// Transport failures surface as `AppError::Transport`, non-success statuses
/// as `AppError::Api`.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Record: Send;

    async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<Self::Record>>;
}

/// Moves the array under `field` out of an envelope and decodes it.
/// A missing or null field is an empty page.
pub(crate) fn take_records<R: DeserializeOwned>(
    envelope: &mut Value,
    field: &str,
) -> AppResult<Vec<R>> {
    match envelope.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(records) => Ok(serde_json::from_value(records)?),
    }
}

/// Non-empty string found at `pointer`, if any.
pub(crate) fn string_at(envelope: &Value, pointer: &str) -> Option<String> {
    envelope
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn unexpected_cursor(style: &str, cursor: &Cursor) -> AppError {
    AppError::InvalidInput(format!("{style} pagination cannot follow cursor {cursor}"))
}
