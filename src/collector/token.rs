use super::http::HttpSource;
use super::page::{string_at, take_records, unexpected_cursor, Cursor, Page, PageFetcher};
use crate::errors::AppResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use url::Url;

const PAGE_SIZE_KEY: &str = "maxResults";
const TOKEN_KEY: &str = "nextPageToken";

/// Search-style pagination: the request body carries a page size and the
/// previous response's continuation token.
///
/// Exhaustion is signalled only by a missing token. An empty page that still
/// carries a token is followed.
#[derive(Debug)]
pub struct TokenCursorFetcher<R> {
    http: HttpSource,
    url: Url,
    body: Map<String, Value>,
    page_size: usize,
    records_field: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> TokenCursorFetcher<R> {
    pub fn new(
        http: HttpSource,
        url: Url,
        body: Map<String, Value>,
        page_size: usize,
        records_field: &'static str,
    ) -> Self {
        Self {
            http,
            url,
            body,
            page_size,
            records_field,
            _record: PhantomData,
        }
    }

    /// Request body for one page.
    pub fn request_body(&self, token: Option<&str>) -> Value {
        let mut body = self.body.clone();
        body.insert(PAGE_SIZE_KEY.to_string(), Value::from(self.page_size));
        if let Some(token) = token {
            body.insert(TOKEN_KEY.to_string(), Value::from(token));
        }
        Value::Object(body)
    }
}

/// Splits a token-paginated envelope into records and the next token.
pub fn parse_token_page<R: DeserializeOwned>(
    mut envelope: Value,
    records_field: &str,
) -> AppResult<Page<R>> {
    let records = take_records(&mut envelope, records_field)?;
    let continuation = string_at(&envelope, &format!("/{TOKEN_KEY}")).map(Cursor::Token);
    Ok(Page::new(records, continuation))
}

#[async_trait]
impl<R> PageFetcher for TokenCursorFetcher<R>
where
    R: DeserializeOwned + Send,
{
    type Record = R;

    async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<R>> {
        let token = match cursor {
            None => None,
            Some(Cursor::Token(token)) => Some(token.as_str()),
            Some(other) => return Err(unexpected_cursor("token", other)),
        };
        let request = self
            .http
            .post(self.url.clone())
            .json(&self.request_body(token));
        let envelope = self.http.send_json(request).await?;
        parse_token_page(envelope, self.records_field)
    }
}
