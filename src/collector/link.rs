use super::http::HttpSource;
use super::page::{string_at, take_records, unexpected_cursor, Cursor, Page, PageFetcher};
use crate::errors::AppResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use url::Url;

/// Content-search pagination: the envelope embeds a "next" link which is
/// resolved against a fixed base URL.
///
/// Query parameters are sent on the first call only; the link already
/// carries them afterwards. Pagination ends on a missing link or an empty page.
#[derive(Debug)]
pub struct LinkCursorFetcher<R> {
    http: HttpSource,
    url: Url,
    base: Url,
    query: Vec<(String, String)>,
    records_field: &'static str,
    next_pointer: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> LinkCursorFetcher<R> {
    pub fn new(
        http: HttpSource,
        url: Url,
        base: Url,
        query: Vec<(String, String)>,
        records_field: &'static str,
        next_pointer: &'static str,
    ) -> Self {
        Self {
            http,
            url,
            base,
            query,
            records_field,
            next_pointer,
            _record: PhantomData,
        }
    }
}

/// Resolves a "next" link: absolute links are used as-is, relative ones are
/// appended to `base` (whose own path is kept).
pub fn resolve_link(base: &Url, next: &str) -> AppResult<Url> {
    match Url::parse(next) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = format!(
                "{}/{}",
                base.as_str().trim_end_matches('/'),
                next.trim_start_matches('/')
            );
            Ok(Url::parse(&joined)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Splits a link-paginated envelope into records and the next link.
pub fn parse_link_page<R: DeserializeOwned>(
    mut envelope: Value,
    records_field: &str,
    next_pointer: &str,
) -> AppResult<Page<R>> {
    let records: Vec<R> = take_records(&mut envelope, records_field)?;
    if records.is_empty() {
        return Ok(Page::last(records));
    }
    let continuation = string_at(&envelope, next_pointer).map(Cursor::Link);
    Ok(Page::new(records, continuation))
}

#[async_trait]
impl<R> PageFetcher for LinkCursorFetcher<R>
where
    R: DeserializeOwned + Send,
{
    type Record = R;

    async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<R>> {
        let request = match cursor {
            None => self.http.get(self.url.clone()).query(&self.query),
            Some(Cursor::Link(next)) => self.http.get(resolve_link(&self.base, next)?),
            Some(other) => return Err(unexpected_cursor("link", other)),
        };
        let envelope = self.http.send_json(request).await?;
        parse_link_page(envelope, self.records_field, self.next_pointer)
    }
}
