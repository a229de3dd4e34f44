use super::http::HttpSource;
use super::page::{string_at, take_records, unexpected_cursor, Cursor, Page, PageFetcher};
use crate::errors::AppResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use url::Url;

/// Listing pagination where the envelope carries a fully-qualified `next` URL.
///
/// Query parameters go on the first call only. With `follow` disabled the
/// first page is the only page.
#[derive(Debug)]
pub struct NextUrlFetcher<R> {
    http: HttpSource,
    url: Url,
    query: Vec<(String, String)>,
    records_field: &'static str,
    next_pointer: &'static str,
    follow: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R> NextUrlFetcher<R> {
    pub fn new(
        http: HttpSource,
        url: Url,
        query: Vec<(String, String)>,
        records_field: &'static str,
        next_pointer: &'static str,
    ) -> Self {
        Self {
            http,
            url,
            query,
            records_field,
            next_pointer,
            follow: true,
            _record: PhantomData,
        }
    }

    /// Stops after the first page regardless of any `next` URL.
    pub fn single_page(mut self) -> Self {
        self.follow = false;
        self
    }
}

impl<R: DeserializeOwned> NextUrlFetcher<R> {
    /// Splits `envelope` into a page, dropping the continuation in
    /// single-page mode.
    pub fn parse(&self, envelope: Value) -> AppResult<Page<R>> {
        let page = parse_next_url_page(envelope, self.records_field, self.next_pointer)?;
        Ok(if self.follow {
            page
        } else {
            Page::last(page.records)
        })
    }
}

/// Splits a listing envelope into records and the absolute next URL.
pub fn parse_next_url_page<R: DeserializeOwned>(
    mut envelope: Value,
    records_field: &str,
    next_pointer: &str,
) -> AppResult<Page<R>> {
    let records = take_records(&mut envelope, records_field)?;
    let continuation = string_at(&envelope, next_pointer).map(Cursor::Next);
    Ok(Page::new(records, continuation))
}

#[async_trait]
impl<R> PageFetcher for NextUrlFetcher<R>
where
    R: DeserializeOwned + Send,
{
    type Record = R;

    async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<R>> {
        let request = match cursor {
            None => self.http.get(self.url.clone()).query(&self.query),
            Some(Cursor::Next(next)) => self.http.get(Url::parse(next)?),
            Some(other) => return Err(unexpected_cursor("next-url", other)),
        };
        let envelope = self.http.send_json(request).await?;
        self.parse(envelope)
    }
}
