use crate::errors::{AppError, AppResult};
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde_json::Value;
use std::fmt;
use url::Url;

/// Authenticated JSON endpoint access shared by the fetchers of one source.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    username: String,
    token: String,
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl HttpSource {
    pub fn new(client: reqwest::Client, username: &str, token: &str) -> Self {
        Self {
            client,
            username: username.to_string(),
            token: token.to_string(),
        }
    }

    pub fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.get(url))
    }

    pub fn post(&self, url: Url) -> RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .basic_auth(&self.username, Some(&self.token))
            .header(ACCEPT, "application/json")
    }

    /// Sends a single request and decodes the JSON body.
    ///
    /// No retries: a send failure is `Transport`, a non-success status is
    /// `Api` carrying the response body, an unparsable body is `Decode`.
    pub async fn send_json(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read response body: {e}")))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Body text of a failed response, or the reason it could not be read.
fn error_body<E: fmt::Display>(read: Result<String, E>) -> String {
    read.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}
