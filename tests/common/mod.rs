//! Common test utilities for integration tests

use activity_audit::collector::{Cursor, Page, PageFetcher};
use activity_audit::errors::{AppError, AppResult};
use activity_audit::export::{RecordSink, Report};
use activity_audit::filter::Authored;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Minimal record carrying an author pair.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[allow(dead_code)]
pub fn person(name: &str, email: &str) -> Person {
    Person {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    }
}

impl Authored for Person {
    fn author_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn author_email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Returns scripted responses in order and records every cursor it was given.
/// Once the script runs out every call fails with a transport error.
#[allow(dead_code)]
pub struct ScriptedFetcher<R> {
    responses: Mutex<VecDeque<AppResult<Page<R>>>>,
    calls: Mutex<Vec<Option<Cursor>>>,
}

#[allow(dead_code)]
impl<R> ScriptedFetcher<R> {
    pub fn new(responses: Vec<AppResult<Page<R>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Option<Cursor>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl<R: Send> PageFetcher for ScriptedFetcher<R> {
    type Record = R;

    async fn fetch(&self, cursor: Option<&Cursor>) -> AppResult<Page<R>> {
        self.calls.lock().unwrap().push(cursor.cloned());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Transport("script exhausted".into())))
    }
}

/// Misbehaving server: every call returns the same records and the same cursor.
#[allow(dead_code)]
pub struct RepeatingFetcher<R> {
    page: Page<R>,
    calls: Mutex<usize>,
}

#[allow(dead_code)]
impl<R: Clone> RepeatingFetcher<R> {
    pub fn new(page: Page<R>) -> Self {
        Self {
            page,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> PageFetcher for RepeatingFetcher<R> {
    type Record = R;

    async fn fetch(&self, _cursor: Option<&Cursor>) -> AppResult<Page<R>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.page.clone())
    }
}

/// Keeps every report in memory.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemorySink {
    pub reports: Vec<Report>,
}

impl RecordSink for MemorySink {
    fn write(&mut self, report: &Report) -> AppResult<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Local HTTP server answering canned JSON by request target.
///
/// A route key containing `?` must equal the full request target; any other
/// key matches on the path alone. Unrouted requests get `404 {}`. `{base}` in
/// a response body is replaced with the server's own base URL.
#[allow(dead_code)]
pub struct StubServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl StubServer {
    pub async fn start(routes: Vec<(&str, u16, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind");
        let addr = listener.local_addr().expect("failed to get addr");
        let base = format!("http://{addr}");
        let routes: Arc<Vec<(String, u16, String)>> = Arc::new(
            routes
                .into_iter()
                .map(|(key, status, body)| {
                    (key.to_string(), status, body.to_string().replace("{base}", &base))
                })
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(answer(socket, Arc::clone(&routes), Arc::clone(&log)));
            }
        });

        Self { base, requests }
    }

    /// Request targets (path and query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[allow(dead_code)]
async fn answer(
    mut socket: TcpStream,
    routes: Arc<Vec<(String, u16, String)>>,
    log: Arc<Mutex<Vec<String>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    log.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or_default();
    let (status, body) = routes
        .iter()
        .find(|(key, _, _)| *key == target)
        .or_else(|| routes.iter().find(|(key, _, _)| key == path))
        .map(|(_, status, body)| (*status, body.clone()))
        .unwrap_or((404, "{}".to_string()));

    let response = format!(
        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
