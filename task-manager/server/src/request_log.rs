//! Append-only record of every request the API answers, including a short summary of
//! the request body.
//!
//! The log is observational only: handlers never read it and a failing sink
//! never fails a request. Sinks are injected through [`RequestLog`] so tests and
//! deployments can pick where entries go.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A single request as seen by the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    pub request_id: Uuid,
    pub method: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
    /// HTTP status code the request was answered with.
    pub status: u16,
    /// Leading part of the request body, `None` when the body was empty.
    pub body: Option<String>,
}

/// Largest body the log buffers, the same as axum's default JSON limit.
const MAX_LOGGED_BODY_BYTES: usize = 2 * 1024 * 1024;
const BODY_SUMMARY_CHARS: usize = 200;

impl fmt::Display for RequestLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} ({})",
            self.timestamp.to_rfc3339(),
            self.method,
            self.path,
            self.status,
            self.request_id
        )?;
        if let Some(body) = &self.body {
            write!(f, " | body: {}", body)?;
        }
        Ok(())
    }
}

fn summarize_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(bytes);
    let mut summary: String = text.chars().take(BODY_SUMMARY_CHARS).collect();
    if text.chars().nth(BODY_SUMMARY_CHARS).is_some() {
        summary.push_str("...");
    }
    Some(summary)
}

/// Sink for request log entries.
#[async_trait]
pub trait RequestLog: Send + Sync {
    async fn record(&self, entry: RequestLogEntry);
}

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Default, Clone)]
pub struct TracingRequestLog;

#[async_trait]
impl RequestLog for TracingRequestLog {
    async fn record(&self, entry: RequestLogEntry) {
        tracing::info!(
            request_id = %entry.request_id,
            method = %entry.method,
            path = %entry.path,
            status = entry.status,
            timestamp = %entry.timestamp.to_rfc3339(),
            body = entry.body.as_deref(),
            "request"
        );
    }
}

/// Appends one line per entry to a text file.
#[derive(Debug)]
pub struct FileRequestLog {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl FileRequestLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn append(&self, line: String) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl RequestLog for FileRequestLog {
    async fn record(&self, entry: RequestLogEntry) {
        if let Err(err) = self.append(format!("{entry}\n")).await {
            tracing::warn!(path = %self.path.display(), "Failed to append request log: {}", err);
        }
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemoryRequestLog {
    entries: Mutex<Vec<RequestLogEntry>>,
}

impl MemoryRequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn entries(&self) -> Vec<RequestLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RequestLog for MemoryRequestLog {
    async fn record(&self, entry: RequestLogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Fans every entry out to several sinks.
pub struct CompositeRequestLog {
    sinks: Vec<Arc<dyn RequestLog>>,
}

impl CompositeRequestLog {
    pub fn new(sinks: Vec<Arc<dyn RequestLog>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl RequestLog for CompositeRequestLog {
    async fn record(&self, entry: RequestLogEntry) {
        for sink in &self.sinks {
            sink.record(entry.clone()).await;
        }
    }
}

/// Middleware that records the method, path, time, body summary and resulting status of
/// each request. The body is buffered and handed on unchanged.
pub async fn request_log_middleware(
    State(log): State<Arc<dyn RequestLog>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let timestamp = Utc::now();

    let (parts, body) = request.into_parts();
    let (body, response) = match axum::body::to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
        Ok(bytes) => {
            let summary = summarize_body(&bytes);
            let request = Request::from_parts(parts, Body::from(bytes));
            (summary, next.run(request).await)
        }
        Err(err) => {
            tracing::warn!("Failed to read request body: {}", err);
            (
                None,
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response(),
            )
        }
    };

    log.record(RequestLogEntry {
        request_id: Uuid::new_v4(),
        method,
        path,
        timestamp,
        status: response.status().as_u16(),
        body,
    })
    .await;
    response
}
