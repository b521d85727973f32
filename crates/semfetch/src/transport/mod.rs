// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Transport abstraction: one HTTP-like request, one response.
//!
//! The fetcher only ever talks to a [`Transport`]. [`HttpTransport`] is the
//! reqwest-backed implementation; tests substitute scripted transports.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a transport needs to perform one request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Whether ambient credentials may be sent with the request.
    pub credentials: bool,
    /// Advisory per-request deadline; the fetcher enforces its own timeout.
    pub timeout_hint: Option<Duration>,
}

impl TransportRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
            credentials: true,
            timeout_hint: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response body that is read at most once, when the caller wants it.
pub struct ResponseBody {
    inner: BoxFuture<'static, Result<Vec<u8>, TransportError>>,
}

impl ResponseBody {
    /// Body backed by a future, typically a network read.
    pub fn deferred(
        read: impl std::future::Future<Output = Result<Vec<u8>, TransportError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(read),
        }
    }

    /// Body that is already in memory.
    pub fn ready(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self::deferred(async move { Ok(bytes) })
    }

    pub fn empty() -> Self {
        Self::ready(Vec::new())
    }

    pub async fn bytes(self) -> Result<Vec<u8>, TransportError> {
        self.inner.await
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.inner.await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseBody(..)")
    }
}

/// Response from a transport.
#[derive(Debug)]
pub struct TransportResponse {
    /// Final URL after any transport-followed redirects.
    pub url: String,
    /// HTTP status. `0` means the transport masked the real failure.
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Connection-level failures. HTTP error statuses are *not* errors here.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport timed out")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Performs a single request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        uri: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError>;
}
