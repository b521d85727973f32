// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Caller-facing option and outcome types.
//!
//! Fetch failures are values, not errors: every operation returns a
//! [`FetchResult`] so batches compose positionally.

use crate::dialect::DialectTag;
use crate::store::Term;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Symbolic failure reasons that have no HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Scheme rejected before any dial.
    UnsupportedProtocol,
    /// An interpreter rejected the body.
    ParseError,
    Timeout,
    /// Connection-level transport failure.
    Network,
    /// Store contents could not be serialized for upload.
    SerializationError,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::UnsupportedProtocol => "unsupported_protocol",
            FailureCode::ParseError => "parse_error",
            FailureCode::Timeout => "timeout",
            FailureCode::Network => "network",
            FailureCode::SerializationError => "serialization_error",
        }
    }
}

/// Either the HTTP status the server sent (0 for a masked failure) or a
/// symbolic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FailureStatus {
    Http(u16),
    Code(FailureCode),
}

impl FailureStatus {
    pub fn http(&self) -> Option<u16> {
        match self {
            FailureStatus::Http(status) => Some(*status),
            FailureStatus::Code(_) => None,
        }
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStatus::Http(status) => write!(f, "{status}"),
            FailureStatus::Code(code) => f.write_str(code.as_str()),
        }
    }
}

impl From<FailureCode> for FailureStatus {
    fn from(code: FailureCode) -> Self {
        FailureStatus::Code(code)
    }
}

/// A failed fetch: what went wrong and the status that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{error} ({status})")]
pub struct FetchFailure {
    pub error: String,
    pub status: FailureStatus,
}

impl FetchFailure {
    pub fn new(error: impl Into<String>, status: impl Into<FailureStatus>) -> Self {
        Self {
            error: error.into(),
            status: status.into(),
        }
    }
}

impl From<u16> for FailureStatus {
    fn from(status: u16) -> Self {
        FailureStatus::Http(status)
    }
}

/// A completed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Document URI that was requested.
    pub uri: String,
    /// Document the representation came from, after HTTP redirects.
    pub final_uri: String,
    pub status: u16,
    pub status_text: String,
    /// Effective content type the body was interpreted as.
    pub content_type: Option<String>,
    /// Settled dialect, when a handler claimed the body.
    pub dialect: Option<DialectTag>,
    /// Answered from fetch state without a transport call.
    pub from_cache: bool,
    pub statements_added: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<String>,
}

impl FetchResponse {
    /// Synthetic success for a document that is already loaded.
    pub fn cached(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            final_uri: uri.clone(),
            uri,
            status: 200,
            status_text: "Already loaded".to_string(),
            from_cache: true,
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type FetchResult = Result<FetchResponse, FetchFailure>;

/// Per-call options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Bypass fetch state and send `Cache-Control: no-cache`.
    pub force: bool,
    pub with_credentials: bool,
    /// Interpret the body as this type whatever the server says.
    pub force_content_type: Option<String>,
    /// Content type of a write body, or the type asked for on a copy.
    pub content_type: Option<String>,
    /// Do not write request/response provenance.
    pub no_meta: bool,
    pub no_rdfa: bool,
    /// Drop the document's previous statements before adding new ones.
    pub clear_previous_data: bool,
    pub referring_term: Option<Term>,
    /// Base for relative references, instead of the document URI.
    pub base_uri: Option<String>,
    /// Overrides the configured deadline.
    pub timeout: Option<Duration>,
    /// Extra request headers; these win over the generated ones.
    pub headers: Vec<(String, String)>,
    /// Body of a write.
    pub body: Option<Vec<u8>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            force: false,
            with_credentials: true,
            force_content_type: None,
            content_type: None,
            no_meta: false,
            no_rdfa: false,
            clear_previous_data: false,
            referring_term: None,
            base_uri: None,
            timeout: None,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self
    }
}
