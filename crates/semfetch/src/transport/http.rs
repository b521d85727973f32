// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! reqwest-backed transport.
//!
//! Follows a bounded number of HTTP redirects itself and reports the final
//! URL. Falls back to an HTTP/1.1-only client on protocol errors (some CDNs
//! reject HTTP/2). `file://` URIs are served from the local filesystem.

use super::{Method, ResponseBody, Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// HTTP transport for the fetcher.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// HTTP/1.1-only fallback client for servers that reject HTTP/2.
    h1_client: reqwest::Client,
    /// Header sent only on requests that allow credentials.
    credential_header: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();

        let h1_client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .http1_only()
            .build()
            .unwrap_or_default();

        Self {
            client,
            h1_client,
            credential_header: None,
        }
    }

    /// Attach e.g. an `Authorization` header to credentialed requests.
    pub fn with_credential_header(mut self, name: &str, value: &str) -> Self {
        self.credential_header = Some((name.to_string(), value.to_string()));
        self
    }

    async fn send_inner(
        &self,
        client: &reqwest::Client,
        uri: &str,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = client.request(method, uri);
        if let Some(timeout) = request.timeout_hint {
            builder = builder.timeout(timeout);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.credentials {
            if let Some((name, value)) = &self.credential_header {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let r = builder.send().await.map_err(classify)?;
        let status = r.status();
        let url = r.url().to_string();
        let headers: Vec<(String, String)> = r
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        Ok(TransportResponse {
            url,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: ResponseBody::deferred(async move {
                r.bytes().await.map(|b| b.to_vec()).map_err(classify)
            }),
        })
    }

    async fn send_file(
        &self,
        uri: &str,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let path = Url::parse(uri)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| TransportError::Io(format!("not a local file path: {uri}")))?;

        let (status, status_text, body) = match request.method {
            Method::Get | Method::Head => match tokio::fs::read(&path).await {
                Ok(bytes) if request.method == Method::Get => (200, "OK", bytes),
                Ok(_) => (200, "OK", Vec::new()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    (404, "Not Found", Vec::new())
                }
                Err(e) => return Err(TransportError::Io(e.to_string())),
            },
            Method::Put => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| TransportError::Io(e.to_string()))?;
                }
                let data = request.body.clone().unwrap_or_default();
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| TransportError::Io(e.to_string()))?;
                (201, "Created", Vec::new())
            }
            Method::Delete => match tokio::fs::remove_file(&path).await {
                Ok(()) => (200, "OK", Vec::new()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    (404, "Not Found", Vec::new())
                }
                Err(e) => return Err(TransportError::Io(e.to_string())),
            },
            Method::Post => (405, "Method Not Allowed", Vec::new()),
        };

        Ok(TransportResponse {
            url: uri.to_string(),
            status,
            status_text: status_text.to_string(),
            headers: Vec::new(),
            body: ResponseBody::ready(body),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        uri: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        match crate::uri::scheme(uri).as_deref() {
            Some("file") => return self.send_file(uri, &request).await,
            Some("http") | Some("https") => {}
            other => {
                return Err(TransportError::UnsupportedScheme(
                    other.unwrap_or("none").to_string(),
                ))
            }
        }

        match self.send_inner(&self.client, uri, &request).await {
            Ok(resp) => Ok(resp),
            Err(TransportError::Protocol(msg))
                if msg.contains("http2")
                    || msg.contains("protocol")
                    || msg.contains("connection closed") =>
            {
                tracing::debug!("retrying {uri} over HTTP/1.1 after: {msg}");
                self.send_inner(&self.h1_client, uri, &request).await
            }
            Err(e) => Err(e),
        }
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Protocol(format!("{e:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new("semfetch-test", Duration::from_secs(5))
            .with_credential_header("Authorization", "Bearer x");
        assert!(transport.credential_header.is_some());
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.ttl");
        let uri = Url::from_file_path(&path).unwrap().to_string();
        let transport = HttpTransport::new("semfetch-test", Duration::from_secs(5));

        let missing = transport
            .send(&uri, TransportRequest::new(Method::Get))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);

        let put = transport
            .send(&uri, TransportRequest::new(Method::Put).body(b"<a> <b> <c> .".to_vec()))
            .await
            .unwrap();
        assert_eq!(put.status, 201);

        let got = transport
            .send(&uri, TransportRequest::new(Method::Get))
            .await
            .unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.body.text().await.unwrap(), "<a> <b> <c> .");

        let deleted = transport
            .send(&uri, TransportRequest::new(Method::Delete))
            .await
            .unwrap();
        assert_eq!(deleted.status, 200);
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_an_error() {
        let transport = HttpTransport::new("semfetch-test", Duration::from_secs(5));
        let err = transport
            .send("ftp://example.org/x", TransportRequest::new(Method::Get))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedScheme(_)));
    }
}
