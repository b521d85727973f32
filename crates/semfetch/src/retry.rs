// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Retry, proxy and offline rewriting policy.
//!
//! Pure decisions only; the fetcher performs the resulting requests.

use crate::config::FetcherConfig;
use crate::uri;

/// One failed dial, as seen by the retry policy.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// The URI the caller asked for (before proxying).
    pub target: String,
    /// Whether credentials were sent.
    pub credentials: bool,
    /// A credential-less retry already happened.
    pub retried_without_credentials: bool,
    /// This attempt already went through the proxy.
    pub proxied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Fail,
    RetryWithoutCredentials,
    /// Re-issue through the proxy at this URI.
    RetryViaProxy(String),
}

/// Where a target is first dialed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    pub uri: String,
    /// The proxy was already applied, so a proxy retry would repeat this dial.
    pub proxied: bool,
}

impl DialTarget {
    fn direct(uri: String) -> Self {
        Self {
            uri,
            proxied: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryController {
    proxy_template: Option<String>,
    context_origin: Option<String>,
    offline: bool,
    offline_mirror: Option<String>,
    local_site_map: Vec<(String, String)>,
}

/// Substitute the percent-encoded `target` into the `{uri}` slot of
/// `template`. A template without the slot gets the target appended.
pub fn proxy_uri(template: &str, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    if template.contains("{uri}") {
        template.replace("{uri}", &encoded)
    } else {
        format!("{template}{encoded}")
    }
}

impl RetryController {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            proxy_template: config.proxy_template.clone(),
            context_origin: config.context_origin.clone(),
            offline: config.offline,
            offline_mirror: config.offline_mirror.clone(),
            local_site_map: config
                .local_site_map
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
        }
    }

    /// Targets are same-origin unless a context origin says otherwise.
    pub fn is_same_origin(&self, target: &str) -> bool {
        match &self.context_origin {
            Some(origin) => uri::same_origin(origin, target),
            None => true,
        }
    }

    fn secure_context(&self) -> bool {
        self.context_origin
            .as_deref()
            .is_some_and(|o| o.starts_with("https:"))
    }

    /// Decide what to do after a connection failure or masked (status 0)
    /// response. Each retry category is used at most once.
    pub fn decide(&self, attempt: &Attempt) -> RetryDecision {
        if self.is_same_origin(&attempt.target) {
            return RetryDecision::Fail;
        }
        if attempt.credentials && !attempt.retried_without_credentials {
            return RetryDecision::RetryWithoutCredentials;
        }
        if let Some(template) = &self.proxy_template {
            if !attempt.proxied {
                return RetryDecision::RetryViaProxy(proxy_uri(template, &attempt.target));
            }
        }
        RetryDecision::Fail
    }

    /// The URI actually dialed for `target`: offline mirror, local site
    /// remap, or secure-context proxy, in that order.
    pub fn rewrite(&self, target: &str) -> DialTarget {
        if self.offline {
            if let (Some(mirror), Ok(url)) = (&self.offline_mirror, url::Url::parse(target)) {
                if let Some(host) = url.host_str() {
                    let mut rewritten =
                        format!("{}/{}{}", mirror.trim_end_matches('/'), host, url.path());
                    if let Some(query) = url.query() {
                        rewritten.push('?');
                        rewritten.push_str(query);
                    }
                    return DialTarget::direct(rewritten);
                }
            }
        }

        if let Ok(url) = url::Url::parse(target) {
            if let Some(host) = url.host_str() {
                let host = host.to_ascii_lowercase();
                if let Some((_, base)) = self.local_site_map.iter().find(|(h, _)| *h == host) {
                    let path = url.path().trim_start_matches('/');
                    let mut rewritten = format!("{}/{}", base.trim_end_matches('/'), path);
                    if let Some(query) = url.query() {
                        rewritten.push('?');
                        rewritten.push_str(query);
                    }
                    return DialTarget::direct(rewritten);
                }
            }
        }

        if self.secure_context() && uri::scheme(target).as_deref() == Some("http") {
            if let Some(template) = &self.proxy_template {
                return DialTarget {
                    uri: proxy_uri(template, target),
                    proxied: true,
                };
            }
        }

        DialTarget::direct(target.to_string())
    }
}
