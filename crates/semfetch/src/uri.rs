// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! URI helpers: document identity, joining, origins.

use url::Url;

/// The document a URI lives in: absolute, normalized, fragment stripped.
///
/// Strings that do not parse as absolute URLs are only fragment-stripped.
pub fn document_uri(uri: &str) -> String {
    match Url::parse(uri.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => uri.split('#').next().unwrap_or(uri).to_string(),
    }
}

/// Resolve `reference` against `base`. Falls back to `reference` unchanged.
pub fn join(base: &str, reference: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(url) => url.to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Lower-cased scheme, or `None` when the string has no scheme.
pub fn scheme(uri: &str) -> Option<String> {
    if let Ok(url) = Url::parse(uri) {
        return Some(url.scheme().to_string());
    }
    let (head, _) = uri.split_once(':')?;
    let valid = !head.is_empty()
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| head.to_ascii_lowercase())
}

/// `scheme://host:port` for hierarchical URIs.
pub fn origin(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

pub fn same_origin(a: &str, b: &str) -> bool {
    match (origin(a), origin(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

pub fn host(uri: &str) -> Option<String> {
    Url::parse(uri).ok()?.host_str().map(str::to_string)
}

/// Lower-cased file extension of the last path segment.
pub fn extension(uri: &str) -> Option<String> {
    let path = match Url::parse(uri) {
        Ok(url) => url.path().to_string(),
        Err(_) => uri.split(['?', '#']).next().unwrap_or(uri).to_string(),
    };
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// True for schemes that serve content from the local machine.
pub fn is_local_scheme(uri: &str) -> bool {
    matches!(scheme(uri).as_deref(), Some("file") | Some("chrome"))
}
