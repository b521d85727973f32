// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Content negotiation: the outgoing `Accept` header and the effective
//! content type of a response.

use crate::dialect::HandlerRegistry;
use crate::store::{vocab, Term};
use crate::uri;

/// Always advertised so binary resources stay fetchable.
const IMAGE_ENTRY: (&str, f32) = ("image/*", 0.9);
const CATCH_ALL_ENTRY: (&str, f32) = ("*/*", 0.1);

const OCTET_STREAM: &str = "application/octet-stream";

/// Extension → content type fallback for undeclared or opaque responses.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("ttl", "text/turtle"),
    ("n3", "text/n3"),
    ("nt", "application/n-triples"),
    ("rdf", "application/rdf+xml"),
    ("owl", "application/rdf+xml"),
    ("xml", "text/xml"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
];

fn format_quality(q: f32) -> String {
    let formatted = format!("{q:.3}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

/// Build the `Accept` header from every registration plus the fixed image
/// and catch-all entries. Each media type appears once, with its highest
/// registered weight.
pub fn accept_header(registry: &HandlerRegistry) -> String {
    let mut entries: Vec<(String, f32)> = Vec::new();
    let registered = registry
        .registrations()
        .iter()
        .map(|r| (r.media_type.as_str(), r.quality));
    for (media_type, quality) in registered.chain([IMAGE_ENTRY, CATCH_ALL_ENTRY]) {
        match entries.iter_mut().find(|(m, _)| m == media_type) {
            Some(entry) => entry.1 = entry.1.max(quality),
            None => entries.push((media_type.to_string(), quality)),
        }
    }
    entries
        .iter()
        .map(|(m, q)| format!("{m};q={}", format_quality(*q)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Media type without parameters, lower-cased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Content type suggested by the URI's file extension.
pub fn guess_content_type(uri: &str) -> Option<&'static str> {
    let ext = uri::extension(uri)?;
    EXTENSION_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
}

/// Resolve the content type a response should be interpreted as.
///
/// Priority: forced override, declared type (unless it is an opaque octet
/// stream or absent), extension guess, then generic XML for local schemes.
/// `None` means the body is accepted but not interpreted.
pub fn effective_content_type(
    forced: Option<&str>,
    declared: Option<&str>,
    uri: &str,
) -> Option<String> {
    if let Some(forced) = forced.filter(|f| !f.trim().is_empty()) {
        return Some(essence(forced));
    }
    let declared = declared.map(essence).filter(|d| !d.is_empty());
    match declared {
        Some(d) if d != OCTET_STREAM => Some(d),
        Some(d) => guess_content_type(uri).map(str::to_string).or(Some(d)),
        None => guess_content_type(uri)
            .map(str::to_string)
            .or_else(|| uri::is_local_scheme(uri).then(|| "text/xml".to_string())),
    }
}

/// True for content types recorded as images (images proper, and PDF).
pub fn is_image_like(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence.starts_with("image/") || essence == "application/pdf"
}

/// IANA media-type class for a content type, e.g.
/// `http://www.w3.org/ns/iana/media-types/text/turtle#Resource`.
pub fn media_type_class(content_type: &str) -> Term {
    Term::named(format!(
        "{}{}#Resource",
        vocab::IANA_MEDIA_TYPES,
        essence(content_type)
    ))
}
