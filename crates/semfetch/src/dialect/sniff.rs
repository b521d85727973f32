// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dialect sniffing: the declared content type is a hint, not ground truth.

use super::{xml, DialectTag, ParseError};
use crate::store::vocab;
use regex::Regex;
use std::sync::OnceLock;

/// How much of a text body is inspected for XML markers.
const TEXT_SNIFF_CHARS: usize = 500;

fn xml_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*<\?xml[^?]*\?>").expect("xml declaration regex is valid"))
}

fn xhtml_doctype() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<!DOCTYPE\s+html\s+PUBLIC\s+"-//W3C//DTD XHTML"#)
            .expect("doctype regex is valid")
    })
}

fn xhtml_default_ns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<html[^>]*\sxmlns\s*=\s*["']http://www\.w3\.org/1999/xhtml["']"#)
            .expect("xhtml namespace regex is valid")
    })
}

pub fn has_xml_declaration(body: &str) -> bool {
    xml_declaration().is_match(body)
}

pub fn has_xhtml_doctype(body: &str) -> bool {
    xhtml_doctype().is_match(body)
}

pub fn has_xhtml_namespace(body: &str) -> bool {
    xhtml_default_ns().is_match(body)
}

fn leading_chars(body: &str, n: usize) -> &str {
    match body.char_indices().nth(n) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Settle the actual dialect of `body` given the dialect its content type
/// declared. Never returns [`DialectTag::Xml`].
pub fn classify_body(declared: DialectTag, body: &str) -> Result<DialectTag, ParseError> {
    match declared {
        DialectTag::Text => {
            let head = leading_chars(body, TEXT_SNIFF_CHARS);
            if has_xml_declaration(head) || head.contains("xmlns:") {
                tracing::debug!("plain text body looks like XML; re-dispatching");
                classify_xml(body)
            } else {
                Ok(DialectTag::Text)
            }
        }
        DialectTag::Xml => classify_xml(body),
        DialectTag::Html => {
            if has_xml_declaration(body) || has_xhtml_doctype(body) || has_xhtml_namespace(body) {
                tracing::debug!("HTML body is XHTML; re-dispatching");
                Ok(DialectTag::Xhtml)
            } else {
                Ok(DialectTag::Html)
            }
        }
        settled => Ok(settled),
    }
}

fn classify_xml(body: &str) -> Result<DialectTag, ParseError> {
    let (ns, local) = xml::root_element_name(body)?;
    if ns == vocab::RDF {
        return Ok(DialectTag::RdfXml);
    }
    if has_xhtml_doctype(body) || (local == "html" && ns == vocab::XHTML) {
        return Ok(DialectTag::Xhtml);
    }
    Err(ParseError::UnsupportedXmlDialect)
}
