// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Format handlers: registration, dispatch, sniffing, interpretation.
//!
//! Dispatch is two flat steps rather than handlers calling each other:
//!
//! 1. [`HandlerRegistry::dispatch`] maps the effective content type to the
//!    *declared* [`DialectTag`] (first matching registration wins).
//! 2. [`sniff::classify_body`] inspects the bytes and settles the *actual*
//!    dialect (generic XML that is really RDF/XML, HTML that is really XHTML,
//!    text that is really XML, ...).
//!
//! The settled tag then indexes an [`InterpreterTable`].

pub mod html;
pub mod rdfa;
pub mod rdfxml;
pub mod sniff;
pub mod turtle;
pub mod xhtml;
pub mod xml;

pub use sniff::classify_body;

use crate::store::Triple;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const TURTLE_PATTERN: &str = r"(application|text)/(x-)?(rdf\+)?(n3|turtle)";

/// Every dialect the fetcher knows how to recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectTag {
    RdfXml,
    Xhtml,
    /// Generic XML. Only ever a declared dialect; sniffing resolves it further.
    Xml,
    Html,
    Turtle,
    NTriples,
    Text,
}

impl fmt::Display for DialectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialectTag::RdfXml => "RDF/XML",
            DialectTag::Xhtml => "XHTML",
            DialectTag::Xml => "XML",
            DialectTag::Html => "HTML",
            DialectTag::Turtle => "Turtle/N3",
            DialectTag::NTriples => "N-Triples",
            DialectTag::Text => "plain text",
        };
        f.write_str(name)
    }
}

/// Why an interpreter rejected a body.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unsupported dialect of XML")]
    UnsupportedXmlDialect,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("RDFa extraction failed: {0}")]
    Rdfa(String),
}

/// What the interpreter needs to know about the document it is reading.
#[derive(Debug, Clone)]
pub struct ParseTarget {
    /// Document URI the facts are attributed to.
    pub document: String,
    /// Base for relative references (the document unless overridden).
    pub base: String,
    /// Skip the embedded-attribute (RDFa) pass.
    pub no_rdfa: bool,
}

impl ParseTarget {
    pub fn new(document: impl Into<String>) -> Self {
        let document = document.into();
        Self {
            base: document.clone(),
            document,
            no_rdfa: false,
        }
    }
}

/// A format-specific interpreter.
///
/// Blank node labels in the returned triples are local to this parse; the
/// fetcher maps them to fresh store nodes.
pub trait Interpreter: Send + Sync {
    fn interpret(&self, target: &ParseTarget, body: &str) -> Result<Vec<Triple>, ParseError>;
}

/// One (media type, weight) contribution to negotiation and dispatch.
#[derive(Debug, Clone)]
pub struct HandlerRegistration {
    /// Media type advertised in `Accept`.
    pub media_type: String,
    /// Pattern matched against the effective content type.
    pub pattern: Regex,
    pub quality: f32,
    pub tag: DialectTag,
}

/// Ordered set of registrations. Negotiation uses all of them; dispatch uses
/// the first whose pattern matches.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    registrations: Vec<HandlerRegistration>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in handlers in dispatch order.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        let builtins = [
            (DialectTag::RdfXml, r"application/rdf\+xml", "application/rdf+xml", 0.9),
            (DialectTag::Xhtml, r"application/xhtml", "application/xhtml+xml", 0.3),
            (DialectTag::Xml, r"(text|application)/(.*)xml", "text/xml", 0.5),
            (DialectTag::Xml, r"(text|application)/(.*)xml", "application/xml", 0.5),
            (DialectTag::Html, r"text/html", "text/html", 0.9),
            (DialectTag::Text, r"text/plain", "text/plain", 0.5),
            (DialectTag::Turtle, TURTLE_PATTERN, "text/turtle", 1.0),
            (DialectTag::Turtle, TURTLE_PATTERN, "text/n3", 1.0),
            (DialectTag::NTriples, r"application/n-triples", "application/n-triples", 1.0),
        ];
        for (tag, pattern, media_type, quality) in builtins {
            if let Err(e) = registry.register(media_type, pattern, quality, tag) {
                tracing::error!("built-in handler pattern {pattern} rejected: {e}");
            }
        }
        registry
    }

    /// Append a registration. Earlier registrations win dispatch ties.
    pub fn register(
        &mut self,
        media_type: &str,
        pattern: &str,
        quality: f32,
        tag: DialectTag,
    ) -> Result<(), regex::Error> {
        self.registrations.push(HandlerRegistration {
            media_type: media_type.to_string(),
            pattern: Regex::new(pattern)?,
            quality,
            tag,
        });
        Ok(())
    }

    pub fn registrations(&self) -> &[HandlerRegistration] {
        &self.registrations
    }

    /// Declared dialect for a content type, if any handler claims it.
    pub fn dispatch(&self, content_type: &str) -> Option<DialectTag> {
        self.registrations
            .iter()
            .find(|r| r.pattern.is_match(content_type))
            .map(|r| r.tag)
    }
}

/// Flat `DialectTag → interpreter` table.
#[derive(Clone)]
pub struct InterpreterTable {
    interpreters: HashMap<DialectTag, Arc<dyn Interpreter>>,
}

impl InterpreterTable {
    pub fn empty() -> Self {
        Self {
            interpreters: HashMap::new(),
        }
    }

    /// The built-in interpreters.
    pub fn standard() -> Self {
        let turtle: Arc<dyn Interpreter> = Arc::new(turtle::TurtleInterpreter);
        let rdfxml: Arc<dyn Interpreter> = Arc::new(rdfxml::RdfXmlInterpreter);

        let mut table = Self::empty();
        table.insert(DialectTag::RdfXml, rdfxml.clone());
        table.insert(DialectTag::Turtle, turtle.clone());
        table.insert(DialectTag::NTriples, turtle.clone());
        table.insert(DialectTag::Html, Arc::new(html::HtmlInterpreter));
        table.insert(DialectTag::Text, Arc::new(html::TextInterpreter));
        table.insert(
            DialectTag::Xhtml,
            Arc::new(xhtml::XhtmlInterpreter::new(vec![
                ("text/turtle".to_string(), turtle.clone()),
                ("text/n3".to_string(), turtle.clone()),
                ("application/n-triples".to_string(), turtle),
                ("application/rdf+xml".to_string(), rdfxml),
            ])),
        );
        table
    }

    pub fn insert(&mut self, tag: DialectTag, interpreter: Arc<dyn Interpreter>) {
        self.interpreters.insert(tag, interpreter);
    }

    pub fn get(&self, tag: DialectTag) -> Option<Arc<dyn Interpreter>> {
        self.interpreters.get(&tag).cloned()
    }
}

impl Default for InterpreterTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_first_match_wins() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.dispatch("application/rdf+xml"), Some(DialectTag::RdfXml));
        assert_eq!(registry.dispatch("application/xhtml+xml"), Some(DialectTag::Xhtml));
        assert_eq!(registry.dispatch("text/xml"), Some(DialectTag::Xml));
        assert_eq!(registry.dispatch("text/html"), Some(DialectTag::Html));
        assert_eq!(registry.dispatch("text/turtle"), Some(DialectTag::Turtle));
        assert_eq!(registry.dispatch("text/n3"), Some(DialectTag::Turtle));
        assert_eq!(registry.dispatch("application/x-turtle"), Some(DialectTag::Turtle));
        assert_eq!(registry.dispatch("application/n-triples"), Some(DialectTag::NTriples));
        assert_eq!(registry.dispatch("image/png"), None);
    }

    #[test]
    fn test_register_appends_after_builtins() {
        let mut registry = HandlerRegistry::standard();
        registry
            .register("application/trig", r"application/trig", 0.8, DialectTag::Turtle)
            .unwrap();
        assert_eq!(registry.dispatch("application/trig"), Some(DialectTag::Turtle));
        assert!(registry.register("x", "(", 0.1, DialectTag::Text).is_err());
    }

    #[test]
    fn test_standard_table_covers_every_settled_dialect() {
        let table = InterpreterTable::standard();
        for tag in [
            DialectTag::RdfXml,
            DialectTag::Xhtml,
            DialectTag::Html,
            DialectTag::Turtle,
            DialectTag::NTriples,
            DialectTag::Text,
        ] {
            assert!(table.get(tag).is_some(), "missing interpreter for {tag}");
        }
        assert!(table.get(DialectTag::Xml).is_none());
    }
}
