// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! XHTML: title, `link` relations, embedded data blocks and RDFa.

use super::html::document_title;
use super::{rdfa, Interpreter, ParseError, ParseTarget};
use crate::store::{vocab, Term, Triple};
use crate::uri;
use scraper::{Html, Selector};
use std::sync::Arc;

pub struct XhtmlInterpreter {
    /// `<script type>` value → interpreter for the block's content.
    script_dialects: Vec<(String, Arc<dyn Interpreter>)>,
}

impl XhtmlInterpreter {
    pub fn new(script_dialects: Vec<(String, Arc<dyn Interpreter>)>) -> Self {
        Self { script_dialects }
    }

    fn script_interpreter(&self, script_type: &str) -> Option<&Arc<dyn Interpreter>> {
        let essence = script_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.script_dialects
            .iter()
            .find(|(media_type, _)| *media_type == essence)
            .map(|(_, interpreter)| interpreter)
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Rdfa(format!("bad selector {css}: {e}")))
}

/// Resolve a `link` relation token. Absolute IRIs stand for themselves,
/// bare terms live in the XHTML vocabulary.
fn relation(token: &str) -> Term {
    if uri::scheme(token).is_some() && token.contains("//") {
        Term::named(token)
    } else {
        vocab::xhtml_vocab(&token.to_ascii_lowercase())
    }
}

/// Script bodies in XHTML are often wrapped in (commented) CDATA markers.
fn strip_cdata(text: &str) -> &str {
    let mut text = text.trim();
    for open in ["//<![CDATA[", "<![CDATA["] {
        if let Some(rest) = text.strip_prefix(open) {
            text = rest;
            break;
        }
    }
    for close in ["//]]>", "]]>"] {
        if let Some(rest) = text.strip_suffix(close) {
            text = rest;
            break;
        }
    }
    text.trim()
}

/// Give each embedded block its own blank node namespace.
fn scope_blanks(triples: Vec<Triple>, scope: &str) -> Vec<Triple> {
    let rename = |term: Term| match term {
        Term::Blank(label) => Term::blank(format!("{scope}_{label}")),
        other => other,
    };
    triples
        .into_iter()
        .map(|t| Triple::new(rename(t.subject), t.predicate, rename(t.object)))
        .collect()
}

impl Interpreter for XhtmlInterpreter {
    fn interpret(&self, target: &ParseTarget, body: &str) -> Result<Vec<Triple>, ParseError> {
        let document = Html::parse_document(body);
        let doc = Term::named(&target.document);
        let mut triples = Vec::new();

        if let Some(title) = document_title(&document) {
            triples.push(Triple::new(doc.clone(), vocab::dcterms("title"), Term::literal(title)));
        }

        let links = selector("link[href]")?;
        for link in document.select(&links) {
            let el = link.value();
            let Some(href) = el.attr("href") else { continue };
            let target_term = Term::named(uri::join(&target.base, href));
            for rel in el.attr("rel").unwrap_or_default().split_whitespace() {
                triples.push(Triple::new(doc.clone(), relation(rel), target_term.clone()));
            }
            for rev in el.attr("rev").unwrap_or_default().split_whitespace() {
                triples.push(Triple::new(target_term.clone(), relation(rev), doc.clone()));
            }
        }

        let scripts = selector("script[type]")?;
        for (index, script) in document.select(&scripts).enumerate() {
            let script_type = script.value().attr("type").unwrap_or_default();
            let Some(interpreter) = self.script_interpreter(script_type) else {
                continue;
            };
            let content: String = script.text().collect();
            let content = strip_cdata(&content);
            if content.is_empty() {
                continue;
            }
            tracing::debug!(
                document = %target.document,
                script_type,
                "parsing embedded data block"
            );
            let block = interpreter.interpret(target, content)?;
            triples.extend(scope_blanks(block, &format!("s{index}")));
        }

        if !target.no_rdfa {
            let extracted = rdfa::extract(&document, &target.base).map_err(ParseError::Rdfa)?;
            triples.extend(scope_blanks(extracted, "rdfa"));
        }

        Ok(triples)
    }
}
