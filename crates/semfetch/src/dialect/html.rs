// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plain HTML and plain text: no embedded semantics, just a record of what
//! the document is.

use super::{Interpreter, ParseError, ParseTarget};
use crate::store::{vocab, Term, Triple};
use scraper::{Html, Selector};

/// Records a generic web page and its title.
pub struct HtmlInterpreter;

impl Interpreter for HtmlInterpreter {
    fn interpret(&self, target: &ParseTarget, body: &str) -> Result<Vec<Triple>, ParseError> {
        let document = Html::parse_document(body);
        let doc = Term::named(&target.document);

        let mut triples = Vec::new();
        if let Some(title) = document_title(&document) {
            triples.push(Triple::new(doc.clone(), vocab::dcterms("title"), Term::literal(title)));
        }
        triples.push(Triple::new(doc, vocab::rdf("type"), vocab::link("WebPage")));
        Ok(triples)
    }
}

/// Text with no recognisable markup carries no facts.
pub struct TextInterpreter;

impl Interpreter for TextInterpreter {
    fn interpret(&self, _target: &ParseTarget, _body: &str) -> Result<Vec<Triple>, ParseError> {
        Ok(Vec::new())
    }
}

/// Whitespace-normalized `<title>` text, if non-empty.
pub(crate) fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = title.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_title_and_page_type() {
        let target = ParseTarget::new("https://example.org/page");
        let triples = HtmlInterpreter
            .interpret(
                &target,
                "<html><head><title>\n  Hello   world </title></head><body></body></html>",
            )
            .unwrap();
        let doc = Term::named("https://example.org/page");
        assert!(triples.contains(&Triple::new(
            doc.clone(),
            vocab::dcterms("title"),
            Term::literal("Hello world")
        )));
        assert!(triples.contains(&Triple::new(doc, vocab::rdf("type"), vocab::link("WebPage"))));
    }

    #[test]
    fn test_html_without_title() {
        let target = ParseTarget::new("https://example.org/page");
        let triples = HtmlInterpreter.interpret(&target, "<p>no head</p>").unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn test_text_has_no_facts() {
        let target = ParseTarget::new("https://example.org/notes.txt");
        assert!(TextInterpreter.interpret(&target, "just words").unwrap().is_empty());
    }
}
