// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! RDF/XML interpreter.
//!
//! Covers node and property elements, typed nodes, property attributes,
//! `rdf:li`, `rdf:parseType` (`Resource`, `Literal`, `Collection`),
//! `rdf:datatype`, `xml:lang` and `xml:base`. Reification via `rdf:ID` on
//! property elements is not supported and is ignored.

use super::xml::{self, XmlElement};
use super::{Interpreter, ParseError, ParseTarget};
use crate::store::{vocab, Literal, Term, Triple};
use crate::uri;

pub struct RdfXmlInterpreter;

impl Interpreter for RdfXmlInterpreter {
    fn interpret(&self, target: &ParseTarget, body: &str) -> Result<Vec<Triple>, ParseError> {
        let root = xml::parse_document(body)?;
        let mut parser = RdfXmlParser::default();
        let scope = Scope {
            base: root
                .attr(vocab::XML, "base")
                .map(|b| uri::join(&target.base, b))
                .unwrap_or_else(|| target.base.clone()),
            lang: root.attr(vocab::XML, "lang").map(str::to_string),
        };

        if root.is(vocab::RDF, "RDF") {
            for node in root.child_elements() {
                parser.node_element(node, &scope)?;
            }
        } else {
            parser.node_element(&root, &scope)?;
        }
        Ok(parser.triples)
    }
}

#[derive(Debug, Clone)]
struct Scope {
    base: String,
    lang: Option<String>,
}

impl Scope {
    fn enter(&self, element: &XmlElement) -> Scope {
        Scope {
            base: element
                .attr(vocab::XML, "base")
                .map(|b| uri::join(&self.base, b))
                .unwrap_or_else(|| self.base.clone()),
            lang: element
                .attr(vocab::XML, "lang")
                .map(str::to_string)
                .or_else(|| self.lang.clone()),
        }
    }
}

#[derive(Default)]
struct RdfXmlParser {
    triples: Vec<Triple>,
    next_blank: usize,
}

fn is_syntax_attr(ns: &str, local: &str) -> bool {
    (ns == vocab::RDF
        && matches!(
            local,
            "about" | "ID" | "nodeID" | "resource" | "datatype" | "parseType" | "li"
        ))
        || ns == vocab::XML
        || ns.is_empty()
}

impl RdfXmlParser {
    fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::blank(format!("r{}", self.next_blank))
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term) {
        self.triples.push(Triple::new(subject, predicate, object));
    }

    fn literal(&self, value: String, scope: &Scope, datatype: Option<&str>) -> Term {
        match datatype {
            Some(dt) => Term::Literal(Literal {
                value,
                datatype: Some(uri::join(&scope.base, dt)),
                lang: None,
            }),
            None => Term::Literal(Literal {
                value,
                datatype: None,
                lang: scope.lang.clone(),
            }),
        }
    }

    fn subject_of(&mut self, element: &XmlElement, scope: &Scope) -> Term {
        if let Some(about) = element.attr(vocab::RDF, "about") {
            Term::named(uri::join(&scope.base, about))
        } else if let Some(id) = element.attr(vocab::RDF, "ID") {
            Term::named(uri::join(&scope.base, &format!("#{id}")))
        } else if let Some(node_id) = element.attr(vocab::RDF, "nodeID") {
            Term::blank(format!("n_{node_id}"))
        } else {
            self.fresh_blank()
        }
    }

    /// Process a node element and return its subject.
    fn node_element(&mut self, element: &XmlElement, outer: &Scope) -> Result<Term, ParseError> {
        let scope = outer.enter(element);
        let subject = self.subject_of(element, &scope);

        if !element.is(vocab::RDF, "Description") {
            self.emit(subject.clone(), vocab::rdf("type"), Term::named(element.iri()));
        }

        self.property_attributes(element, &subject, &scope);

        let mut li_counter = 0usize;
        for property in element.child_elements() {
            self.property_element(property, &subject, &scope, &mut li_counter)?;
        }
        Ok(subject)
    }

    fn property_attributes(&mut self, element: &XmlElement, subject: &Term, scope: &Scope) {
        for attr in &element.attrs {
            if is_syntax_attr(&attr.ns, &attr.local) {
                continue;
            }
            if attr.ns == vocab::RDF && attr.local == "type" {
                self.emit(
                    subject.clone(),
                    vocab::rdf("type"),
                    Term::named(uri::join(&scope.base, &attr.value)),
                );
                continue;
            }
            let object = self.literal(attr.value.clone(), scope, None);
            self.emit(
                subject.clone(),
                Term::named(format!("{}{}", attr.ns, attr.local)),
                object,
            );
        }
    }

    fn property_element(
        &mut self,
        element: &XmlElement,
        subject: &Term,
        outer: &Scope,
        li_counter: &mut usize,
    ) -> Result<(), ParseError> {
        let scope = outer.enter(element);
        let predicate = if element.is(vocab::RDF, "li") {
            *li_counter += 1;
            vocab::rdf(&format!("_{li_counter}"))
        } else {
            Term::named(element.iri())
        };

        match element.attr(vocab::RDF, "parseType") {
            Some("Resource") => {
                let object = self.fresh_blank();
                self.emit(subject.clone(), predicate, object.clone());
                let mut inner_li = 0usize;
                for property in element.child_elements() {
                    self.property_element(property, &object, &scope, &mut inner_li)?;
                }
                return Ok(());
            }
            Some("Collection") => {
                let mut items = Vec::new();
                for node in element.child_elements() {
                    items.push(self.node_element(node, &scope)?);
                }
                let head = self.collection(items);
                self.emit(subject.clone(), predicate, head);
                return Ok(());
            }
            Some(_) => {
                // "Literal" and unknown parse types are treated as XML literals.
                let object =
                    Term::typed_literal(element.inner_xml(), vocab::rdf("XMLLiteral").value());
                self.emit(subject.clone(), predicate, object);
                return Ok(());
            }
            None => {}
        }

        let mut children = element.child_elements();
        if let Some(node) = children.next() {
            if children.next().is_some() {
                return Err(ParseError::Syntax {
                    line: 0,
                    message: format!("property element {} has more than one node", element.qname),
                });
            }
            let object = self.node_element(node, &scope)?;
            self.emit(subject.clone(), predicate, object);
            return Ok(());
        }

        let has_property_attrs = element
            .attrs
            .iter()
            .any(|a| !is_syntax_attr(&a.ns, &a.local));

        if let Some(resource) = element.attr(vocab::RDF, "resource") {
            let object = Term::named(uri::join(&scope.base, resource));
            self.property_attributes(element, &object, &scope);
            self.emit(subject.clone(), predicate, object);
        } else if let Some(node_id) = element.attr(vocab::RDF, "nodeID") {
            let object = Term::blank(format!("n_{node_id}"));
            self.property_attributes(element, &object, &scope);
            self.emit(subject.clone(), predicate, object);
        } else if has_property_attrs {
            let object = self.fresh_blank();
            self.property_attributes(element, &object, &scope);
            self.emit(subject.clone(), predicate, object);
        } else {
            let datatype = element.attr(vocab::RDF, "datatype");
            let object = self.literal(element.text(), &scope, datatype);
            self.emit(subject.clone(), predicate, object);
        }
        Ok(())
    }

    fn collection(&mut self, items: Vec<Term>) -> Term {
        let mut head = vocab::rdf("nil");
        for item in items.into_iter().rev() {
            let cell = self.fresh_blank();
            self.emit(cell.clone(), vocab::rdf("first"), item);
            self.emit(cell.clone(), vocab::rdf("rest"), head);
            head = cell;
        }
        head
    }
}
