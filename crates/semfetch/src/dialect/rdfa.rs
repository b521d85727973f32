// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! RDFa extraction over an HTML/XHTML element tree.
//!
//! Implements the core RDFa 1.1 processing rules: subject resolution from
//! `about`/`resource`/`href`/`src`, `typeof`, `property` literals and
//! resources, `rel`/`rev` with incomplete triples completed by descendants,
//! `vocab`, `prefix` (and legacy `xmlns:`), and language inheritance.

use crate::store::{vocab, Literal, Term, Triple};
use crate::uri;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::rc::Rc;

/// Deepest element nesting walked before extraction gives up.
const MAX_DEPTH: usize = 256;

/// Prefixes available without declaration (subset of the RDFa initial context).
const INITIAL_PREFIXES: &[(&str, &str)] = &[
    ("rdf", vocab::RDF),
    ("rdfs", vocab::RDFS),
    ("owl", vocab::OWL),
    ("xsd", vocab::XSD),
    ("dc", vocab::DCTERMS),
    ("dcterms", vocab::DCTERMS),
    ("xhv", vocab::XHTML_VOCAB),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("schema", "http://schema.org/"),
    ("og", "http://ogp.me/ns#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
];

/// `rel`/`rev` terms that resolve without a `vocab` declaration.
const XHTML_REL_TERMS: &[&str] = &[
    "alternate", "appendix", "bookmark", "cite", "chapter", "contents", "copyright", "first",
    "glossary", "help", "icon", "index", "last", "license", "meta", "next", "p3pv1", "prev",
    "previous", "role", "section", "start", "stylesheet", "subsection", "top", "up",
    "describedby",
];

#[derive(Clone)]
struct Context {
    base: String,
    parent_subject: Term,
    parent_object: Option<Term>,
    incomplete: Vec<(Term, bool)>,
    lang: Option<String>,
    vocab: Option<String>,
    prefixes: HashMap<String, String>,
}

struct Extractor {
    triples: Vec<Triple>,
    next_blank: usize,
}

/// Extract every RDFa statement from `document`.
///
/// Returns an error message when the document cannot be walked.
pub fn extract(document: &Html, base: &str) -> Result<Vec<Triple>, String> {
    let base = document_base(document, base);
    let context = Context {
        base: base.clone(),
        parent_subject: Term::named(&base),
        parent_object: None,
        incomplete: Vec::new(),
        lang: None,
        vocab: None,
        prefixes: INITIAL_PREFIXES
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect(),
    };
    let mut extractor = Extractor {
        triples: Vec::new(),
        next_blank: 0,
    };
    extractor.walk(document.root_element(), context)?;
    Ok(extractor.triples)
}

/// `<base href>` wins over the retrieval URI.
fn document_base(document: &Html, fallback: &str) -> String {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "base")
        .and_then(|e| e.value().attr("href"))
        .map(|href| uri::join(fallback, href))
        .unwrap_or_else(|| uri::document_uri(fallback))
}

fn is_root(element: &ElementRef) -> bool {
    matches!(element.value().name(), "html" | "head" | "body")
}

fn tokens(value: Option<&str>) -> Vec<&str> {
    value.map(|v| v.split_whitespace().collect()).unwrap_or_default()
}

impl Extractor {
    fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::blank(format!("a{}", self.next_blank))
    }

    fn emit(&mut self, subject: Term, predicate: Term, object: Term) {
        self.triples.push(Triple::new(subject, predicate, object));
    }

    /// Depth-first, document-order walk over an explicit stack of
    /// `(element, parent context, depth)`.
    fn walk(&mut self, root: ElementRef, context: Context) -> Result<(), String> {
        let mut stack = vec![(root, Rc::new(context), 0usize)];
        while let Some((element, parent, depth)) = stack.pop() {
            if depth > MAX_DEPTH {
                return Err(format!("element nesting deeper than {MAX_DEPTH}"));
            }
            let child_ctx = Rc::new(self.visit(element, &parent));
            let children: Vec<ElementRef> =
                element.children().filter_map(ElementRef::wrap).collect();
            for child in children.into_iter().rev() {
                stack.push((child, child_ctx.clone(), depth + 1));
            }
        }
        Ok(())
    }

    /// Apply the processing rules to one element and return the context its
    /// children inherit.
    fn visit(&mut self, element: ElementRef, parent: &Context) -> Context {
        let el = element.value();

        let mut ctx = parent.clone();
        for (name, value) in el.attrs() {
            if let Some(prefix) = name.strip_prefix("xmlns:") {
                ctx.prefixes.insert(prefix.to_ascii_lowercase(), value.to_string());
            }
        }
        let prefix_decl = tokens(el.attr("prefix"));
        for pair in prefix_decl.chunks(2) {
            if let [prefix, ns] = pair {
                if let Some(prefix) = prefix.strip_suffix(':') {
                    ctx.prefixes.insert(prefix.to_ascii_lowercase(), ns.to_string());
                }
            }
        }
        if let Some(v) = el.attr("vocab") {
            ctx.vocab = if v.is_empty() {
                None
            } else {
                let v = uri::join(&ctx.base, v);
                self.emit(
                    Term::named(&ctx.base),
                    Term::named("http://www.w3.org/ns/rdfa#usesVocabulary"),
                    Term::named(&v),
                );
                Some(v)
            };
        }
        if let Some(lang) = el.attr("xml:lang").or_else(|| el.attr("lang")) {
            ctx.lang = if lang.is_empty() {
                None
            } else {
                Some(lang.to_ascii_lowercase())
            };
        }

        let rels: Vec<Term> = tokens(el.attr("rel"))
            .into_iter()
            .filter_map(|t| self.predicate(&ctx, t, true))
            .collect();
        let revs: Vec<Term> = tokens(el.attr("rev"))
            .into_iter()
            .filter_map(|t| self.predicate(&ctx, t, true))
            .collect();
        let properties: Vec<Term> = tokens(el.attr("property"))
            .into_iter()
            .filter_map(|t| self.predicate(&ctx, t, false))
            .collect();
        let types: Vec<Term> = tokens(el.attr("typeof"))
            .into_iter()
            .filter_map(|t| self.predicate(&ctx, t, false))
            .collect();
        let has_typeof = el.attr("typeof").is_some();
        let has_rel = el.attr("rel").is_some() || el.attr("rev").is_some();
        let has_property = el.attr("property").is_some();
        let has_content = el.attr("content").is_some() || el.attr("datatype").is_some();

        let about = el.attr("about").and_then(|v| self.safe_curie_or_iri(&ctx, v));
        let resource = el
            .attr("resource")
            .and_then(|v| self.safe_curie_or_iri(&ctx, v))
            .or_else(|| el.attr("href").map(|v| Term::named(uri::join(&ctx.base, v))))
            .or_else(|| el.attr("src").map(|v| Term::named(uri::join(&ctx.base, v))));

        let mut skip = false;
        let new_subject: Option<Term>;
        let mut typed_resource: Option<Term> = None;
        let mut current_object: Option<Term> = None;

        if !has_rel {
            if has_property && !has_content {
                new_subject = about.clone().or_else(|| {
                    if is_root(&element) {
                        Some(Term::named(&ctx.base))
                    } else {
                        parent.parent_object.clone()
                    }
                });
                if has_typeof {
                    typed_resource = match &about {
                        Some(a) => Some(a.clone()),
                        None => Some(resource.clone().unwrap_or_else(|| self.fresh_blank())),
                    };
                    if about.is_none() {
                        current_object = typed_resource.clone();
                    }
                }
            } else {
                new_subject = match about.clone().or_else(|| resource.clone()) {
                    Some(s) => Some(s),
                    None if is_root(&element) => Some(Term::named(&ctx.base)),
                    None if has_typeof => Some(self.fresh_blank()),
                    None => {
                        skip = !has_property;
                        parent.parent_object.clone()
                    }
                };
                if has_typeof {
                    typed_resource = new_subject.clone();
                }
            }
        } else {
            new_subject = match about.clone() {
                Some(s) => Some(s),
                None if is_root(&element) => Some(Term::named(&ctx.base)),
                None => parent.parent_object.clone(),
            };
            if has_typeof && about.is_some() {
                typed_resource = about.clone();
            }
            current_object = resource.clone();
            if current_object.is_none() && has_typeof && about.is_none() {
                current_object = Some(self.fresh_blank());
                typed_resource = current_object.clone();
            }
        }

        if let Some(typed) = &typed_resource {
            for ty in &types {
                self.emit(typed.clone(), vocab::rdf("type"), ty.clone());
            }
        }

        if let Some(subject) = &new_subject {
            if !skip {
                for (predicate, forward) in &parent.incomplete {
                    if *forward {
                        let from = parent.parent_subject.clone();
                        self.emit(from, predicate.clone(), subject.clone());
                    } else {
                        let to = parent.parent_subject.clone();
                        self.emit(subject.clone(), predicate.clone(), to);
                    }
                }
            }
        }

        let mut incomplete = Vec::new();
        if let Some(subject) = &new_subject {
            match &current_object {
                Some(object) => {
                    for rel in &rels {
                        self.emit(subject.clone(), rel.clone(), object.clone());
                    }
                    for rev in &revs {
                        self.emit(object.clone(), rev.clone(), subject.clone());
                    }
                }
                None if !rels.is_empty() || !revs.is_empty() => {
                    current_object = Some(self.fresh_blank());
                    incomplete.extend(rels.iter().map(|r| (r.clone(), true)));
                    incomplete.extend(revs.iter().map(|r| (r.clone(), false)));
                }
                None => {}
            }

            if !properties.is_empty() {
                let object = self.property_value(
                    &element,
                    &ctx,
                    has_rel,
                    &resource,
                    &typed_resource,
                    about.is_some(),
                );
                for property in &properties {
                    self.emit(subject.clone(), property.clone(), object.clone());
                }
            }
        }

        if skip {
            Context {
                lang: ctx.lang.clone(),
                vocab: ctx.vocab.clone(),
                prefixes: ctx.prefixes.clone(),
                ..parent.clone()
            }
        } else {
            let subject = new_subject.unwrap_or_else(|| parent.parent_subject.clone());
            Context {
                parent_object: Some(current_object.unwrap_or_else(|| subject.clone())),
                parent_subject: subject,
                incomplete,
                ..ctx
            }
        }
    }

    fn property_value(
        &self,
        element: &ElementRef,
        ctx: &Context,
        has_rel: bool,
        resource: &Option<Term>,
        typed_resource: &Option<Term>,
        has_about: bool,
    ) -> Term {
        let el = element.value();
        let datatype = el
            .attr("datatype")
            .filter(|d| !d.is_empty())
            .and_then(|d| self.predicate(ctx, d, false))
            .map(|d| d.value().to_string());

        if let Some(content) = el.attr("content") {
            return self.literal(content.to_string(), datatype, ctx);
        }
        let xml_literal = format!("{}XMLLiteral", vocab::RDF);
        if datatype.as_deref() == Some(xml_literal.as_str()) {
            return Term::typed_literal(element.inner_html(), xml_literal);
        }
        if el.attr("datatype").is_none() && !has_rel {
            if let Some(resource) = resource {
                return resource.clone();
            }
            if let (Some(typed), false) = (typed_resource, has_about) {
                return typed.clone();
            }
        }
        let text: String = element.text().collect();
        self.literal(text, datatype, ctx)
    }

    fn literal(&self, value: String, datatype: Option<String>, ctx: &Context) -> Term {
        match datatype {
            Some(dt) => Term::typed_literal(value, dt),
            None => Term::Literal(Literal {
                value,
                datatype: None,
                lang: ctx.lang.clone(),
            }),
        }
    }

    /// Resolve a TERMorCURIEorAbsIRI.
    fn predicate(&self, ctx: &Context, token: &str, is_rel: bool) -> Option<Term> {
        if let Some((prefix, local)) = token.split_once(':') {
            if prefix == "_" {
                return None;
            }
            if let Some(ns) = ctx.prefixes.get(&prefix.to_ascii_lowercase()) {
                return Some(Term::named(format!("{ns}{local}")));
            }
            if uri::scheme(token).is_some() {
                return Some(Term::named(token));
            }
            return None;
        }
        if let Some(v) = &ctx.vocab {
            return Some(Term::named(format!("{v}{token}")));
        }
        let lower = token.to_ascii_lowercase();
        if is_rel && XHTML_REL_TERMS.contains(&lower.as_str()) {
            return Some(vocab::xhtml_vocab(&lower));
        }
        None
    }

    /// Resolve a SafeCURIEorCURIEorIRI (`about`, `resource`).
    fn safe_curie_or_iri(&self, ctx: &Context, value: &str) -> Option<Term> {
        if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            return self.curie(ctx, inner);
        }
        if value.starts_with("_:") {
            return self.curie(ctx, value);
        }
        if let Some((prefix, _)) = value.split_once(':') {
            if ctx.prefixes.contains_key(&prefix.to_ascii_lowercase()) {
                return self.curie(ctx, value);
            }
        }
        Some(Term::named(uri::join(&ctx.base, value)))
    }

    fn curie(&self, ctx: &Context, value: &str) -> Option<Term> {
        let (prefix, local) = value.split_once(':')?;
        if prefix == "_" {
            let label = if local.is_empty() { "_" } else { local };
            return Some(Term::blank(format!("l_{label}")));
        }
        ctx.prefixes
            .get(&prefix.to_ascii_lowercase())
            .map(|ns| Term::named(format!("{ns}{local}")))
    }
}
