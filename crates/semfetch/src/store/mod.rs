// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The quad store the fetcher writes into.
//!
//! The fetcher never owns the store: it holds an `Arc<dyn Store>` and is the
//! store's sole writer of request/response provenance. [`MemoryStore`] is a
//! small in-process implementation good enough for the CLI and for tests.

pub mod ntriples;
pub mod vocab;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// An RDF literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<String>,
    pub lang: Option<String>,
}

/// A node in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Named(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    pub fn named(iri: impl Into<String>) -> Self {
        Term::Named(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::Blank(label.into())
    }

    /// Plain string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            lang: None,
        })
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            lang: None,
        })
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            lang: Some(lang.into()),
        })
    }

    /// The IRI, blank label, or lexical form.
    pub fn value(&self) -> &str {
        match self {
            Term::Named(iri) => iri,
            Term::Blank(label) => label,
            Term::Literal(lit) => &lit.value,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Named(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Term::Named(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::Blank(_))
    }
}

/// A subject/predicate/object triple as produced by a dialect interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// A triple plus the graph (provenance) it was asserted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Statement {
    fn matches(
        &self,
        s: Option<&Term>,
        p: Option<&Term>,
        o: Option<&Term>,
        g: Option<&Term>,
    ) -> bool {
        s.is_none_or(|s| *s == self.subject)
            && p.is_none_or(|p| *p == self.predicate)
            && o.is_none_or(|o| *o == self.object)
            && g.is_none_or(|g| *g == self.graph)
    }
}

/// The store collaborator consumed by the fetcher.
pub trait Store: Send + Sync {
    /// Assert a statement. Asserting an identical quad twice is a no-op.
    fn add(&self, subject: Term, predicate: Term, object: Term, graph: Term);

    /// Remove every statement whose graph is `graph`; returns how many went.
    fn remove_statements_with_provenance(&self, graph: &Term) -> usize;

    /// Remove every statement matching the pattern; returns how many went.
    fn remove_matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> usize;

    /// All statements matching the pattern (`None` is a wildcard).
    fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Statement>;

    /// Every IRI known to denote the same thing as `term`, `term` first.
    fn uris_denoting(&self, term: &Term) -> Vec<String>;

    /// A fresh blank node, unique within this store.
    fn blank_node(&self) -> Term;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shorthand for the first object matching `(subject, predicate, ?, graph?)`.
    fn any_object(&self, subject: &Term, predicate: &Term) -> Option<Term> {
        self.match_pattern(Some(subject), Some(predicate), None, None)
            .into_iter()
            .next()
            .map(|st| st.object)
    }
}

/// In-memory quad store.
pub struct MemoryStore {
    statements: RwLock<Vec<Statement>>,
    next_blank: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            statements: RwLock::new(Vec::new()),
            next_blank: AtomicU64::new(0),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Statement>> {
        self.statements
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Statement>> {
        self.statements
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn add(&self, subject: Term, predicate: Term, object: Term, graph: Term) {
        let st = Statement {
            subject,
            predicate,
            object,
            graph,
        };
        let mut statements = self.write();
        if !statements.contains(&st) {
            statements.push(st);
        }
    }

    fn remove_statements_with_provenance(&self, graph: &Term) -> usize {
        self.remove_matching(None, None, None, Some(graph))
    }

    fn remove_matching(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> usize {
        let mut statements = self.write();
        let before = statements.len();
        statements.retain(|st| !st.matches(subject, predicate, object, graph));
        before - statements.len()
    }

    fn match_pattern(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Vec<Statement> {
        self.read()
            .iter()
            .filter(|st| st.matches(subject, predicate, object, graph))
            .cloned()
            .collect()
    }

    fn uris_denoting(&self, term: &Term) -> Vec<String> {
        let Some(start) = term.as_iri() else {
            return Vec::new();
        };
        let same_as = vocab::owl("sameAs");
        let statements = self.read();

        let mut seen: HashSet<String> = HashSet::new();
        let mut ordered = vec![start.to_string()];
        seen.insert(start.to_string());
        let mut cursor = 0;

        while cursor < ordered.len() {
            let current = Term::named(ordered[cursor].clone());
            cursor += 1;
            for st in statements.iter().filter(|st| st.predicate == same_as) {
                let other = if st.subject == current {
                    &st.object
                } else if st.object == current {
                    &st.subject
                } else {
                    continue;
                };
                if let Some(iri) = other.as_iri() {
                    if seen.insert(iri.to_string()) {
                        ordered.push(iri.to_string());
                    }
                }
            }
        }
        ordered
    }

    fn blank_node(&self) -> Term {
        let n = self.next_blank.fetch_add(1, Ordering::Relaxed);
        Term::Blank(format!("b{n}"))
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}
