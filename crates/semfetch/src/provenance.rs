// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request and response provenance written into the store.
//!
//! Every record is append-only. A retried request gets a new record linked
//! from the old one with `link:redirectedRequest`.

use crate::negotiation;
use crate::store::{vocab, Store, Term};
use crate::transport::TransportResponse;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;

/// Error bodies at or below this length are treated as placeholders.
const MIN_ERROR_BODY_CHARS: usize = 10;

pub struct Provenance {
    store: Arc<dyn Store>,
    session: Term,
}

fn clock() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}

impl Provenance {
    pub fn new(store: Arc<dyn Store>, session: impl Into<String>) -> Self {
        Self {
            store,
            session: Term::named(session.into()),
        }
    }

    fn add(&self, subject: &Term, predicate: Term, object: Term) {
        self.store
            .add(subject.clone(), predicate, object, self.session.clone());
    }

    /// Start a request record for `doc` and link it from the document.
    pub fn new_request(&self, doc: &str, requested: &str, referring: Option<&Term>) -> Term {
        let request = self.store.blank_node();
        self.add(
            &request,
            vocab::rdfs("label"),
            Term::literal(format!("[{}] Request for {doc}", clock())),
        );
        self.add(&request, vocab::link("requestedURI"), Term::literal(requested));
        self.add(
            &request,
            vocab::link("timestamp"),
            Term::typed_literal(
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                vocab::xsd("dateTime").value(),
            ),
        );
        if let Some(referring) = referring {
            self.add(&request, vocab::link("referringTerm"), referring.clone());
        }
        self.add(&Term::named(doc), vocab::link("request"), request.clone());
        request
    }

    /// Append a human-readable entry to the request's status log.
    pub fn log_status(&self, request: &Term, message: &str) {
        self.add(
            request,
            vocab::link("status"),
            Term::literal(format!("[{}] {message}", clock())),
        );
    }

    pub fn record_error(&self, request: &Term, message: &str) {
        self.add(request, vocab::link("error"), Term::literal(message));
        self.log_status(request, message);
    }

    /// Link a retry's record from the record it replaces.
    pub fn link_retry(&self, old_request: &Term, new_request: &Term) {
        self.add(old_request, vocab::link("redirectedRequest"), new_request.clone());
    }

    /// Record that the representation of `from` came from `to`.
    pub fn link_redirect(&self, from: &str, to: &str) {
        self.add(&Term::named(from), vocab::link("redirectedTo"), Term::named(to));
    }

    /// Status, every header, and the declared document class of a response.
    /// Returns the response node.
    pub fn record_response(&self, request: &Term, doc: &str, response: &TransportResponse) -> Term {
        let node = self.store.blank_node();
        self.add(request, vocab::link("response"), node.clone());
        self.add(
            &node,
            vocab::http("status"),
            Term::typed_literal(response.status.to_string(), vocab::xsd("integer").value()),
        );
        self.add(&node, vocab::http("statusText"), Term::literal(&response.status_text));
        for (name, value) in &response.headers {
            self.add(&node, vocab::httph(name), Term::literal(value));
        }
        if let Some(content_type) = response.header("content-type") {
            self.add(
                &Term::named(doc),
                vocab::rdf("type"),
                negotiation::media_type_class(content_type),
            );
        }
        node
    }

    /// Document type facts for a successful response, on every URI in the
    /// redirect chain.
    pub fn record_documents(&self, chain: &[&str], content_type: Option<&str>) {
        let image = content_type.is_some_and(negotiation::is_image_like);
        for doc in chain {
            let doc = Term::named(*doc);
            self.add(&doc, vocab::rdf("type"), vocab::link("Document"));
            if image {
                self.add(&doc, vocab::rdf("type"), vocab::dcterms("Image"));
            }
        }
    }

    /// Keep an error body when it looks like a real message.
    pub fn record_error_body(&self, response_node: &Term, body: &str) -> bool {
        let body = body.trim();
        if body.chars().count() <= MIN_ERROR_BODY_CHARS {
            return false;
        }
        self.add(response_node, vocab::http("content"), Term::literal(body));
        true
    }
}
