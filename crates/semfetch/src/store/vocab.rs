// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Namespaces used by the fetcher's provenance records and the interpreters.

use super::Term;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const LINK: &str = "http://www.w3.org/2007/ont/link#";
pub const HTTP: &str = "http://www.w3.org/2007/ont/http#";
pub const HTTPH: &str = "http://www.w3.org/2007/ont/httph#";
pub const XHTML: &str = "http://www.w3.org/1999/xhtml";
pub const XHTML_VOCAB: &str = "http://www.w3.org/1999/xhtml/vocab#";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const IANA_MEDIA_TYPES: &str = "http://www.w3.org/ns/iana/media-types/";

fn term(ns: &str, local: &str) -> Term {
    Term::Named(format!("{ns}{local}"))
}

pub fn rdf(local: &str) -> Term {
    term(RDF, local)
}

pub fn rdfs(local: &str) -> Term {
    term(RDFS, local)
}

pub fn owl(local: &str) -> Term {
    term(OWL, local)
}

pub fn xsd(local: &str) -> Term {
    term(XSD, local)
}

pub fn dcterms(local: &str) -> Term {
    term(DCTERMS, local)
}

/// The link ontology: requests, documents, redirects, status logs.
pub fn link(local: &str) -> Term {
    term(LINK, local)
}

/// HTTP response properties (status, statusText, content).
pub fn http(local: &str) -> Term {
    term(HTTP, local)
}

/// One property per response header, lower-cased.
pub fn httph(header: &str) -> Term {
    term(HTTPH, &header.to_ascii_lowercase())
}

pub fn xhtml_vocab(local: &str) -> Term {
    term(XHTML_VOCAB, local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_httph_lowercases_header_names() {
        assert_eq!(
            httph("Content-Type"),
            Term::named("http://www.w3.org/2007/ont/httph#content-type")
        );
    }
}
