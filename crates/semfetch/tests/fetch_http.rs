// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end fetches against a local HTTP server.

mod common;

use common::{graph_facts, PEOPLE_RDF, PEOPLE_TTL};
use semfetch::store::vocab;
use semfetch::{
    DialectTag, FailureCode, FailureStatus, FetchOptions, FetchState, Fetcher, FetcherConfig,
    MemoryStore, Store, Term,
};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_fetcher() -> (Fetcher, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Fetcher::with_http(FetcherConfig::default(), store.clone());
    (fetcher, store)
}

fn ok_body(body: &str, content_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), content_type)
}

#[tokio::test]
async fn test_second_fetch_is_served_from_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/people", server.uri());

    let first = assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert!(!first.from_cache);
    assert_eq!(first.dialect, Some(DialectTag::Turtle));
    assert_eq!(first.statements_added, 3);
    assert_eq!(graph_facts(store.as_ref(), &doc).len(), 3);

    let second = assert_ok!(fetcher.fetch(&format!("{doc}#alice"), &FetchOptions::default()).await);
    assert!(second.from_cache);
    assert_eq!(fetcher.get_state(&doc), FetchState::Fetched);
}

#[tokio::test]
async fn test_accept_header_lists_every_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    assert_ok!(fetcher.fetch(&format!("{}/people", server.uri()), &FetchOptions::default()).await);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let accept = requests[0].headers.get("accept").unwrap().to_str().unwrap().to_string();
    for entry in [
        "text/turtle;q=1",
        "application/rdf+xml;q=0.9",
        "text/html;q=0.9",
        "application/xhtml+xml;q=0.3",
        "image/*;q=0.9",
        "*/*;q=0.1",
    ] {
        assert!(accept.contains(entry), "{entry} missing from {accept}");
    }
    assert_eq!(accept.matches("text/xml").count(), 1);
}

#[tokio::test]
async fn test_rdfxml_under_generic_xml_type_is_equivalent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/as-xml"))
        .respond_with(ok_body(PEOPLE_RDF, "text/xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/as-rdf"))
        .respond_with(ok_body(PEOPLE_RDF, "application/rdf+xml"))
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let as_xml = format!("{}/as-xml", server.uri());
    let as_rdf = format!("{}/as-rdf", server.uri());
    let results = fetcher.fetch_all(&[&as_xml, &as_rdf], &FetchOptions::default()).await;

    for result in &results {
        let response = result.as_ref().unwrap();
        assert_eq!(response.dialect, Some(DialectTag::RdfXml));
    }
    let facts = graph_facts(store.as_ref(), &as_xml);
    assert_eq!(facts.len(), 3);
    assert_eq!(facts, graph_facts(store.as_ref(), &as_rdf));
}

#[tokio::test]
async fn test_not_found_then_forced_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/later"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    let doc = format!("{}/later", server.uri());

    let failure = assert_err!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Http(404));
    assert!(fetcher.is_nonexistent(&doc));
    assert!(matches!(fetcher.get_state(&doc), FetchState::Failed { .. }));

    // Without force the failure is remembered.
    let again = assert_err!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(again.status, FailureStatus::Http(404));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    assert_ok!(fetcher.fetch(&doc, &FetchOptions::forced()).await);
    assert!(!fetcher.is_nonexistent(&doc));
    assert_eq!(fetcher.get_state(&doc), FetchState::Fetched);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let cache_control = requests[1].headers.get("cache-control").unwrap();
    assert_eq!(cache_control.to_str().unwrap(), "no-cache");
}

#[tokio::test]
async fn test_plain_text_with_namespace_is_rdfxml() {
    let server = MockServer::start().await;
    let body = PEOPLE_RDF.replace("<?xml version=\"1.0\"?>\n", "");
    Mock::given(method("GET"))
        .and(path("/mislabelled"))
        .respond_with(ok_body(&body, "text/plain"))
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/mislabelled", server.uri());
    let response = assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(response.dialect, Some(DialectTag::RdfXml));
    assert_eq!(graph_facts(store.as_ref(), &doc).len(), 3);
}

#[tokio::test]
async fn test_batch_results_are_positional() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    let uris = [
        format!("{}/missing", server.uri()),
        format!("{}/people", server.uri()),
    ];
    let results = fetcher.fetch_all(&uris, &FetchOptions::default()).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap_err().status, FailureStatus::Http(404));
    assert_eq!(results[1].as_ref().unwrap().uri, uris[1]);
}

#[tokio::test]
async fn test_unload_then_refetch_restores_same_facts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .expect(2)
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/people", server.uri());
    assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    let before = graph_facts(store.as_ref(), &doc);

    assert_eq!(fetcher.unload(&doc), 3);
    assert_eq!(fetcher.get_state(&doc), FetchState::Unrequested);
    assert!(graph_facts(store.as_ref(), &doc).is_empty());

    assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(graph_facts(store.as_ref(), &doc), before);
}

#[tokio::test]
async fn test_html_that_is_really_xhtml() {
    let server = MockServer::start().await;
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
  <head><title>Alice's page</title></head>
  <body>
    <p about="http://example.org/people#alice" property="http://xmlns.com/foaf/0.1/name">Alice</p>
  </body>
</html>"#;
    Mock::given(method("GET"))
        .and(path("/alice.html"))
        .respond_with(ok_body(body, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/alice.html", server.uri());
    let response = assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(response.dialect, Some(DialectTag::Xhtml));
    assert_eq!(response.content_type.as_deref(), Some("text/html"));

    let graph = Term::named(&doc);
    assert_eq!(
        store
            .match_pattern(Some(&graph), Some(&vocab::dcterms("title")), None, Some(&graph))
            .len(),
        1
    );
    let name = store.match_pattern(
        Some(&Term::named("http://example.org/people#alice")),
        Some(&Term::named("http://xmlns.com/foaf/0.1/name")),
        None,
        Some(&graph),
    );
    assert_eq!(name.len(), 1);
    assert_eq!(name[0].object.value(), "Alice");
}

#[tokio::test]
async fn test_put_back_uploads_document_graph() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/people"))
        .and(header("content-type", "text/turtle"))
        .and(body_string_contains("<http://example.org/people#alice>"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/people", server.uri());
    store.add(
        Term::named("http://example.org/people#alice"),
        Term::named("http://xmlns.com/foaf/0.1/name"),
        Term::literal("Alice"),
        Term::named(&doc),
    );

    let response = assert_ok!(fetcher.put_back(&doc, &FetchOptions::default()).await);
    assert_eq!(response.status, 201);
    assert_eq!(fetcher.get_state(&doc), FetchState::Fetched);
}

#[tokio::test]
async fn test_put_back_rejects_unserializable_type() {
    let (fetcher, _) = http_fetcher();
    let options = FetchOptions {
        content_type: Some("application/ld+json".into()),
        ..FetchOptions::default()
    };
    let failure = assert_err!(fetcher.put_back("http://127.0.0.1:9/doc", &options).await);
    assert_eq!(failure.status, FailureStatus::Code(FailureCode::SerializationError));
}

#[tokio::test]
async fn test_delete_marks_document_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/people", server.uri());
    assert_ok!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_ok!(fetcher.delete(&doc, &FetchOptions::default()).await);

    assert!(graph_facts(store.as_ref(), &doc).is_empty());
    assert!(fetcher.is_nonexistent(&doc));
    match fetcher.get_state(&doc) {
        FetchState::Failed { status, .. } => assert_eq!(status, FailureStatus::Http(404)),
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn test_web_copy_reads_then_writes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/source"))
        .and(header("accept", "text/turtle"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/copy"))
        .and(body_string_contains("foaf:knows"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    let response = assert_ok!(
        fetcher
            .web_copy(
                &format!("{}/source", server.uri()),
                &format!("{}/copy", server.uri()),
                "text/turtle",
            )
            .await
    );
    assert_eq!(response.status, 201);
    // Copies go around fetch state.
    assert_eq!(
        fetcher.get_state(&format!("{}/source", server.uri())),
        FetchState::Unrequested
    );
}

#[tokio::test]
async fn test_create_if_not_exists_puts_missing_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fresh"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fresh"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    let doc = format!("{}/fresh", server.uri());
    let created = assert_ok!(fetcher.create_if_not_exists(&doc, &FetchOptions::default()).await);
    assert_eq!(created.status, 201);
    assert_eq!(fetcher.get_state(&doc), FetchState::Unrequested);
    assert!(!fetcher.is_nonexistent(&doc));
}

#[tokio::test]
async fn test_http_redirect_attributes_facts_to_final_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ok_body(PEOPLE_TTL, "text/turtle"))
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let old = format!("{}/old", server.uri());
    let new = format!("{}/new", server.uri());
    let response = assert_ok!(fetcher.fetch(&old, &FetchOptions::default()).await);
    assert_eq!(response.final_uri, new);

    assert!(graph_facts(store.as_ref(), &old).is_empty());
    assert_eq!(graph_facts(store.as_ref(), &new).len(), 3);
    assert_eq!(fetcher.get_state(&old), FetchState::Fetched);
    assert_eq!(fetcher.get_state(&new), FetchState::Fetched);
    assert_eq!(
        store.any_object(&Term::named(&old), &vocab::link("redirectedTo")),
        Some(Term::named(&new))
    );

    assert_eq!(fetcher.unload(&old), 3);
    assert_eq!(fetcher.get_state(&new), FetchState::Unrequested);
}

#[tokio::test]
async fn test_turtle_syntax_error_fails_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ok_body(
            "<http://a.example/s> <http://a.example/p> \"never closed .",
            "text/turtle",
        ))
        .mount(&server)
        .await;

    let (fetcher, store) = http_fetcher();
    let doc = format!("{}/broken", server.uri());
    let failure = assert_err!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Code(FailureCode::ParseError));
    assert!(graph_facts(store.as_ref(), &doc).is_empty());

    // The request record carries the error.
    let request = store.any_object(&Term::named(&doc), &vocab::link("request")).unwrap();
    assert!(store.any_object(&request, &vocab::link("error")).is_some());
}

#[tokio::test]
async fn test_unrecognised_xml_dialect_fails() {
    let server = MockServer::start().await;
    let atom = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>News</title></feed>"#;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ok_body(atom, "application/atom+xml"))
        .mount(&server)
        .await;

    let (fetcher, _) = http_fetcher();
    let doc = format!("{}/feed", server.uri());
    let failure = assert_err!(fetcher.fetch(&doc, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Code(FailureCode::ParseError));
    assert!(failure.error.contains("unsupported dialect of XML"));
}
