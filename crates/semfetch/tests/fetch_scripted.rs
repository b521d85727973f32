// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Retry ladder, deadlines, events and state, driven by a scripted transport.

mod common;

use common::{fetcher_with, graph_facts, masked, respond, Reply, ScriptedTransport, PEOPLE_TTL};
use semfetch::store::vocab;
use semfetch::{
    FailureCode, FailureStatus, FetchEventKind, FetchOptions, FetchState, FetcherConfig, Store,
    Term, TransportError,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const DOC: &str = "https://data.example/people";

fn cross_origin() -> FetcherConfig {
    FetcherConfig {
        context_origin: Some("https://app.example".into()),
        ..FetcherConfig::default()
    }
}

#[tokio::test]
async fn test_masked_failure_retries_without_credentials() {
    let transport = ScriptedTransport::new(|_, _, call| match call {
        0 => masked(),
        _ => respond(200, "text/turtle", PEOPLE_TTL),
    });
    let (fetcher, store) = fetcher_with(cross_origin(), transport.clone());

    let response = assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(response.statements_added, 3);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].1.credentials);
    assert!(!calls[1].1.credentials);

    let requests =
        store.match_pattern(Some(&Term::named(DOC)), Some(&vocab::link("request")), None, None);
    assert_eq!(requests.len(), 2);
    let retries = store.match_pattern(None, Some(&vocab::link("redirectedRequest")), None, None);
    assert_eq!(retries.len(), 1);
}

#[tokio::test]
async fn test_cross_origin_failure_falls_back_to_proxy() {
    let transport = ScriptedTransport::new(|uri, _, _| {
        if uri.starts_with("https://proxy.example/") {
            respond(200, "text/turtle", PEOPLE_TTL)
        } else {
            masked()
        }
    });
    let config = FetcherConfig {
        proxy_template: Some("https://proxy.example/fetch?uri={uri}".into()),
        ..cross_origin()
    };
    let (fetcher, store) = fetcher_with(config, transport.clone());

    assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);

    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, DOC);
    assert_eq!(calls[1].0, DOC);
    assert_eq!(
        calls[2].0,
        "https://proxy.example/fetch?uri=https%3A%2F%2Fdata.example%2Fpeople"
    );
    // Facts belong to the document, not the proxy URL.
    assert_eq!(graph_facts(store.as_ref(), DOC).len(), 3);
    assert_eq!(fetcher.get_state(DOC), FetchState::Fetched);
}

#[tokio::test]
async fn test_insecure_target_proxied_up_front_is_not_proxied_again() {
    let transport = ScriptedTransport::new(|_, _, _| masked());
    let config = FetcherConfig {
        proxy_template: Some("https://proxy.example/fetch?uri={uri}".into()),
        ..cross_origin()
    };
    let (fetcher, _) = fetcher_with(config, transport.clone());

    let failure = assert_err!(
        fetcher
            .fetch("http://data.example/doc", &FetchOptions::default())
            .await
    );
    assert_eq!(failure.status, FailureStatus::Http(0));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    for (dialed, _) in &calls {
        assert_eq!(dialed, "https://proxy.example/fetch?uri=http%3A%2F%2Fdata.example%2Fdoc");
    }
    assert!(calls[0].1.credentials);
    assert!(!calls[1].1.credentials);
}

#[tokio::test]
async fn test_same_origin_masked_failure_is_not_retried() {
    let transport = ScriptedTransport::new(|_, _, _| masked());
    let (fetcher, _) = fetcher_with(FetcherConfig::default(), transport.clone());

    let failure = assert_err!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Http(0));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_connection_error_after_credential_retry_is_network_failure() {
    let transport = ScriptedTransport::new(|_, _, _| {
        Reply::Fail(TransportError::Connect("connection refused".into()))
    });
    let (fetcher, _) = fetcher_with(cross_origin(), transport.clone());

    let failure = assert_err!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Code(FailureCode::Network));
    assert!(failure.error.contains("connection refused"));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let transport = ScriptedTransport::new(|_, _, _| {
        Reply::Delay(
            Duration::from_secs(5),
            Box::new(respond(200, "text/turtle", PEOPLE_TTL)),
        )
    });
    let (fetcher, store) = fetcher_with(FetcherConfig::default(), transport);

    let options = FetchOptions {
        timeout: Some(Duration::from_millis(50)),
        ..FetchOptions::default()
    };
    let started = std::time::Instant::now();
    let failure = assert_err!(fetcher.fetch(DOC, &options).await);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(failure.status, FailureStatus::Code(FailureCode::Timeout));
    assert!(matches!(fetcher.get_state(DOC), FetchState::Failed { .. }));
    assert!(graph_facts(store.as_ref(), DOC).is_empty());
}

#[tokio::test]
async fn test_events_request_then_done() {
    let transport = ScriptedTransport::new(|_, _, _| respond(200, "text/turtle", PEOPLE_TTL));
    let (fetcher, _) = fetcher_with(FetcherConfig::default(), transport);
    let mut events = fetcher.subscribe();

    assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);

    let first = events.try_recv().unwrap();
    let second = events.try_recv().unwrap();
    assert_eq!(first.kind(), FetchEventKind::Request);
    assert_eq!(second.kind(), FetchEventKind::Done);
    assert_eq!(second.uri(), DOC);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_refresh_replaces_document_facts() {
    let updated =
        r#"<http://example.org/people#alice> <http://xmlns.com/foaf/0.1/name> "Alice Liddell" ."#;
    let transport = ScriptedTransport::new(move |_, _, call| match call {
        0 => respond(200, "text/turtle", PEOPLE_TTL),
        _ => respond(200, "text/turtle", updated),
    });
    let (fetcher, store) = fetcher_with(FetcherConfig::default(), transport.clone());
    let mut events = fetcher.subscribe();

    assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(graph_facts(store.as_ref(), DOC).len(), 3);

    assert_ok!(fetcher.refresh(DOC).await);
    assert_eq!(transport.call_count(), 2);
    let names = store.match_pattern(
        None,
        Some(&Term::named("http://xmlns.com/foaf/0.1/name")),
        None,
        Some(&Term::named(DOC)),
    );
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].object.value(), "Alice Liddell");
    assert_eq!(graph_facts(store.as_ref(), DOC).len(), 1);

    let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .map(|e| e.kind())
        .collect();
    assert!(kinds.contains(&FetchEventKind::Refresh));
}

#[tokio::test]
async fn test_look_up_thing_fetches_aliases_once() {
    let transport = ScriptedTransport::new(|_, _, _| respond(200, "text/turtle", ""));
    let (fetcher, store) = fetcher_with(FetcherConfig::default(), transport.clone());
    let alice = Term::named(format!("{DOC}#alice"));
    store.add(
        alice.clone(),
        vocab::owl("sameAs"),
        Term::named("https://other.example/alice#me"),
        Term::named("https://index.example/"),
    );

    let results = fetcher.look_up_thing(&alice, None).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.is_ok()));
    let dialed: Vec<String> = transport.calls().into_iter().map(|(uri, _)| uri).collect();
    assert!(dialed.contains(&DOC.to_string()));
    assert!(dialed.contains(&"https://other.example/alice".to_string()));

    assert!(fetcher.look_up_thing(&alice, None).await.is_empty());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_content_location_of_loaded_document_short_circuits() {
    let transport = ScriptedTransport::new(|uri, _, _| {
        if uri.ends_with(".ttl") {
            respond(200, "text/turtle", PEOPLE_TTL)
        } else {
            Reply::Respond {
                status: 200,
                headers: vec![
                    ("Content-Type".into(), "text/turtle".into()),
                    ("Content-Location".into(), "people.ttl".into()),
                ],
                body: PEOPLE_TTL.into(),
            }
        }
    });
    let (fetcher, store) = fetcher_with(FetcherConfig::default(), transport);
    let located = "https://data.example/people.ttl";

    assert_ok!(fetcher.fetch(located, &FetchOptions::default()).await);
    let response = assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert!(response.from_cache);
    assert_eq!(response.final_uri, located);
    assert_eq!(fetcher.get_state(DOC), FetchState::Fetched);
    assert!(graph_facts(store.as_ref(), DOC).is_empty());
}

#[tokio::test]
async fn test_content_location_is_marked_loaded() {
    let transport = ScriptedTransport::new(|_, _, _| Reply::Respond {
        status: 200,
        headers: vec![
            ("Content-Type".into(), "text/turtle".into()),
            ("Content-Location".into(), "people.ttl".into()),
        ],
        body: PEOPLE_TTL.into(),
    });
    let (fetcher, _) = fetcher_with(FetcherConfig::default(), transport);

    let response = assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert!(!response.from_cache);
    assert_eq!(fetcher.get_state("https://data.example/people.ttl"), FetchState::Fetched);
}

#[tokio::test]
async fn test_failed_state_short_circuits_until_forced() {
    let transport = ScriptedTransport::new(|_, _, call| match call {
        0 => respond(500, "text/plain", "Internal error while rendering the page"),
        _ => respond(200, "text/turtle", PEOPLE_TTL),
    });
    let (fetcher, store) = fetcher_with(FetcherConfig::default(), transport.clone());

    let failure = assert_err!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(failure.status, FailureStatus::Http(500));
    assert!(!fetcher.is_nonexistent(DOC));
    assert_eq!(
        store
            .match_pattern(None, Some(&vocab::http("content")), None, None)
            .len(),
        1
    );

    let cached = assert_err!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(cached, failure);
    assert_eq!(transport.call_count(), 1);

    assert_ok!(fetcher.fetch(DOC, &FetchOptions::forced()).await);
    assert_eq!(transport.call_count(), 2);
    assert_eq!(fetcher.get_state(DOC), FetchState::Fetched);
}

#[tokio::test]
async fn test_offline_mirror_rewrites_dial_target() {
    let transport = ScriptedTransport::new(|_, _, _| respond(200, "text/turtle", PEOPLE_TTL));
    let config = FetcherConfig {
        offline: true,
        offline_mirror: Some("http://localhost:3000".into()),
        ..FetcherConfig::default()
    };
    let (fetcher, store) = fetcher_with(config, transport.clone());

    assert_ok!(fetcher.fetch(DOC, &FetchOptions::default()).await);
    assert_eq!(transport.calls()[0].0, "http://localhost:3000/data.example/people");
    assert_eq!(graph_facts(store.as_ref(), DOC).len(), 3);
}

#[tokio::test]
async fn test_no_meta_skips_provenance() {
    let transport = ScriptedTransport::new(|_, _, _| respond(200, "text/turtle", PEOPLE_TTL));
    let config = FetcherConfig::default();
    let session = Term::named(config.session_node.clone());
    let (fetcher, store) = fetcher_with(config, transport);

    let options = FetchOptions {
        no_meta: true,
        ..FetchOptions::default()
    };
    assert_ok!(fetcher.fetch(DOC, &options).await);
    assert!(store.match_pattern(None, None, None, Some(&session)).is_empty());
    assert_eq!(store.len(), 3);
}
