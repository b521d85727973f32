// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use semfetch::store::{Store, Term};
use semfetch::transport::{ResponseBody, TransportRequest, TransportResponse};
use semfetch::{Fetcher, FetcherConfig, MemoryStore, Transport, TransportError};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a [`ScriptedTransport`] does for one call.
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    Fail(TransportError),
    /// Wait, then reply.
    Delay(Duration, Box<Reply>),
}

pub fn respond(status: u16, content_type: &str, body: &str) -> Reply {
    Reply::Respond {
        status,
        headers: vec![("Content-Type".to_string(), content_type.to_string())],
        body: body.to_string(),
    }
}

pub fn masked() -> Reply {
    Reply::Respond {
        status: 0,
        headers: Vec::new(),
        body: String::new(),
    }
}

type Script = dyn Fn(&str, &TransportRequest, usize) -> Reply + Send + Sync;

/// In-process transport driven by a closure of `(uri, request, call index)`.
pub struct ScriptedTransport {
    script: Box<Script>,
    calls: Mutex<Vec<(String, TransportRequest)>>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl Fn(&str, &TransportRequest, usize) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, TransportRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        uri: &str,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let reply = {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push((uri.to_string(), request.clone()));
            (self.script)(uri, &request, index)
        };
        let mut reply = reply;
        while let Reply::Delay(wait, next) = reply {
            tokio::time::sleep(wait).await;
            reply = *next;
        }
        match reply {
            Reply::Respond {
                status,
                headers,
                body,
            } => Ok(TransportResponse {
                url: uri.to_string(),
                status,
                status_text: String::new(),
                headers,
                body: ResponseBody::ready(body),
            }),
            Reply::Fail(e) => Err(e),
            Reply::Delay(..) => unreachable!("delays are unwrapped above"),
        }
    }
}

pub fn fetcher_with(
    config: FetcherConfig,
    transport: Arc<dyn Transport>,
) -> (Fetcher, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let fetcher = Fetcher::new(config, store.clone(), transport);
    (fetcher, store)
}

/// The `(s, p, o)` facts asserted in one document's graph, rendered for
/// comparison.
pub fn graph_facts(store: &dyn Store, doc: &str) -> BTreeSet<String> {
    store
        .match_pattern(None, None, None, Some(&Term::named(doc)))
        .into_iter()
        .map(|st| format!("{:?} {:?} {:?}", st.subject, st.predicate, st.object))
        .collect()
}

pub const PEOPLE_TTL: &str = r#"@prefix foaf: <http://xmlns.com/foaf/0.1/> .
<http://example.org/people#alice> a foaf:Person ;
    foaf:name "Alice" ;
    foaf:knows <http://example.org/people#bob> .
"#;

pub const PEOPLE_RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:foaf="http://xmlns.com/foaf/0.1/">
  <foaf:Person rdf:about="http://example.org/people#alice">
    <foaf:name>Alice</foaf:name>
    <foaf:knows rdf:resource="http://example.org/people#bob"/>
  </foaf:Person>
</rdf:RDF>
"#;
