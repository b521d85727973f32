// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! The request orchestrator.
//!
//! Per call: reject unsupported schemes, consult fetch state, write a
//! request record, rewrite the dial URI, race the transport against the
//! deadline, then either interpret the response or walk the retry ladder.
//! Every terminal outcome goes through [`Fetcher::done_fetch`] or
//! [`Fetcher::fail_fetch`].

use crate::config::FetcherConfig;
use crate::dialect::{self, DialectTag, HandlerRegistry, InterpreterTable, ParseTarget};
use crate::events::{EventBus, FetchEvent};
use crate::negotiation;
use crate::provenance::Provenance;
use crate::retry::{Attempt, RetryController, RetryDecision};
use crate::state::{FetchState, StateTracker, TrackedState, MAX_REDIRECT_HOPS};
use crate::store::{ntriples, Store, Term};
use crate::transport::{
    HttpTransport, Method, ResponseBody, Transport, TransportError, TransportRequest,
    TransportResponse,
};
use crate::types::{
    FailureCode, FailureStatus, FetchFailure, FetchOptions, FetchResponse, FetchResult,
};
use crate::uri;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

/// Content type used for writes when the caller names none.
const DEFAULT_WRITE_TYPE: &str = "text/turtle";

/// Outcome of one transport call raced against the deadline.
enum Dialed {
    Response(TransportResponse),
    Failed(TransportError),
    TimedOut,
}

struct Inner {
    config: FetcherConfig,
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
    registry: HandlerRegistry,
    interpreters: InterpreterTable,
    accept: String,
    state: Arc<StateTracker>,
    retry: RetryController,
    events: EventBus,
    provenance: Provenance,
}

/// Document fetcher. Cheap to clone; clones share state and store.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<Inner>,
}

fn apply_overrides(
    mut request: TransportRequest,
    overrides: &[(String, String)],
) -> TransportRequest {
    for (name, value) in overrides {
        request.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        request.headers.push((name.clone(), value.clone()));
    }
    request
}

async fn read_body(body: ResponseBody, deadline: Instant) -> Result<String, FetchFailure> {
    match timeout_at(deadline, body.text()).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(FetchFailure::new(
            format!("Failed to read response body: {e}"),
            FailureCode::Network,
        )),
        Err(_) => Err(FetchFailure::new("Request timed out", FailureCode::Timeout)),
    }
}

impl Fetcher {
    /// Fetcher with the built-in handlers.
    pub fn new(
        config: FetcherConfig,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::with_handlers(
            config,
            store,
            transport,
            HandlerRegistry::standard(),
            InterpreterTable::standard(),
        )
    }

    /// Fetcher over the reqwest transport.
    pub fn with_http(config: FetcherConfig, store: Arc<dyn Store>) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.user_agent, config.timeout()));
        Self::new(config, store, transport)
    }

    pub fn with_handlers(
        config: FetcherConfig,
        store: Arc<dyn Store>,
        transport: Arc<dyn Transport>,
        registry: HandlerRegistry,
        interpreters: InterpreterTable,
    ) -> Self {
        let accept = negotiation::accept_header(&registry);
        tracing::debug!(%accept, "negotiation preferences");
        let provenance = Provenance::new(store.clone(), config.session_node.clone());
        Self {
            inner: Arc::new(Inner {
                retry: RetryController::new(&config),
                config,
                store,
                transport,
                registry,
                interpreters,
                accept,
                state: Arc::new(StateTracker::new()),
                events: EventBus::default(),
                provenance,
            }),
        }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    pub fn state(&self) -> &Arc<StateTracker> {
        &self.inner.state
    }

    /// The `Accept` header sent with every read.
    pub fn accept_header(&self) -> &str {
        &self.inner.accept
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.inner.events.subscribe()
    }

    pub fn get_state(&self, uri: &str) -> FetchState {
        self.inner.state.get_state(&uri::document_uri(uri))
    }

    pub fn is_nonexistent(&self, uri: &str) -> bool {
        self.inner.state.is_nonexistent(&uri::document_uri(uri))
    }

    fn deadline(&self, options: &FetchOptions) -> Instant {
        Instant::now() + options.timeout.unwrap_or_else(|| self.inner.config.timeout())
    }

    fn reject_scheme(&self, doc: &str) -> Option<FetchFailure> {
        let supported = match uri::scheme(doc) {
            Some(scheme) => !self.inner.config.is_unsupported_scheme(&scheme),
            None => false,
        };
        if supported {
            return None;
        }
        let failure = FetchFailure::new(
            format!("Unsupported protocol for {doc}"),
            FailureCode::UnsupportedProtocol,
        );
        tracing::warn!(uri = doc, "unsupported protocol; not dialing");
        self.inner.events.emit(FetchEvent::Fail {
            uri: doc.to_string(),
            error: failure.error.clone(),
            status: failure.status.to_string(),
        });
        Some(failure)
    }

    /// Load one document into the store.
    pub async fn fetch(&self, uri: &str, options: &FetchOptions) -> FetchResult {
        let inner = &self.inner;
        let doc = uri::document_uri(uri);
        if let Some(failure) = self.reject_scheme(&doc) {
            return Err(failure);
        }

        if !options.force {
            match inner.state.get_state(&doc) {
                FetchState::Fetched => {
                    tracing::debug!(uri = %doc, "already loaded");
                    return Ok(FetchResponse::cached(doc));
                }
                FetchState::Failed { reason, status } => {
                    tracing::debug!(uri = %doc, %status, "previously failed");
                    return Err(FetchFailure::new(reason, status));
                }
                _ => {}
            }
        }

        tracing::info!(uri = %doc, force = options.force, "fetching");
        inner.state.mark_requested(&doc);
        inner.events.emit(FetchEvent::Request {
            uri: doc.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });

        let mut request_node = (!options.no_meta).then(|| {
            inner
                .provenance
                .new_request(&doc, uri, options.referring_term.as_ref())
        });
        let deadline = self.deadline(options);
        let first = inner.retry.rewrite(&doc);
        let mut attempt = Attempt {
            target: doc.clone(),
            credentials: options.with_credentials,
            retried_without_credentials: false,
            proxied: first.proxied,
        };
        let mut dial = first.uri;

        loop {
            let request = self.read_request(options, attempt.credentials, deadline);
            if let Some(node) = &request_node {
                inner.provenance.log_status(node, &format!("GET {dial}"));
            }

            let (status, message) = match self.dial(&dial, request, deadline).await {
                Dialed::TimedOut => {
                    return Err(self.fail_fetch(
                        &doc,
                        "Request timed out",
                        FailureCode::Timeout.into(),
                        request_node.as_ref(),
                    ))
                }
                Dialed::Response(response) if response.status != 0 => {
                    return self
                        .handle_response(
                            &doc,
                            &dial,
                            response,
                            request_node.as_ref(),
                            options,
                            deadline,
                        )
                        .await
                }
                Dialed::Response(_) => (
                    FailureStatus::Http(0),
                    format!("Masked failure (status 0) fetching {dial}"),
                ),
                Dialed::Failed(e) => (
                    FailureStatus::Code(FailureCode::Network),
                    format!("Failed to fetch {dial}: {e}"),
                ),
            };

            match inner.retry.decide(&attempt) {
                RetryDecision::Fail => {
                    return Err(self.fail_fetch(&doc, &message, status, request_node.as_ref()))
                }
                RetryDecision::RetryWithoutCredentials => {
                    tracing::warn!(uri = %doc, "{message}; retrying without credentials");
                    attempt.credentials = false;
                    attempt.retried_without_credentials = true;
                }
                RetryDecision::RetryViaProxy(proxied) => {
                    tracing::warn!(
                        uri = %doc,
                        proxy = %proxied,
                        "{message}; retrying through proxy"
                    );
                    attempt.proxied = true;
                    dial = proxied;
                }
            }

            if let Some(old) = request_node.take() {
                inner.provenance.log_status(&old, &format!("{message}; retrying"));
                let new = inner
                    .provenance
                    .new_request(&doc, &dial, options.referring_term.as_ref());
                inner.provenance.link_retry(&old, &new);
                request_node = Some(new);
            }
        }
    }

    /// Fetch several documents concurrently. Results are positional and one
    /// failure never cancels the others.
    pub async fn fetch_all<S: AsRef<str>>(
        &self,
        uris: &[S],
        options: &FetchOptions,
    ) -> Vec<FetchResult> {
        join_all(uris.iter().map(|uri| self.fetch(uri.as_ref(), options))).await
    }

    /// Fetch in the background and hand the outcome to `callback` as
    /// `(ok, message, result)`.
    pub fn now_or_when_fetched<F>(
        &self,
        uri: impl Into<String>,
        options: FetchOptions,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(bool, String, FetchResult) + Send + 'static,
    {
        let fetcher = self.clone();
        let uri = uri.into();
        tokio::spawn(async move {
            let result = fetcher.fetch(&uri, &options).await;
            let (ok, message) = match &result {
                Ok(response) => (true, response.status_text.clone()),
                Err(failure) => (false, failure.error.clone()),
            };
            callback(ok, message, result);
        })
    }

    /// Mark a document loaded and notify listeners.
    pub fn done_fetch(&self, doc: &str, request: Option<&Term>) {
        self.inner.state.mark_fetched(doc);
        if let Some(node) = request {
            self.inner.provenance.log_status(node, "Done.");
        }
        tracing::info!(uri = doc, "fetched");
        self.inner.events.emit(FetchEvent::Done {
            uri: doc.to_string(),
        });
    }

    /// Mark a document failed, record why, notify listeners, and hand back
    /// the failure value.
    pub fn fail_fetch(
        &self,
        doc: &str,
        error: &str,
        status: FailureStatus,
        request: Option<&Term>,
    ) -> FetchFailure {
        self.inner.state.mark_failed(doc, error, status);
        if let Some(node) = request {
            self.inner.provenance.record_error(node, error);
        }
        tracing::warn!(uri = doc, %status, "{error}");
        self.inner.events.emit(FetchEvent::Fail {
            uri: doc.to_string(),
            error: error.to_string(),
            status: status.to_string(),
        });
        FetchFailure::new(error, status)
    }

    fn read_request(
        &self,
        options: &FetchOptions,
        credentials: bool,
        deadline: Instant,
    ) -> TransportRequest {
        let mut request =
            TransportRequest::new(Method::Get).header("Accept", self.inner.accept.clone());
        if options.force {
            request = request.header("Cache-Control", "no-cache");
        }
        request.credentials = credentials;
        request.timeout_hint = Some(deadline.saturating_duration_since(Instant::now()));
        apply_overrides(request, &options.headers)
    }

    /// Race one transport call against the deadline. A call that loses the
    /// race keeps running detached; its result is dropped.
    async fn dial(&self, uri: &str, request: TransportRequest, deadline: Instant) -> Dialed {
        let transport = self.inner.transport.clone();
        let target = uri.to_string();
        let call = tokio::spawn(async move { transport.send(&target, request).await });
        match timeout_at(deadline, call).await {
            Ok(Ok(Ok(response))) => Dialed::Response(response),
            Ok(Ok(Err(TransportError::Timeout))) => Dialed::TimedOut,
            Ok(Ok(Err(e))) => Dialed::Failed(e),
            Ok(Err(join)) => {
                Dialed::Failed(TransportError::Io(format!("transport task failed: {join}")))
            }
            Err(_) => {
                tracing::warn!(uri, "deadline passed; abandoning in-flight request");
                Dialed::TimedOut
            }
        }
    }

    async fn handle_response(
        &self,
        doc: &str,
        dialed: &str,
        response: TransportResponse,
        request_node: Option<&Term>,
        options: &FetchOptions,
        deadline: Instant,
    ) -> FetchResult {
        let inner = &self.inner;
        let response_node =
            request_node.map(|node| inner.provenance.record_response(node, doc, &response));

        // A changed final URL is an HTTP redirect only when the document
        // itself was dialed; a rewritten dial always ends elsewhere.
        let final_doc = if dialed == doc && !response.url.is_empty() {
            uri::document_uri(&response.url)
        } else {
            doc.to_string()
        };
        let redirected = final_doc != doc;

        let declared_type = response.header("content-type").map(str::to_string);
        let content_location = response.header("content-location").map(str::to_string);
        let TransportResponse {
            status,
            status_text,
            headers,
            body,
            ..
        } = response;

        if !(200..300).contains(&status) {
            let text = read_body(body, deadline).await.unwrap_or_default();
            if let Some(node) = &response_node {
                inner.provenance.record_error_body(node, &text);
            }
            if status == 404 {
                inner.state.add_nonexistent(doc);
            }
            let message = format!("HTTP error for {doc}: {status} {status_text}");
            return Err(self.fail_fetch(
                doc,
                message.trim_end(),
                FailureStatus::Http(status),
                request_node,
            ));
        }

        if redirected {
            tracing::debug!(uri = doc, to = %final_doc, "followed HTTP redirect");
            if let Some(node) = request_node {
                inner.provenance.log_status(node, &format!("Redirected to {final_doc}"));
            }
            if !options.no_meta {
                inner.provenance.link_redirect(doc, &final_doc);
            }
        }

        let mut located: Option<String> = None;
        if let Some(location) = content_location {
            let location_doc = uri::document_uri(&uri::join(&final_doc, &location));
            if location_doc != final_doc {
                if inner.state.raw(&location_doc) == Some(TrackedState::Fetched) {
                    tracing::info!(uri = doc, location = %location_doc, "content already loaded");
                    self.done_fetch(doc, request_node);
                    return Ok(FetchResponse {
                        final_uri: location_doc,
                        status,
                        status_text,
                        headers,
                        ..FetchResponse::cached(doc)
                    });
                }
                inner.state.mark_requested(&location_doc);
                located = Some(location_doc);
            }
        }

        let text = match read_body(body, deadline).await {
            Ok(text) => text,
            Err(failure) => {
                return Err(self.fail_fetch(doc, &failure.error, failure.status, request_node))
            }
        };

        let content_type = negotiation::effective_content_type(
            options.force_content_type.as_deref(),
            declared_type.as_deref(),
            &final_doc,
        );
        if !options.no_meta {
            let chain: Vec<&str> = if redirected {
                vec![doc, final_doc.as_str()]
            } else {
                vec![doc]
            };
            inner.provenance.record_documents(&chain, content_type.as_deref());
        }

        let (dialect, statements_added) =
            match self.interpret(&final_doc, content_type.as_deref(), &text, options) {
                Ok(parsed) => parsed,
                Err(failure) => {
                    if let Some(location) = &located {
                        inner.state.clear(location);
                    }
                    return Err(self.fail_fetch(doc, &failure.error, failure.status, request_node));
                }
            };

        inner.state.remove_nonexistent(doc);
        if let Some(location) = &located {
            inner.state.mark_fetched(location);
        }
        self.done_fetch(doc, request_node);
        if redirected {
            inner.state.remove_nonexistent(&final_doc);
            inner.state.mark_fetched(&final_doc);
            inner.state.mark_redirected(doc, &final_doc);
        }

        Ok(FetchResponse {
            uri: doc.to_string(),
            final_uri: final_doc,
            status,
            status_text,
            content_type,
            dialect,
            from_cache: false,
            statements_added,
            headers,
            body: Some(text),
        })
    }

    /// Classify and parse a body into the document's graph. Returns the
    /// settled dialect (if any handler claimed the type) and how many
    /// statements were added.
    fn interpret(
        &self,
        doc: &str,
        content_type: Option<&str>,
        body: &str,
        options: &FetchOptions,
    ) -> Result<(Option<DialectTag>, usize), FetchFailure> {
        let inner = &self.inner;
        let Some(content_type) = content_type else {
            tracing::debug!(uri = doc, "no interpretable content type");
            return Ok((None, 0));
        };
        let Some(declared) = inner.registry.dispatch(content_type) else {
            tracing::debug!(uri = doc, content_type, "no handler for content type");
            return Ok((None, 0));
        };

        let settled = dialect::classify_body(declared, body).map_err(|e| {
            FetchFailure::new(format!("Error parsing {doc}: {e}"), FailureCode::ParseError)
        })?;
        tracing::debug!(uri = doc, %declared, %settled, "dispatching");

        let Some(interpreter) = inner.interpreters.get(settled) else {
            return Ok((Some(settled), 0));
        };
        let target = ParseTarget {
            document: doc.to_string(),
            base: options.base_uri.clone().unwrap_or_else(|| doc.to_string()),
            no_rdfa: options.no_rdfa,
        };
        let triples = interpreter.interpret(&target, body).map_err(|e| {
            FetchFailure::new(
                format!("Error parsing {doc} as {settled}: {e}"),
                FailureCode::ParseError,
            )
        })?;

        let graph = Term::named(doc);
        if options.clear_previous_data {
            let removed = inner.store.remove_statements_with_provenance(&graph);
            tracing::debug!(uri = doc, removed, "cleared previous data");
        }

        // Interpreter blank labels are local to this parse.
        let mut blanks: HashMap<String, Term> = HashMap::new();
        let mut local = |term: Term| match term {
            Term::Blank(label) => blanks
                .entry(label)
                .or_insert_with(|| inner.store.blank_node())
                .clone(),
            other => other,
        };
        let count = triples.len();
        for triple in triples {
            let subject = local(triple.subject);
            let object = local(triple.object);
            inner.store.add(subject, triple.predicate, object, graph.clone());
        }
        Ok((Some(settled), count))
    }

    /// Perform a single non-cached request (`PUT`, `DELETE`, a raw `GET`...).
    /// Fetch state is not consulted or changed.
    pub async fn web_operation(
        &self,
        method: Method,
        uri: &str,
        options: &FetchOptions,
    ) -> FetchResult {
        let doc = uri::document_uri(uri);
        if let Some(failure) = self.reject_scheme(&doc) {
            return Err(failure);
        }
        let deadline = self.deadline(options);

        let mut request = TransportRequest::new(method);
        request.credentials = options.with_credentials;
        request.timeout_hint = Some(deadline.saturating_duration_since(Instant::now()));
        if let Some(body) = &options.body {
            request = request.body(body.clone());
            if let Some(content_type) = &options.content_type {
                request = request.header("Content-Type", content_type.clone());
            }
        } else if method == Method::Get {
            let accept = options
                .content_type
                .clone()
                .unwrap_or_else(|| self.inner.accept.clone());
            request = request.header("Accept", accept);
        }
        let request = apply_overrides(request, &options.headers);

        let dial = self.inner.retry.rewrite(&doc).uri;
        tracing::info!(%method, uri = %doc, "web operation");
        let response = match self.dial(&dial, request, deadline).await {
            Dialed::Response(response) => response,
            Dialed::Failed(e) => {
                return Err(FetchFailure::new(
                    format!("{method} {doc} failed: {e}"),
                    FailureCode::Network,
                ))
            }
            Dialed::TimedOut => {
                return Err(FetchFailure::new("Request timed out", FailureCode::Timeout))
            }
        };

        let content_type = response.header("content-type").map(negotiation::essence);
        let TransportResponse {
            url,
            status,
            status_text,
            headers,
            body,
        } = response;
        let text = read_body(body, deadline).await.unwrap_or_default();
        if !(200..300).contains(&status) {
            let error = format!("{method} {doc} failed: {status} {status_text}");
            tracing::warn!(uri = %doc, status, "{}", error.trim_end());
            return Err(FetchFailure::new(error.trim_end(), status));
        }

        Ok(FetchResponse {
            final_uri: if url.is_empty() {
                doc.clone()
            } else {
                uri::document_uri(&url)
            },
            uri: doc,
            status,
            status_text,
            content_type,
            headers,
            body: Some(text),
            ..FetchResponse::default()
        })
    }

    /// Serialize the document's statements and upload them.
    pub async fn put_back(&self, uri: &str, options: &FetchOptions) -> FetchResult {
        let doc = uri::document_uri(uri);
        let content_type = options
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_WRITE_TYPE.to_string());
        let statements = self
            .inner
            .store
            .match_pattern(None, None, None, Some(&Term::named(&doc)));
        let text = ntriples::serialize(&statements, &content_type).map_err(|e| {
            FetchFailure::new(format!("Cannot write {doc}: {e}"), FailureCode::SerializationError)
        })?;

        let write = FetchOptions {
            body: Some(text.into_bytes()),
            content_type: Some(content_type),
            ..options.clone()
        };
        let response = self.web_operation(Method::Put, &doc, &write).await?;
        tracing::info!(uri = %doc, statements = statements.len(), "written back");
        self.inner.state.remove_nonexistent(&doc);
        self.inner.state.mark_fetched(&doc);
        Ok(response)
    }

    /// Copy a resource: read `from` as `content_type`, write it to `to`.
    pub async fn web_copy(&self, from: &str, to: &str, content_type: &str) -> FetchResult {
        let read = FetchOptions {
            content_type: Some(content_type.to_string()),
            ..FetchOptions::default()
        };
        let source = self.web_operation(Method::Get, from, &read).await?;
        let body = source.body.unwrap_or_default();
        let write = FetchOptions::default().with_body(body, content_type);
        self.web_operation(Method::Put, to, &write).await
    }

    /// Delete a resource; on success it is unloaded and known not to exist.
    pub async fn delete(&self, uri: &str, options: &FetchOptions) -> FetchResult {
        let doc = uri::document_uri(uri);
        let response = self.web_operation(Method::Delete, &doc, options).await?;
        self.unload(&doc);
        self.inner.state.add_nonexistent(&doc);
        self.inner
            .state
            .mark_failed(&doc, &format!("Deleted {doc}"), FailureStatus::Http(404));
        Ok(response)
    }

    /// Fetch a document, creating it with `options.body` (or empty) if the
    /// server says it does not exist.
    pub async fn create_if_not_exists(&self, uri: &str, options: &FetchOptions) -> FetchResult {
        match self.fetch(uri, options).await {
            Err(failure) if failure.status == FailureStatus::Http(404) => {
                let doc = uri::document_uri(uri);
                tracing::info!(uri = %doc, "creating missing document");
                let write = FetchOptions {
                    body: Some(options.body.clone().unwrap_or_default()),
                    content_type: Some(
                        options
                            .content_type
                            .clone()
                            .unwrap_or_else(|| DEFAULT_WRITE_TYPE.to_string()),
                    ),
                    with_credentials: options.with_credentials,
                    ..FetchOptions::default()
                };
                let created = self.web_operation(Method::Put, &doc, &write).await?;
                self.inner.state.clear(&doc);
                self.inner.state.remove_nonexistent(&doc);
                Ok(created)
            }
            other => other,
        }
    }

    /// Fetch every not-yet-looked-up document naming `term` or one of its
    /// aliases.
    pub async fn look_up_thing(
        &self,
        term: &Term,
        referring_term: Option<&Term>,
    ) -> Vec<FetchResult> {
        let mut docs: Vec<String> = Vec::new();
        for alias in self.inner.store.uris_denoting(term) {
            if !self.inner.state.mark_looked_up(&alias) {
                continue;
            }
            let doc = uri::document_uri(&alias);
            if !docs.contains(&doc) {
                docs.push(doc);
            }
        }
        let options = FetchOptions {
            referring_term: referring_term.cloned(),
            ..FetchOptions::default()
        };
        self.fetch_all(&docs, &options).await
    }

    /// Reload a document, replacing its statements.
    pub async fn refresh(&self, uri: &str) -> FetchResult {
        let doc = uri::document_uri(uri);
        self.inner.events.emit(FetchEvent::Refresh { uri: doc.clone() });
        let options = FetchOptions {
            force: true,
            clear_previous_data: true,
            ..FetchOptions::default()
        };
        self.fetch(&doc, &options).await
    }

    /// Remove a document's statements and forget its state, so the next
    /// fetch goes to the network. Follows the document's redirect chain.
    pub fn unload(&self, uri: &str) -> usize {
        let inner = &self.inner;
        let doc = uri::document_uri(uri);
        let mut removed = 0;
        let mut current = doc.clone();
        for _ in 0..=MAX_REDIRECT_HOPS {
            removed += inner
                .store
                .remove_statements_with_provenance(&Term::named(&current));
            let next = match inner.state.raw(&current) {
                Some(TrackedState::Redirected { target }) => Some(target),
                _ => None,
            };
            inner.state.clear(&current);
            inner.state.remove_nonexistent(&current);
            match next {
                Some(target) if target != doc => current = target,
                _ => break,
            }
        }
        tracing::debug!(uri = %doc, removed, "unloaded");
        removed
    }

    /// Like [`Fetcher::unload`], announced to listeners.
    pub fn retract(&self, uri: &str) -> usize {
        let removed = self.unload(uri);
        self.inner.events.emit(FetchEvent::Retract {
            uri: uri::document_uri(uri),
        });
        removed
    }
}
