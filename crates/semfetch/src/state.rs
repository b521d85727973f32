// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-document fetch state, owned by one fetcher.
//!
//! The tracker is the single source of truth for "has this been fetched,
//! and with what outcome". It is mutated only when a request completes.

use crate::types::FailureStatus;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// How far [`StateTracker::get_state`] follows redirects.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Raw tracked value for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackedState {
    Requested,
    Fetched,
    Failed { reason: String, status: FailureStatus },
    Redirected { target: String },
}

/// What callers see for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    Unrequested,
    Requested,
    Fetched,
    Failed { reason: String, status: FailureStatus },
    /// Only reported when the redirect chain had to be truncated.
    Redirected { target: String },
}

impl From<TrackedState> for FetchState {
    fn from(state: TrackedState) -> Self {
        match state {
            TrackedState::Requested => FetchState::Requested,
            TrackedState::Fetched => FetchState::Fetched,
            TrackedState::Failed { reason, status } => FetchState::Failed { reason, status },
            TrackedState::Redirected { target } => FetchState::Redirected { target },
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    states: HashMap<String, TrackedState>,
    nonexistent: HashSet<String>,
    looked_up: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct StateTracker {
    inner: Mutex<Inner>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the maps half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn raw(&self, doc: &str) -> Option<TrackedState> {
        self.lock().states.get(doc).cloned()
    }

    pub fn set(&self, doc: &str, state: TrackedState) {
        self.lock().states.insert(doc.to_string(), state);
    }

    pub fn mark_requested(&self, doc: &str) {
        self.set(doc, TrackedState::Requested);
    }

    pub fn mark_fetched(&self, doc: &str) {
        self.set(doc, TrackedState::Fetched);
    }

    pub fn mark_failed(&self, doc: &str, reason: &str, status: FailureStatus) {
        self.set(
            doc,
            TrackedState::Failed {
                reason: reason.to_string(),
                status,
            },
        );
    }

    pub fn mark_redirected(&self, doc: &str, target: &str) {
        self.set(
            doc,
            TrackedState::Redirected {
                target: target.to_string(),
            },
        );
    }

    pub fn clear(&self, doc: &str) {
        self.lock().states.remove(doc);
    }

    /// Symbolic state, following redirects up to [`MAX_REDIRECT_HOPS`].
    ///
    /// A cycle or an over-long chain is truncated: the last redirect seen is
    /// reported as-is.
    pub fn get_state(&self, doc: &str) -> FetchState {
        let inner = self.lock();
        let mut current = doc.to_string();
        let mut seen = HashSet::new();
        for _ in 0..=MAX_REDIRECT_HOPS {
            let Some(state) = inner.states.get(&current) else {
                return FetchState::Unrequested;
            };
            match state {
                TrackedState::Redirected { target } => {
                    seen.insert(current.clone());
                    if seen.contains(target) {
                        tracing::warn!(uri = doc, at = %current, "redirect cycle; truncating");
                        return state.clone().into();
                    }
                    current = target.clone();
                }
                other => return other.clone().into(),
            }
        }
        tracing::warn!(uri = doc, hops = MAX_REDIRECT_HOPS, "redirect chain too long; truncating");
        FetchState::Redirected { target: current }
    }

    pub fn add_nonexistent(&self, doc: &str) {
        self.lock().nonexistent.insert(doc.to_string());
    }

    pub fn remove_nonexistent(&self, doc: &str) {
        self.lock().nonexistent.remove(doc);
    }

    pub fn is_nonexistent(&self, doc: &str) -> bool {
        self.lock().nonexistent.contains(doc)
    }

    /// Record a lookup; returns `false` if it was already recorded.
    pub fn mark_looked_up(&self, uri: &str) -> bool {
        self.lock().looked_up.insert(uri.to_string())
    }
}
