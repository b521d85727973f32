// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fetch lifecycle events.
//!
//! The [`EventBus`] is a `tokio::sync::broadcast` channel carrying
//! [`FetchEvent`] values. Any number of observers can subscribe; when none
//! exist, events are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffer used by [`EventBus::default`].
pub const DEFAULT_CAPACITY: usize = 256;

/// Every lifecycle notification the fetcher emits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FetchEvent {
    /// A request is about to be dialed.
    Request { uri: String, timestamp: String },
    /// A fetch settled with a failure.
    Fail {
        uri: String,
        error: String,
        status: String,
    },
    /// A fetch settled successfully.
    Done { uri: String },
    /// A document is being reloaded from the network.
    Refresh { uri: String },
    /// A document's statements were removed from the store.
    Retract { uri: String },
}

/// Discriminant of [`FetchEvent`], for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchEventKind {
    Request,
    Fail,
    Done,
    Refresh,
    Retract,
}

impl FetchEvent {
    pub fn kind(&self) -> FetchEventKind {
        match self {
            FetchEvent::Request { .. } => FetchEventKind::Request,
            FetchEvent::Fail { .. } => FetchEventKind::Fail,
            FetchEvent::Done { .. } => FetchEventKind::Done,
            FetchEvent::Refresh { .. } => FetchEventKind::Refresh,
            FetchEvent::Retract { .. } => FetchEventKind::Retract,
        }
    }

    /// The document the event is about.
    pub fn uri(&self) -> &str {
        match self {
            FetchEvent::Request { uri, .. }
            | FetchEvent::Fail { uri, .. }
            | FetchEvent::Done { uri }
            | FetchEvent::Refresh { uri }
            | FetchEvent::Retract { uri } => uri,
        }
    }
}

pub struct EventBus {
    sender: broadcast::Sender<FetchEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit to all subscribers. Silently ignores a missing audience.
    pub fn emit(&self, event: FetchEvent) {
        tracing::trace!(kind = ?event.kind(), uri = event.uri(), "fetch event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FetchEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
