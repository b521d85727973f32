// Copyright 2026 Semfetch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Semfetch: a linked-data document fetcher.
//!
//! Given a URI, the [`Fetcher`] negotiates a representation, works out what
//! dialect the bytes really are, hands them to the matching interpreter and
//! records the outcome (and its provenance) so repeat requests are cheap and
//! traceable.

pub mod config;
pub mod dialect;
pub mod events;
pub mod fetcher;
pub mod negotiation;
pub mod provenance;
pub mod retry;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;
pub mod uri;

pub use config::{ConfigError, FetcherConfig};
pub use dialect::{DialectTag, HandlerRegistry, InterpreterTable, ParseError};
pub use events::{EventBus, FetchEvent, FetchEventKind};
pub use fetcher::Fetcher;
pub use state::{FetchState, StateTracker};
pub use store::{MemoryStore, Statement, Store, Term, Triple};
pub use transport::{HttpTransport, Method, Transport, TransportError};
pub use types::{FailureCode, FailureStatus, FetchFailure, FetchOptions, FetchResponse, FetchResult};
