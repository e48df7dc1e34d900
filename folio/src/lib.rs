//! A headless data layer for showcase-style sites.
//!
//! Two independent pieces:
//!
//! - [`QueryCache`]: a read-through cache over a document collection store. Each collection is
//!   fetched once, concurrent requests share the in-flight fetch, and results are published to
//!   any number of subscribers with pending/success/error status.
//! - [`VisibilityTracker`]: folds viewport-intersection events into a set of revealed keys that
//!   only grows until the list it tracks changes identity. Used to drive progressive reveal.
//!
//! It is UI-agnostic. A host is expected to provide:
//! - a [`DocumentStore`] implementation (the backing database)
//! - an [`ObserverFactory`] (viewport intersection), or [`Unobservable`] when there is none
//! - a Tokio runtime to run fetches on
//!
//! For adapter-level utilities (reveal controller, typed portfolio records, filtering), see the
//! `folio-adapter` crate.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod collection;
mod document;
mod error;
mod observer;
mod options;
mod query;
mod store;
mod visibility;


pub use collection::{Collection, Projects, Startups, User};
pub use document::{Document, Keyed, StoredDocument};
pub use error::{FetchError, ObservationUnavailable, StoreError};
pub use observer::{NoopObserver, ObserverFactory, Unobservable, ViewportObserver};
pub use options::{
    CacheOptions, DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_REVEAL_THRESHOLD, TrackerOptions,
};
pub use query::{QueryCache, QueryHandle, QueryResult, QueryStatus};
pub use store::{DocumentStore, MemoryStore};
pub use visibility::{EventSink, IntersectionEvent, ListVersion, VisibilitySet, VisibilityTracker};
