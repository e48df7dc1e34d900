//! Error types for store access, fetches, and viewport observation.

/// Errors reported by a [`crate::DocumentStore`] implementation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (network or connectivity failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to read or write the collection.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A write targeted a document that does not exist.
    #[error("document {id} not found in collection {collection}")]
    NotFound { collection: String, id: String },

    /// The store answered with something that is not a document listing.
    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Why a collection fetch failed.
///
/// Surfaced to consumers through [`crate::QueryResult::error`]; the cache never retries on its
/// own.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("fetching collection {collection} timed out after {after_ms} ms")]
    TimedOut { collection: String, after_ms: u64 },

    /// Two documents in one listing share an id.
    #[error("collection {collection} returned duplicate document id {id}")]
    DuplicateId { collection: String, id: String },

    #[error("collection name must not be empty")]
    InvalidCollection,

    /// The fetch task ended without an outcome: the store panicked or the task was dropped.
    #[error("fetch of collection {collection} ended before completing")]
    Aborted { collection: String },

    /// `query` was called outside of a Tokio runtime, so there is nothing to run the fetch on.
    #[error("no async runtime available to run the fetch")]
    RuntimeUnavailable,
}

impl FetchError {
    /// Returns the underlying store error, if the failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// The host cannot provide viewport intersection observation.
///
/// Reveal logic degrades to "everything visible" when it sees this.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("viewport observation unavailable: {reason}")]
pub struct ObservationUnavailable {
    pub reason: String,
}

impl ObservationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
