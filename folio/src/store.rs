//! The document store seam and an in-memory implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{Document, StoreError, StoredDocument};

/// Read access to a document collection store.
///
/// Implementations enumerate every document in a collection. The cache calls this at most once
/// per collection at a time and runs the returned future on a spawned task.
pub trait DocumentStore: Send + Sync + 'static {
    fn list_documents(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send;
}

/// An in-memory [`DocumentStore`].
///
/// Enumeration order is insertion order. Writes go straight to the store and do not notify any
/// cache, the same way an admin console writes to the backing database.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, Vec<StoredDocument>>,
    failures: HashMap<String, StoreError>,
    fetches: HashMap<String, usize>,
    latency_ms: u64,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every listing by `latency_ms`, measured on the Tokio clock.
    pub fn with_latency_ms(self, latency_ms: u64) -> Self {
        self.lock().latency_ms = latency_ms;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a document with a generated id and returns the id.
    ///
    /// Generated ids skip any id already present in `collection`.
    pub fn insert(&self, collection: &str, fields: Document) -> String {
        let mut state = self.lock();
        let MemoryState {
            collections,
            next_id,
            ..
        } = &mut *state;
        let docs = collections.entry(collection.to_string()).or_default();
        let id = loop {
            *next_id += 1;
            let id = format!("doc-{next_id}");
            if !docs.iter().any(|d| d.id == id) {
                break id;
            }
        };
        docs.push(StoredDocument::new(id.clone(), fields));
        id
    }

    /// Adds or replaces a document under a caller-chosen id.
    pub fn insert_with_id(&self, collection: &str, id: &str, fields: Document) {
        let mut state = self.lock();
        let docs = state.collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(StoredDocument::new(id, fields)),
        }
    }

    /// Merges `fields` into an existing document.
    pub fn update(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut state = self.lock();
        let doc = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.fields.extend(fields);
        Ok(())
    }

    /// Removes a document. Returns `true` if it existed.
    pub fn delete(&self, collection: &str, id: &str) -> bool {
        let mut state = self.lock();
        let Some(docs) = state.collections.get_mut(collection) else {
            return false;
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        docs.len() != before
    }

    /// Makes every listing of `collection` fail with `err` until [`Self::clear_failure`].
    pub fn fail_with(&self, collection: &str, err: StoreError) {
        self.lock().failures.insert(collection.to_string(), err);
    }

    pub fn clear_failure(&self, collection: &str) {
        self.lock().failures.remove(collection);
    }

    /// Number of listings requested for `collection`, failed ones included.
    pub fn fetch_count(&self, collection: &str) -> usize {
        self.lock().fetches.get(collection).copied().unwrap_or(0)
    }

    pub fn len(&self, collection: &str) -> usize {
        self.lock().collections.get(collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl DocumentStore for MemoryStore {
    fn list_documents(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<StoredDocument>, StoreError>> + Send {
        let (latency_ms, outcome) = {
            let mut state = self.lock();
            *state.fetches.entry(collection.to_string()).or_default() += 1;
            let outcome = match state.failures.get(collection) {
                Some(err) => Err(err.clone()),
                None => Ok(state
                    .collections
                    .get(collection)
                    .cloned()
                    .unwrap_or_default()),
            };
            (state.latency_ms, outcome)
        };

        async move {
            if latency_ms > 0 {
                tokio::time::sleep(Duration::from_millis(latency_ms)).await;
            }
            outcome
        }
    }
}
