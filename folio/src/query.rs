use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use crate::{CacheOptions, Collection, DocumentStore, FetchError, StoredDocument};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    Pending,
    Success,
    Error,
}

impl QueryStatus {
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    pub fn is_settled(self) -> bool {
        self != Self::Pending
    }
}

/// The outcome of fetching one collection, shaped for consumers of collection `C`.
///
/// `generation` identifies the fetch that produced (or is producing) this result. Every fetch
/// gets a new generation.
///
/// While a refetch is pending, and after a refetch fails, `data` still holds the documents of
/// the last successful fetch. `data_generation` is the generation of that fetch (0 before any
/// fetch succeeded); it only moves when `data` is replaced, so it is what a list identity should
/// be derived from.
#[derive(Clone, Debug)]
pub struct QueryResult<T> {
    pub collection: &'static str,
    pub generation: u64,
    pub data_generation: u64,
    pub status: QueryStatus,
    pub data: Vec<T>,
    pub error: Option<Arc<FetchError>>,
}

impl<T> QueryResult<T> {
    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

/// Untyped cache entry state shared between the fetch task and every handle.
#[derive(Clone, Debug)]
struct Snapshot {
    collection: &'static str,
    generation: u64,
    data_generation: u64,
    status: QueryStatus,
    documents: Arc<[StoredDocument]>,
    error: Option<Arc<FetchError>>,
}

impl Snapshot {
    fn empty(collection: &'static str) -> Self {
        Self {
            collection,
            generation: 0,
            data_generation: 0,
            status: QueryStatus::Pending,
            documents: Arc::from(Vec::new()),
            error: None,
        }
    }

    fn failed(collection: &'static str, err: FetchError) -> Self {
        Self {
            status: QueryStatus::Error,
            error: Some(Arc::new(err)),
            ..Self::empty(collection)
        }
    }

    fn shape<C: Collection>(&self) -> QueryResult<C::Item> {
        QueryResult {
            collection: self.collection,
            generation: self.generation,
            data_generation: self.data_generation,
            status: self.status,
            data: self.documents.iter().map(C::shape).collect(),
            error: self.error.clone(),
        }
    }
}

struct Entry {
    tx: watch::Sender<Snapshot>,
    in_flight: bool,
    stale: bool,
}

impl Entry {
    fn new(collection: &'static str) -> Self {
        let (tx, _) = watch::channel(Snapshot::empty(collection));
        Self {
            tx,
            in_flight: false,
            stale: false,
        }
    }

    fn needs_fetch(&self) -> bool {
        !self.in_flight && (self.stale || self.tx.borrow().status != QueryStatus::Success)
    }

    fn begin(&mut self, generation: u64) {
        self.in_flight = true;
        self.stale = false;
        self.tx.send_modify(|snapshot| {
            snapshot.generation = generation;
            snapshot.status = QueryStatus::Pending;
            snapshot.error = None;
        });
    }
}

struct Shared<S> {
    store: S,
    options: CacheOptions,
    entries: Mutex<HashMap<&'static str, Entry>>,
    generations: AtomicU64,
}

impl<S> Shared<S> {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<&'static str, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(
        &self,
        collection: &'static str,
        generation: u64,
        outcome: Result<Vec<StoredDocument>, FetchError>,
    ) {
        let mut entries = self.lock_entries();
        let Some(entry) = entries.get_mut(collection) else {
            return;
        };
        debug_assert_eq!(entry.tx.borrow().generation, generation);
        entry.in_flight = false;

        match outcome {
            Ok(documents) => {
                fdebug!(
                    collection,
                    generation,
                    count = documents.len(),
                    "QueryCache: fetch succeeded"
                );
                entry.tx.send_modify(|snapshot| {
                    snapshot.status = QueryStatus::Success;
                    snapshot.data_generation = generation;
                    snapshot.documents = Arc::from(documents);
                    snapshot.error = None;
                });
            }
            Err(err) => {
                fwarn!(collection, generation, error = %err, "QueryCache: fetch failed");
                entry.tx.send_modify(|snapshot| {
                    snapshot.status = QueryStatus::Error;
                    snapshot.error = Some(Arc::new(err));
                });
            }
        }
    }
}

impl<S: DocumentStore> Shared<S> {
    async fn fetch(&self, collection: &'static str) -> Result<Vec<StoredDocument>, FetchError> {
        let listing = self.store.list_documents(collection);
        let documents = match self.options.fetch_timeout_ms {
            Some(after_ms) => tokio::time::timeout(Duration::from_millis(after_ms), listing)
                .await
                .map_err(|_| FetchError::TimedOut {
                    collection: collection.to_string(),
                    after_ms,
                })??,
            None => listing.await?,
        };
        ensure_unique_ids(collection, &documents)?;
        Ok(documents)
    }
}

fn ensure_unique_ids(collection: &str, documents: &[StoredDocument]) -> Result<(), FetchError> {
    let mut seen = HashSet::with_capacity(documents.len());
    for doc in documents {
        if !seen.insert(doc.id.as_str()) {
            return Err(FetchError::DuplicateId {
                collection: collection.to_string(),
                id: doc.id.clone(),
            });
        }
    }
    Ok(())
}

/// A read-through cache over a [`DocumentStore`], keyed by collection.
///
/// - The first [`query`](Self::query) for a collection starts exactly one fetch of the whole
///   collection; queries issued while it is in flight share it.
/// - Successful results are served from the cache until invalidated.
/// - A failed result is kept until the next `query` for that collection, which fetches again.
///   Nothing is retried automatically.
/// - Dropping a [`QueryHandle`] only stops updates to that handle; the fetch keeps running for
///   everyone else.
///
/// Fetches run as tasks on the ambient Tokio runtime. Cloning is cheap: clones share the same
/// entries, so create one cache per process and hand clones to consumers.
pub struct QueryCache<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for QueryCache<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for QueryCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.shared.lock_entries();
        let mut collections: Vec<_> = entries.keys().copied().collect();
        collections.sort_unstable();
        f.debug_struct("QueryCache")
            .field("options", &self.shared.options)
            .field("collections", &collections)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> QueryCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, CacheOptions::default())
    }

    pub fn with_options(store: S, options: CacheOptions) -> Self {
        fdebug!(
            fetch_timeout_ms = ?options.fetch_timeout_ms,
            "QueryCache::new"
        );
        Self {
            shared: Arc::new(Shared {
                store,
                options,
                entries: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.shared.options
    }

    pub fn store(&self) -> &S {
        &self.shared.store
    }

    /// Subscribes to collection `C`, starting a fetch if there is no usable cached result.
    ///
    /// Returns immediately. A cached success is visible through [`QueryHandle::current`] right
    /// away; otherwise the handle reports `Pending` until the fetch settles.
    pub fn query<C: Collection>(&self) -> QueryHandle<C> {
        QueryHandle::new(self.subscribe(C::NAME))
    }

    /// Queries `C` and waits for the result to settle.
    pub async fn fetch<C: Collection>(&self) -> QueryResult<C::Item> {
        self.query::<C>().settled().await
    }

    /// Returns the cached result for `C` without starting a fetch.
    pub fn cached<C: Collection>(&self) -> Option<QueryResult<C::Item>> {
        let entries = self.shared.lock_entries();
        entries.get(C::NAME).map(|entry| entry.tx.borrow().shape::<C>())
    }

    pub fn is_in_flight<C: Collection>(&self) -> bool {
        let entries = self.shared.lock_entries();
        entries.get(C::NAME).is_some_and(|entry| entry.in_flight)
    }

    /// Marks `C` stale so the next [`query`](Self::query) fetches again.
    ///
    /// Returns `false` if nothing was cached for `C`.
    pub fn invalidate<C: Collection>(&self) -> bool {
        self.invalidate_collection(C::NAME)
    }

    /// Like [`invalidate`](Self::invalidate), by store-side name.
    ///
    /// An in-flight fetch is not cancelled: it still publishes its result, and the entry stays
    /// stale afterwards.
    pub fn invalidate_collection(&self, collection: &str) -> bool {
        let mut entries = self.shared.lock_entries();
        let Some(entry) = entries.get_mut(collection) else {
            return false;
        };
        entry.stale = true;
        fdebug!(collection, "QueryCache: invalidated");
        true
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.shared.lock_entries();
        for entry in entries.values_mut() {
            entry.stale = true;
        }
        fdebug!(count = entries.len(), "QueryCache: invalidated all");
    }

    /// Manual refresh: invalidates `C` and queries it again.
    ///
    /// If a fetch for `C` is already in flight, the returned handle follows that fetch.
    pub fn refetch<C: Collection>(&self) -> QueryHandle<C> {
        self.invalidate::<C>();
        self.query::<C>()
    }

    fn subscribe(&self, collection: &'static str) -> watch::Receiver<Snapshot> {
        if collection.is_empty() {
            fwarn!("QueryCache: query for an empty collection name");
            let (_, rx) = watch::channel(Snapshot::failed(collection, FetchError::InvalidCollection));
            return rx;
        }

        let (rx, started) = {
            let mut entries = self.shared.lock_entries();
            let entry = entries
                .entry(collection)
                .or_insert_with(|| Entry::new(collection));
            let started = if entry.needs_fetch() {
                let generation = self.shared.generations.fetch_add(1, Ordering::Relaxed) + 1;
                entry.begin(generation);
                Some(generation)
            } else {
                None
            };
            (entry.tx.subscribe(), started)
        };

        if let Some(generation) = started {
            self.spawn_fetch(collection, generation);
        }
        rx
    }

    fn spawn_fetch(&self, collection: &'static str, generation: u64) {
        fdebug!(collection, generation, "QueryCache: fetch started");
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.shared
                .complete(collection, generation, Err(FetchError::RuntimeUnavailable));
            return;
        };

        let in_flight = InFlight {
            shared: Arc::clone(&self.shared),
            collection,
            generation,
            done: false,
        };
        runtime.spawn(async move {
            let outcome = in_flight.shared.fetch(collection).await;
            in_flight.finish(outcome);
        });
    }
}

/// Owned by a fetch task. If the task goes away without publishing (the store panicked, or the
/// runtime dropped the task), the entry is completed with [`FetchError::Aborted`] so the next
/// query can fetch again.
struct InFlight<S> {
    shared: Arc<Shared<S>>,
    collection: &'static str,
    generation: u64,
    done: bool,
}

impl<S> InFlight<S> {
    fn finish(mut self, outcome: Result<Vec<StoredDocument>, FetchError>) {
        self.done = true;
        self.shared.complete(self.collection, self.generation, outcome);
    }
}

impl<S> Drop for InFlight<S> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.shared.complete(
            self.collection,
            self.generation,
            Err(FetchError::Aborted {
                collection: self.collection.to_string(),
            }),
        );
    }
}

/// A subscription to one collection in a [`QueryCache`].
///
/// Dropping the handle unsubscribes. It never cancels the underlying fetch.
pub struct QueryHandle<C: Collection> {
    rx: watch::Receiver<Snapshot>,
    _collection: PhantomData<fn() -> C>,
}

impl<C: Collection> Clone for QueryHandle<C> {
    fn clone(&self) -> Self {
        Self::new(self.rx.clone())
    }
}

impl<C: Collection> fmt::Debug for QueryHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.rx.borrow();
        f.debug_struct("QueryHandle")
            .field("collection", &snapshot.collection)
            .field("generation", &snapshot.generation)
            .field("status", &snapshot.status)
            .field("len", &snapshot.documents.len())
            .finish()
    }
}

impl<C: Collection> QueryHandle<C> {
    fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self {
            rx,
            _collection: PhantomData,
        }
    }

    pub fn current(&self) -> QueryResult<C::Item> {
        self.rx.borrow().shape::<C>()
    }

    pub fn status(&self) -> QueryStatus {
        self.rx.borrow().status
    }

    pub fn generation(&self) -> u64 {
        self.rx.borrow().generation
    }

    /// Whether the entry changed since this handle last looked at it via [`Self::changed`].
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Waits for the next update of the entry.
    ///
    /// Returns `None` once no further updates can arrive.
    pub async fn changed(&mut self) -> Option<QueryResult<C::Item>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().shape::<C>())
    }

    /// Waits until the entry is no longer pending and returns that result.
    pub async fn settled(&mut self) -> QueryResult<C::Item> {
        let settled = match self.rx.wait_for(|s| s.status.is_settled()).await {
            Ok(snapshot) => Some(snapshot.shape::<C>()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.current())
    }
}
