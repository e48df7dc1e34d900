use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::mpsc::{Receiver, Sender, channel};

use serde::{Deserialize, Serialize};

/// Identity of a rendered list.
///
/// Whenever the list a tracker follows changes identity (new data, a different filter), the
/// host moves to a new version and the tracker starts over.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ListVersion(pub u64);

impl ListVersion {
    pub const INITIAL: Self = Self(0);

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A single "element `key` did (not) intersect the viewport" notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntersectionEvent<K> {
    /// The list version the observer was created for.
    pub version: ListVersion,
    pub key: K,
    pub is_intersecting: bool,
}

/// The sending half handed to viewport observers.
///
/// Every event is stamped with the list version that was current when the sink was created, so
/// late callbacks from a torn-down observer cannot leak into the next list.
pub struct EventSink<K> {
    tx: Sender<IntersectionEvent<K>>,
    version: ListVersion,
}

impl<K> Clone for EventSink<K> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            version: self.version,
        }
    }
}

impl<K> fmt::Debug for EventSink<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<K> EventSink<K> {
    pub fn version(&self) -> ListVersion {
        self.version
    }

    /// Queues an event. Returns `false` if the tracker is gone.
    pub fn notify(&self, key: K, is_intersecting: bool) -> bool {
        self.tx
            .send(IntersectionEvent {
                version: self.version,
                key,
                is_intersecting,
            })
            .is_ok()
    }

    pub fn entered(&self, key: K) -> bool {
        self.notify(key, true)
    }
}

/// Keys that have intersected the viewport at least once, in first-observed order.
///
/// Read-only outside the tracker: entries are only ever added by intersection events and only
/// ever removed all at once when the list identity changes.
#[derive(Clone)]
pub struct VisibilitySet<K> {
    order: Vec<K>,
    members: HashSet<K>,
}

impl<K> Default for VisibilitySet<K> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for VisibilitySet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.order.iter()).finish()
    }
}

impl<K: PartialEq> PartialEq for VisibilitySet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl<K: Hash + Eq + Clone> VisibilitySet<K> {
    fn insert(&mut self, key: K) -> bool {
        if !self.members.insert(key.clone()) {
            return false;
        }
        self.order.push(key);
        true
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn contains(&self, key: &K) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, K> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.order
    }
}

impl<'a, K> IntoIterator for &'a VisibilitySet<K> {
    type Item = &'a K;
    type IntoIter = core::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

/// Folds intersection events into a growing [`VisibilitySet`].
///
/// This type does not observe anything itself. Observers push events through an [`EventSink`]
/// obtained from [`sink`](Self::sink); the host calls [`pump`](Self::pump) (e.g. once per frame)
/// to fold whatever arrived. Keys are usually list indices (`usize`), but any hashable key works,
/// e.g. section ids.
///
/// The set only grows for a given [`ListVersion`]. [`sync`](Self::sync) with a different version
/// empties it, and events stamped with any other version are ignored.
pub struct VisibilityTracker<K = usize> {
    version: ListVersion,
    visible: VisibilitySet<K>,
    tx: Sender<IntersectionEvent<K>>,
    rx: Receiver<IntersectionEvent<K>>,
}

impl<K: Hash + Eq + Clone> Default for VisibilityTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for VisibilityTracker<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityTracker")
            .field("version", &self.version)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl<K: Hash + Eq + Clone> VisibilityTracker<K> {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            version: ListVersion::INITIAL,
            visible: VisibilitySet::default(),
            tx,
            rx,
        }
    }

    pub fn version(&self) -> ListVersion {
        self.version
    }

    /// Moves to `version`. If it differs from the current one, the set is emptied.
    ///
    /// Returns `true` when a reset happened.
    pub fn sync(&mut self, version: ListVersion) -> bool {
        if version == self.version {
            return false;
        }
        fdebug!(
            from = self.version.0,
            to = version.0,
            dropped = self.visible.len(),
            "VisibilityTracker: list identity changed"
        );
        self.version = version;
        self.visible.clear();
        true
    }

    /// Empties the set by advancing to the next version.
    pub fn reset(&mut self) -> ListVersion {
        let next = self.version.next();
        self.sync(next);
        next
    }

    /// A sink whose events count for the current version.
    pub fn sink(&self) -> EventSink<K> {
        EventSink {
            tx: self.tx.clone(),
            version: self.version,
        }
    }

    /// Folds one event. Returns `true` if it revealed a new key.
    pub fn apply(&mut self, event: IntersectionEvent<K>) -> bool {
        if event.version != self.version {
            ftrace!(
                event_version = event.version.0,
                current = self.version.0,
                "VisibilityTracker: dropping event from a previous list"
            );
            return false;
        }
        if !event.is_intersecting {
            return false;
        }
        self.visible.insert(event.key)
    }

    /// Folds every queued event, in delivery order. Returns how many keys were newly revealed.
    pub fn pump(&mut self) -> usize {
        let mut revealed = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.apply(event) {
                revealed += 1;
            }
        }
        revealed
    }

    /// Marks every key as visible without waiting for events.
    pub fn reveal_all(&mut self, keys: impl IntoIterator<Item = K>) -> usize {
        let mut revealed = 0;
        for key in keys {
            if self.visible.insert(key) {
                revealed += 1;
            }
        }
        revealed
    }

    pub fn visible(&self) -> &VisibilitySet<K> {
        &self.visible
    }

    pub fn is_visible(&self, key: &K) -> bool {
        self.visible.contains(key)
    }
}
