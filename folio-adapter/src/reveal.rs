use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;

use folio::{
    ListVersion, ObserverFactory, TrackerOptions, ViewportObserver, VisibilitySet,
    VisibilityTracker,
};

/// A framework-neutral controller that owns the observe/teardown lifecycle of one revealed list.
///
/// This type does not hold any UI objects beyond the borrowed element handles passed to
/// [`sync`](Self::sync). Adapters drive it by calling:
/// - `sync(version, elements)` after every render of the list
/// - `pump()` each frame/tick, then reading `is_visible` to decide which items animate in
///
/// When the host cannot observe the viewport, every listed item is revealed immediately instead.
pub struct RevealController<K, H: ?Sized, F: ObserverFactory<K, H>> {
    tracker: VisibilityTracker<K>,
    factory: F,
    observer: Option<F::Observer>,
    options: TrackerOptions,
    degraded: bool,
    _element: PhantomData<fn(&H)>,
}

impl<K, H, F> fmt::Debug for RevealController<K, H, F>
where
    K: fmt::Debug,
    H: ?Sized,
    F: ObserverFactory<K, H>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealController")
            .field("tracker", &self.tracker)
            .field("attached", &self.observer.is_some())
            .field("options", &self.options)
            .field("degraded", &self.degraded)
            .finish_non_exhaustive()
    }
}

impl<K, H, F> RevealController<K, H, F>
where
    H: ?Sized,
    F: ObserverFactory<K, H>,
{
    /// Disconnects the current observer, if any. The revealed set is kept.
    pub fn teardown(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.observer.is_some()
    }

    /// Whether the last attach fell back to revealing everything.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<K, H, F> RevealController<K, H, F>
where
    K: Hash + Eq + Clone,
    H: ?Sized,
    F: ObserverFactory<K, H>,
{
    pub fn new(factory: F) -> Self {
        Self::with_options(factory, TrackerOptions::default())
    }

    pub fn with_options(factory: F, options: TrackerOptions) -> Self {
        Self {
            tracker: VisibilityTracker::new(),
            factory,
            observer: None,
            options,
            degraded: false,
            _element: PhantomData,
        }
    }

    /// Re-attaches observation to the elements of the list identified by `version`.
    ///
    /// The previous observer is always disconnected first. If `version` differs from the last
    /// one, the revealed set starts over. Elements that are not rendered yet (`None`) are
    /// skipped. An empty list attaches nothing.
    ///
    /// Returns the number of elements now being observed.
    pub fn sync<'a>(
        &mut self,
        version: ListVersion,
        elements: impl IntoIterator<Item = (K, Option<&'a H>)>,
    ) -> usize
    where
        H: 'a,
    {
        self.teardown();
        self.tracker.sync(version);

        let mut elements = elements.into_iter().peekable();
        if elements.peek().is_none() {
            return 0;
        }

        let threshold = self.options.effective_threshold();
        let options = TrackerOptions { threshold };
        match self.factory.create(self.tracker.sink(), &options) {
            Ok(mut observer) => {
                self.degraded = false;
                let mut observed = 0;
                for (key, element) in elements {
                    if let Some(element) = element {
                        observer.observe(key, element);
                        observed += 1;
                    }
                }
                fdebug!(
                    version = version.0,
                    observed,
                    threshold,
                    "RevealController: attached"
                );
                self.observer = Some(observer);
                observed
            }
            Err(_err) => {
                if !self.degraded {
                    fwarn!(error = %_err, "RevealController: revealing everything");
                }
                self.degraded = true;
                self.tracker.reveal_all(elements.map(|(key, _)| key));
                0
            }
        }
    }

    /// Folds queued intersection events. Returns how many items were newly revealed.
    pub fn pump(&mut self) -> usize {
        self.tracker.pump()
    }

    pub fn version(&self) -> ListVersion {
        self.tracker.version()
    }

    pub fn visible(&self) -> &VisibilitySet<K> {
        self.tracker.visible()
    }

    pub fn is_visible(&self, key: &K) -> bool {
        self.tracker.is_visible(key)
    }

    pub fn tracker(&self) -> &VisibilityTracker<K> {
        &self.tracker
    }
}

impl<K, H, F> Drop for RevealController<K, H, F>
where
    H: ?Sized,
    F: ObserverFactory<K, H>,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
