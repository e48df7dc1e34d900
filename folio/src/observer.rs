use crate::{EventSink, ObservationUnavailable, TrackerOptions};

/// A live viewport-intersection observation, as provided by the host.
///
/// `H` is whatever the host uses to refer to a rendered element.
pub trait ViewportObserver<K, H: ?Sized> {
    /// Starts watching `element`. Its intersection changes are reported for `key`.
    fn observe(&mut self, key: K, element: &H);

    /// Stops all observation. No events may be sent after this returns.
    fn disconnect(&mut self);
}

/// Creates viewport observers that report through an [`EventSink`].
pub trait ObserverFactory<K, H: ?Sized> {
    type Observer: ViewportObserver<K, H>;

    fn create(
        &mut self,
        sink: EventSink<K>,
        options: &TrackerOptions,
    ) -> Result<Self::Observer, ObservationUnavailable>;
}

/// A factory for environments without intersection observation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unobservable;

/// The observer type of [`Unobservable`]. Never constructed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl<K, H: ?Sized> ViewportObserver<K, H> for NoopObserver {
    fn observe(&mut self, _key: K, _element: &H) {}

    fn disconnect(&mut self) {}
}

impl<K, H: ?Sized> ObserverFactory<K, H> for Unobservable {
    type Observer = NoopObserver;

    fn create(
        &mut self,
        _sink: EventSink<K>,
        _options: &TrackerOptions,
    ) -> Result<NoopObserver, ObservationUnavailable> {
        Err(ObservationUnavailable::new(
            "host has no viewport intersection support",
        ))
    }
}
