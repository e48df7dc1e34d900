use serde::{Deserialize, Serialize};

/// Default fetch timeout for [`CacheOptions`].
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Default intersection threshold for [`TrackerOptions`] (10% of the element area).
pub const DEFAULT_REVEAL_THRESHOLD: f32 = 0.1;

/// Configuration for [`crate::QueryCache`].
///
/// Deserializable so hosts can keep it next to the rest of their configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Upper bound for a single collection fetch. `None` waits forever.
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self {
            fetch_timeout_ms: Some(DEFAULT_FETCH_TIMEOUT_MS),
        }
    }

    pub fn with_fetch_timeout_ms(mut self, fetch_timeout_ms: Option<u64>) -> Self {
        self.fetch_timeout_ms = fetch_timeout_ms;
        self
    }
}

/// Configuration handed to viewport observers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    /// Fraction of an element's area that must overlap the viewport before it counts as
    /// intersecting. Clamped to `[0, 1]`.
    pub threshold: f32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerOptions {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_REVEAL_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = if threshold.is_nan() {
            DEFAULT_REVEAL_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    /// The threshold actually used, with out-of-range values from deserialization clamped.
    pub fn effective_threshold(&self) -> f32 {
        if self.threshold.is_nan() {
            DEFAULT_REVEAL_THRESHOLD
        } else {
            self.threshold.clamp(0.0, 1.0)
        }
    }
}
