//! Single-value cache with a time-to-live.

use std::future::Future;
use std::time::{Duration, Instant};

/// One cached value, the instant it was stored, and how long it stays fresh.
///
/// Owned by whoever needs it; there is no process-wide instance.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    value: Option<T>,
    timestamp: Option<Instant>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: None,
            timestamp: None,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// When the current value was stored.
    pub fn timestamp(&self) -> Option<Instant> {
        self.timestamp
    }

    pub fn is_fresh(&self) -> bool {
        self.value.is_some() && self.timestamp.is_some_and(|t| t.elapsed() < self.ttl)
    }

    /// The cached value, only while fresh.
    pub fn get(&self) -> Option<&T> {
        if self.is_fresh() { self.value.as_ref() } else { None }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
        self.timestamp = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.value = None;
        self.timestamp = None;
    }

    /// Return the cached value, or call `load` when it is stale, absent, or
    /// `force_refresh` is set. A failed load leaves the cache untouched.
    pub async fn refresh<F, Fut, E>(&mut self, force_refresh: bool, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !force_refresh && let Some(value) = self.get() {
            return Ok(value.clone());
        }
        let value = load().await?;
        self.set(value.clone());
        Ok(value)
    }
}
