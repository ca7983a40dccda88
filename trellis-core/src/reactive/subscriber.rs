//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that depends on reactive values:
//! render watchers, lazy computed values and user watchers. Deps only ever
//! see subscribers through the [`Subscriber`] trait, which keeps the
//! dependency sets free of the computation's value type.

use std::sync::atomic::{AtomicU64, Ordering};

use super::dep::Dep;

/// Unique identifier for a watcher.
///
/// Each watcher gets a unique, monotonically increasing ID when created.
/// The scheduler uses it to de-duplicate queued re-runs and Deps use it to
/// keep their subscriber sets free of duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Generate a new unique watcher ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a dependency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(u64);

impl DepId {
    /// Generate a new unique dep ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for DepId {
    fn default() -> Self {
        Self::new()
    }
}

/// A computation that can be notified when its dependencies change.
pub trait Subscriber {
    /// Get the subscriber's unique ID.
    fn id(&self) -> WatcherId;

    /// Record that the current run read `dep`.
    ///
    /// Must be idempotent within a single run.
    fn add_dep(&self, dep: &Dep);

    /// React to a change in one of the recorded deps.
    ///
    /// Eager subscribers enqueue themselves on the scheduler; lazy ones only
    /// mark themselves dirty.
    fn update(&self);

    /// Re-execute the computation now.
    fn run(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watcher_ids_are_unique() {
        let id1 = WatcherId::new();
        let id2 = WatcherId::new();
        let id3 = WatcherId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ids_increase_monotonically() {
        let a = DepId::new();
        let b = DepId::new();
        assert!(a.raw() < b.raw());

        let w1 = WatcherId::new();
        let w2 = WatcherId::new();
        assert!(w1 < w2);
    }
}
