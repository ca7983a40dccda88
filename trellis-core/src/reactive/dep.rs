//! Dependency Sets
//!
//! A [`Dep`] exists for every observed slot: one per object property and one
//! per observed container (for whole-container events such as array
//! mutation). It holds the computations currently interested in that slot.
//!
//! The relationship is many-to-many. A property can be read by several
//! watchers, and a watcher reads many properties. The Dep does not decide
//! whether to subscribe a reader; [`Dep::depend`] hands itself to the current
//! target and the watcher de-duplicates by [`DepId`].
//!
//! Subscribers are held weakly. Dropping the last handle to a watcher is
//! enough to stop it from being notified.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::subscriber::{DepId, Subscriber, WatcherId};

struct DepInner {
    id: DepId,
    /// Ordered by first subscription.
    subscribers: RefCell<IndexMap<WatcherId, Weak<dyn Subscriber>>>,
}

/// A dependency set for one observed slot.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    /// Create a new dep with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: DepId::new(),
                subscribers: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the dep's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Register this dep with the current collection target.
    ///
    /// Does nothing outside a collecting computation.
    pub fn depend(&self) {
        if let Some(target) = ReactiveContext::current() {
            target.add_dep(self);
        }
    }

    /// Add a subscriber. Adding the same watcher twice keeps one entry.
    pub fn add_subscriber(&self, id: WatcherId, subscriber: Weak<dyn Subscriber>) {
        self.inner
            .subscribers
            .borrow_mut()
            .entry(id)
            .or_insert(subscriber);
    }

    /// Remove a subscriber, preserving the order of the rest.
    pub fn remove_subscriber(&self, id: WatcherId) {
        self.inner.subscribers.borrow_mut().shift_remove(&id);
    }

    /// Notify every current subscriber, in subscription order.
    ///
    /// The subscriber list is snapshotted first, so an `update()` that
    /// subscribes to or notifies other deps (or this one) does not disturb
    /// the iteration.
    pub fn notify(&self) {
        let snapshot: SmallVec<[Weak<dyn Subscriber>; 8]> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|_, s| s.strong_count() > 0);
            subscribers.values().cloned().collect()
        };

        tracing::trace!(
            dep = self.id().raw(),
            subscribers = snapshot.len(),
            "dep notify"
        );

        for subscriber in snapshot {
            if let Some(subscriber) = subscriber.upgrade() {
                subscriber.update();
            }
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .values()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    /// IDs of the subscribers, in subscription order.
    pub fn subscriber_ids(&self) -> Vec<WatcherId> {
        self.inner.subscribers.borrow().keys().copied().collect()
    }

    /// Whether `id` is subscribed.
    pub fn has_subscriber(&self, id: WatcherId) -> bool {
        self.inner.subscribers.borrow().contains_key(&id)
    }

    /// Whether both handles refer to the same dep.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
