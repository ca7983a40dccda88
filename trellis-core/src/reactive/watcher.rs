//! Watcher Implementation
//!
//! A Watcher wraps a computation and re-runs it when any Dep it read during
//! its last run is notified.
//!
//! # Kinds
//!
//! - **Render** watchers run immediately on creation and are re-run through
//!   the scheduler, at most once per flush.
//! - **Lazy** watchers back computed values. They never run eagerly; a
//!   change only marks them dirty and the next read recomputes.
//! - **User** watchers run like render watchers and additionally hand
//!   `(new, old)` to a callback whenever the computed value changed.
//!
//! # Dependency collection
//!
//! Each run pushes the watcher onto the collection context, runs the
//! getter, then pops. Every Dep read in between calls [`Subscriber::add_dep`],
//! which is idempotent per run. After the run, deps from the previous run
//! that were not read again are unsubscribed, so `deps` always reflects the
//! latest run exactly.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::dep::Dep;
use super::scheduler;
use super::subscriber::{DepId, Subscriber, WatcherId};

type DepList = SmallVec<[Dep; 4]>;

/// What a watcher does when one of its deps changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherKind {
    /// Side-effecting computation, re-run through the scheduler.
    Render,
    /// Cached derived value, recomputed on read when dirty.
    Lazy,
    /// Scheduled like `Render`, reports value changes to a callback.
    User,
}

#[derive(Default)]
struct Collected {
    deps: DepList,
    ids: HashSet<DepId>,
}

struct WatcherInner<T: 'static> {
    id: WatcherId,
    kind: WatcherKind,
    getter: Box<dyn Fn() -> T>,
    callback: Option<Box<dyn Fn(&T, &T)>>,
    this: Weak<WatcherInner<T>>,
    collected: RefCell<Collected>,
    dirty: Cell<bool>,
    value: RefCell<Option<T>>,
    runs: Cell<usize>,
}

/// Unsubscribes stale deps once a run finishes, even if the getter panics.
struct Collection<'a, T: 'static> {
    watcher: &'a WatcherInner<T>,
    previous: DepList,
}

impl<T: 'static> Drop for Collection<'_, T> {
    fn drop(&mut self) {
        let collected = self.watcher.collected.borrow();
        for dep in self.previous.drain(..) {
            if !collected.ids.contains(&dep.id()) {
                dep.remove_subscriber(self.watcher.id);
            }
        }
    }
}

impl<T: 'static> WatcherInner<T> {
    fn handle(&self) -> Option<Rc<dyn Subscriber>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn Subscriber>)
    }

    /// One collection cycle: push, run the getter, pop, clean up.
    fn get(&self) -> T {
        let previous = {
            let mut collected = self.collected.borrow_mut();
            collected.ids.clear();
            std::mem::take(&mut collected.deps)
        };
        let _collection = Collection {
            watcher: self,
            previous,
        };

        let value = {
            let _ctx = ReactiveContext::enter(self.handle());
            (self.getter)()
        };

        self.runs.set(self.runs.get() + 1);
        tracing::trace!(
            watcher = self.id.raw(),
            kind = ?self.kind,
            deps = self.collected.borrow().deps.len(),
            "watcher ran"
        );
        value
    }

    /// Run and store the value, reporting changes to the callback.
    fn run_eager(&self) {
        let new = self.get();
        let old = self.value.borrow_mut().take();
        if let (Some(callback), Some(old)) = (&self.callback, old.as_ref()) {
            callback(&new, old);
        }
        *self.value.borrow_mut() = Some(new);
    }

    fn recompute(&self) {
        let value = self.get();
        *self.value.borrow_mut() = Some(value);
        self.dirty.set(false);
    }
}

impl<T: 'static> Subscriber for WatcherInner<T> {
    fn id(&self) -> WatcherId {
        self.id
    }

    fn add_dep(&self, dep: &Dep) {
        let inserted = {
            let mut collected = self.collected.borrow_mut();
            if collected.ids.insert(dep.id()) {
                collected.deps.push(dep.clone());
                true
            } else {
                false
            }
        };

        if inserted {
            let weak: Weak<dyn Subscriber> = self.this.clone();
            dep.add_subscriber(self.id, weak);
        }
    }

    fn update(&self) {
        match self.kind {
            WatcherKind::Lazy => self.dirty.set(true),
            WatcherKind::Render | WatcherKind::User => {
                if let Some(handle) = self.handle() {
                    scheduler::queue_watcher(handle);
                }
            }
        }
    }

    fn run(&self) {
        match self.kind {
            WatcherKind::Lazy => self.recompute(),
            WatcherKind::Render | WatcherKind::User => self.run_eager(),
        }
    }
}

/// A tracked computation producing values of type `T`.
///
/// Cloning a watcher yields another handle to the same computation.
///
/// Deps hold their subscribers weakly. Dropping the last handle tears the
/// watcher down: it is never notified or re-run again.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use serde_json::json;
/// use trellis_core::reactive::{observe, scheduler, Watcher};
///
/// let data = observe(json!({ "count": 1 }));
/// let state = data.as_object().unwrap().clone();
///
/// let renders = Rc::new(Cell::new(0));
/// let seen = renders.clone();
/// let source = state.clone();
/// let _render = Watcher::new(move || {
///     let _ = source.get("count");
///     seen.set(seen.get() + 1);
/// });
///
/// state.set("count", 2);
/// state.set("count", 3);
/// scheduler::tick();
/// assert_eq!(renders.get(), 2);
/// ```
pub struct Watcher<T: 'static = ()> {
    inner: Rc<WatcherInner<T>>,
}

impl<T: 'static> Watcher<T> {
    fn build(
        kind: WatcherKind,
        getter: Box<dyn Fn() -> T>,
        callback: Option<Box<dyn Fn(&T, &T)>>,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| WatcherInner {
            id: WatcherId::new(),
            kind,
            getter,
            callback,
            this: this.clone(),
            collected: RefCell::new(Collected::default()),
            dirty: Cell::new(kind == WatcherKind::Lazy),
            value: RefCell::new(None),
            runs: Cell::new(0),
        });
        Self { inner }
    }

    /// Create an immediate watcher. The getter runs before this returns.
    #[must_use = "dropping the watcher stops it from re-running"]
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let watcher = Self::build(WatcherKind::Render, Box::new(getter), None);
        watcher.inner.run_eager();
        watcher
    }

    /// Create a lazy watcher. The getter does not run until evaluated.
    #[must_use = "dropping the watcher stops it from re-running"]
    pub fn lazy<F>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self::build(WatcherKind::Lazy, Box::new(getter), None)
    }

    /// Get the watcher's unique ID.
    pub fn id(&self) -> WatcherId {
        self.inner.id
    }

    /// Get the watcher's kind.
    pub fn kind(&self) -> WatcherKind {
        self.inner.kind
    }

    /// Whether a lazy watcher needs to recompute. Always false for eager
    /// watchers.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Run one collection cycle and return the getter's result.
    ///
    /// The result is not cached; use [`Watcher::evaluate`] for that.
    pub fn get(&self) -> T {
        self.inner.get()
    }

    /// Record `dep` as a dependency of the current run.
    pub fn add_dep(&self, dep: &Dep) {
        self.inner.add_dep(dep);
    }

    /// Notify the watcher that a dependency changed.
    pub fn update(&self) {
        self.inner.update();
    }

    /// Re-run the computation immediately.
    pub fn run(&self) {
        self.inner.run();
    }

    /// Recompute a dirty watcher and cache the result.
    pub fn evaluate(&self) {
        if self.inner.dirty.get() || self.inner.value.borrow().is_none() {
            self.inner.recompute();
        }
    }

    /// Make the current collection target depend on every dep this watcher
    /// read, so it is re-run when any of this watcher's inputs change.
    pub fn depend(&self) {
        let deps: DepList = self.inner.collected.borrow().deps.clone();
        for dep in &deps {
            dep.depend();
        }
    }

    /// Deps recorded by the latest run, in read order.
    pub fn deps(&self) -> Vec<Dep> {
        self.inner.collected.borrow().deps.to_vec()
    }

    /// IDs of the deps recorded by the latest run.
    pub fn dep_ids(&self) -> Vec<DepId> {
        self.inner
            .collected
            .borrow()
            .deps
            .iter()
            .map(Dep::id)
            .collect()
    }

    /// Number of deps recorded by the latest run.
    pub fn dependency_count(&self) -> usize {
        self.inner.collected.borrow().deps.len()
    }

    /// Number of times the getter has run.
    pub fn run_count(&self) -> usize {
        self.inner.runs.get()
    }

    /// Whether both handles refer to the same watcher.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Watcher<T> {
    /// The value stored by the latest run, if any.
    pub fn value(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }
}

impl<T: PartialEq + 'static> Watcher<T> {
    /// Create a user watcher.
    ///
    /// The getter runs immediately to record the initial value. After every
    /// scheduled re-run where the value differs from the previous one,
    /// `callback` receives `(new, old)`.
    #[must_use = "dropping the watcher stops it from re-running"]
    pub fn watch<F, C>(getter: F, callback: C) -> Self
    where
        F: Fn() -> T + 'static,
        C: Fn(&T, &T) + 'static,
    {
        let callback = move |new: &T, old: &T| {
            if new != old {
                callback(new, old);
            }
        };
        let watcher = Self::build(
            WatcherKind::User,
            Box::new(getter),
            Some(Box::new(callback)),
        );
        watcher.inner.run_eager();
        watcher
    }
}

impl<T: 'static> Clone for Watcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Watcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("dirty", &self.is_dirty())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
