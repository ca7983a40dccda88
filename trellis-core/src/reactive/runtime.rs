//! Reactive Runtime
//!
//! The runtime is the per-thread owner of all ambient reactive state:
//!
//! 1. The collection context stack (which computation is currently reading).
//! 2. The scheduler's pending watcher queue and its de-duplication set.
//! 3. The deferred-callback queue that both watcher flushes and user
//!    callbacks go through.
//! 4. The active [`RuntimeConfig`].
//!
//! Nothing here is shared between threads. Reactive handles are `Rc`-based,
//! so a watcher created on one thread can only ever be scheduled on it.
//!
//! Access always goes through [`Runtime::with`]. Callers must never hold a
//! `RefCell` borrow from this struct while invoking user code: computations
//! re-enter the runtime freely.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use super::subscriber::{Subscriber, WatcherId};
use crate::config::RuntimeConfig;

/// A callback waiting for the next tick.
pub(crate) type Deferred = Box<dyn FnOnce()>;

/// The thread-local reactive runtime.
pub(crate) struct Runtime {
    /// Collection context stack. `None` entries suspend collection.
    pub(crate) stack: RefCell<Vec<Option<Rc<dyn Subscriber>>>>,

    /// Watchers waiting for the next scheduler flush, in enqueue order.
    pub(crate) queue: RefCell<Vec<Rc<dyn Subscriber>>>,

    /// IDs of the watchers in `queue`.
    pub(crate) queued: RefCell<HashSet<WatcherId>>,

    /// Whether a scheduler flush has been deferred for the current tick.
    pub(crate) flush_pending: Cell<bool>,

    /// Callbacks to run on the next tick, FIFO.
    pub(crate) callbacks: RefCell<VecDeque<Deferred>>,

    /// Whether a tick has been requested for `callbacks`.
    pub(crate) waiting: Cell<bool>,

    pub(crate) config: RefCell<RuntimeConfig>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
}

impl Runtime {
    fn new() -> Self {
        Self {
            stack: RefCell::new(Vec::new()),
            queue: RefCell::new(Vec::new()),
            queued: RefCell::new(HashSet::new()),
            flush_pending: Cell::new(false),
            callbacks: RefCell::new(VecDeque::new()),
            waiting: Cell::new(false),
            config: RefCell::new(RuntimeConfig::default()),
        }
    }

    /// Run `f` against this thread's runtime.
    pub(crate) fn with<R>(f: impl FnOnce(&Runtime) -> R) -> R {
        RUNTIME.with(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_starts_idle() {
        Runtime::with(|rt| {
            assert!(rt.stack.borrow().is_empty());
            assert!(rt.queue.borrow().is_empty());
            assert!(!rt.flush_pending.get());
            assert!(!rt.waiting.get());
        });
    }

    #[test]
    fn runtime_is_per_thread() {
        Runtime::with(|rt| rt.waiting.set(true));

        let other = std::thread::spawn(|| Runtime::with(|rt| rt.waiting.get()))
            .join()
            .unwrap();
        assert!(!other);

        Runtime::with(|rt| rt.waiting.set(false));
    }
}
