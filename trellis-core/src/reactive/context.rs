//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when an observed slot is
//! read, its Dep asks the context for the current target and registers
//! itself with it.
//!
//! # Implementation
//!
//! The context is a stack owned by the thread-local [`Runtime`]. Entering a
//! computation pushes it, and the returned guard pops it when dropped, so the
//! stack stays balanced even if the computation panics. Nesting is the normal
//! case: a lazy computed value evaluated while a render is running pushes
//! itself on top of the render and pops back to it.
//!
//! A `None` entry suspends collection: reads inside [`untracked`] do not
//! register with the enclosing computation.

use std::rc::Rc;

use super::runtime::Runtime;
use super::subscriber::{Subscriber, WatcherId};

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
pub struct ReactiveContext {
    depth: usize,
    subscriber_id: Option<WatcherId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given target.
    ///
    /// While this context is active, any Dep that is read registers itself
    /// with `target`. Passing `None` suspends collection until the guard is
    /// dropped.
    pub fn enter(target: Option<Rc<dyn Subscriber>>) -> Self {
        let subscriber_id = target.as_ref().map(|t| t.id());
        let depth = Runtime::with(|rt| {
            let mut stack = rt.stack.borrow_mut();
            stack.push(target);
            stack.len()
        });

        Self {
            depth,
            subscriber_id,
        }
    }

    /// Check if there is an active collection target.
    pub fn is_active() -> bool {
        Runtime::with(|rt| matches!(rt.stack.borrow().last(), Some(Some(_))))
    }

    /// Get the current collection target, if any.
    pub fn current() -> Option<Rc<dyn Subscriber>> {
        Runtime::with(|rt| rt.stack.borrow().last().cloned().flatten())
    }

    /// Get the ID of the current collection target, if any.
    pub fn current_subscriber() -> Option<WatcherId> {
        Runtime::with(|rt| {
            rt.stack
                .borrow()
                .last()
                .and_then(|entry| entry.as_ref().map(|s| s.id()))
        })
    }

    /// Number of entries on the stack.
    pub fn depth() -> usize {
        Runtime::with(|rt| rt.stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        Runtime::with(|rt| {
            let mut stack = rt.stack.borrow_mut();

            // Verify we're popping the right context.
            // This helps catch bugs where contexts are mismatched.
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "ReactiveContext mismatch: expected depth {}, got {}",
                self.depth,
                stack.len()
            );

            if let Some(entry) = stack.pop() {
                debug_assert_eq!(
                    entry.as_ref().map(|s| s.id()),
                    self.subscriber_id,
                    "ReactiveContext popped a different subscriber"
                );
            }
        });
    }
}

/// Run `f` without collecting dependencies for the enclosing computation.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter(None);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::dep::Dep;
    use std::cell::RefCell;

    struct Probe {
        id: WatcherId,
        seen: RefCell<Vec<u64>>,
    }

    impl Probe {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                id: WatcherId::new(),
                seen: RefCell::new(Vec::new()),
            })
        }
    }

    impl Subscriber for Probe {
        fn id(&self) -> WatcherId {
            self.id
        }

        fn add_dep(&self, dep: &Dep) {
            self.seen.borrow_mut().push(dep.id().raw());
        }

        fn update(&self) {}

        fn run(&self) {}
    }

    #[test]
    fn context_tracks_subscriber() {
        let probe = Probe::new();
        let id = probe.id;

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(Some(probe.clone()));

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let outer = Probe::new();
        let inner = Probe::new();

        {
            let _ctx1 = ReactiveContext::enter(Some(outer.clone()));
            assert_eq!(ReactiveContext::current_subscriber(), Some(outer.id));

            {
                let _ctx2 = ReactiveContext::enter(Some(inner.clone()));
                assert_eq!(ReactiveContext::current_subscriber(), Some(inner.id));
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(outer.id));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untracked_suspends_collection() {
        let probe = Probe::new();
        let dep = Dep::new();

        let _ctx = ReactiveContext::enter(Some(probe.clone()));
        untracked(|| {
            assert!(!ReactiveContext::is_active());
            dep.depend();
        });
        assert!(probe.seen.borrow().is_empty());

        dep.depend();
        assert_eq!(*probe.seen.borrow(), vec![dep.id().raw()]);
    }

    #[test]
    fn stack_is_popped_when_computation_panics() {
        let probe = Probe::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ctx = ReactiveContext::enter(Some(probe.clone()));
            panic!("computation failed");
        }));

        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
