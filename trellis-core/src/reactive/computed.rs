//! Computed Values
//!
//! A Computed is a cached derived value backed by a lazy [`Watcher`].
//!
//! # How Computed Values Work
//!
//! 1. Creating a computed value runs nothing.
//!
//! 2. The first read evaluates the getter and caches the result.
//!
//! 3. When any input changes, the lazy watcher is only marked dirty; nothing
//!    is scheduled.
//!
//! 4. The next read recomputes once and caches again.
//!
//! 5. A read from inside another computation additionally forwards the
//!    computed value's inputs to that computation, so a render that reads a
//!    computed value re-runs when the computed value's inputs change.
//!
//! Computed values that are never read stay dirty and cost nothing.

use std::fmt;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::watcher::Watcher;

/// A cached derived value.
pub struct Computed<T: Clone + 'static> {
    watcher: Watcher<T>,
    setter: Option<Rc<dyn Fn(T)>>,
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a read-only computed value.
    #[must_use = "dropping the computed value stops its tracking"]
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            watcher: Watcher::lazy(getter),
            setter: None,
        }
    }

    /// Create a computed value whose `set` calls `setter`.
    ///
    /// The setter usually writes back to the observed data the getter reads.
    #[must_use = "dropping the computed value stops its tracking"]
    pub fn with_setter<F, S>(getter: F, setter: S) -> Self
    where
        F: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Self {
            watcher: Watcher::lazy(getter),
            setter: Some(Rc::new(setter)),
        }
    }

    /// Read the value, recomputing first if an input changed.
    pub fn get(&self) -> T {
        if self.watcher.is_dirty() {
            self.watcher.evaluate();
        }
        if ReactiveContext::is_active() {
            self.watcher.depend();
        }

        match self.watcher.value() {
            Some(value) => value,
            // Only reachable if the getter never completed; run it directly.
            None => self.watcher.get(),
        }
    }

    /// Write through the setter. Without one the write is dropped.
    pub fn set(&self, value: T) {
        match &self.setter {
            Some(setter) => setter(value),
            None => {
                tracing::warn!(
                    watcher = self.watcher.id().raw(),
                    "computed value has no setter"
                );
            }
        }
    }

    /// Whether the next read recomputes.
    pub fn is_dirty(&self) -> bool {
        self.watcher.is_dirty()
    }

    /// The backing lazy watcher.
    pub fn watcher(&self) -> &Watcher<T> {
        &self.watcher
    }
}

impl<T: Clone + 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            watcher: self.watcher.clone(),
            setter: self.setter.clone(),
        }
    }
}

impl<T: Clone + 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("watcher", &self.watcher)
            .field("has_setter", &self.setter.is_some())
            .finish()
    }
}
