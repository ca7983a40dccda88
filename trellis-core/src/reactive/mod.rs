//! Reactive Primitives
//!
//! This module implements the reactive half of the runtime: observed data,
//! dependency sets, watchers, computed values and the update scheduler.
//!
//! # Concepts
//!
//! ## Observed data
//!
//! [`observe`] turns plain JSON-like data into an [`Observed`] tree. Every
//! object property has its own [`Dep`]; every object and array additionally
//! carries an [`Observer`] whose Dep fires on whole-container changes such as
//! `push` or a new key.
//!
//! ## Watchers
//!
//! A [`Watcher`] wraps a computation. While it runs it is the current
//! collection target, and every Dep it reads subscribes it. When one of those
//! Deps is notified the watcher is scheduled (render and user watchers) or
//! marked dirty (lazy watchers).
//!
//! ## Computed values
//!
//! A [`Computed`] is a lazy watcher with a cache. Reading it from inside
//! another computation forwards its inputs to that computation.
//!
//! ## Scheduling
//!
//! Re-runs are batched. Any number of mutations in one tick produce at most
//! one re-run per watcher, performed when the [`scheduler`] flushes.
//!
//! # Implementation Notes
//!
//! All state is single-threaded. Handles are `Rc`-based and the collection
//! stack, scheduler queue and deferred callbacks live in a thread-local
//! runtime. Deps hold their subscribers weakly, so dropping the last handle
//! to a watcher retires it.

mod computed;
mod context;
mod dep;
mod observe;
pub(crate) mod runtime;
pub mod scheduler;
mod subscriber;
mod watcher;

pub use computed::Computed;
pub use context::{untracked, ReactiveContext};
pub use dep::Dep;
pub use observe::{observe, Observed, Observer, ReactiveArray, ReactiveObject};
pub use scheduler::defer_until_flush;
pub use subscriber::{DepId, Subscriber, WatcherId};
pub use watcher::{Watcher, WatcherKind};
