//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis reactive UI engine.
//! It implements:
//!
//! - Observed data with per-property dependency tracking
//! - Watchers, computed values and a batching update scheduler
//! - Virtual nodes and a keyed reconciler over a pluggable surface
//! - Views that re-render and re-patch when their data changes
//!
//! The runtime is single-threaded. Handles are cheap `Rc` clones and the
//! scheduler state is thread-local.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: observed data, deps, watchers, computed values, scheduler
//! - `vdom`: node descriptions, the `Surface` trait, the reconciler
//! - `mount`: the render watcher that connects the two
//! - `config`: per-thread runtime settings
//! - `error`: error types
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use serde_json::json;
//! use trellis_core::mount::View;
//! use trellis_core::reactive::{observe, scheduler};
//! use trellis_core::vdom::{make_element, make_text, MemorySurface, Props};
//!
//! let mut surface = MemorySurface::new();
//! let root = surface.root();
//! let target = surface.append_element(root, "div");
//! let surface = Rc::new(RefCell::new(surface));
//!
//! let data = observe(json!({ "message": "Hello" }));
//! let state = data.as_object().unwrap().clone();
//!
//! let source = state.clone();
//! let view = View::mount(Rc::clone(&surface), target, move || {
//!     let message = source.get("message").and_then(|v| v.as_str().map(str::to_owned));
//!     make_element("p", Props::new(), vec![make_text(message.unwrap_or_default())])
//! });
//!
//! state.set("message", "World");
//! scheduler::tick();
//!
//! let root = view.root().unwrap();
//! assert_eq!(surface.borrow().to_html(root), "<p>World</p>");
//! ```

pub mod config;
pub mod error;
pub mod mount;
pub mod reactive;
pub mod vdom;

pub use config::{RuntimeConfig, TickMode};
pub use error::{ConfigError, PatchError, SchedulerError};
pub use mount::View;
pub use reactive::{
    defer_until_flush, observe, untracked, Computed, Dep, Observed, ReactiveArray,
    ReactiveObject, Watcher,
};
pub use vdom::{patch, MemorySurface, Node, Surface, Target};
