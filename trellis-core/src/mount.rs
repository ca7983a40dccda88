//! Mounting
//!
//! A [`View`] ties the two halves of the crate together: a render watcher
//! whose computation builds a node tree and patches it onto a surface. Any
//! observed data the render reads becomes a dependency, so mutating that
//! data schedules exactly one re-render and re-patch per tick.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::PatchError;
use crate::reactive::Watcher;
use crate::vdom::{patch, Node, Surface, Target};

struct ViewState<H> {
    /// The primitive the next fresh build replaces.
    target: H,
    tree: Option<Node<H>>,
    root: Option<H>,
    last_error: Option<PatchError>,
}

/// A mounted render function.
///
/// Dropping the last handle tears down the render watcher: later changes
/// to the data no longer re-render. What is already on the surface stays
/// there.
pub struct View<S: Surface + 'static> {
    watcher: Watcher<()>,
    state: Rc<RefCell<ViewState<S::Handle>>>,
}

impl<S: Surface + 'static> View<S> {
    /// Render once, replacing `target` on `surface`, and keep the result in
    /// sync with the data `render` reads.
    ///
    /// The surface is borrowed for the duration of each patch. A failed
    /// patch is logged and recorded in [`View::last_error`]. It may have
    /// left the surface partly patched, so the tree is discarded and the
    /// next render builds fresh over the last root primitive.
    #[must_use = "dropping the view stops it from re-rendering"]
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn mount<F>(surface: Rc<RefCell<S>>, target: S::Handle, render: F) -> Self
    where
        F: Fn() -> Node<S::Handle> + 'static,
    {
        let state = Rc::new(RefCell::new(ViewState {
            target,
            tree: None,
            root: None,
            last_error: None,
        }));

        let shared = Rc::clone(&state);
        let watcher = Watcher::new(move || {
            let mut next = render();

            let mut state = shared.borrow_mut();
            let previous = state.tree.take();
            let old = match &previous {
                Some(tree) => Target::Node(tree),
                None => Target::Surface(state.target.clone()),
            };

            let result = patch(&mut *surface.borrow_mut(), Some(old), &mut next);
            match result {
                Ok(root) => {
                    state.root = Some(root);
                    state.tree = Some(next);
                    state.last_error = None;
                }
                Err(err) => {
                    tracing::error!(error = %err, "render patch failed");
                    if let Some(root) = state.root.clone() {
                        state.target = root;
                    }
                    state.last_error = Some(err);
                }
            }
        });

        tracing::debug!(watcher = watcher.id().raw(), "view mounted");
        Self { watcher, state }
    }

    /// The primitive currently at the root of the view.
    pub fn root(&self) -> Option<S::Handle> {
        self.state.borrow().root.clone()
    }

    /// The error from the latest render, if it failed.
    pub fn last_error(&self) -> Option<PatchError> {
        self.state.borrow().last_error.clone()
    }

    /// Number of renders so far, including the initial one.
    pub fn render_count(&self) -> usize {
        self.watcher.run_count()
    }

    /// Schedule a re-render even though no dependency changed.
    pub fn force_update(&self) {
        self.watcher.update();
    }

    /// Run `f` against the tree from the latest render, or `None` if it
    /// failed.
    pub fn with_tree<R>(&self, f: impl FnOnce(Option<&Node<S::Handle>>) -> R) -> R {
        f(self.state.borrow().tree.as_ref())
    }

    /// The render watcher.
    pub fn watcher(&self) -> &Watcher<()> {
        &self.watcher
    }
}

impl<S: Surface + 'static> fmt::Debug for View<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("View")
            .field("watcher", &self.watcher)
            .field("root", &state.root)
            .field("last_error", &state.last_error)
            .finish()
    }
}
