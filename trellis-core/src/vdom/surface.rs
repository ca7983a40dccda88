//! Rendering Surface
//!
//! The reconciler never touches a concrete tree directly. Everything it does
//! goes through a [`Surface`], so the same diff drives a browser DOM binding,
//! a terminal renderer or the in-memory [`MemorySurface`] used by tests.
//!
//! [`MemorySurface`]: super::MemorySurface

use std::fmt::Debug;

/// The primitive operations of a tree-shaped rendering target.
///
/// Handles are opaque to the reconciler. Moving a handle that already has a
/// parent with [`Surface::insert_before`] detaches it first, the way the DOM
/// does.
pub trait Surface {
    /// A reference to one primitive in the tree.
    type Handle: Clone + PartialEq + Debug;

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Handle;

    /// Creates a detached text primitive.
    fn create_text(&mut self, text: &str) -> Self::Handle;

    /// Overwrites the content of a text primitive.
    fn set_text(&mut self, node: &Self::Handle, text: &str);

    fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);

    fn remove_attribute(&mut self, node: &Self::Handle, name: &str);

    fn set_style(&mut self, node: &Self::Handle, name: &str, value: &str);

    fn clear_style(&mut self, node: &Self::Handle, name: &str);

    /// Inserts `child` into `parent` before `anchor`. If `anchor` is `None`,
    /// appends to the end of the parent's children.
    ///
    /// An `anchor` equal to `child` must leave the tree unchanged. The
    /// reconciler does not issue such calls, but implementations should not
    /// rely on that.
    fn insert_before(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        anchor: Option<&Self::Handle>,
    );

    /// Removes `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Handle, child: &Self::Handle);

    /// Puts `new` where `old` was in `parent`, detaching `old`.
    fn replace_child(
        &mut self,
        parent: &Self::Handle,
        new: &Self::Handle,
        old: &Self::Handle,
    );

    /// Removes every child of `parent`.
    fn clear_children(&mut self, parent: &Self::Handle);

    /// The parent of `node`, if it is attached.
    fn parent_of(&self, node: &Self::Handle) -> Option<Self::Handle>;

    /// The sibling immediately after `node`, if any.
    fn next_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;
}
