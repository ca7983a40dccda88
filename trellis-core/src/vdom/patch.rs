//! Reconciler
//!
//! [`patch`] brings a surface from the state described by an old node tree
//! (or a raw surface primitive) to the state described by a new one, and
//! records the resulting primitives in the new tree's `mounted` fields.
//!
//! # Algorithm
//!
//! Nodes that are not [`same_node`] are never patched into each other: the
//! new node is built fresh and swapped in at the old one's position. Matching
//! nodes reuse the old primitive, have their text or props diffed, and have
//! their children reconciled with the four-pointer keyed diff:
//!
//! 1. Compare old-start with new-start, old-end with new-end, old-end with
//!    new-start (moved to front) and old-start with new-end (moved to back).
//!    Each hit is patched and the pointers move inward.
//! 2. On a miss, look up new-start's key among the remaining old children.
//!    A hit is moved into place and its old slot marked consumed; a miss is
//!    created fresh. Unkeyed nodes are never looked up.
//! 3. Leftover new children are inserted before the node following the new
//!    range; leftover old children are removed.
//!
//! The common edits (no change, append, prepend, a single move) never build
//! the key map.

use std::collections::HashMap;

use super::node::{same_node, Key, Node, Props};
use super::surface::Surface;
use crate::error::PatchError;

/// What the new tree is patched against.
#[derive(Debug)]
pub enum Target<'a, H> {
    /// An unmanaged surface primitive, replaced by the new tree on first
    /// mount.
    Surface(H),
    /// The previously rendered tree.
    Node(&'a Node<H>),
}

/// Reconcile `new` against `old` and return the primitive now backing
/// `new`.
///
/// - `None`: build `new` fresh. The caller attaches the result.
/// - `Target::Surface(h)`: build `new`, insert it right after `h` and remove
///   `h`.
/// - `Target::Node(old)`: patch `old` into `new`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn patch<S: Surface>(
    surface: &mut S,
    old: Option<Target<'_, S::Handle>>,
    new: &mut Node<S::Handle>,
) -> Result<S::Handle, PatchError> {
    let mut patcher = Patcher { surface };

    match old {
        None => Ok(patcher.create(new)),
        Some(Target::Surface(target)) => {
            let parent = patcher
                .surface
                .parent_of(&target)
                .ok_or(PatchError::Detached { operation: "mount over" })?;
            let root = patcher.create(new);
            let anchor = patcher.surface.next_sibling(&target);
            patcher.surface.insert_before(&parent, &root, anchor.as_ref());
            patcher.surface.remove_child(&parent, &target);
            Ok(root)
        }
        Some(Target::Node(old)) => patcher.patch_node(old, new),
    }
}

fn mounted<H: Clone>(node: &Node<H>) -> Result<H, PatchError> {
    node.mounted().cloned().ok_or_else(|| PatchError::Unmounted {
        tag: node.tag().unwrap_or("#text").to_owned(),
    })
}

fn key_map<H>(children: &[Node<H>]) -> HashMap<&Key, usize> {
    children
        .iter()
        .enumerate()
        .filter_map(|(index, child)| child.key().map(|key| (key, index)))
        .collect()
}

struct Patcher<'s, S: Surface> {
    surface: &'s mut S,
}

impl<S: Surface> Patcher<'_, S> {
    /// Build the primitives for `node` and its descendants.
    fn create(&mut self, node: &mut Node<S::Handle>) -> S::Handle {
        match node {
            Node::Element(el) => {
                let handle = self.surface.create_element(&el.tag);
                self.patch_props(&handle, &Props::default(), &el.props);
                for child in &mut el.children {
                    let child = self.create(child);
                    self.surface.insert_before(&handle, &child, None);
                }
                el.mounted = Some(handle.clone());
                handle
            }
            Node::Text(text) => {
                let handle = self.surface.create_text(&text.text);
                text.mounted = Some(handle.clone());
                handle
            }
            Node::Component(component) => {
                let mut instance = component.factory.render(&component.props, &component.children);
                let handle = self.create(&mut instance);
                component.instance = Some(Box::new(instance));
                handle
            }
        }
    }

    /// Build `new` and put it where `old` is.
    fn replace(
        &mut self,
        old: &Node<S::Handle>,
        new: &mut Node<S::Handle>,
    ) -> Result<S::Handle, PatchError> {
        let previous = mounted(old)?;
        let parent = self
            .surface
            .parent_of(&previous)
            .ok_or(PatchError::Detached { operation: "replace" })?;

        tracing::debug!(old = ?old.tag(), new = ?new.tag(), "replacing subtree");
        let handle = self.create(new);
        self.surface.replace_child(&parent, &handle, &previous);
        Ok(handle)
    }

    fn patch_node(
        &mut self,
        old: &Node<S::Handle>,
        new: &mut Node<S::Handle>,
    ) -> Result<S::Handle, PatchError> {
        if !same_node(old, new) {
            return self.replace(old, new);
        }

        match (old, new) {
            (Node::Text(old), Node::Text(new)) => {
                let handle = old.mounted.clone().ok_or_else(|| PatchError::Unmounted {
                    tag: "#text".to_owned(),
                })?;
                if old.text != new.text {
                    self.surface.set_text(&handle, &new.text);
                }
                new.mounted = Some(handle.clone());
                Ok(handle)
            }
            (Node::Element(old), Node::Element(new)) => {
                let handle = old.mounted.clone().ok_or_else(|| PatchError::Unmounted {
                    tag: old.tag.clone(),
                })?;
                new.mounted = Some(handle.clone());
                self.patch_props(&handle, &old.props, &new.props);

                match (old.children.is_empty(), new.children.is_empty()) {
                    (true, true) => {}
                    (true, false) => {
                        for child in &mut new.children {
                            let child = self.create(child);
                            self.surface.insert_before(&handle, &child, None);
                        }
                    }
                    (false, true) => self.surface.clear_children(&handle),
                    (false, false) => {
                        self.update_children(&handle, &old.children, &mut new.children)?
                    }
                }
                Ok(handle)
            }
            (Node::Component(old), Node::Component(new)) => {
                let previous = old.instance.as_deref().ok_or_else(|| PatchError::Unmounted {
                    tag: old.tag.clone(),
                })?;
                let mut instance = new.factory.render(&new.props, &new.children);
                let handle = self.patch_node(previous, &mut instance)?;
                new.instance = Some(Box::new(instance));
                Ok(handle)
            }
            (old, new) => self.replace(old, new),
        }
    }

    /// Clear styles and attributes missing from `new`, then apply `new`.
    fn patch_props(&mut self, handle: &S::Handle, old: &Props, new: &Props) {
        for name in old.style.keys() {
            if !new.style.contains_key(name) {
                self.surface.clear_style(handle, name);
            }
        }
        for name in old.attrs.keys() {
            if !new.attrs.contains_key(name) {
                self.surface.remove_attribute(handle, name);
            }
        }
        for (name, value) in &new.style {
            self.surface.set_style(handle, name, value);
        }
        for (name, value) in &new.attrs {
            self.surface.set_attribute(handle, name, value);
        }
    }

    fn update_children(
        &mut self,
        parent: &S::Handle,
        old: &[Node<S::Handle>],
        new: &mut [Node<S::Handle>],
    ) -> Result<(), PatchError> {
        // `None` marks an old child already consumed by a keyed move.
        let mut slots: Vec<Option<&Node<S::Handle>>> = old.iter().map(Some).collect();
        let mut keys: Option<HashMap<&Key, usize>> = None;

        // Half-open ranges.
        let (mut old_lo, mut old_hi) = (0, old.len());
        let (mut new_lo, mut new_hi) = (0, new.len());

        while old_lo < old_hi && new_lo < new_hi {
            let Some(old_start) = slots[old_lo] else {
                old_lo += 1;
                continue;
            };
            let Some(old_end) = slots[old_hi - 1] else {
                old_hi -= 1;
                continue;
            };

            if same_node(old_start, &new[new_lo]) {
                self.patch_node(old_start, &mut new[new_lo])?;
                old_lo += 1;
                new_lo += 1;
            } else if same_node(old_end, &new[new_hi - 1]) {
                self.patch_node(old_end, &mut new[new_hi - 1])?;
                old_hi -= 1;
                new_hi -= 1;
            } else if same_node(old_end, &new[new_lo]) {
                let handle = self.patch_node(old_end, &mut new[new_lo])?;
                let anchor = mounted(old_start)?;
                self.surface.insert_before(parent, &handle, Some(&anchor));
                old_hi -= 1;
                new_lo += 1;
            } else if same_node(old_start, &new[new_hi - 1]) {
                let handle = self.patch_node(old_start, &mut new[new_hi - 1])?;
                let anchor = self.surface.next_sibling(&mounted(old_end)?);
                self.surface.insert_before(parent, &handle, anchor.as_ref());
                old_lo += 1;
                new_hi -= 1;
            } else {
                let keys = keys.get_or_insert_with(|| key_map(old));
                let found = new[new_lo]
                    .key()
                    .and_then(|key| keys.get(key).copied())
                    .filter(|&index| {
                        (old_lo..old_hi).contains(&index) && slots[index].is_some()
                    });
                let anchor = mounted(old_start)?;

                match found.and_then(|index| slots[index].take()) {
                    Some(moved) => {
                        tracing::debug!(key = ?new[new_lo].key(), "keyed move");
                        let handle = mounted(moved)?;
                        // A hit on old-start itself is already in place.
                        if handle != anchor {
                            self.surface.insert_before(parent, &handle, Some(&anchor));
                        }
                        self.patch_node(moved, &mut new[new_lo])?;
                    }
                    None => {
                        tracing::debug!(key = ?new[new_lo].key(), "keyed miss, creating");
                        let handle = self.create(&mut new[new_lo]);
                        self.surface.insert_before(parent, &handle, Some(&anchor));
                    }
                }
                new_lo += 1;
            }
        }

        if new_lo < new_hi {
            let anchor = new.get(new_hi).and_then(|node| node.mounted().cloned());
            for node in &mut new[new_lo..new_hi] {
                let handle = self.create(node);
                self.surface.insert_before(parent, &handle, anchor.as_ref());
            }
        }

        for node in slots[old_lo..old_hi].iter().flatten() {
            let handle = mounted(node)?;
            self.surface.remove_child(parent, &handle);
        }

        Ok(())
    }
}
