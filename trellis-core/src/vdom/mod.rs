//! Virtual Nodes and Reconciliation
//!
//! A render produces a [`Node`] tree. [`patch`] compares it with the tree
//! from the previous render and applies the difference to a [`Surface`].
//!
//! [`MemorySurface`] is a complete in-memory surface, useful for tests and
//! for hosts that only need the resulting structure.

mod memory;
mod node;
mod patch;
mod surface;

pub use memory::{MemId, MemorySurface, SurfaceStats};
pub use node::{
    make_component, make_element, make_text, same_node, ComponentFactory, ComponentNode,
    ElementNode, Key, Node, NodeKind, Props, TextNode,
};
pub use patch::{patch, Target};
pub use surface::Surface;
