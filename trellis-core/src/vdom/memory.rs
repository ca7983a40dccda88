//! In-Memory Surface
//!
//! An arena-backed [`Surface`] for tests, benchmarks and headless hosts.
//! Primitives are never freed; a detached primitive simply has no parent.
//!
//! Every structural operation is counted in [`SurfaceStats`], which is what
//! makes "this reorder moved one node and created none" checkable.

use std::fmt::Write as _;

use indexmap::IndexMap;

use super::surface::Surface;

/// A handle into a [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemId(usize);

impl MemId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    /// Elements and text primitives created.
    pub created: usize,
    /// `insert_before` calls, including moves of attached primitives.
    pub inserted: usize,
    /// `remove_child` calls plus children dropped by `clear_children`.
    pub removed: usize,
    /// `replace_child` calls.
    pub replaced: usize,
}

#[derive(Debug)]
enum Content {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        style: IndexMap<String, String>,
        children: Vec<MemId>,
    },
    Text(String),
}

#[derive(Debug)]
struct Slot {
    parent: Option<MemId>,
    content: Content,
}

/// An arena of element and text primitives with a single root element.
#[derive(Debug)]
pub struct MemorySurface {
    slots: Vec<Slot>,
    root: MemId,
    stats: SurfaceStats,
}

impl MemorySurface {
    /// Create a surface holding an empty `<root>` element.
    pub fn new() -> Self {
        let mut surface = Self {
            slots: Vec::new(),
            root: MemId(0),
            stats: SurfaceStats::default(),
        };
        surface.root = surface.alloc(Content::Element {
            tag: "root".to_owned(),
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
        });
        surface
    }

    /// The root element.
    pub fn root(&self) -> MemId {
        self.root
    }

    /// Create an element and append it to `parent`. Convenient for setting
    /// up mount targets; not counted in the stats.
    pub fn append_element(&mut self, parent: MemId, tag: &str) -> MemId {
        let id = self.alloc(Content::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
        });
        self.attach(parent, id, None);
        id
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SurfaceStats::default();
    }

    /// The tag of an element. `None` for text primitives.
    pub fn tag(&self, id: MemId) -> Option<&str> {
        match &self.slot(id)?.content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    pub fn attribute(&self, id: MemId, name: &str) -> Option<&str> {
        match &self.slot(id)?.content {
            Content::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            Content::Text(_) => None,
        }
    }

    pub fn style(&self, id: MemId, name: &str) -> Option<&str> {
        match &self.slot(id)?.content {
            Content::Element { style, .. } => style.get(name).map(String::as_str),
            Content::Text(_) => None,
        }
    }

    pub fn children(&self, id: MemId) -> Vec<MemId> {
        match self.slot(id).map(|slot| &slot.content) {
            Some(Content::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Concatenated text of `id` and its descendants.
    pub fn text_content(&self, id: MemId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: MemId, out: &mut String) {
        match self.slot(id).map(|slot| &slot.content) {
            Some(Content::Text(text)) => out.push_str(text),
            Some(Content::Element { children, .. }) => {
                for child in children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Serialise the subtree at `id` as markup.
    pub fn to_html(&self, id: MemId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: MemId, out: &mut String) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        match &slot.content {
            Content::Text(text) => out.push_str(text),
            Content::Element {
                tag,
                attrs,
                style,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                if !style.is_empty() {
                    let rules = style
                        .iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    let _ = write!(out, " style=\"{rules}\"");
                }
                out.push('>');
                for child in children {
                    self.write_html(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn alloc(&mut self, content: Content) -> MemId {
        let id = MemId(self.slots.len());
        self.slots.push(Slot {
            parent: None,
            content,
        });
        id
    }

    fn slot(&self, id: MemId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    fn slot_mut(&mut self, id: MemId) -> Option<&mut Slot> {
        self.slots.get_mut(id.0)
    }

    fn children_mut(&mut self, id: MemId) -> Option<&mut Vec<MemId>> {
        match &mut self.slot_mut(id)?.content {
            Content::Element { children, .. } => Some(children),
            Content::Text(_) => None,
        }
    }

    fn detach(&mut self, id: MemId) {
        let Some(parent) = self.slot(id).and_then(|slot| slot.parent) else {
            return;
        };
        if let Some(children) = self.children_mut(parent) {
            children.retain(|child| *child != id);
        }
        if let Some(slot) = self.slot_mut(id) {
            slot.parent = None;
        }
    }

    fn attach(&mut self, parent: MemId, child: MemId, anchor: Option<MemId>) {
        if parent == child {
            tracing::warn!(node = child.0, "refusing to insert a primitive into itself");
            return;
        }
        self.detach(child);

        let Some(children) = self.children_mut(parent) else {
            tracing::warn!(parent = parent.0, "insert into a text primitive ignored");
            return;
        };
        let position = anchor.and_then(|anchor| children.iter().position(|c| *c == anchor));
        match position {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    fn element_maps(
        &mut self,
        id: MemId,
    ) -> Option<(&mut IndexMap<String, String>, &mut IndexMap<String, String>)> {
        match &mut self.slot_mut(id)?.content {
            Content::Element { attrs, style, .. } => Some((attrs, style)),
            Content::Text(_) => None,
        }
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MemorySurface {
    type Handle = MemId;

    fn create_element(&mut self, tag: &str) -> MemId {
        self.stats.created += 1;
        self.alloc(Content::Element {
            tag: tag.to_owned(),
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            children: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> MemId {
        self.stats.created += 1;
        self.alloc(Content::Text(text.to_owned()))
    }

    fn set_text(&mut self, node: &MemId, text: &str) {
        if let Some(Slot {
            content: Content::Text(current),
            ..
        }) = self.slot_mut(*node)
        {
            *current = text.to_owned();
        }
    }

    fn set_attribute(&mut self, node: &MemId, name: &str, value: &str) {
        if let Some((attrs, _)) = self.element_maps(*node) {
            attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    fn remove_attribute(&mut self, node: &MemId, name: &str) {
        if let Some((attrs, _)) = self.element_maps(*node) {
            attrs.shift_remove(name);
        }
    }

    fn set_style(&mut self, node: &MemId, name: &str, value: &str) {
        if let Some((_, style)) = self.element_maps(*node) {
            style.insert(name.to_owned(), value.to_owned());
        }
    }

    fn clear_style(&mut self, node: &MemId, name: &str) {
        if let Some((_, style)) = self.element_maps(*node) {
            style.shift_remove(name);
        }
    }

    fn insert_before(&mut self, parent: &MemId, child: &MemId, anchor: Option<&MemId>) {
        self.stats.inserted += 1;
        if anchor == Some(child) {
            return;
        }
        self.attach(*parent, *child, anchor.copied());
    }

    fn remove_child(&mut self, parent: &MemId, child: &MemId) {
        if self.slot(*child).and_then(|slot| slot.parent) != Some(*parent) {
            return;
        }
        self.stats.removed += 1;
        self.detach(*child);
    }

    fn replace_child(&mut self, parent: &MemId, new: &MemId, old: &MemId) {
        if self.slot(*old).and_then(|slot| slot.parent) != Some(*parent) {
            return;
        }
        self.stats.replaced += 1;
        self.detach(*new);

        if let Some(children) = self.children_mut(*parent) {
            if let Some(index) = children.iter().position(|c| c == old) {
                children[index] = *new;
            }
        }
        if let Some(slot) = self.slot_mut(*old) {
            slot.parent = None;
        }
        if let Some(slot) = self.slot_mut(*new) {
            slot.parent = Some(*parent);
        }
    }

    fn clear_children(&mut self, parent: &MemId) {
        let children = match self.children_mut(*parent) {
            Some(children) => std::mem::take(children),
            None => return,
        };
        self.stats.removed += children.len();
        for child in children {
            if let Some(slot) = self.slot_mut(child) {
                slot.parent = None;
            }
        }
    }

    fn parent_of(&self, node: &MemId) -> Option<MemId> {
        self.slot(*node)?.parent
    }

    fn next_sibling(&self, node: &MemId) -> Option<MemId> {
        let parent = self.parent_of(node)?;
        match &self.slot(parent)?.content {
            Content::Element { children, .. } => {
                let index = children.iter().position(|c| c == node)?;
                children.get(index + 1).copied()
            }
            Content::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_list(n: usize) -> (MemorySurface, MemId, Vec<MemId>) {
        let mut surface = MemorySurface::new();
        let root = surface.root();
        let list = surface.append_element(root, "ul");
        let items = (0..n)
            .map(|i| {
                let li = surface.create_element("li");
                let text = surface.create_text(&i.to_string());
                surface.insert_before(&li, &text, None);
                surface.insert_before(&list, &li, None);
                li
            })
            .collect();
        (surface, list, items)
    }

    #[test]
    fn insert_before_moves_attached_primitives() {
        let (mut surface, list, items) = with_list(3);
        surface.insert_before(&list, &items[2], Some(&items[0]));

        assert_eq!(surface.children(list), vec![items[2], items[0], items[1]]);
        assert_eq!(surface.parent_of(&items[2]), Some(list));
    }

    #[test]
    fn missing_anchor_appends() {
        let (mut surface, list, items) = with_list(2);
        let stray = surface.create_element("li");
        surface.insert_before(&list, &items[0], Some(&stray));
        assert_eq!(surface.children(list), vec![items[1], items[0]]);
    }

    #[test]
    fn next_sibling_walks_the_parent() {
        let (surface, _list, items) = with_list(3);
        assert_eq!(surface.next_sibling(&items[0]), Some(items[1]));
        assert_eq!(surface.next_sibling(&items[2]), None);
        assert_eq!(surface.next_sibling(&surface.root()), None);
    }

    #[test]
    fn replace_child_keeps_position() {
        let (mut surface, list, items) = with_list(3);
        let fresh = surface.create_element("p");
        surface.replace_child(&list, &fresh, &items[1]);

        assert_eq!(surface.children(list), vec![items[0], fresh, items[2]]);
        assert_eq!(surface.parent_of(&items[1]), None);
        assert_eq!(surface.stats().replaced, 1);
    }

    #[test]
    fn clear_children_detaches_everything() {
        let (mut surface, list, items) = with_list(3);
        surface.reset_stats();
        surface.clear_children(&list);

        assert!(surface.children(list).is_empty());
        assert!(items.iter().all(|item| surface.parent_of(item).is_none()));
        assert_eq!(surface.stats().removed, 3);
    }

    #[test]
    fn renders_markup() {
        let mut surface = MemorySurface::new();
        let root = surface.root();
        let div = surface.append_element(root, "div");
        surface.set_attribute(&div, "id", "app");
        surface.set_style(&div, "color", "red");
        let text = surface.create_text("hi");
        surface.insert_before(&div, &text, None);

        assert_eq!(
            surface.to_html(div),
            r#"<div id="app" style="color: red">hi</div>"#
        );
        assert_eq!(surface.text_content(root), "hi");

        surface.remove_attribute(&div, "id");
        surface.clear_style(&div, "color");
        assert_eq!(surface.to_html(div), "<div>hi</div>");
    }
}
