//! Node Descriptions
//!
//! A [`Node`] is a cheap, plain description of one piece of UI. A render
//! produces a fresh tree of them every time; the reconciler compares it with
//! the previous tree and records the surface primitive each node ended up
//! backed by in its `mounted` field.
//!
//! Identity for reconciliation is [`same_node`]: same kind, same tag, same
//! key. Two nodes without a key match each other.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A sibling-unique identity for list reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(i64::from(value))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        // Keys beyond i64::MAX are not meaningful list positions.
        Key::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

/// Attributes and styles of an element, plus an optional key.
///
/// The key is lifted onto the node by [`make_element`] and
/// [`make_component`]; it never reaches the surface as an attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Props {
    pub key: Option<Key>,
    pub attrs: IndexMap<String, String>,
    pub style: IndexMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.style.is_empty()
    }
}

/// Renders a component's subtree from its props and children.
pub trait ComponentFactory<H> {
    fn render(&self, props: &Props, children: &[Node<H>]) -> Node<H>;
}

impl<H, F> ComponentFactory<H> for F
where
    F: Fn(&Props, &[Node<H>]) -> Node<H>,
{
    fn render(&self, props: &Props, children: &[Node<H>]) -> Node<H> {
        self(props, children)
    }
}

#[derive(Debug, Clone)]
pub struct ElementNode<H> {
    pub tag: String,
    pub key: Option<Key>,
    pub props: Props,
    pub children: Vec<Node<H>>,
    pub mounted: Option<H>,
}

#[derive(Debug, Clone)]
pub struct TextNode<H> {
    pub text: String,
    pub mounted: Option<H>,
}

/// A component placeholder. Its rendered subtree lives in `instance` once
/// the reconciler has built it.
pub struct ComponentNode<H> {
    pub tag: String,
    pub key: Option<Key>,
    pub props: Props,
    pub children: Vec<Node<H>>,
    pub factory: Rc<dyn ComponentFactory<H>>,
    pub instance: Option<Box<Node<H>>>,
}

impl<H: Clone> Clone for ComponentNode<H> {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            key: self.key.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            factory: Rc::clone(&self.factory),
            instance: self.instance.clone(),
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for ComponentNode<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentNode")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("props", &self.props)
            .field("children", &self.children)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

/// Which variant a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Component,
}

/// A node description. `H` is the surface's primitive handle type.
#[derive(Debug, Clone)]
pub enum Node<H> {
    Element(ElementNode<H>),
    Text(TextNode<H>),
    Component(ComponentNode<H>),
}

/// Describe an element. A key in `props` moves onto the node.
pub fn make_element<H>(
    tag: impl Into<String>,
    mut props: Props,
    children: Vec<Node<H>>,
) -> Node<H> {
    let key = props.key.take();
    Node::Element(ElementNode {
        tag: tag.into(),
        key,
        props,
        children,
        mounted: None,
    })
}

/// Describe a text node.
pub fn make_text<H>(text: impl Into<String>) -> Node<H> {
    Node::Text(TextNode {
        text: text.into(),
        mounted: None,
    })
}

/// Describe a component. A key in `props` moves onto the node.
pub fn make_component<H, F>(
    tag: impl Into<String>,
    factory: F,
    mut props: Props,
    children: Vec<Node<H>>,
) -> Node<H>
where
    F: ComponentFactory<H> + 'static,
{
    let key = props.key.take();
    Node::Component(ComponentNode {
        tag: tag.into(),
        key,
        props,
        children,
        factory: Rc::new(factory),
        instance: None,
    })
}

/// Reconciliation identity: same kind, same tag and same key.
pub fn same_node<H>(a: &Node<H>, b: &Node<H>) -> bool {
    a.kind() == b.kind() && a.tag() == b.tag() && a.key() == b.key()
}

impl<H> Node<H> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::Component(_) => NodeKind::Component,
        }
    }

    /// The tag. `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Node::Element(el) => Some(&el.tag),
            Node::Text(_) => None,
            Node::Component(c) => Some(&c.tag),
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Node::Element(el) => el.key.as_ref(),
            Node::Text(_) => None,
            Node::Component(c) => c.key.as_ref(),
        }
    }

    /// The primitive backing this node, once reconciled. A component is
    /// backed by the root of its rendered subtree.
    pub fn mounted(&self) -> Option<&H> {
        match self {
            Node::Element(el) => el.mounted.as_ref(),
            Node::Text(text) => text.mounted.as_ref(),
            Node::Component(c) => c.instance.as_deref().and_then(Node::mounted),
        }
    }

    pub fn children(&self) -> &[Node<H>] {
        match self {
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
            Node::Component(c) => &c.children,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn props(&self) -> Option<&Props> {
        match self {
            Node::Element(el) => Some(&el.props),
            Node::Text(_) => None,
            Node::Component(c) => Some(&c.props),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type N = Node<u32>;

    #[test]
    fn key_moves_out_of_props() {
        let node: N = make_element("li", Props::new().key("a").attr("class", "item"), vec![]);
        assert_eq!(node.key(), Some(&Key::from("a")));
        assert_eq!(node.props().unwrap().key, None);
        assert_eq!(node.props().unwrap().attrs.get("class").map(String::as_str), Some("item"));
    }

    #[test]
    fn identity_is_kind_tag_and_key() {
        let a: N = make_element("li", Props::new().key(1), vec![]);
        let b: N = make_element("li", Props::new().key(1), vec![make_text("x")]);
        let c: N = make_element("li", Props::new().key(2), vec![]);
        let d: N = make_element("p", Props::new().key(1), vec![]);

        assert!(same_node(&a, &b));
        assert!(!same_node(&a, &c));
        assert!(!same_node(&a, &d));
    }

    #[test]
    fn unkeyed_nodes_match_each_other() {
        let a: N = make_element("div", Props::new(), vec![]);
        let b: N = make_element("div", Props::new().attr("id", "x"), vec![]);
        assert!(same_node(&a, &b));
        assert!(same_node::<u32>(&make_text("a"), &make_text("b")));
    }

    #[test]
    fn components_never_match_elements() {
        let element: N = make_element("card", Props::new(), vec![]);
        let component: N = make_component(
            "card",
            |_: &Props, _: &[N]| make_element("div", Props::new(), vec![]),
            Props::new(),
            vec![],
        );
        assert!(!same_node(&element, &component));
        assert_eq!(component.kind(), NodeKind::Component);
        assert!(component.mounted().is_none());
    }

    #[test]
    fn props_deserialize_with_defaults() {
        let props: Props =
            serde_json::from_str(r#"{ "key": 3, "attrs": { "id": "x" } }"#).unwrap();
        assert_eq!(props.key, Some(Key::Int(3)));
        assert!(props.style.is_empty());

        let props: Props = serde_json::from_str(r#"{ "key": "row" }"#).unwrap();
        assert_eq!(props.key, Some(Key::from("row")));
    }
}
