//! Element handles: the seam between a live rendering and the fingerprint builder.
//!
//! A browser host implements [`ElementHandle`] over its own node references.
//! [`Tree`] is an in-memory implementation for hosts without a browser and for
//! tests; it is built programmatically, never parsed from source text.

use std::fmt::Write as _;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Read-only view of one element in a live rendering.
///
/// Equality must mean "same node", not "structurally equal": the fingerprint
/// builder finds an element's ordinal by comparing it against its siblings.
pub trait ElementHandle: Clone + PartialEq {
    /// Attributes in document order.
    fn attributes(&self) -> Vec<(String, String)>;
    /// Element children in document order, text nodes excluded.
    fn child_elements(&self) -> Vec<Self>;
    /// Concatenated text of the element's own text-node children.
    fn direct_text(&self) -> String;
    /// Serialized markup of the element's children.
    fn inner_html(&self) -> String;
    /// Whether this is the content root (the body of the rendered document).
    fn is_content_root(&self) -> bool;
    /// Serialized markup of the element itself.
    fn outer_html(&self) -> String;
    /// Parent element, `None` for detached nodes and the document element.
    fn parent(&self) -> Option<Self>;
    /// Tag name as reported by the host, any case.
    fn tag_name(&self) -> String;
    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String;
}

/// Index of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node stored in the arena.
#[derive(Debug)]
enum NodeData {
    /// An element with its attributes and children.
    Element {
        /// Attributes in insertion order.
        attributes: Vec<(String, String)>,
        /// Child nodes in document order.
        children: Vec<NodeId>,
        /// Owning element, `None` for the root.
        parent: Option<NodeId>,
        /// Tag name as given.
        tag: String,
    },
    /// A text node.
    Text {
        /// Raw (unescaped) text.
        text: String,
    },
}

/// Arena-backed element tree whose root is the content root (`body`).
#[derive(Debug)]
pub struct Tree {
    /// All nodes; index 0 is the root.
    nodes: Vec<NodeData>,
}

impl Default for Tree {
    fn default() -> Self {
        return Self::new();
    }
}

impl Tree {
    /// Create a tree holding only an empty `body` root.
    pub fn new() -> Self {
        return Self {
            nodes: vec![NodeData::Element {
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
                tag: "body".to_string(),
            }],
        };
    }

    /// Id of the content root.
    pub const fn root(&self) -> NodeId {
        return NodeId(0);
    }

    /// Append an element under `parent` and return its id.
    /// Appending under a text node or an unknown id attaches nothing and
    /// returns a detached element.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = NodeId(self.nodes.len());
        let attached = self.push_child(parent, id);
        self.nodes.push(NodeData::Element {
            attributes: attributes
                .iter()
                .map(|(name, value)| return ((*name).to_string(), (*value).to_string()))
                .collect(),
            children: Vec::new(),
            parent: attached.then_some(parent),
            tag: tag.to_string(),
        });
        return id;
    }

    /// Append a text node under `parent` and return its id.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.push_child(parent, id);
        self.nodes.push(NodeData::Text { text: text.to_string() });
        return id;
    }

    /// Handle for an element id, `None` for text nodes and unknown ids.
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        return match self.nodes.get(id.0) {
            Some(NodeData::Element { .. }) => Some(ElementRef { id, tree: self }),
            _ => None,
        };
    }

    /// Register `child` in `parent`'s child list. Returns false if `parent` is not an element.
    fn push_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(NodeData::Element { children, .. }) = self.nodes.get_mut(parent.0) else {
            return false;
        };
        children.push(child);
        return true;
    }

    /// Serialize one node into `out`.
    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id.0) {
            Some(NodeData::Text { text }) => out.push_str(&escape_text(text)),
            Some(NodeData::Element { attributes, children, tag, .. }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape_attribute(value));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str()) {
                    return;
                }
                for child in children {
                    self.write_node(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            },
            None => {},
        }
    }

    /// Collect descendant text of one node into `out`.
    fn write_text(&self, id: NodeId, out: &mut String) {
        match self.nodes.get(id.0) {
            Some(NodeData::Text { text }) => out.push_str(text),
            Some(NodeData::Element { children, .. }) => {
                for child in children {
                    self.write_text(*child, out);
                }
            },
            None => {},
        }
    }

    /// Children of an element, empty for anything else.
    fn children_of(&self, id: NodeId) -> &[NodeId] {
        return match self.nodes.get(id.0) {
            Some(NodeData::Element { children, .. }) => children,
            _ => &[],
        };
    }
}

/// Borrowed handle to one element of a [`Tree`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    /// Node id inside `tree`.
    id: NodeId,
    /// Owning tree.
    tree: &'a Tree,
}

impl ElementRef<'_> {
    /// The node id this handle points at.
    pub const fn id(&self) -> NodeId {
        return self.id;
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        return self.id == other.id && std::ptr::eq(self.tree, other.tree);
    }
}

impl ElementHandle for ElementRef<'_> {
    fn attributes(&self) -> Vec<(String, String)> {
        return match self.tree.nodes.get(self.id.0) {
            Some(NodeData::Element { attributes, .. }) => attributes.clone(),
            _ => Vec::new(),
        };
    }

    fn child_elements(&self) -> Vec<Self> {
        return self
            .tree
            .children_of(self.id)
            .iter()
            .filter_map(|child| return self.tree.element(*child))
            .collect();
    }

    fn direct_text(&self) -> String {
        let mut out = String::new();
        for child in self.tree.children_of(self.id) {
            if let Some(NodeData::Text { text }) = self.tree.nodes.get(child.0) {
                out.push_str(text);
            }
        }
        return out;
    }

    fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.tree.children_of(self.id) {
            self.tree.write_node(*child, &mut out);
        }
        return out;
    }

    fn is_content_root(&self) -> bool {
        return self.id == self.tree.root();
    }

    fn outer_html(&self) -> String {
        let mut out = String::new();
        self.tree.write_node(self.id, &mut out);
        return out;
    }

    fn parent(&self) -> Option<Self> {
        return match self.tree.nodes.get(self.id.0) {
            Some(NodeData::Element { parent: Some(parent), .. }) => self.tree.element(*parent),
            _ => None,
        };
    }

    fn tag_name(&self) -> String {
        return match self.tree.nodes.get(self.id.0) {
            Some(NodeData::Element { tag, .. }) => tag.clone(),
            _ => String::new(),
        };
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        self.tree.write_text(self.id, &mut out);
        return out;
    }
}

/// Escape text for placement between tags.
pub fn escape_text(text: &str) -> String {
    return text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
}

/// Escape a value for placement inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
    return value.replace('&', "&amp;").replace('"', "&quot;");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_markup_with_void_elements() {
        let mut tree = Tree::new();
        let card = tree.append_element(tree.root(), "div", &[("class", "card")]);
        let title = tree.append_element(card, "h1", &[]);
        tree.append_text(title, "Fish & Chips");
        tree.append_element(card, "img", &[("src", "a.png"), ("alt", "say \"hi\"")]);

        let card_ref = tree.element(card).unwrap();
        assert_eq!(
            card_ref.outer_html(),
            "<div class=\"card\"><h1>Fish &amp; Chips</h1><img src=\"a.png\" alt=\"say &quot;hi&quot;\"></div>"
        );
        assert_eq!(card_ref.text_content(), "Fish & Chips");
        assert_eq!(card_ref.direct_text(), "");
    }

    #[test]
    fn handles_compare_by_identity() {
        let mut tree = Tree::new();
        let first = tree.append_element(tree.root(), "p", &[]);
        let second = tree.append_element(tree.root(), "p", &[]);
        let a = tree.element(first).unwrap();
        let b = tree.element(second).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, tree.element(first).unwrap());
        assert_eq!(a.parent().map(|p| p.is_content_root()), Some(true));
    }

    #[test]
    fn appending_under_text_node_yields_detached_element() {
        let mut tree = Tree::new();
        let text = tree.append_text(tree.root(), "loose");
        let orphan = tree.append_element(text, "span", &[]);
        assert!(tree.element(orphan).unwrap().parent().is_none());
    }
}
