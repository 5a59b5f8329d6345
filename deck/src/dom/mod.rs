pub mod html;

use std::collections::BTreeMap;

/// Handle to a node stored in a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Class list, in insertion order, without duplicates.
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    /// Markup passed through from the source untouched.
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

/// An arena-backed document tree with parent links.
///
/// Nodes are never freed; detached nodes simply stop being reachable from
/// the root.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a tree holding a single `body` element.
    pub fn new() -> Self {
        let mut dom = Dom {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        dom.root = dom.create_element("body");
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_raw(&mut self, markup: impl Into<String>) -> NodeId {
        self.push(NodeKind::Raw(markup.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` before the current first child of `parent`.
    pub fn insert_first(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    pub fn is_element(&self, node: NodeId, tag: &str) -> bool {
        self.tag(node) == Some(tag)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|e| e.attributes.get(name))
            .map(|v| v.as_str())
    }

    /// Set an attribute. Ignored on text nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(node) {
            element.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|e| e.classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            if !element.classes.iter().any(|c| c == class) {
                element.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.retain(|c| c != class);
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let NodeKind::Text(s) = &self.nodes[node.0].kind {
            text.push_str(s);
        }
        for id in self.descendants(node) {
            if let NodeKind::Text(s) = &self.nodes[id.0].kind {
                text.push_str(s);
            }
        }
        text
    }

    /// Replace all children of `node` with a single text node. A lone text
    /// child is updated in place.
    pub fn set_text_content(&mut self, node: NodeId, text: impl Into<String>) {
        let text = text.into();
        if let &[child] = self.nodes[node.0].children.as_slice() {
            if let NodeKind::Text(existing) = &mut self.nodes[child.0].kind {
                *existing = text;
                return;
            }
        }
        self.clear_children(node);
        let text = self.create_text(text);
        self.append_child(node, text);
    }

    /// All nodes below `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Elements with the given tag below `scope`, in document order.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.is_element(id, tag))
            .collect()
    }

    /// First attached element carrying `id="<id>"`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&node| self.id(node) == Some(id))
    }

    /// Nearest node, starting at `node` and walking up through its
    /// ancestors, for which `predicate` holds.
    pub fn closest(
        &self,
        node: NodeId,
        predicate: impl Fn(&Dom, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if predicate(self, id) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Whether `node` or one of its ancestors carries `class`.
    pub fn within_class(&self, node: NodeId, class: &str) -> bool {
        self.closest(node, |dom, id| dom.has_class(id, class)).is_some()
    }
}
