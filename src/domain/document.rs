//! Arena-backed markup tree.
//!
//! Every node lives in a generational arena and is addressed by [`NodeId`].
//! Removing a node frees its slot, so handles to removed nodes simply stop
//! resolving instead of dangling.

use std::fmt;

use generational_arena::{Arena, Index};

use crate::domain::error::{DomainError, DomainResult};

/// Stable handle of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

/// Tagged element with ordered string attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace an existing attribute in place or append a new one.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Synthetic container of the prolog and the document element
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// Raw `<?xml ...?>` content
    Declaration(String),
    ProcessingInstruction(String),
    DocType(String),
}

/// Node in the arena-based document tree.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Parent node, None for the document node and detached nodes
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Ordered, mutable markup document.
#[derive(Debug)]
pub struct Document {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode {
            data: NodeData::Document,
            parent: None,
            children: Vec::new(),
        }));
        Self { arena, root }
    }

    /// The synthetic document node holding prolog items and the root element.
    pub fn document_node(&self) -> NodeId {
        self.root
    }

    /// The single top-level element, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.element_children(self.root).next()
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Number of live nodes, including the document node.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|node| &node.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id)? {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> DomainResult<()> {
        let node = self.arena.get_mut(id.0).ok_or(DomainError::NodeNotFound)?;
        match &mut node.data {
            NodeData::Element(element) => {
                element.set_attribute(name, value);
                Ok(())
            }
            _ => Err(DomainError::NotAnElement),
        }
    }

    /// Concatenation of the node's direct text and CDATA children.
    pub fn text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|&child| match self.data(child) {
                Some(NodeData::Text(text)) | Some(NodeData::CData(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(text)) if text.trim().is_empty())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children in document order; empty for unknown nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.element(child).is_some())
    }

    pub fn children_by_tag<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.element_children(id)
            .filter(move |&child| self.tag(child) == Some(tag))
    }

    /// Position of `id` among its parent's children.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        pos.checked_sub(1).map(|prev| self.children(parent)[prev])
    }

    /// Create a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        NodeId(self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        }))
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.create(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` below `parent` right before `reference`, or at the end
    /// when `reference` is None. An attached child is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomainResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(DomainError::NodeNotFound);
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomainError::NotAChild);
            }
        }
        self.detach(child);

        let node = self.arena.get_mut(parent.0).ok_or(DomainError::NodeNotFound)?;
        let pos = reference
            .and_then(|r| node.children.iter().position(|&c| c == r))
            .unwrap_or(node.children.len());
        node.children.insert(pos, child);

        if let Some(child_node) = self.arena.get_mut(child.0) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Unhook a node from its parent, keeping it alive in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent.0) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.arena.get_mut(id.0) {
            node.parent = None;
        }
    }

    /// Detach a node and free it together with its whole subtree.
    ///
    /// Returns false if the node was already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.contains(id) || id == self.root {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                stack.extend(node.children);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("AlertingConfig");
        doc.append_child(doc.document_node(), root).unwrap();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, b).unwrap();
        (doc, root, a, b)
    }

    #[test]
    fn given_reference_when_inserting_before_then_child_lands_in_front() {
        let (mut doc, root, a, b) = sample();
        let c = doc.create_element("c");

        doc.insert_before(root, c, Some(b)).unwrap();

        assert_eq!(doc.children(root), &[a, c, b]);
        assert_eq!(doc.parent(c), Some(root));
        assert_eq!(doc.previous_sibling(b), Some(c));
    }

    #[test]
    fn given_foreign_reference_when_inserting_then_errors() {
        let (mut doc, root, a, _) = sample();
        let c = doc.create_element("c");
        let d = doc.create_element("d");
        doc.append_child(a, d).unwrap();

        let result = doc.insert_before(root, c, Some(d));

        assert_eq!(result, Err(DomainError::NotAChild));
    }

    #[test]
    fn given_subtree_when_removing_then_all_nodes_are_freed() {
        let (mut doc, root, a, b) = sample();
        let text = doc.create_text("x");
        doc.append_child(a, text).unwrap();
        let before = doc.len();

        assert!(doc.remove(a));

        assert_eq!(doc.len(), before - 2);
        assert!(!doc.contains(text));
        assert_eq!(doc.children(root), &[b]);
        assert!(!doc.remove(a));
    }

    #[test]
    fn given_mixed_children_when_reading_text_then_concatenates_direct_text() {
        let (mut doc, _, a, _) = sample();
        let t1 = doc.create_text("my-");
        let inner = doc.create_element("i");
        let hidden = doc.create_text("hidden");
        let t2 = doc.create(NodeData::CData("id".into()));
        doc.append_child(a, t1).unwrap();
        doc.append_child(a, inner).unwrap();
        doc.append_child(inner, hidden).unwrap();
        doc.append_child(a, t2).unwrap();

        assert_eq!(doc.text(a), "my-id");
    }

    #[test]
    fn given_attribute_when_setting_twice_then_value_is_replaced() {
        let (mut doc, _, a, _) = sample();
        doc.set_attribute(a, "id", "one").unwrap();
        doc.set_attribute(a, "id", "two").unwrap();

        assert_eq!(doc.attribute(a, "id"), Some("two"));
        assert_eq!(doc.element(a).unwrap().attributes.len(), 1);
    }
}
