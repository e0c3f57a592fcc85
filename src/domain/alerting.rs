//! Alerting configuration: a document plus its category index.

use crate::domain::category::Category;
use crate::domain::document::{Document, NodeId};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::index::{self, CategoryIndex};

/// Whitespace handling for nodes created or removed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// One level of indentation
    pub indent: String,
    /// Emit indentation text around new nodes and drop the whitespace text
    /// preceding removed top-level nodes
    pub tidy: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            tidy: true,
        }
    }
}

/// Graph edge: a child element whose text names another node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The reference element itself
    pub element: NodeId,
    pub category: Category,
    /// Identifier of the target node
    pub target: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// An alerting configuration document with its identifier index.
#[derive(Debug)]
pub struct AlertingConfig {
    pub(crate) doc: Document,
    pub(crate) root: NodeId,
    pub(crate) index: CategoryIndex,
    pub(crate) layout: Layout,
}

impl AlertingConfig {
    /// Tag of the document element.
    pub const ROOT_TAG: &'static str = "AlertingConfig";

    /// Wrap a parsed document, checking its root marker and indexing it.
    pub fn new(doc: Document) -> DomainResult<Self> {
        let root = doc
            .document_element()
            .ok_or_else(|| DomainError::malformed("no root element"))?;
        let tag = doc.tag(root).unwrap_or_default();
        let local_name = tag.rsplit(':').next().unwrap_or(tag);
        if local_name != Self::ROOT_TAG {
            return Err(DomainError::malformed(format!(
                "expected <{}> root element, found <{}>",
                Self::ROOT_TAG,
                tag
            )));
        }
        let index = CategoryIndex::build(&doc, root);
        Ok(Self {
            doc,
            root,
            index,
            layout: Layout::default(),
        })
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access to the tree. Call [`AlertingConfig::rebuild`] after
    /// adding or removing children of the root this way.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The `AlertingConfig` element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    pub fn rebuild(&mut self) {
        self.index.rebuild(&self.doc, self.root);
    }

    pub fn category_of(&self, node: NodeId) -> Option<Category> {
        Category::from_tag(self.doc.tag(node)?)
    }

    pub fn identifier(&self, node: NodeId) -> Option<&str> {
        index::identifier(&self.doc, node)
    }

    pub fn lookup(&self, category: Category, identifier: &str) -> Option<NodeId> {
        self.index.lookup(category, identifier)
    }

    pub fn nodes(&self, category: Category) -> &[NodeId] {
        self.index.nodes(category)
    }

    pub fn definitions(&self) -> &[NodeId] {
        self.nodes(Category::Definition)
    }

    /// Text of the first child element with `tag`, e.g. `name` or `class`.
    pub fn child_text(&self, node: NodeId, tag: &str) -> Option<String> {
        self.doc
            .children_by_tag(node, tag)
            .next()
            .map(|child| self.doc.text(child))
    }

    pub fn class_of(&self, node: NodeId) -> Option<String> {
        self.child_text(node, "class").map(|s| s.trim().to_string())
    }

    fn reference(&self, element: NodeId, category: Category) -> Reference {
        Reference {
            element,
            category,
            target: self.doc.text(element).trim().to_string(),
            from: self.doc.attribute(element, "from").map(str::to_string),
            to: self.doc.attribute(element, "to").map(str::to_string),
        }
    }

    /// Reference children of `node` whose tag is `category`, in document order.
    pub fn references_of(
        &self,
        node: NodeId,
        category: Category,
    ) -> impl Iterator<Item = Reference> + '_ {
        self.doc
            .children_by_tag(node, category.tag())
            .map(move |element| self.reference(element, category))
    }

    /// All reference children of `node`, in document order.
    pub fn references(&self, node: NodeId) -> Vec<Reference> {
        self.doc
            .element_children(node)
            .filter_map(|child| {
                let category = self.category_of(child).filter(|c| c.is_referenced())?;
                Some(self.reference(child, category))
            })
            .collect()
    }

    /// Target node of a reference; None for dangling references.
    pub fn resolve(&self, reference: &Reference) -> Option<NodeId> {
        self.lookup(reference.category, &reference.target)
    }

    /// Resolved targets of the `category` references of `node`; dangling
    /// references are skipped.
    pub fn targets(&self, node: NodeId, category: Category) -> impl Iterator<Item = NodeId> + '_ {
        self.references_of(node, category)
            .filter_map(move |reference| self.resolve(&reference))
    }
}
