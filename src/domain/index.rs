//! Category index over the document root's direct children.
//!
//! The index is a derived view: it is built once per document and must be
//! rebuilt after the root's children are edited directly. Edits made through
//! [`crate::domain::AlertingConfig`] keep it current.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::warn;

use crate::domain::category::Category;
use crate::domain::document::{Document, NodeId};

/// Declared identifier of a node: the non-empty `id` attribute, else the
/// non-empty `name` attribute.
pub fn identifier(doc: &Document, node: NodeId) -> Option<&str> {
    ["id", "name"]
        .into_iter()
        .filter_map(|attr| doc.attribute(node, attr))
        .find(|value| !value.is_empty())
}

/// Non-fatal finding produced while indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Top-level element whose tag is not a known category; not indexed
    UnknownCategory { tag: String },
    /// Second node with an already indexed identifier; the first one wins
    DuplicateIdentifier {
        category: Category,
        identifier: String,
    },
    /// Referencable node without `id`/`name`; it can never be a link target
    MissingIdentifier { category: Category },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownCategory { tag } => {
                write!(f, "unknown top-level element <{tag}> ignored")
            }
            Diagnostic::DuplicateIdentifier {
                category,
                identifier,
            } => write!(f, "duplicate {category} identifier '{identifier}' ignored"),
            Diagnostic::MissingIdentifier { category } => {
                write!(f, "{category} without id or name cannot be referenced")
            }
        }
    }
}

/// Per-category node lists, insertion points and identifier lookup.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    lists: BTreeMap<Category, Vec<NodeId>>,
    ref_points: [Option<NodeId>; Category::COUNT],
    identifiers: HashMap<Category, HashMap<String, NodeId>>,
    diagnostics: Vec<Diagnostic>,
}

impl CategoryIndex {
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut index = Self::default();
        index.rebuild(doc, root);
        index
    }

    /// Recompute everything from the root's element children.
    pub fn rebuild(&mut self, doc: &Document, root: NodeId) {
        self.lists.clear();
        self.identifiers.clear();
        self.diagnostics.clear();

        for child in doc.element_children(root) {
            let tag = doc.tag(child).unwrap_or_default();
            let Some(category) = Category::from_tag(tag) else {
                self.diagnose(Diagnostic::UnknownCategory {
                    tag: tag.to_string(),
                });
                continue;
            };
            self.lists.entry(category).or_default().push(child);

            match identifier(doc, child) {
                Some(id) if self.lookup(category, id).is_some() => {
                    self.diagnose(Diagnostic::DuplicateIdentifier {
                        category,
                        identifier: id.to_string(),
                    });
                }
                Some(id) => {
                    self.identifiers
                        .entry(category)
                        .or_default()
                        .insert(id.to_string(), child);
                }
                None if category.is_referenced() => {
                    self.diagnose(Diagnostic::MissingIdentifier { category });
                }
                None => {}
            }
        }
        self.compute_ref_points();
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Insertion point of each category: the first node of the nearest later
    /// category that currently has nodes.
    fn compute_ref_points(&mut self) {
        let mut carried = None;
        for category in Category::ORDER.into_iter().rev() {
            self.ref_points[category.rank()] = carried;
            carried = self.first(category).or(carried);
        }
    }

    /// Nodes of a category in document order.
    pub fn nodes(&self, category: Category) -> &[NodeId] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Present categories in fixed category order.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[NodeId])> {
        self.lists.iter().map(|(c, nodes)| (*c, nodes.as_slice()))
    }

    pub fn first(&self, category: Category) -> Option<NodeId> {
        self.nodes(category).first().copied()
    }

    /// Node a new node of `category` must be inserted before; None means
    /// append at the end of the root.
    pub fn ref_point(&self, category: Category) -> Option<NodeId> {
        self.ref_points[category.rank()]
    }

    pub fn lookup(&self, category: Category, identifier: &str) -> Option<NodeId> {
        if identifier.is_empty() {
            return None;
        }
        self.identifiers.get(&category)?.get(identifier).copied()
    }

    /// Indexed identifiers of a category, in no particular order.
    pub fn identifiers(&self, category: Category) -> impl Iterator<Item = (&str, NodeId)> {
        self.identifiers
            .get(&category)
            .into_iter()
            .flat_map(|ids| ids.iter().map(|(id, node)| (id.as_str(), *node)))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Record a node just inserted below `root`.
    pub(crate) fn register(
        &mut self,
        doc: &Document,
        root: NodeId,
        category: Category,
        identifier: &str,
        node: NodeId,
    ) {
        self.identifiers
            .entry(category)
            .or_default()
            .insert(identifier.to_string(), node);
        let list: Vec<NodeId> = doc
            .children_by_tag(root, category.tag())
            .collect();
        self.lists.insert(category, list);
        self.compute_ref_points();
    }

    /// Forget a node that is being removed from the root.
    pub(crate) fn unregister(&mut self, category: Category, node: NodeId) {
        if let Some(ids) = self.identifiers.get_mut(&category) {
            ids.retain(|_, n| *n != node);
        }
        if let Some(list) = self.lists.get_mut(&category) {
            list.retain(|n| *n != node);
            if list.is_empty() {
                self.lists.remove(&category);
            }
        }
        self.compute_ref_points();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(tags: &[(&str, &str)]) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let root = doc.create_element("AlertingConfig");
        doc.append_child(doc.document_node(), root).unwrap();
        let mut nodes = Vec::new();
        for (tag, id) in tags {
            let node = doc.create_element(*tag);
            if !id.is_empty() {
                doc.set_attribute(node, "id", *id).unwrap();
            }
            doc.append_child(root, node).unwrap();
            nodes.push(node);
        }
        (doc, root, nodes)
    }

    #[test]
    fn given_interleaved_categories_when_building_then_lists_keep_document_order() {
        let (doc, root, n) = build(&[
            ("definition-list", "d1"),
            ("entry-point-list", "e1"),
            ("definition-list", "d2"),
            ("action-list", "a1"),
        ]);

        let index = CategoryIndex::build(&doc, root);

        assert_eq!(index.nodes(Category::Definition), &[n[0], n[2]]);
        assert_eq!(index.nodes(Category::EntryPoint), &[n[1]]);
        assert_eq!(index.lookup(Category::Action, "a1"), Some(n[3]));
        assert_eq!(index.lookup(Category::Operation, "a1"), None);
    }

    #[test]
    fn given_missing_categories_when_building_then_ref_points_skip_to_next_existing() {
        let (doc, root, n) = build(&[
            ("definition-list", "d1"),
            ("action-list", "a1"),
            ("component-template-list", "t1"),
        ]);

        let index = CategoryIndex::build(&doc, root);

        assert_eq!(index.ref_point(Category::Adapter), Some(n[0]));
        assert_eq!(index.ref_point(Category::Definition), Some(n[1]));
        assert_eq!(index.ref_point(Category::EntryPoint), Some(n[1]));
        assert_eq!(index.ref_point(Category::Operation), Some(n[1]));
        assert_eq!(index.ref_point(Category::Action), Some(n[2]));
        assert_eq!(index.ref_point(Category::GroupedBox), Some(n[2]));
        assert_eq!(index.ref_point(Category::ComponentTemplate), None);
    }

    #[test]
    fn given_name_attribute_when_indexing_then_used_as_identifier() {
        let mut doc = Document::new();
        let root = doc.create_element("AlertingConfig");
        doc.append_child(doc.document_node(), root).unwrap();
        let def = doc.create_element("definition-list");
        doc.set_attribute(def, "id", "").unwrap();
        doc.set_attribute(def, "name", "Health/Availability").unwrap();
        doc.append_child(root, def).unwrap();

        let index = CategoryIndex::build(&doc, root);

        assert_eq!(
            index.lookup(Category::Definition, "Health/Availability"),
            Some(def)
        );
    }

    #[test]
    fn given_duplicates_and_unknown_tags_when_building_then_reports_diagnostics() {
        let (doc, root, n) = build(&[
            ("action-list", "a1"),
            ("action-list", "a1"),
            ("mystery-list", "m"),
            ("operation-list", ""),
        ]);

        let index = CategoryIndex::build(&doc, root);

        assert_eq!(index.lookup(Category::Action, "a1"), Some(n[0]));
        assert_eq!(index.diagnostics().len(), 3);
        assert!(index
            .diagnostics()
            .contains(&Diagnostic::UnknownCategory {
                tag: "mystery-list".into()
            }));
    }

    #[test]
    fn given_node_when_unregistering_then_ref_points_follow() {
        let (doc, root, n) = build(&[("definition-list", "d1"), ("action-list", "a1")]);
        let mut index = CategoryIndex::build(&doc, root);

        index.unregister(Category::Action, n[1]);

        assert_eq!(index.lookup(Category::Action, "a1"), None);
        assert!(index.nodes(Category::Action).is_empty());
        assert_eq!(index.ref_point(Category::EntryPoint), None);
    }
}
