//! Node creation and linking.

use tracing::{debug, instrument};

use crate::domain::alerting::AlertingConfig;
use crate::domain::category::Category;
use crate::domain::document::NodeId;
use crate::domain::error::{DomainError, DomainResult};

/// Sub-element of a new node: `<tag name="label">value</tag>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub tag: String,
    pub label: Option<String>,
    pub value: String,
}

impl Component {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            label: None,
            value: value.into(),
        }
    }

    /// Component carrying a `name` attribute, e.g. a `param-list` entry.
    pub fn labeled(
        tag: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            label: Some(label.into()),
            value: value.into(),
        }
    }
}

impl AlertingConfig {
    fn append_text(&mut self, parent: NodeId, text: String) -> DomainResult<()> {
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node)
    }

    /// Create a top-level node of `category` with `identifier` as its `id`.
    ///
    /// The node is inserted before the category's insertion point so the
    /// first node of every category stays in category order, and it is
    /// registered in the index right away.
    ///
    /// # Errors
    /// `MissingIdentifier` for an empty identifier, `DuplicateIdentifier` if
    /// the identifier is already indexed for the category; the document is
    /// left untouched.
    ///
    /// # Panics
    /// If the insertion point is not a direct child of the root.
    #[instrument(level = "debug", skip(self, components))]
    pub fn create_node(
        &mut self,
        category: Category,
        identifier: &str,
        components: &[Component],
    ) -> DomainResult<NodeId> {
        if identifier.is_empty() {
            return Err(DomainError::MissingIdentifier {
                tag: category.tag().to_string(),
            });
        }
        if self.lookup(category, identifier).is_some() {
            return Err(DomainError::DuplicateIdentifier {
                category,
                identifier: identifier.to_string(),
            });
        }
        let reference = self.index.ref_point(category);
        if let Some(reference) = reference {
            assert_eq!(
                self.doc.parent(reference),
                Some(self.root),
                "structural invariant violated: insertion point for {category} is not a child of the root"
            );
        }

        let indent = self.layout.indent.clone();
        let tidy = self.layout.tidy;
        let node = self.doc.create_element(category.tag());
        self.doc.set_attribute(node, "id", identifier)?;
        if tidy {
            self.append_text(node, format!("\n{indent}"))?;
        }
        for component in components {
            let element = self.doc.create_element(component.tag.as_str());
            if let Some(label) = &component.label {
                self.doc.set_attribute(element, "name", label.as_str())?;
            }
            if !component.value.is_empty() {
                self.append_text(element, component.value.clone())?;
            }
            if tidy {
                self.append_text(node, indent.clone())?;
            }
            self.doc.append_child(node, element)?;
            if tidy {
                self.append_text(node, format!("\n{indent}"))?;
            }
        }

        if tidy && reference.is_none() {
            let lead = self.doc.create_text(indent.clone());
            self.doc.append_child(self.root, lead)?;
        }
        self.doc.insert_before(self.root, node, reference)?;
        if tidy {
            let trail = match reference {
                Some(_) => format!("\n{indent}"),
                None => "\n".to_string(),
            };
            let trail = self.doc.create_text(trail);
            self.doc.insert_before(self.root, trail, reference)?;
        }

        self.index
            .register(&self.doc, self.root, category, identifier, node);
        debug!("created {} '{}'", category, identifier);
        Ok(node)
    }

    /// Append to `source` a reference to `dest` labelled with ports.
    ///
    /// Duplicate links are allowed.
    #[instrument(level = "debug", skip(self))]
    pub fn add_link(
        &mut self,
        source: NodeId,
        dest: NodeId,
        from_port: &str,
        to_port: &str,
    ) -> DomainResult<NodeId> {
        if !self.doc.contains(source) || !self.doc.contains(dest) {
            return Err(DomainError::NodeNotFound);
        }
        let tag = self
            .doc
            .tag(dest)
            .ok_or(DomainError::NotAnElement)?
            .to_string();
        let target = self
            .identifier(dest)
            .ok_or_else(|| DomainError::MissingIdentifier { tag: tag.clone() })?
            .to_string();

        let link = self.doc.create_element(tag);
        self.doc.set_attribute(link, "from", from_port)?;
        self.doc.set_attribute(link, "to", to_port)?;
        self.append_text(link, target)?;

        let indent = self.layout.indent.clone();
        if self.layout.tidy {
            self.append_text(source, indent.clone())?;
        }
        self.doc.append_child(source, link)?;
        if self.layout.tidy {
            self.append_text(source, format!("\n{indent}"))?;
        }
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Document, Layout};

    fn empty(tidy: bool) -> AlertingConfig {
        let mut doc = Document::new();
        let root = doc.create_element("AlertingConfig");
        doc.append_child(doc.document_node(), root).unwrap();
        AlertingConfig::new(doc).unwrap().with_layout(Layout {
            tidy,
            ..Layout::default()
        })
    }

    fn top_level_tags(config: &AlertingConfig) -> Vec<String> {
        let doc = config.document();
        doc.element_children(config.root())
            .map(|n| doc.tag(n).unwrap().to_string())
            .collect()
    }

    #[test]
    fn given_components_when_creating_then_sub_elements_are_attached() {
        let mut config = empty(false);

        let node = config
            .create_node(
                Category::Action,
                "mail",
                &[
                    Component::new("name", "send mail"),
                    Component::labeled("param-list", "to", "ops@example.com"),
                ],
            )
            .unwrap();

        let doc = config.document();
        assert_eq!(doc.attribute(node, "id"), Some("mail"));
        let params: Vec<NodeId> = doc.children_by_tag(node, "param-list").collect();
        assert_eq!(params.len(), 1);
        assert_eq!(doc.attribute(params[0], "name"), Some("to"));
        assert_eq!(doc.text(params[0]), "ops@example.com");
        assert_eq!(config.child_text(node, "name").as_deref(), Some("send mail"));
        assert_eq!(config.lookup(Category::Action, "mail"), Some(node));
    }

    #[test]
    fn given_reverse_creation_order_when_creating_then_categories_stay_ordered() {
        let mut config = empty(true);

        config.create_node(Category::Action, "a1", &[]).unwrap();
        config.create_node(Category::Definition, "d1", &[]).unwrap();
        config.create_node(Category::Operation, "o1", &[]).unwrap();
        config.create_node(Category::Action, "a2", &[]).unwrap();
        config.create_node(Category::Adapter, "ad", &[]).unwrap();
        config.create_node(Category::EntryPoint, "e1", &[]).unwrap();

        assert_eq!(
            top_level_tags(&config),
            [
                "adapter-list",
                "definition-list",
                "entry-point-list",
                "operation-list",
                "action-list",
                "action-list",
            ]
        );
    }

    #[test]
    fn given_duplicate_identifier_when_creating_then_fails_without_mutation() {
        let mut config = empty(true);
        config.create_node(Category::Operation, "o1", &[]).unwrap();
        let before = config.document().len();

        let result = config.create_node(Category::Operation, "o1", &[Component::new("x", "y")]);

        assert_eq!(
            result,
            Err(DomainError::DuplicateIdentifier {
                category: Category::Operation,
                identifier: "o1".into()
            })
        );
        assert_eq!(config.document().len(), before);
    }

    #[test]
    fn given_empty_identifier_when_creating_then_fails_without_mutation() {
        let mut config = empty(true);
        let before = config.document().len();

        let result = config.create_node(Category::Action, "", &[Component::new("name", "x")]);

        assert!(matches!(result, Err(DomainError::MissingIdentifier { .. })));
        assert_eq!(config.document().len(), before);
        assert!(config.nodes(Category::Action).is_empty());
        assert_eq!(config.lookup(Category::Action, ""), None);
    }

    #[test]
    fn given_same_identifier_in_other_category_when_creating_then_succeeds() {
        let mut config = empty(false);
        config.create_node(Category::Operation, "x", &[]).unwrap();

        assert!(config.create_node(Category::Action, "x", &[]).is_ok());
    }

    #[test]
    fn given_link_twice_when_adding_then_both_edges_exist() {
        let mut config = empty(false);
        let op = config.create_node(Category::Operation, "o1", &[]).unwrap();
        let action = config.create_node(Category::Action, "a1", &[]).unwrap();

        config.add_link(op, action, "true", "entry").unwrap();
        config.add_link(op, action, "true", "entry").unwrap();

        let refs = config.references(op);
        assert_eq!(refs.len(), 2);
        assert!(refs
            .iter()
            .all(|r| r.target == "a1" && r.from.as_deref() == Some("true")));
    }

    #[test]
    fn given_destination_without_identifier_when_linking_then_errors() {
        let mut config = empty(false);
        let op = config.create_node(Category::Operation, "o1", &[]).unwrap();
        let root = config.root();
        let anonymous = config.document_mut().create_element("action-list");
        config.document_mut().append_child(root, anonymous).unwrap();

        let result = config.add_link(op, anonymous, "true", "entry");

        assert!(matches!(result, Err(DomainError::MissingIdentifier { .. })));
    }
}
