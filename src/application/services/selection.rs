//! Definition selection and whole-definition edits.

use std::collections::BTreeMap;

use regex::Regex;
use termtree::Tree;
use tracing::{debug, info, instrument};

use crate::application::services::inventory::display_name;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{AlertingConfig, Category, NodeId, PruneReport};

/// Which definitions a command works on.
#[derive(Debug, Clone, Default)]
pub struct DefinitionFilter {
    pattern: Option<Regex>,
    enabled_only: bool,
}

impl DefinitionFilter {
    /// Build a filter; without a pattern every name matches.
    pub fn new(pattern: Option<&str>, enabled_only: bool) -> ApplicationResult<Self> {
        let pattern = pattern
            .map(|p| {
                Regex::new(p).map_err(|source| ApplicationError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .transpose()?;
        Ok(Self {
            pattern,
            enabled_only,
        })
    }

    pub fn matches(&self, config: &AlertingConfig, definition: NodeId) -> bool {
        if self.enabled_only && !is_enabled(config, definition) {
            return false;
        }
        match &self.pattern {
            Some(pattern) => definition_name(config, definition)
                .is_some_and(|name| pattern.is_match(&name)),
            None => true,
        }
    }
}

pub fn is_enabled(config: &AlertingConfig, definition: NodeId) -> bool {
    config.document().attribute(definition, "enabled") == Some("true")
}

/// Name of a definition: its `name` attribute, else its identifier.
pub fn definition_name(config: &AlertingConfig, definition: NodeId) -> Option<String> {
    config
        .document()
        .attribute(definition, "name")
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| display_name(config, definition))
        .or_else(|| config.identifier(definition).map(str::to_string))
}

/// Definitions matching `filter`, in document order.
pub fn select(config: &AlertingConfig, filter: &DefinitionFilter) -> Vec<NodeId> {
    config
        .definitions()
        .iter()
        .copied()
        .filter(|&definition| filter.matches(config, definition))
        .collect()
}

/// Definitions whose graph reaches a node with the given `class`.
pub fn find_by_class(config: &AlertingConfig, class: &str) -> Vec<NodeId> {
    config
        .definitions()
        .iter()
        .copied()
        .filter(|&definition| {
            config
                .find(definition, |node| config.class_of(node).as_deref() == Some(class))
                .is_some()
        })
        .collect()
}

/// Keep only `wanted` definitions: remove every other definition, then prune
/// the entry points, operations and actions no wanted definition reaches.
#[instrument(level = "debug", skip(config, wanted), fields(wanted = wanted.len()))]
pub fn retain(config: &mut AlertingConfig, wanted: &[NodeId]) -> ApplicationResult<PruneReport> {
    let unwanted: Vec<NodeId> = config
        .definitions()
        .iter()
        .copied()
        .filter(|definition| !wanted.contains(definition))
        .collect();

    let mut report = PruneReport::default();
    for definition in unwanted {
        let name = definition_name(config, definition).unwrap_or_default();
        config.remove_node(definition)?;
        debug!("removed definition '{}'", name);
        report.removed.push((Category::Definition, name));
    }
    let pruned = config.prune(wanted);
    report.removed.extend(pruned.removed);
    info!(
        "kept {} definitions, removed {} nodes",
        wanted.len(),
        report.removed_count()
    );
    Ok(report)
}

/// Append ` <suffix>` to the name of each definition.
pub fn rename(config: &mut AlertingConfig, definitions: &[NodeId], suffix: &str) -> ApplicationResult<()> {
    for &definition in definitions {
        let old = definition_name(config, definition).unwrap_or_default();
        let new = format!("{old} {suffix}");
        debug!("rename '{}' -> '{}'", old, new);
        config
            .document_mut()
            .set_attribute(definition, "name", new)?;
    }
    // definitions without id are indexed by name
    config.rebuild();
    Ok(())
}

/// Mark definitions as disabled.
pub fn disable(config: &mut AlertingConfig, definitions: &[NodeId]) -> ApplicationResult<()> {
    for &definition in definitions {
        config
            .document_mut()
            .set_attribute(definition, "enabled", "false")?;
    }
    Ok(())
}

/// Definition names arranged as a tree of their `/`-separated segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedDefinitions {
    branches: BTreeMap<String, ChangedDefinitions>,
}

impl ChangedDefinitions {
    pub fn add(&mut self, name: &str) {
        let mut current = self;
        for segment in name.split('/') {
            current = current.branches.entry(segment.to_string()).or_default();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Sorted tree below `root`.
    pub fn to_tree(&self, root: &str) -> Tree<String> {
        fn leaves(node: &ChangedDefinitions) -> Vec<Tree<String>> {
            node.branches
                .iter()
                .map(|(segment, child)| Tree::new(segment.clone()).with_leaves(leaves(child)))
                .collect()
        }
        Tree::new(root.to_string()).with_leaves(leaves(self))
    }
}
