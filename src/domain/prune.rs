//! Reachability of entry points, operations and actions from live definitions.

use std::collections::HashSet;

use tracing::{debug, info, instrument};

use crate::domain::alerting::AlertingConfig;
use crate::domain::category::Category;
use crate::domain::document::NodeId;
use crate::domain::error::{DomainError, DomainResult};

/// Identifiers reachable from a set of live definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Liveness {
    pub entry_points: HashSet<String>,
    pub operations: HashSet<String>,
    pub actions: HashSet<String>,
}

impl Liveness {
    pub fn get(&self, category: Category) -> Option<&HashSet<String>> {
        match category {
            Category::EntryPoint => Some(&self.entry_points),
            Category::Operation => Some(&self.operations),
            Category::Action => Some(&self.actions),
            _ => None,
        }
    }

    pub fn is_live(&self, category: Category, identifier: &str) -> bool {
        self.get(category)
            .is_some_and(|live| live.contains(identifier))
    }
}

/// Nodes removed by a prune run, in removal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<(Category, String)>,
}

impl PruneReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

impl AlertingConfig {
    fn target_ids(&self, node: NodeId, category: Category) -> Vec<(NodeId, String)> {
        self.targets(node, category)
            .filter_map(|target| Some((target, self.identifier(target)?.to_string())))
            .collect()
    }

    /// Compute the live sets of `definitions` on the current graph.
    ///
    /// Entry points are the direct references of the definitions. Operations
    /// are closed over nested operation references. Actions are those
    /// referenced by live entry points or live operations.
    pub fn liveness(&self, definitions: &[NodeId]) -> Liveness {
        let mut live = Liveness::default();
        let mut entry_nodes = Vec::new();
        for &definition in definitions {
            for (node, id) in self.target_ids(definition, Category::EntryPoint) {
                if live.entry_points.insert(id) {
                    entry_nodes.push(node);
                }
            }
        }

        let mut operation_nodes = Vec::new();
        let mut worklist = entry_nodes.clone();
        while let Some(node) = worklist.pop() {
            for (operation, id) in self.target_ids(node, Category::Operation) {
                if live.operations.insert(id) {
                    operation_nodes.push(operation);
                    worklist.push(operation);
                }
            }
        }

        for node in entry_nodes.into_iter().chain(operation_nodes) {
            for (_, id) in self.target_ids(node, Category::Action) {
                live.actions.insert(id);
            }
        }
        live
    }

    /// Top-level entry points, operations and actions not reachable from
    /// `definitions`, grouped by category, in document order.
    ///
    /// Nodes without identifier can never be referenced and count as orphans.
    pub fn orphans(&self, definitions: &[NodeId]) -> Vec<(Category, Option<String>, NodeId)> {
        let live = self.liveness(definitions);
        let live = &live;
        Category::REFERENCED
            .into_iter()
            .flat_map(|category| {
                self.nodes(category)
                    .iter()
                    .filter_map(move |&node| match self.identifier(node) {
                        Some(id) if live.is_live(category, id) => None,
                        id => Some((category, id.map(str::to_string), node)),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Remove every entry point, operation and action not reachable from
    /// `definitions`.
    ///
    /// All liveness is computed on the graph as it is before the first
    /// removal. References left in surviving nodes are not touched.
    #[instrument(level = "debug", skip(self))]
    pub fn prune(&mut self, definitions: &[NodeId]) -> PruneReport {
        let mut report = PruneReport::default();
        for (category, id, node) in self.orphans(definitions) {
            if self.remove_node(node).is_ok() {
                debug!("removed {} '{}'", category, id.as_deref().unwrap_or("?"));
                report.removed.push((category, id.unwrap_or_default()));
            }
        }
        info!("pruned {} nodes", report.removed_count());
        report
    }

    /// Remove a top-level node together with its subtree.
    ///
    /// With a tidy layout the whitespace-only text right before the node is
    /// removed as well.
    pub fn remove_node(&mut self, node: NodeId) -> DomainResult<()> {
        if !self.doc.contains(node) {
            return Err(DomainError::NodeNotFound);
        }
        if self.doc.parent(node) != Some(self.root) {
            return Err(DomainError::NotAChild);
        }
        let category = self.category_of(node);
        if self.layout.tidy {
            if let Some(previous) = self.doc.previous_sibling(node) {
                if self.doc.is_whitespace_text(previous) {
                    self.doc.remove(previous);
                }
            }
        }
        self.doc.remove(node);
        if let Some(category) = category {
            self.index.unregister(category, node);
        }
        Ok(())
    }
}
