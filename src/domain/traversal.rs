//! Cycle-safe walk over the reference graph of a definition.

use std::collections::HashSet;

use tracing::{instrument, trace};

use crate::domain::alerting::AlertingConfig;
use crate::domain::category::Category;
use crate::domain::document::NodeId;

/// Which node kinds a walk hands to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkScope {
    pub actions: bool,
}

impl Default for WalkScope {
    fn default() -> Self {
        Self { actions: true }
    }
}

struct Walker<'a, F> {
    config: &'a AlertingConfig,
    scope: WalkScope,
    visited: HashSet<NodeId>,
    visit: F,
}

impl<'a, F> Walker<'a, F> {
    fn run<R>(&mut self, definition: NodeId) -> Option<R>
    where
        F: FnMut(NodeId, NodeId) -> Option<R>,
    {
        let config = self.config;
        for entry_point in config.targets(definition, Category::EntryPoint) {
            if let Some(result) = self.step(entry_point, definition, true) {
                return Some(result);
            }
        }
        None
    }

    fn step<R>(&mut self, node: NodeId, parent: NodeId, descend: bool) -> Option<R>
    where
        F: FnMut(NodeId, NodeId) -> Option<R>,
    {
        if !self.visited.insert(node) {
            return None;
        }
        trace!("visit {} from {}", node, parent);
        if let Some(result) = (self.visit)(node, parent) {
            return Some(result);
        }
        if descend {
            self.descend(node)
        } else {
            None
        }
    }

    fn descend<R>(&mut self, node: NodeId) -> Option<R>
    where
        F: FnMut(NodeId, NodeId) -> Option<R>,
    {
        let config = self.config;
        if self.scope.actions {
            for action in config.targets(node, Category::Action) {
                if let Some(result) = self.step(action, node, false) {
                    return Some(result);
                }
            }
        }
        for operation in config.targets(node, Category::Operation) {
            if let Some(result) = self.step(operation, node, true) {
                return Some(result);
            }
        }
        None
    }
}

impl AlertingConfig {
    /// Walk the graph below `definition`: its entry points, then for each node
    /// its actions and operations, recursing into operations.
    ///
    /// `visit(node, parent)` is called at most once per node. The first
    /// `Some` it returns stops the walk and is returned. Dangling references
    /// are skipped.
    #[instrument(level = "debug", skip(self, visit))]
    pub fn walk<R, F>(&self, definition: NodeId, visit: F) -> Option<R>
    where
        F: FnMut(NodeId, NodeId) -> Option<R>,
    {
        self.walk_scoped(definition, WalkScope::default(), visit)
    }

    pub fn walk_scoped<R, F>(&self, definition: NodeId, scope: WalkScope, visit: F) -> Option<R>
    where
        F: FnMut(NodeId, NodeId) -> Option<R>,
    {
        let mut walker = Walker {
            config: self,
            scope,
            visited: HashSet::new(),
            visit,
        };
        walker.run(definition)
    }

    /// Every `(node, parent)` pair reached from `definition`, in visit order.
    pub fn collect(&self, definition: NodeId) -> Vec<(NodeId, NodeId)> {
        let mut visited = Vec::new();
        self.walk::<(), _>(definition, |node, parent| {
            visited.push((node, parent));
            None
        });
        visited
    }

    /// First node reached from `definition` that satisfies `predicate`.
    pub fn find<P>(&self, definition: NodeId, mut predicate: P) -> Option<NodeId>
    where
        P: FnMut(NodeId) -> bool,
    {
        self.walk(definition, |node, _| predicate(node).then_some(node))
    }
}
