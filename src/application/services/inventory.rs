//! Category tally and definition outlines
//!
//! Read-only reports over an alerting configuration.

use std::collections::HashSet;

use termtree::Tree;
use tracing::debug;

use crate::domain::{AlertingConfig, Category, NodeId, Reference};

/// Number of top-level nodes per category, every category in fixed order.
pub fn tally(config: &AlertingConfig) -> Vec<(Category, usize)> {
    Category::ORDER
        .into_iter()
        .map(|category| (category, config.nodes(category).len()))
        .collect()
}

/// Display name of a node: its `name` child element, else its `name` attribute.
pub fn display_name(config: &AlertingConfig, node: NodeId) -> Option<String> {
    config
        .child_text(node, "name")
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            config
                .document()
                .attribute(node, "name")
                .map(str::to_string)
        })
}

fn label(config: &AlertingConfig, node: NodeId) -> String {
    let category = config
        .category_of(node)
        .map(|c| c.tag())
        .unwrap_or("?");
    let id = config.identifier(node).unwrap_or("?");
    match display_name(config, node) {
        Some(name) if name != id => format!("{category} {id}: {name}"),
        _ => format!("{category} {id}"),
    }
}

fn ports(reference: &Reference) -> String {
    match (&reference.from, &reference.to) {
        (Some(from), Some(to)) => format!("[{from} -> {to}] "),
        (Some(from), None) => format!("[{from}] "),
        _ => String::new(),
    }
}

struct Outliner<'a> {
    config: &'a AlertingConfig,
    path: HashSet<NodeId>,
    expanded: HashSet<NodeId>,
}

impl Outliner<'_> {
    fn leaves(&mut self, node: NodeId) -> Vec<Tree<String>> {
        self.config
            .references(node)
            .iter()
            .map(|reference| self.branch(reference))
            .collect()
    }

    fn branch(&mut self, reference: &Reference) -> Tree<String> {
        let prefix = ports(reference);
        let Some(target) = self.config.resolve(reference) else {
            return Tree::new(format!(
                "{prefix}{} {} (missing)",
                reference.category, reference.target
            ));
        };
        let text = format!("{prefix}{}", label(self.config, target));
        if self.path.contains(&target) {
            return Tree::new(format!("{text} (cycle)"));
        }
        if !self.expanded.insert(target) {
            return Tree::new(format!("{text} (seen)"));
        }
        self.path.insert(target);
        let tree = Tree::new(text).with_leaves(self.leaves(target));
        self.path.remove(&target);
        tree
    }
}

/// Outline of a definition's reference graph.
///
/// Each node is expanded once. Later references to it are marked as seen, a
/// node already on the current path is marked as a cycle and dangling
/// references are marked as missing; none of these is followed.
pub fn outline(config: &AlertingConfig, definition: NodeId) -> Tree<String> {
    debug!("outline: {}", definition);
    let root = display_name(config, definition)
        .or_else(|| config.identifier(definition).map(str::to_string))
        .unwrap_or_else(|| definition.to_string());
    let mut outliner = Outliner {
        config,
        path: HashSet::from([definition]),
        expanded: HashSet::new(),
    };
    Tree::new(root).with_leaves(outliner.leaves(definition))
}
