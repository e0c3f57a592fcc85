//! Orphan report: graph nodes that no live definition reaches.

use tracing::debug;

use crate::application::services::inventory::display_name;
use crate::domain::{AlertingConfig, Category, NodeId};

/// One unreachable entry point, operation or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphan {
    pub category: Category,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub class: Option<String>,
    pub description: Option<String>,
}

/// Orphans reachable from none of `definitions`, grouped by category in
/// document order.
pub fn orphans(config: &AlertingConfig, definitions: &[NodeId]) -> Vec<Orphan> {
    let found: Vec<Orphan> = config
        .orphans(definitions)
        .into_iter()
        .map(|(category, identifier, node)| Orphan {
            category,
            identifier,
            name: display_name(config, node),
            class: config.class_of(node),
            description: config
                .child_text(node, "description")
                .map(|d| d.trim().to_string()),
        })
        .collect();
    debug!("lint: {} orphans", found.len());
    found
}

/// Live and orphan counts for each graph category.
pub fn summary(config: &AlertingConfig, orphans: &[Orphan]) -> Vec<(Category, usize, usize)> {
    Category::REFERENCED
        .into_iter()
        .map(|category| {
            let unused = orphans.iter().filter(|o| o.category == category).count();
            let total = config.nodes(category).len();
            (category, total - unused, unused)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::xml;

    #[test]
    fn given_unreferenced_operation_when_linting_then_details_are_reported() {
        let doc = xml::parse(
            r#"<AlertingConfig>
    <definition-list id="d1"><entry-point-list>e1</entry-point-list></definition-list>
    <entry-point-list id="e1"/>
    <operation-list id="old">
        <name>Old filter</name>
        <class>Filter</class>
        <description> unused </description>
    </operation-list>
</AlertingConfig>"#,
        )
        .unwrap();
        let config = AlertingConfig::new(doc).unwrap();
        let d1 = config.definitions()[0];

        let found = orphans(&config, &[d1]);

        assert_eq!(
            found,
            [Orphan {
                category: Category::Operation,
                identifier: Some("old".into()),
                name: Some("Old filter".into()),
                class: Some("Filter".into()),
                description: Some("unused".into()),
            }]
        );
        assert_eq!(
            summary(&config, &found),
            [
                (Category::EntryPoint, 1, 0),
                (Category::Operation, 0, 1),
                (Category::Action, 0, 0),
            ]
        );
    }
}
