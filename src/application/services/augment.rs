//! Alert augmentation
//!
//! Adds notification paths next to every action of a configured class that is
//! reachable from the selected definitions. Matches are collected with a walk
//! first; the document is only mutated afterwards.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::services::selection::definition_name;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{AlertingConfig, Category, Component, NodeId};

const GROUP_DESCRIPTION: &str =
    "Always send an email, also send a trap if the severity is high enough.";

/// Nodes created for an action, the operation first.
fn planned_nodes(mode: AugmentMode, identifier: &str) -> Vec<(Category, String)> {
    match mode {
        AugmentMode::Counter => vec![
            (Category::Operation, format!("{identifier}-counter")),
            (Category::Action, format!("{identifier}-email-2")),
            (Category::Action, format!("{identifier}-email-1")),
        ],
        AugmentMode::Group => vec![(Category::Operation, format!("{identifier}-grouplist"))],
    }
}

/// What gets added for each matched action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AugmentMode {
    /// Counter operation `<id>-counter` feeding two mail actions
    #[default]
    Counter,
    /// Single grouping operation `<id>-grouplist`
    Group,
}

impl FromStr for AugmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "group" => Ok(Self::Group),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Outcome of an augmentation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentReport {
    /// Identifiers of created nodes, in creation order
    pub created: Vec<String>,
    /// Identifiers of matched actions that were already augmented
    pub skipped: Vec<String>,
}

/// Action of the old class found below a definition.
#[derive(Debug, Clone)]
struct Match {
    action: NodeId,
    parent: NodeId,
    identifier: String,
    name: String,
    description: String,
    source: String,
}

/// Service adding counter or grouping paths to matched actions.
pub struct AugmentService {
    settings: Arc<Settings>,
}

impl AugmentService {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    fn collect(&self, config: &AlertingConfig, definitions: &[NodeId]) -> Vec<Match> {
        let old_action = self.settings.classes.old_action.as_str();
        let mut matches = Vec::new();
        for &definition in definitions {
            let source = definition_name(config, definition).unwrap_or_default();
            config.walk::<(), _>(definition, |node, parent| {
                if config.category_of(node) != Some(Category::Action)
                    || config.class_of(node).as_deref() != Some(old_action)
                {
                    return None;
                }
                let Some(identifier) = config.identifier(node) else {
                    return None;
                };
                debug!("match {} from {}", identifier, parent);
                matches.push(Match {
                    action: node,
                    parent,
                    identifier: identifier.to_string(),
                    name: config.child_text(node, "name").unwrap_or_default(),
                    description: config.child_text(node, "description").unwrap_or_default(),
                    source: source.clone(),
                });
                None
            });
        }
        matches
    }

    /// Augment every old-class action reachable from `definitions`.
    ///
    /// # Errors
    /// `Config` if counter mode runs without a mail recipient; domain errors
    /// from node creation.
    #[instrument(level = "debug", skip(self, config, definitions))]
    pub fn augment(
        &self,
        config: &mut AlertingConfig,
        definitions: &[NodeId],
        mode: AugmentMode,
    ) -> ApplicationResult<AugmentReport> {
        if mode == AugmentMode::Counter && self.settings.mail.to.is_none() {
            return Err(ApplicationError::Config {
                message: "mail.to is not set (use --to or ALERTCFG_MAIL__TO)".into(),
            });
        }

        let matches = self.collect(config, definitions);
        info!("found {} actions to augment", matches.len());

        let mut report = AugmentReport::default();
        for m in matches {
            let planned = planned_nodes(mode, &m.identifier);
            if let Some((category, id)) = planned
                .iter()
                .find(|(category, id)| config.lookup(*category, id).is_some())
            {
                warn!(
                    "action '{}' is already augmented ({} '{}' exists), skipping",
                    m.identifier, category, id
                );
                report.skipped.push(m.identifier);
                continue;
            }
            let target = &planned[0].1;
            match mode {
                AugmentMode::Counter => self.add_counter(config, &m, target, &mut report)?,
                AugmentMode::Group => self.add_group(config, &m, target, &mut report)?,
            }
            debug!("augmented {}", m.action);
        }
        Ok(report)
    }

    fn add_counter(
        &self,
        config: &mut AlertingConfig,
        m: &Match,
        target: &str,
        report: &mut AugmentReport,
    ) -> ApplicationResult<()> {
        let classes = &self.settings.classes;
        let counter = &self.settings.counter;
        let mail = &self.settings.mail;

        let counter_node = config.create_node(
            Category::Operation,
            target,
            &[
                Component::new("name", m.name.replace("trap", "counter")),
                Component::new("class", classes.new_operation.as_str()),
                Component::new("description", m.description.replace("trap", "counter")),
                Component::labeled("param-list", "time-range", counter.time_range.as_str()),
                Component::labeled("param-list", "counter", counter.counter.as_str()),
                Component::labeled("param-list", "time-based", counter.time_based.to_string()),
            ],
        )?;
        config.add_link(m.parent, counter_node, "output", "entry")?;
        report.created.push(target.to_string());

        let to = mail.to.clone().unwrap_or_default();
        let message = format!("{}\n{}", mail.message, m.source);
        for (suffix, subject, port) in [
            ("email-2", mail.subject.clone(), "false"),
            ("email-1", format!("{}.", mail.subject), "true"),
        ] {
            let id = format!("{}-{}", m.identifier, suffix);
            let email_node = config.create_node(
                Category::Action,
                &id,
                &[
                    Component::new("name", m.name.replace("trap", "email")),
                    Component::new("class", classes.new_action.as_str()),
                    Component::new("description", m.description.replace("trap", "email")),
                    Component::labeled("param-list", "to", to.as_str()),
                    Component::labeled("param-list", "subject", subject),
                    Component::labeled("param-list", "message", message.as_str()),
                ],
            )?;
            config.add_link(counter_node, email_node, port, "entry")?;
            report.created.push(id);
        }
        Ok(())
    }

    fn add_group(
        &self,
        config: &mut AlertingConfig,
        m: &Match,
        target: &str,
        report: &mut AugmentReport,
    ) -> ApplicationResult<()> {
        let node = config.create_node(
            Category::Operation,
            target,
            &[
                Component::new("name", m.name.replace("trap", "action")),
                Component::new("class", self.settings.classes.group_operation.as_str()),
                Component::new("description", GROUP_DESCRIPTION),
            ],
        )?;
        config.add_link(m.parent, node, "output", "entry")?;
        report.created.push(target.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SNMP_TRAP_ACTION;
    use crate::infrastructure::xml;

    fn config() -> AlertingConfig {
        let doc = xml::parse(&format!(
            r#"<AlertingConfig>
    <definition-list id="d1" name="Health/Disk" enabled="true">
        <entry-point-list>e1</entry-point-list>
    </definition-list>
    <entry-point-list id="e1">
        <operation-list from="output" to="entry">o1</operation-list>
    </entry-point-list>
    <operation-list id="o1">
        <action-list from="true" to="entry">t1</action-list>
    </operation-list>
    <action-list id="t1">
        <name>Disk trap</name>
        <class>{SNMP_TRAP_ACTION}</class>
        <description>Send trap</description>
    </action-list>
</AlertingConfig>
"#
        ))
        .unwrap();
        AlertingConfig::new(doc).unwrap()
    }

    fn service(to: Option<&str>) -> AugmentService {
        let mut settings = Settings::default();
        settings.mail.to = to.map(str::to_string);
        AugmentService::new(Arc::new(settings))
    }

    #[test]
    fn given_trap_action_when_augmenting_counter_then_counter_and_mails_are_linked() {
        let mut config = config();
        let d1 = config.lookup(Category::Definition, "d1").unwrap();

        let report = service(Some("ops@example.com"))
            .augment(&mut config, &[d1], AugmentMode::Counter)
            .unwrap();

        assert_eq!(report.created, ["t1-counter", "t1-email-2", "t1-email-1"]);
        let counter = config.lookup(Category::Operation, "t1-counter").unwrap();
        assert_eq!(config.child_text(counter, "name").as_deref(), Some("Disk counter"));
        let o1 = config.lookup(Category::Operation, "o1").unwrap();
        assert!(config.targets(o1, Category::Operation).any(|n| n == counter));
        let ports: Vec<_> = config
            .references(counter)
            .into_iter()
            .map(|r| (r.target, r.from.unwrap()))
            .collect();
        assert_eq!(
            ports,
            [
                ("t1-email-2".to_string(), "false".to_string()),
                ("t1-email-1".to_string(), "true".to_string()),
            ]
        );
        let visited = config.collect(d1).len();
        assert_eq!(visited, 6);
        assert!(config.prune(&[d1]).is_empty());
    }

    #[test]
    fn given_augmented_document_when_augmenting_again_then_action_is_skipped() {
        let mut config = config();
        let d1 = config.lookup(Category::Definition, "d1").unwrap();
        let service = service(None);
        service.augment(&mut config, &[d1], AugmentMode::Group).unwrap();

        let report = service.augment(&mut config, &[d1], AugmentMode::Group).unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.skipped, ["t1"]);
    }

    #[test]
    fn given_existing_mail_action_when_augmenting_counter_then_nothing_is_created() {
        let mut config = config();
        let d1 = config.lookup(Category::Definition, "d1").unwrap();
        config
            .create_node(Category::Action, "t1-email-1", &[Component::new("name", "old")])
            .unwrap();
        let before = config.document().len();

        let report = service(Some("ops@example.com"))
            .augment(&mut config, &[d1], AugmentMode::Counter)
            .unwrap();

        assert!(report.created.is_empty());
        assert_eq!(report.skipped, ["t1"]);
        assert_eq!(config.lookup(Category::Operation, "t1-counter"), None);
        assert_eq!(config.document().len(), before);
    }

    #[test]
    fn given_group_mode_when_augmenting_then_single_operation_is_added() {
        let mut config = config();
        let d1 = config.lookup(Category::Definition, "d1").unwrap();

        let report = service(None)
            .augment(&mut config, &[d1], AugmentMode::Group)
            .unwrap();

        assert_eq!(report.created, ["t1-grouplist"]);
        let node = config.lookup(Category::Operation, "t1-grouplist").unwrap();
        assert_eq!(config.class_of(node).as_deref(), Some("1443211023196"));
        assert_eq!(config.child_text(node, "name").as_deref(), Some("Disk action"));
    }

    #[test]
    fn given_counter_mode_without_recipient_when_augmenting_then_config_error() {
        let mut config = config();
        let d1 = config.lookup(Category::Definition, "d1").unwrap();

        let result = service(None).augment(&mut config, &[d1], AugmentMode::Counter);

        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }
}
