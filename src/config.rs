//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/alertcfg/alertcfg.toml`
//! 3. Local config: `<document_dir>/.alertcfg.toml`
//! 4. Environment variables: `ALERTCFG_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::Layout;

pub const SNMP_TRAP_ACTION: &str = "com.watch4net.alerting.action.SNMPTrapAction";
pub const DATA_COUNTER_OPERATION: &str =
    "com.watch4net.alerting.operation.window.DataCounterOperation";
pub const MAIL_ACTION: &str = "com.watch4net.alerting.action.MailAction";

const DEFAULT_SUBJECT: &str = "SRM-ALERT - Sev-PROP.'severity' PROP.'category' alert received for PROP.'devtype'-PROP.'device' is now PROP.'eventstate'";

const DEFAULT_MESSAGE: &str = "An PROP.'eventstate' alert has been received with the following attributes:

Message: PROP.'fullmsg'
Device: PROP.'device'
Device Type: PROP.'devtype'
Severity: PROP.'severity'
Source: PROP.'Source'
Source IP: PROP.'sourceip'
Part Type: PROP.'parttype'
Part: PROP.'part'
Category: PROP.'category'

This is an auto-generated email. To change the notification settings, consult the site administrator.";

/// Whitespace emitted around created and removed nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    pub indent: String,
    pub tidy: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            indent: layout.indent,
            tidy: layout.tidy,
        }
    }
}

impl From<&LayoutConfig> for Layout {
    fn from(config: &LayoutConfig) -> Self {
        Layout {
            indent: config.indent.clone(),
            tidy: config.tidy,
        }
    }
}

/// Implementation classes matched and created by `augment`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClassConfig {
    /// Action class whose nodes get augmented
    pub old_action: String,
    /// Operation class of the counter created in counter mode
    pub new_operation: String,
    /// Action class of the mail actions created in counter mode
    pub new_action: String,
    /// Operation class (grouped box id) of the operation created in group mode
    pub group_operation: String,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            old_action: SNMP_TRAP_ACTION.into(),
            new_operation: DATA_COUNTER_OPERATION.into(),
            new_action: MAIL_ACTION.into(),
            group_operation: "1443211023196".into(),
        }
    }
}

/// Parameters of created mail actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MailConfig {
    /// Comma separated recipients
    pub to: Option<String>,
    pub subject: String,
    pub message: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            to: None,
            subject: DEFAULT_SUBJECT.into(),
            message: DEFAULT_MESSAGE.into(),
        }
    }
}

/// Parameters of created counter operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CounterConfig {
    /// Window in minutes
    pub time_range: String,
    pub counter: String,
    pub time_based: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            time_range: "1440".into(),
            counter: "1".into(),
            time_based: false,
        }
    }
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub output_suffix: Option<String>,
    pub definition_suffix: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub layout: RawLayout,
    pub classes: RawClasses,
    pub mail: RawMail,
    pub counter: RawCounter,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayout {
    pub indent: Option<String>,
    pub tidy: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawClasses {
    pub old_action: Option<String>,
    pub new_operation: Option<String>,
    pub new_action: Option<String>,
    pub group_operation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMail {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawCounter {
    pub time_range: Option<String>,
    pub counter: Option<String>,
    pub time_based: Option<bool>,
}

/// Unified configuration for alertcfg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Appended to the input file stem when no output path is given
    pub output_suffix: String,
    /// Appended to the names of rewritten definitions
    pub definition_suffix: String,
    /// Directory for derived output files (default: next to the input)
    pub output_dir: Option<PathBuf>,
    pub layout: LayoutConfig,
    pub classes: ClassConfig,
    pub mail: MailConfig,
    pub counter: CounterConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_suffix: "-new".into(),
            definition_suffix: today_suffix(),
            output_dir: None,
            layout: LayoutConfig::default(),
            classes: ClassConfig::default(),
            mail: MailConfig::default(),
            counter: CounterConfig::default(),
        }
    }
}

/// `(YYYY-MM-DD)` of the current local date.
fn today_suffix() -> String {
    format!("({})", chrono::Local::now().format("%Y-%m-%d"))
}

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

/// Get the XDG config directory for alertcfg.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "alertcfg").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("alertcfg.toml"))
}

/// Get the path to the local config file next to a document.
pub fn local_config_path(document_dir: &Path) -> PathBuf {
    document_dir.join(".alertcfg.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// The engine layout derived from `[layout]`.
    pub fn document_layout(&self) -> Layout {
        Layout::from(&self.layout)
    }

    fn expand_paths(&mut self) {
        if let Some(dir) = &self.output_dir {
            self.output_dir = Some(PathBuf::from(expand_env_vars(
                dir.to_string_lossy().as_ref(),
            )));
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let pick = |o: &Option<String>, base: &String| o.clone().unwrap_or_else(|| base.clone());
        Self {
            output_suffix: pick(&overlay.output_suffix, &self.output_suffix),
            definition_suffix: pick(&overlay.definition_suffix, &self.definition_suffix),
            output_dir: overlay
                .output_dir
                .clone()
                .or_else(|| self.output_dir.clone()),
            layout: LayoutConfig {
                indent: pick(&overlay.layout.indent, &self.layout.indent),
                tidy: overlay.layout.tidy.unwrap_or(self.layout.tidy),
            },
            classes: ClassConfig {
                old_action: pick(&overlay.classes.old_action, &self.classes.old_action),
                new_operation: pick(&overlay.classes.new_operation, &self.classes.new_operation),
                new_action: pick(&overlay.classes.new_action, &self.classes.new_action),
                group_operation: pick(
                    &overlay.classes.group_operation,
                    &self.classes.group_operation,
                ),
            },
            mail: MailConfig {
                to: overlay.mail.to.clone().or_else(|| self.mail.to.clone()),
                subject: pick(&overlay.mail.subject, &self.mail.subject),
                message: pick(&overlay.mail.message, &self.mail.message),
            },
            counter: CounterConfig {
                time_range: pick(&overlay.counter.time_range, &self.counter.time_range),
                counter: pick(&overlay.counter.counter, &self.counter.counter),
                time_based: overlay
                    .counter
                    .time_based
                    .unwrap_or(self.counter.time_based),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `document_dir` - Optional directory of the processed document for local config
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/alertcfg/alertcfg.toml`
    /// 3. Local config: `<document_dir>/.alertcfg.toml`
    /// 4. Environment variables: `ALERTCFG_*` prefix, `__` between section and key
    pub fn load(document_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = document_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        Ok(current)
    }

    /// Apply ALERTCFG_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("ALERTCFG")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        let string = |key: &str| config.get_string(key).ok();
        if let Some(val) = string("output_suffix") {
            settings.output_suffix = val;
        }
        if let Some(val) = string("definition_suffix") {
            settings.definition_suffix = val;
        }
        if let Some(val) = string("output_dir") {
            settings.output_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = string("layout.indent") {
            settings.layout.indent = val;
        }
        if let Ok(val) = config.get_bool("layout.tidy") {
            settings.layout.tidy = val;
        }
        if let Some(val) = string("classes.old_action") {
            settings.classes.old_action = val;
        }
        if let Some(val) = string("classes.new_operation") {
            settings.classes.new_operation = val;
        }
        if let Some(val) = string("classes.new_action") {
            settings.classes.new_action = val;
        }
        if let Some(val) = string("classes.group_operation") {
            settings.classes.group_operation = val;
        }
        if let Some(val) = string("mail.to") {
            settings.mail.to = Some(val);
        }
        if let Some(val) = string("mail.subject") {
            settings.mail.subject = val;
        }
        if let Some(val) = string("mail.message") {
            settings.mail.message = val;
        }
        if let Some(val) = string("counter.time_range") {
            settings.counter.time_range = val;
        }
        if let Some(val) = string("counter.counter") {
            settings.counter.counter = val;
        }
        if let Ok(val) = config.get_bool("counter.time_based") {
            settings.counter.time_based = val;
        }
        Ok(settings)
    }

    /// Path of the file written for `input` when no explicit output is given:
    /// `<stem><output_suffix>.<ext>`, in `output_dir` if set.
    pub fn derived_output_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match input.extension() {
            Some(ext) => format!("{}{}.{}", stem, self.output_suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, self.output_suffix),
        };
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => input.with_file_name(name),
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# alertcfg configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/alertcfg/alertcfg.toml
#   Local:  <document_dir>/.alertcfg.toml
#   Env:    ALERTCFG_* environment variables, e.g. ALERTCFG_MAIL__TO

# Appended to the input file stem when no --output is given
# output_suffix = "-new"

# Appended to the names of augmented definitions (default: today's date)
# definition_suffix = "(2024-01-31)"

# Directory for derived output files (default: next to the input)
# output_dir = "~/alerting"

[layout]
# indent = "    "
# tidy = true

[classes]
# old_action = "com.watch4net.alerting.action.SNMPTrapAction"
# new_operation = "com.watch4net.alerting.operation.window.DataCounterOperation"
# new_action = "com.watch4net.alerting.action.MailAction"
# group_operation = "1443211023196"

[mail]
# to = "ops@example.com"
# subject = "SRM-ALERT ..."
# message = "..."

[counter]
# time_range = "1440"
# counter = "1"
# time_based = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
