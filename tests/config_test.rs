//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Precedence (lowest to highest): defaults, global file, local
//! `.alertcfg.toml` next to the document, `ALERTCFG_*` environment variables.
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use alertcfg::config::{local_config_path, Settings, MAIL_ACTION, SNMP_TRAP_ACTION};

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let local = r#"
output_suffix = "-email"

[mail]
to = "noc@example.com"
subject = "ALERT"

[counter]
time_range = "60"
"#;
    fs::write(local_config_path(dir.path()), local).unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.output_suffix, "-email");
    assert_eq!(settings.mail.to.as_deref(), Some("noc@example.com"));
    assert_eq!(settings.mail.subject, "ALERT");
    assert_eq!(settings.counter.time_range, "60");
    assert_eq!(settings.counter.counter, "1", "unset keys keep defaults");
    assert_eq!(settings.classes.old_action, SNMP_TRAP_ACTION);
    assert_eq!(settings.classes.new_action, MAIL_ACTION);
}

#[test]
fn given_no_local_config_when_load_then_defaults_apply() {
    // Arrange
    let dir = TempDir::new().unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert!(settings.layout.tidy);
    assert_eq!(settings.layout.indent, "    ");
    assert_eq!(settings.counter.time_range, "1440");
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "[layout\nindent = 3").unwrap();

    // Act
    let result = Settings::load(Some(dir.path()));

    // Assert
    let err = result.expect_err("broken toml must fail");
    assert!(err.to_string().contains(".alertcfg.toml"));
}

#[test]
fn given_env_var_when_load_then_env_wins_over_local_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[classes]\ngroup_operation = \"from-file\"\n",
    )
    .unwrap();
    std::env::set_var("ALERTCFG_CLASSES__GROUP_OPERATION", "from-env");

    // Act
    let settings = Settings::load(Some(dir.path()));
    std::env::remove_var("ALERTCFG_CLASSES__GROUP_OPERATION");

    // Assert
    assert_eq!(settings.unwrap().classes.group_operation, "from-env");
}

#[test]
fn given_single_underscore_after_prefix_when_load_then_section_keys_apply() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::env::set_var("ALERTCFG_CLASSES__NEW_OPERATION", "custom.Counter");
    std::env::set_var("ALERTCFG_COUNTER__TIME_BASED", "true");

    // Act
    let settings = Settings::load(Some(dir.path()));
    std::env::remove_var("ALERTCFG_CLASSES__NEW_OPERATION");
    std::env::remove_var("ALERTCFG_COUNTER__TIME_BASED");

    // Assert
    let settings = settings.unwrap();
    assert_eq!(settings.classes.new_operation, "custom.Counter");
    assert!(settings.counter.time_based);
}

#[rstest]
#[case("alerting.xml", "-new", "alerting-new.xml")]
#[case("dir/alerting.xml", "-email", "dir/alerting-email.xml")]
#[case("noext", "-x", "noext-x")]
fn given_input_path_when_deriving_output_then_suffix_precedes_extension(
    #[case] input: &str,
    #[case] suffix: &str,
    #[case] expected: &str,
) {
    let settings = Settings {
        output_suffix: suffix.to_string(),
        ..Settings::default()
    };

    let out = settings.derived_output_path(&PathBuf::from(input));

    assert_eq!(out, PathBuf::from(expected));
}

#[test]
fn given_loaded_settings_when_rendering_toml_then_sections_are_present() {
    let settings = Settings::default();

    let rendered = settings.to_toml().unwrap();

    assert!(rendered.contains("[layout]"));
    assert!(rendered.contains("[classes]"));
    assert!(rendered.contains("time_range = \"1440\""));
}
