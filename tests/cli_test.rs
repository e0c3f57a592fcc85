//! CLI parsing and command execution against files in a temp directory.

use std::fs;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;

use alertcfg::cli::args::{Cli, Commands, ConfigCommands, ModeArg};
use alertcfg::cli::commands::execute_command;
use alertcfg::cli::CliError;
use alertcfg::exitcode;

const FIXTURE: &str = include_str!("resources/alerting.xml");

fn workspace() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("alerting.xml");
    fs::write(&input, FIXTURE).unwrap();
    let input = input.to_string_lossy().into_owned();
    (dir, input)
}

#[rstest]
#[case(&["alertcfg", "summary", "a.xml"])]
#[case(&["alertcfg", "-dd", "lint", "a.xml"])]
#[case(&["alertcfg", "find", "a.xml", "--class", "X"])]
#[case(&["alertcfg", "prune", "a.xml", "--keep", "^Health", "--enabled-only", "-v"])]
#[case(&["alertcfg", "config", "template"])]
#[case(&["alertcfg", "completion", "bash"])]
fn given_valid_arguments_when_parsing_then_succeeds(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_ok());
}

#[rstest]
#[case(&["alertcfg", "find", "a.xml"])]
#[case(&["alertcfg", "augment", "a.xml", "--mode", "bogus"])]
#[case(&["alertcfg", "summary"])]
fn given_invalid_arguments_when_parsing_then_fails(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}

#[test]
fn given_augment_without_mode_when_parsing_then_counter_is_default() {
    let cli = Cli::try_parse_from(["alertcfg", "augment", "a.xml", "--to", "x@example.com"]).unwrap();

    let Some(Commands::Augment(args)) = cli.command else {
        panic!("expected augment");
    };
    assert_eq!(args.mode, ModeArg::Counter);
    assert_eq!(args.to.as_deref(), Some("x@example.com"));
}

#[test]
fn given_config_show_with_file_when_parsing_then_file_is_optional() {
    let cli = Cli::try_parse_from(["alertcfg", "config", "show"]).unwrap();

    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::Show { file: None }
        })
    ));
}

#[test]
fn given_prune_command_when_executing_then_derived_output_is_written() {
    // Arrange
    let (dir, input) = workspace();
    let cli = Cli::try_parse_from(["alertcfg", "prune", input.as_str(), "--keep", "Network"]).unwrap();

    // Act
    execute_command(&cli).unwrap();

    // Assert
    let out = fs::read_to_string(dir.path().join("alerting-new.xml")).unwrap();
    assert!(out.contains("def-link"));
    assert!(!out.contains("def-disk"));
    assert!(!out.contains("act-unused"));
}

#[test]
fn given_augment_command_when_executing_then_explicit_output_is_written() {
    // Arrange
    let (dir, input) = workspace();
    let output = dir.path().join("augmented.xml");
    let output_arg = output.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "alertcfg",
        "augment",
        input.as_str(),
        "--definition",
        "Disk",
        "--mode",
        "group",
        "--suffix",
        "(copy)",
        "-o",
        output_arg.as_str(),
    ])
    .unwrap();

    // Act
    execute_command(&cli).unwrap();

    // Assert
    let out = fs::read_to_string(&output).unwrap();
    assert!(out.contains(r#"<operation-list id="act-trap-grouplist">"#));
    assert!(out.contains(r#"name="Health/Disk Full (copy)" enabled="false""#));
}

#[test]
fn given_pattern_matching_nothing_when_augmenting_then_data_error() {
    let (_dir, input) = workspace();
    let cli = Cli::try_parse_from([
        "alertcfg",
        "augment",
        input.as_str(),
        "--definition",
        "^NoSuchDefinition$",
        "--mode",
        "group",
    ])
    .unwrap();

    let err: CliError = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
}

#[test]
fn given_invalid_regex_when_pruning_then_usage_error() {
    let (_dir, input) = workspace();
    let cli = Cli::try_parse_from(["alertcfg", "prune", input.as_str(), "--keep", "("]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::USAGE);
}

#[test]
fn given_missing_file_when_summarizing_then_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.xml").to_string_lossy().into_owned();
    let cli = Cli::try_parse_from(["alertcfg", "summary", missing.as_str()]).unwrap();

    let err = execute_command(&cli).unwrap_err();

    assert_eq!(err.exit_code(), exitcode::IOERR);
}
