//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::AugmentMode;

/// Inspect, prune and augment alerting configuration files
#[derive(Parser, Debug)]
#[command(name = "alertcfg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count top-level nodes per category
    Summary {
        /// Alerting configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show the reference graph of definitions as a tree
    Outline {
        /// Alerting configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Only definitions whose name matches this regex
        #[arg(long)]
        definition: Option<String>,
    },

    /// List definitions whose graph reaches a node of a class
    Find {
        /// Alerting configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Implementation class, e.g. com.watch4net.alerting.action.MailAction
        #[arg(long)]
        class: String,
    },

    /// Keep matching definitions and remove everything they do not reach
    Prune {
        /// Alerting configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Keep only definitions whose name matches this regex
        #[arg(long)]
        keep: Option<String>,
        /// Keep only enabled definitions
        #[arg(long)]
        enabled_only: bool,
        /// List every removed node
        #[arg(short, long)]
        verbose: bool,
        /// Output file (default: input stem + output_suffix)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Report entry points, operations and actions no definition reaches
    Lint {
        /// Alerting configuration file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Add counter/mail or grouping paths next to matching actions
    Augment(AugmentArgs),

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// What `augment` adds for each matched action.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeArg {
    /// Counter operation plus two mail actions
    #[default]
    Counter,
    /// Single grouping operation
    Group,
}

impl From<ModeArg> for AugmentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Counter => AugmentMode::Counter,
            ModeArg::Group => AugmentMode::Group,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct AugmentArgs {
    /// Alerting configuration file
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,
    /// Definitions whose name matches this regex (default: enabled definitions)
    #[arg(long)]
    pub definition: Option<String>,
    #[arg(long, value_enum, default_value_t)]
    pub mode: ModeArg,
    /// Mail recipients, comma separated
    #[arg(long)]
    pub to: Option<String>,
    /// Mail subject
    #[arg(long)]
    pub subject: Option<String>,
    /// Mail body
    #[arg(long)]
    pub message: Option<String>,
    /// Class of the created operation
    #[arg(long)]
    pub operation: Option<String>,
    /// Appended to the names of augmented definitions
    #[arg(long)]
    pub suffix: Option<String>,
    /// Output file (default: input stem + output_suffix)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show {
        /// Include the local config next to this document
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Print a commented config template
    Template,

    /// Show config paths
    Path,
}
