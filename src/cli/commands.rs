use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::augment::AugmentMode;
use crate::application::services::{inventory, lint, selection};
use crate::application::services::{AugmentService, ChangedDefinitions, DefinitionFilter};
use crate::application::ApplicationError;
use crate::cli::args::{AugmentArgs, Cli, Commands, ConfigCommands};
use crate::cli::error::CliResult;
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::AlertingConfig;
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Summary { file }) => _summary(file),
        Some(Commands::Outline { file, definition }) => _outline(file, definition.as_deref()),
        Some(Commands::Find { file, class }) => _find(file, class),
        Some(Commands::Prune {
            file,
            keep,
            enabled_only,
            verbose,
            output,
        }) => _prune(file, keep.as_deref(), *enabled_only, *verbose, output.as_deref()),
        Some(Commands::Lint { file }) => _lint(file),
        Some(Commands::Augment(args)) => _augment(args),
        Some(Commands::Config { command }) => _config(command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Ok(()),
    }
}

fn container_for(file: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(file.parent())?;
    Ok(ServiceContainer::new(settings))
}

fn load(container: &ServiceContainer, file: &Path) -> CliResult<AlertingConfig> {
    let config = container.store.load(file)?;
    for diagnostic in config.index().diagnostics() {
        output::warning(diagnostic);
    }
    Ok(config)
}

fn output_path(container: &ServiceContainer, input: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.derived_output_path(input))
}

#[instrument]
fn _summary(file: &Path) -> CliResult<()> {
    let container = container_for(file)?;
    let config = load(&container, file)?;

    output::header(&format!("{:23} {:>5}", "category", "count"));
    for (category, count) in inventory::tally(&config) {
        output::info(&format!("{:23} {:5}", category.tag(), count));
    }
    Ok(())
}

#[instrument]
fn _outline(file: &Path, definition: Option<&str>) -> CliResult<()> {
    let container = container_for(file)?;
    let config = load(&container, file)?;
    let filter = DefinitionFilter::new(definition, false)?;

    for node in selection::select(&config, &filter) {
        output::info(&inventory::outline(&config, node));
    }
    Ok(())
}

#[instrument]
fn _find(file: &Path, class: &str) -> CliResult<()> {
    let container = container_for(file)?;
    let config = load(&container, file)?;

    let found = selection::find_by_class(&config, class);
    debug!("{} definitions reach {}", found.len(), class);
    for node in found {
        let name = selection::definition_name(&config, node).unwrap_or_default();
        if selection::is_enabled(&config, node) {
            output::info(&name);
        } else {
            output::info(&format!("{name} (disabled)"));
        }
    }
    Ok(())
}

#[instrument]
fn _prune(
    file: &Path,
    keep: Option<&str>,
    enabled_only: bool,
    verbose: bool,
    output: Option<&Path>,
) -> CliResult<()> {
    let container = container_for(file)?;
    let mut config = load(&container, file)?;
    let filter = DefinitionFilter::new(keep, enabled_only)?;

    let wanted = selection::select(&config, &filter);
    let report = selection::retain(&mut config, &wanted)?;
    if verbose {
        for (category, identifier) in &report.removed {
            output::diff_remove(&format!("{category} {identifier}"));
        }
    }

    let target = output_path(&container, file, output);
    container.store.save(&config, &target)?;
    output::success(&format!(
        "kept {} definitions, removed {} nodes",
        wanted.len(),
        report.removed_count()
    ));
    output::action("Wrote", &target.display());
    Ok(())
}

#[instrument]
fn _lint(file: &Path) -> CliResult<()> {
    let container = container_for(file)?;
    let config = load(&container, file)?;

    let definitions = config.definitions().to_vec();
    let orphans = lint::orphans(&config, &definitions);

    for (category, group) in &orphans.iter().chunk_by(|orphan| orphan.category) {
        output::header(&format!("unused {category}"));
        for orphan in group {
            let identifier = orphan.identifier.as_deref().unwrap_or("<no id>");
            let details = [orphan.name.as_deref(), orphan.class.as_deref()]
                .into_iter()
                .flatten()
                .join(", ");
            if details.is_empty() {
                output::detail(&identifier);
            } else {
                output::detail(&format!("{identifier} ({details})"));
            }
        }
    }

    output::header(&format!("{:23} {:>5} {:>6}", "category", "live", "unused"));
    for (category, live, unused) in lint::summary(&config, &orphans) {
        output::info(&format!("{:23} {:5} {:6}", category.tag(), live, unused));
    }
    Ok(())
}

/// Settings for one augment run: loaded layers plus command-line overrides.
fn augment_settings(args: &AugmentArgs, mut settings: Settings) -> Settings {
    let mode = AugmentMode::from(args.mode);
    if let Some(to) = &args.to {
        settings.mail.to = Some(to.clone());
    }
    if let Some(subject) = &args.subject {
        settings.mail.subject = subject.clone();
    }
    if let Some(message) = &args.message {
        settings.mail.message = message.clone();
    }
    if let Some(operation) = &args.operation {
        match mode {
            AugmentMode::Counter => settings.classes.new_operation = operation.clone(),
            AugmentMode::Group => settings.classes.group_operation = operation.clone(),
        }
    }
    if let Some(suffix) = &args.suffix {
        settings.definition_suffix = suffix.clone();
    }
    settings
}

#[instrument(skip(args), fields(file = %args.file.display()))]
fn _augment(args: &AugmentArgs) -> CliResult<()> {
    let settings = augment_settings(args, Settings::load(args.file.parent())?);
    let container = ServiceContainer::new(settings);
    let mut config = load(&container, &args.file)?;

    let filter = match &args.definition {
        Some(pattern) => DefinitionFilter::new(Some(pattern), false)?,
        None => DefinitionFilter::new(None, true)?,
    };
    let wanted = selection::select(&config, &filter);
    if wanted.is_empty() {
        return Err(ApplicationError::NothingSelected(
            args.definition
                .clone()
                .unwrap_or_else(|| "enabled definitions".to_string()),
        )
        .into());
    }

    selection::retain(&mut config, &wanted)?;
    selection::disable(&mut config, &wanted)?;
    selection::rename(&mut config, &wanted, &container.settings.definition_suffix)?;

    let service = AugmentService::new(container.settings.clone());
    let report = service.augment(&mut config, &wanted, args.mode.into())?;
    for identifier in &report.created {
        output::diff_add(identifier);
    }
    for identifier in &report.skipped {
        output::warning(&format!("action '{identifier}' already augmented"));
    }

    let target = output_path(&container, &args.file, args.output.as_deref());
    container.store.save(&config, &target)?;

    let mut changed = ChangedDefinitions::default();
    for &definition in &wanted {
        changed.add(&selection::definition_name(&config, definition).unwrap_or_default());
    }
    output::info(&changed.to_tree(&target.display().to_string()));
    output::success(&format!("created {} nodes", report.created.len()));
    Ok(())
}

fn _config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { file } => {
            let dir = file.as_deref().and_then(Path::parent);
            let settings = Settings::load(dir)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no global config directory on this platform"),
            }
            output::action("local", &local_config_path(Path::new(".")).display());
        }
    }
    Ok(())
}
