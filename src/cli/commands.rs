//! Command dispatch
//!
//! Each command returns the process exit code on success; errors carry
//! their own via `CliError::exit_code`.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::{RootSummary, TreeReport};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::CliResult;
use crate::config::{global_config_path, local_config_path, OutputFormat, Settings};
use crate::domain::render::TreeRender;
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::util::{expand_path, parent_dir};

pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    match &cli.command {
        Commands::Check {
            model,
            root,
            sorted,
        } => cmd_check(cli, model, root, *sorted),
        Commands::Report { model, root } => cmd_report(cli, model, root),
        Commands::Roots { model } => cmd_roots(cli, model),
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(exitcode::OK)
        }
    }
}

/// Settings for a model: `--config` if given, else the layered lookup
/// around the model's directory. `--format` wins over both.
fn load_settings(cli: &Cli, model: Option<&Path>) -> CliResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_file(&expand_path(path))?,
        None => {
            let model_dir = model.map(parent_dir);
            Settings::load(model_dir.as_deref())?
        }
    };
    if let Some(format) = cli.format {
        settings.output.format = format;
    }
    Ok(settings)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    output::info(&json);
    Ok(())
}

fn status_code(fully_well_formed: bool) -> i32 {
    if fully_well_formed {
        exitcode::OK
    } else {
        exitcode::ILL_FORMED
    }
}

fn print_ill_formed(report: &TreeReport) {
    for node in &report.ill_formed_nodes {
        output::failure_detail(&format!("node {node}"));
    }
    for branch in &report.ill_formed_branches {
        let codes: Vec<&str> = branch.explanations.iter().map(|e| e.code()).collect();
        output::failure_detail(&format!(
            "{}::{} [{}]",
            branch.owner,
            branch.branch,
            codes.join(", ")
        ));
    }
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, model: &Path, root: &str, sorted: bool) -> CliResult<i32> {
    let model = expand_path(model);
    let mut settings = load_settings(cli, Some(&model))?;
    if sorted {
        settings.output.sort_branches = true;
    }
    let container = ServiceContainer::new(settings);
    let report = container.tree_service.check(&model, root)?;
    let output_settings = &container.settings.output;

    match output_settings.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            output::info(&report.tree.to_tree_string(output_settings.branch_order()));
            if report.fully_well_formed {
                output::success(&format!("{} is a well-formed tree (depth {})", report.root, report.depth));
            } else {
                output::failure(&format!("{} is not a well-formed tree", report.root));
                if output_settings.show_ill_formed {
                    print_ill_formed(&report);
                }
            }
        }
    }
    Ok(status_code(report.fully_well_formed))
}

#[instrument(skip(cli))]
fn cmd_report(cli: &Cli, model: &Path, root: &str) -> CliResult<i32> {
    let model = expand_path(model);
    let container = ServiceContainer::new(load_settings(cli, Some(&model))?);
    let report = container.tree_service.check(&model, root)?;

    match container.settings.output.format {
        OutputFormat::Json => print_json(&report.ill_formed_branches)?,
        OutputFormat::Text => {
            output::header(&format!("Ill-formed branches below {}", report.root));
            if report.ill_formed_branches.is_empty() {
                output::detail("none");
            }
            for branch in &report.ill_formed_branches {
                output::failure(&format!("{}::{}", branch.owner, branch.branch));
                for explanation in &branch.explanations {
                    output::detail(&format!("{}: {}", explanation.code(), explanation.description()));
                }
            }
        }
    }
    Ok(status_code(report.fully_well_formed))
}

#[instrument(skip(cli))]
fn cmd_roots(cli: &Cli, model: &Path) -> CliResult<i32> {
    let model = expand_path(model);
    let container = ServiceContainer::new(load_settings(cli, Some(&model))?);
    let summaries = container.tree_service.summarize_roots(&model)?;
    debug!(roots = summaries.len(), "roots analyzed");

    match container.settings.output.format {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Text => print_summaries(&summaries),
    }
    Ok(exitcode::OK)
}

fn print_summaries(summaries: &[RootSummary]) {
    for summary in summaries {
        let line = format!(
            "{} ({:?}): depth {}, {} ill-formed nodes, {} ill-formed branches",
            summary.name,
            summary.kind,
            summary.depth,
            summary.ill_formed_nodes,
            summary.ill_formed_branches
        );
        if summary.fully_well_formed {
            output::success(&line);
        } else {
            output::failure(&line);
        }
    }
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show { model } => {
            let model = model.as_deref().map(expand_path);
            let settings = load_settings(cli, model.as_deref())?;
            match settings.output.format {
                OutputFormat::Json => print_json(&settings)?,
                OutputFormat::Text => output::info(&settings.to_toml()?),
            }
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", &"<no config directory>"),
            }
            output::action("local", &local_config_path(Path::new("<model_dir>")).display());
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(exitcode::OK)
}
