//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::{CurriculumService, ToggleOutcome, ViewOptions};
use crate::application::Role;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{BuildReport, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Per-invocation wiring for commands working on a curriculum source.
struct Context {
    container: ServiceContainer,
    role: Role,
    color: bool,
    data_dir: PathBuf,
}

impl Context {
    fn new(cli: &Cli, path: &Path) -> CliResult<Self> {
        let data_dir = data_dir(path);
        let settings = Settings::load(Some(&data_dir))?;
        debug!("settings: {:?}", settings);

        let role = cli.role.unwrap_or(settings.role);
        let color = settings.color && !cli.no_color;
        if !color {
            colored::control::set_override(false);
        }

        Ok(Self {
            container: ServiceContainer::new(settings),
            role,
            color,
            data_dir,
        })
    }

    fn service(&self) -> CurriculumService {
        self.container.curriculum_service()
    }

    fn settings(&self) -> &Settings {
        &self.container.settings
    }
}

/// Directory that holds the local config and the default state file.
fn data_dir(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn parse_id(raw: &str) -> CliResult<NodeId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::InvalidArgs("node id must not be empty".into()));
    }
    Ok(NodeId::from(trimmed))
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree {
            path,
            select,
            levels,
            expand,
            state,
            all,
        }) => {
            let options = ViewOptions {
                selected: select.as_deref().map(parse_id).transpose()?,
                levels: levels.unwrap_or(0),
                expand: expand
                    .iter()
                    .map(|id| parse_id(id))
                    .collect::<CliResult<_>>()?,
                saved: None,
                expand_all: *all,
            };
            cmd_tree(cli, path, options, *levels, state.as_deref())
        }
        Some(Commands::Path { path, id }) => cmd_path(cli, path, &parse_id(id)?),
        Some(Commands::Check { path, strict }) => cmd_check(cli, path, *strict),
        Some(Commands::Toggle { path, id, state }) => {
            cmd_toggle(cli, path, &parse_id(id)?, state.as_deref())
        }
        Some(Commands::Select { path }) => cmd_select(cli, path),
        Some(Commands::Move {
            path,
            id,
            parent,
            root,
        }) => {
            let parent = if *root {
                None
            } else {
                parent.as_deref().map(parse_id).transpose()?
            };
            cmd_move(cli, path, &parse_id(id)?, parent.as_ref())
        }
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, run with --help for usage".into(),
        )),
    }
}

fn report_repairs(report: &BuildReport) {
    for cycle in &report.cycles {
        output::warning(cycle);
    }
    if !report.orphans.is_empty() {
        debug!("{} orphan(s) shown as roots", report.orphans.len());
    }
}

#[instrument(skip(cli, options))]
fn cmd_tree(
    cli: &Cli,
    path: &Path,
    mut options: ViewOptions,
    levels: Option<usize>,
    state: Option<&Path>,
) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    let service = ctx.service();
    options.levels = levels.unwrap_or(ctx.settings().expand_levels);
    if let Some(state_file) = state {
        options.saved = service.load_state(state_file)?;
        if options.saved.is_none() {
            output::warning(&format!("no saved state at {}", state_file.display()));
        }
    }

    let nodes = service.load(ctx.role, path)?;
    let view = service.view(&nodes, options)?;
    report_repairs(&view.report);
    print!("{}", view.render(ctx.color));
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_path(cli: &Cli, path: &Path, id: &NodeId) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    let service = ctx.service();
    let nodes = service.load(ctx.role, path)?;
    let ancestors = service.expansion_path(&nodes, id)?;

    let name_of = |id: &NodeId| {
        nodes
            .iter()
            .find(|n| &n.id == id)
            .map(|n| n.name.as_str())
            .unwrap_or("?")
    };
    for ancestor in &ancestors {
        output::info(&format!("{}\t{}", ancestor, name_of(ancestor)));
    }
    debug!("path: {} ancestor(s) of {}", ancestors.len(), id);
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, path: &Path, strict: bool) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    let service = ctx.service();
    let nodes = service.load(ctx.role, path)?;
    let report = service.check(&nodes)?;
    let forest = &report.forest;

    output::header(&format!(
        "{} nodes in {} tree(s), depth {}, {} leaves",
        forest.len(),
        forest.roots().len(),
        forest.depth(),
        forest.leaf_nodes().len()
    ));
    for orphan in &report.orphans {
        let parent = nodes
            .iter()
            .find(|n| &n.id == orphan)
            .and_then(|n| n.parent_id.as_ref())
            .map(|p| p.to_string())
            .unwrap_or_default();
        output::warning(&format!("orphan {orphan}: parent {parent} not found, shown as root"));
    }
    for cycle in &report.cycles {
        output::warning(cycle);
    }

    let defects = report.orphans.len() + report.cycles.len();
    if defects == 0 {
        output::success("no hierarchy defects");
        Ok(())
    } else if strict {
        Err(CliError::Defects(defects))
    } else {
        output::detail(&format!("{defects} defect(s) repaired at build time"));
        Ok(())
    }
}

#[instrument(skip(cli))]
fn cmd_toggle(cli: &Cli, path: &Path, id: &NodeId, state: Option<&Path>) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    let service = ctx.service();
    let state_file = state
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.settings().state_path(&ctx.data_dir));

    let nodes = service.load(ctx.role, path)?;
    let (state, outcome) =
        service.toggle(&nodes, &state_file, id, ctx.settings().expand_levels)?;
    match outcome {
        ToggleOutcome::Expanded => output::action("Expanded", id),
        ToggleOutcome::Collapsed => output::action("Collapsed", id),
        ToggleOutcome::Leaf => output::warning(&format!("{id} has no children, nothing to toggle")),
    }

    let view = service.view(
        &nodes,
        ViewOptions {
            saved: Some(state),
            ..ViewOptions::default()
        },
    )?;
    print!("{}", view.render(ctx.color));
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_select(cli: &Cli, path: &Path) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    let service = ctx.service();
    let nodes = service.load(ctx.role, path)?;
    let items = service.selection_items(&nodes)?;

    let picked = ctx
        .container
        .selector
        .select_one(&items, "node> ")
        .map_err(|message| InfraError::Selector { message })?;
    let Some(item) = picked else {
        output::info("No node selected.");
        return Ok(());
    };

    let view = service.view(
        &nodes,
        ViewOptions {
            selected: Some(NodeId::from(item.value)),
            levels: ctx.settings().expand_levels,
            ..ViewOptions::default()
        },
    )?;
    report_repairs(&view.report);
    print!("{}", view.render(ctx.color));
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_move(cli: &Cli, path: &Path, id: &NodeId, parent: Option<&NodeId>) -> CliResult<()> {
    let ctx = Context::new(cli, path)?;
    ctx.service().reparent(ctx.role, path, id, parent)?;
    let target = parent
        .map(|p| p.to_string())
        .unwrap_or_else(|| "root".to_string());
    output::action("Moved", &format!("{id} -> {target}"));
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Init { local } => {
            let target = match local {
                Some(dir) => local_config_path(dir),
                None => global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".into())
                })?,
            };
            if target.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&target, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::action("Created", &target.display());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => output::info(&format!("global: {}", p.display())),
                None => output::info("global: (unavailable)"),
            }
            output::info(&format!("local:  {}", local_config_path(Path::new(".")).display()));
            Ok(())
        }
    }
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
