//! Command dispatch: one handler per subcommand

use std::io::Write;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::services::{
    parse_assignments, parse_predicate, Document, DocumentService, Placement,
};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Matched, Predicate};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show { file }) => cmd_show(file, cli.json),
        Some(Commands::Find { file, id }) => cmd_find(file, id, cli.json),
        Some(Commands::Select {
            file,
            filters,
            then,
            from,
            deep,
        }) => cmd_select(file, filters, then, from.as_deref(), *deep, cli.json),
        Some(Commands::Flatten { file, from }) => cmd_flatten(file, from.as_deref(), cli.json),
        Some(Commands::Move {
            file,
            node,
            target,
            before,
            after,
        }) => {
            let placement = match (before, after) {
                (true, _) => Placement::Before,
                (_, true) => Placement::After,
                _ => Placement::Child,
            };
            cmd_move(file, node, target, placement)
        }
        Some(Commands::Remove { file, id }) => cmd_remove(file, id),
        Some(Commands::Set {
            file,
            id,
            assignments,
            descendants,
        }) => cmd_set(file, id, assignments, *descendants),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show { dir } => cmd_config_show(dir.as_deref()),
            ConfigCommands::Path => cmd_config_path(),
        },
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see `treemodel --help`".into(),
        )),
    }
}

/// Services configured for the document's directory.
fn container_for(file: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(file.parent())?;
    debug!(?settings, "effective settings");
    Ok(ServiceContainer::new(settings))
}

fn print_nodes(
    service: &DocumentService,
    document: &Document,
    nodes: &Matched,
    json: bool,
) -> CliResult<()> {
    if json {
        let values: Vec<Value> = nodes
            .iter()
            .filter_map(|node| document.tree.to_json(node))
            .collect();
        output::info(&service.format_json(&Value::Array(values))?);
    } else {
        for node in nodes.iter() {
            output::info(&service.label(document, node));
        }
    }
    Ok(())
}

#[instrument]
fn cmd_show(file: &Path, json: bool) -> CliResult<()> {
    let container = container_for(file)?;
    let documents = &container.documents;
    let document = documents.load(file)?;
    if json {
        output::info(&documents.format_json(&document.to_value())?);
    } else {
        print!("{}", documents.render(&document));
    }
    Ok(())
}

#[instrument]
fn cmd_find(file: &Path, id: &str, json: bool) -> CliResult<()> {
    let container = container_for(file)?;
    let documents = &container.documents;
    let document = documents.load(file)?;
    let node = document.resolve(id)?;
    if json {
        let value = document.tree.to_json(node).unwrap_or(Value::Null);
        output::info(&documents.format_json(&value)?);
    } else {
        print!(
            "{}",
            document
                .tree
                .to_tree_string(node, &documents.settings().label_keys)
        );
    }
    Ok(())
}

/// Parse one `--then` stage: comma separated `key=value` pairs.
fn parse_stage(stage: &str) -> CliResult<Predicate> {
    let pairs: Vec<String> = stage
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(String::from)
        .collect();
    if pairs.is_empty() {
        return Err(CliError::InvalidArgs(format!("empty --then stage `{stage}`")));
    }
    Ok(parse_predicate(&pairs)?)
}

#[instrument]
fn cmd_select(
    file: &Path,
    filters: &[String],
    then: &[String],
    from: Option<&str>,
    deep: bool,
    json: bool,
) -> CliResult<()> {
    let mut chain = vec![parse_predicate(filters)?];
    for stage in then {
        chain.push(parse_stage(stage)?);
    }

    let container = container_for(file)?;
    let documents = &container.documents;
    let document = documents.load(file)?;
    let matched = documents.select(&document, from, &chain, deep)?;
    if matched.is_empty() {
        output::warning("no matching nodes");
    }
    print_nodes(documents, &document, &matched, json)
}

#[instrument]
fn cmd_flatten(file: &Path, from: Option<&str>, json: bool) -> CliResult<()> {
    let container = container_for(file)?;
    let documents = &container.documents;
    let document = documents.load(file)?;
    let nodes = documents.flatten(&document, from)?;
    print_nodes(documents, &document, &nodes, json)
}

#[instrument]
fn cmd_move(file: &Path, node: &str, target: &str, placement: Placement) -> CliResult<()> {
    let container = container_for(file)?;
    let documents = &container.documents;
    let mut document = documents.load(file)?;
    let moved = documents.move_node(&mut document, node, target, placement)?;
    if moved.is_empty() {
        return Err(CliError::InvalidArgs(format!(
            "cannot place a node beside the root `{target}`"
        )));
    }
    documents.save(&document)?;
    output::success(&format!("moved {node}"));
    Ok(())
}

#[instrument]
fn cmd_remove(file: &Path, id: &str) -> CliResult<()> {
    let container = container_for(file)?;
    let documents = &container.documents;
    let mut document = documents.load(file)?;
    if !documents.remove_node(&mut document, id)? {
        return Err(CliError::InvalidArgs(format!("cannot remove root node `{id}`")));
    }
    documents.save(&document)?;
    output::success(&format!("removed {id}"));
    Ok(())
}

#[instrument]
fn cmd_set(file: &Path, id: &str, assignments: &[String], descendants: bool) -> CliResult<()> {
    let attributes = parse_assignments(assignments)?;
    let container = container_for(file)?;
    let documents = &container.documents;
    let mut document = documents.load(file)?;
    let count = attributes.len();
    documents.set_attributes(&mut document, id, attributes, descendants)?;
    documents.save(&document)?;
    output::success(&format!("set {count} attribute(s) on {id}"));
    Ok(())
}

#[instrument]
fn cmd_config_show(dir: Option<&Path>) -> CliResult<()> {
    let settings = Settings::load(dir)?;
    print!("{}", settings.to_toml()?);
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    output::header("Config files (lowest to highest precedence)");
    match global_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not found)" };
            output::detail(&format!("global: {}{}", path.display(), marker));
        }
        None => output::detail("global: no config directory on this platform"),
    }
    output::detail(&format!(
        "local:  {} (next to the document)",
        local_config_path(Path::new("<document dir>")).display()
    ));
    output::detail("env:    TREEMODEL_*");
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut buffer = Vec::new();
    generate(shell, &mut cmd, name, &mut buffer);
    std::io::stdout()
        .write_all(&buffer)
        .map_err(|e| InfraError::io("write completion script", e))?;
    Ok(())
}
