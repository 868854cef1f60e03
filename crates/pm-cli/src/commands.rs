//! Subcommand dispatch

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use pm_core::{CoreError, ProjectStateStore, WorkspaceConfig};
use pm_model::{
    Methodology, NewNode, NewPhase, NodeId, NodePatch, NodeStatus, PhaseId, PhasePatch,
};
use pm_phase::InsertPosition;
use pm_wbs::{MoveOutcome, Rollup};
use std::io::Write;
use std::path::PathBuf;

/// Resolve configuration: defaults, then config file, then flags
///
/// # Errors
/// Fails if an explicitly named config file cannot be read or parsed
pub fn resolve_config(matches: &ArgMatches) -> Result<WorkspaceConfig> {
    let path = matches.get_one::<PathBuf>("config");
    let mut config = WorkspaceConfig::discover(path.map(PathBuf::as_path))
        .context("failed to load workspace config")?;

    if let Some(dir) = matches.get_one::<PathBuf>("store-dir") {
        config.store_dir.clone_from(dir);
    }
    if let Some(project) = matches.get_one::<String>("project") {
        config.project_key.clone_from(project);
    }
    Ok(config)
}

/// Run the parsed command, writing results to `out`
///
/// # Errors
/// Fails on config, persistence or lookup errors
pub fn execute(matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    let mut config = resolve_config(matches)?;

    match matches.subcommand() {
        Some(("init", args)) => {
            if let Some(name) = args.get_one::<String>("methodology") {
                config.methodology = name.parse::<Methodology>()?;
            }
            init(&config, out)
        }
        Some(("wbs", args)) => {
            let mut project = open(&config)?;
            wbs(&mut project, args, out)
        }
        Some(("phase", args)) => {
            let mut project = open(&config)?;
            phase(&mut project, args, out)
        }
        _ => bail!("no command given; see `pm --help`"),
    }
}

fn open(config: &WorkspaceConfig) -> Result<ProjectStateStore> {
    ProjectStateStore::open(config).with_context(|| {
        format!(
            "failed to open project {} in {}",
            config.project_key,
            config.store_dir.display()
        )
    })
}

fn init(config: &WorkspaceConfig, out: &mut dyn Write) -> Result<()> {
    let mut project = open(config)?;
    if project.is_persisted() {
        bail!(
            "project {} already exists ({} methodology)",
            project.project_key(),
            project.methodology()
        );
    }
    project.save()?;
    writeln!(
        out,
        "Initialized {} project {}",
        project.methodology(),
        project.project_key()
    )?;
    for phase in project.phases().sequence() {
        writeln!(out, "  {:>2}. {}", phase.order, phase.name)?;
    }
    Ok(())
}

// -------------------------------------------------------------------------
// wbs
// -------------------------------------------------------------------------

fn wbs(project: &mut ProjectStateStore, matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    match matches.subcommand() {
        Some(("add", args)) => {
            let parent = args
                .get_one::<String>("parent")
                .map(|code| project.resolve_code(code))
                .transpose()?;
            let name = args.get_one::<String>("name").cloned().unwrap_or_default();
            let id = project.add_node(new_node(name, args), parent)?;
            let node = project.tree().get(id).context("added node vanished")?;
            writeln!(out, "{}\t{}", node.code, node.name)?;
        }
        Some(("update", args)) => {
            let id = resolve(project, args)?;
            let patch = node_patch(args);
            if patch.is_empty() {
                bail!("nothing to update; pass at least one attribute");
            }
            project.update_node(id, patch)?;
            let node = project.tree().get(id).context("updated node vanished")?;
            writeln!(out, "{}\t{}\t{}\t{}%", node.code, node.name, node.status.name(), node.progress)?;
        }
        Some(("delete", args)) => {
            let id = resolve(project, args)?;
            let removed = project.delete_node(id)?;
            writeln!(out, "Deleted {} work package(s)", removed.len())?;
        }
        Some(("move", args)) => {
            let id = resolve(project, args)?;
            let target = args
                .get_one::<String>("to")
                .map(|code| project.resolve_code(code))
                .transpose()?;
            if let Some(target) = target {
                check_not_into_own_subtree(project, id, target)?;
            }
            match project.move_node(id, target)? {
                MoveOutcome::Moved {
                    old_code,
                    new_code,
                    affected,
                } => writeln!(out, "Moved {old_code} -> {new_code} ({affected} re-coded)")?,
                MoveOutcome::Unchanged => writeln!(out, "Already there")?,
                MoveOutcome::WouldCycle => bail!("cannot move a work package into its own subtree"),
                MoveOutcome::NotFound | MoveOutcome::TargetNotFound => {
                    bail!("work package disappeared during move")
                }
            }
        }
        Some(("show", args)) => show_tree(project, args.get_flag("json"), out)?,
        Some(("verify", args)) => verify(project, args.get_flag("repair"), out)?,
        Some(("rollup", args)) => {
            let rollup = match args.get_one::<String>("code") {
                Some(code) => {
                    let id = project.resolve_code(code)?;
                    project.tree().rollup(id).ok_or(CoreError::UnknownCode(code.as_str().into()))?
                }
                None => project.tree().project_rollup(),
            };
            write_rollup(&rollup, out)?;
        }
        _ => bail!("unknown wbs command"),
    }
    Ok(())
}

fn resolve(project: &ProjectStateStore, args: &ArgMatches) -> Result<NodeId> {
    let code = args.get_one::<String>("code").context("missing code")?;
    Ok(project.resolve_code(code)?)
}

/// Reject a move whose target code lies inside the moved subtree
fn check_not_into_own_subtree(
    project: &ProjectStateStore,
    id: NodeId,
    target: NodeId,
) -> Result<()> {
    let tree = project.tree();
    let (Some(node), Some(parent)) = (tree.get(id), tree.get(target)) else {
        return Ok(());
    };
    if node.code == parent.code || node.code.is_ancestor_of(&parent.code) {
        bail!(
            "cannot move {} into its own subtree (target {})",
            node.code,
            parent.code
        );
    }
    Ok(())
}

fn status_arg(args: &ArgMatches) -> Option<NodeStatus> {
    args.get_one::<String>("status")
        .and_then(|s| NodeStatus::from_name(s))
}

fn new_node(name: String, args: &ArgMatches) -> NewNode {
    let mut data = NewNode::new(name);
    data.description = args.get_one::<String>("description").cloned();
    data.status = status_arg(args);
    data.progress = args.get_one::<u8>("progress").copied();
    data.budget = args.get_one::<f64>("budget").copied();
    data.estimated_hours = args.get_one::<f64>("hours").copied();
    data.assignee = args.get_one::<String>("assignee").cloned();
    data
}

fn node_patch(args: &ArgMatches) -> NodePatch {
    NodePatch {
        name: args.get_one::<String>("name").cloned(),
        description: args.get_one::<String>("description").cloned(),
        status: status_arg(args),
        progress: args.get_one::<u8>("progress").copied(),
        budget: args.get_one::<f64>("budget").copied(),
        estimated_hours: args.get_one::<f64>("hours").copied(),
        assignee: args.get_one::<String>("assignee").cloned(),
        ..NodePatch::default()
    }
}

fn show_tree(project: &ProjectStateStore, json: bool, out: &mut dyn Write) -> Result<()> {
    let outline = project.tree().outline();
    if json {
        serde_json::to_writer_pretty(&mut *out, &outline)?;
        writeln!(out)?;
        return Ok(());
    }
    if outline.is_empty() {
        writeln!(out, "(no work packages)")?;
    }
    for node in outline {
        let indent = "  ".repeat(node.level as usize);
        writeln!(
            out,
            "{indent}{}\t{}\t{}\t{}%",
            node.code,
            node.name,
            node.status.name(),
            node.progress
        )?;
    }
    Ok(())
}

fn verify(project: &mut ProjectStateStore, repair: bool, out: &mut dyn Write) -> Result<()> {
    let violations = project.tree().verify();
    if violations.is_empty() {
        writeln!(out, "OK: {} work packages, no violations", project.tree().len())?;
        return Ok(());
    }
    for violation in &violations {
        writeln!(out, "violation: {violation}")?;
    }
    if !repair {
        bail!("{} structural violation(s); rerun with --repair", violations.len());
    }

    let report = project.repair_tree()?;
    writeln!(
        out,
        "Repaired: {} promoted to root, {} children lists rebuilt, {} levels fixed",
        report.promoted_to_root, report.children_rebuilt, report.levels_fixed
    )?;
    let remaining = project.tree().verify();
    for violation in &remaining {
        writeln!(out, "remaining: {violation}")?;
    }
    Ok(())
}

fn write_rollup(rollup: &Rollup, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "nodes\t{}", rollup.node_count)?;
    writeln!(out, "leaves\t{}", rollup.leaf_count)?;
    writeln!(out, "budget\t{:.2}", rollup.budget)?;
    writeln!(out, "hours\t{:.1}", rollup.estimated_hours)?;
    writeln!(out, "progress\t{:.1}%", rollup.progress)?;
    Ok(())
}

// -------------------------------------------------------------------------
// phase
// -------------------------------------------------------------------------

fn phase(project: &mut ProjectStateStore, matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
    match matches.subcommand() {
        Some(("add", args)) => {
            let name = args.get_one::<String>("name").cloned().unwrap_or_default();
            let mut data = NewPhase::new(name);
            data.description = args.get_one::<String>("description").cloned();
            data.color = args.get_one::<String>("color").cloned();

            let position = insert_position(project, args)?;
            let id = project.add_custom_phase(data, position)?;
            let at = project.phases().position_of(&id).unwrap_or_default();
            writeln!(out, "{id}\t{at}")?;
        }
        Some(("update", args)) => {
            let id = custom_phase_id(project, args)?;
            let patch = PhasePatch {
                name: args.get_one::<String>("name").cloned(),
                description: args.get_one::<String>("description").cloned(),
                color: args.get_one::<String>("color").cloned(),
            };
            project.update_phase(&id, patch)?;
            let phase = project.phase(&id)?;
            writeln!(out, "{}\t{}", phase.id, phase.name)?;
        }
        Some(("delete", args)) => {
            let id = custom_phase_id(project, args)?;
            if let Some(phase) = project.delete_phase(&id)? {
                writeln!(out, "Deleted {} ({})", phase.id, phase.name)?;
            }
        }
        Some(("move", args)) => {
            let id = custom_phase_id(project, args)?;
            let position = insert_position(project, args)?;
            if !project.move_custom_phase(&id, position)? {
                bail!("cannot place phase {id} after itself");
            }
            let at = project.phases().position_of(&id).unwrap_or_default();
            writeln!(out, "{id}\t{at}")?;
        }
        Some(("list", args)) => {
            let sequence = project.phases().sequence();
            if args.get_flag("json") {
                serde_json::to_writer_pretty(&mut *out, &sequence)?;
                writeln!(out)?;
            } else {
                for phase in sequence {
                    let marker = if phase.is_custom { "*" } else { " " };
                    writeln!(out, "{:>2}.{marker} {}\t{}", phase.order, phase.id, phase.name)?;
                }
            }
        }
        _ => bail!("unknown phase command"),
    }
    Ok(())
}

/// `--after` as an insert position, rejecting unknown phase ids up front
fn insert_position(project: &ProjectStateStore, args: &ArgMatches) -> Result<InsertPosition> {
    let position = InsertPosition::from_after(args.get_one::<String>("after").map(String::as_str));
    if let InsertPosition::After(id) = &position {
        project.phase(id)?;
    }
    Ok(position)
}

fn custom_phase_id(project: &ProjectStateStore, args: &ArgMatches) -> Result<PhaseId> {
    let id = PhaseId::new(args.get_one::<String>("id").context("missing phase id")?.as_str());
    let phase = project.phase(&id)?;
    if !phase.is_custom {
        bail!("{} is a base phase and cannot be changed", phase.id);
    }
    Ok(id)
}
