//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use pm_phase::END_SENTINEL;
use std::path::PathBuf;

const METHODOLOGIES: [&str; 3] = ["waterfall", "agile", "hybrid"];
const STATUSES: [&str; 5] = ["not-started", "in-progress", "completed", "on-hold", "cancelled"];

/// Build the `pm` command tree
#[must_use]
pub fn build_cli() -> Command {
    Command::new("pm")
        .version(crate::VERSION)
        .about("Work breakdown structure and phase planning")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML workspace config (defaults to ./pm.toml if present)"),
        )
        .arg(
            Arg::new("store-dir")
                .long("store-dir")
                .global(true)
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding project snapshots"),
        )
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .global(true)
                .value_name("KEY")
                .help("Project key"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Raise log verbosity (repeatable); RUST_LOG takes precedence"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("init")
                .about("Create a project")
                .arg(
                    Arg::new("methodology")
                        .long("methodology")
                        .short('m')
                        .value_parser(METHODOLOGIES)
                        .help("Base phase set (defaults to the configured methodology)"),
                ),
        )
        .subcommand(wbs_command())
        .subcommand(phase_command())
}

fn wbs_command() -> Command {
    Command::new("wbs")
        .about("Edit and inspect the work breakdown structure")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Add a work package")
                .arg(Arg::new("name").required(true).help("Work package name"))
                .arg(
                    Arg::new("parent")
                        .long("parent")
                        .value_name("CODE")
                        .help("Code of the parent (root level if omitted)"),
                )
                .args(node_attribute_args()),
        )
        .subcommand(
            Command::new("update")
                .about("Change attributes of a work package")
                .arg(Arg::new("code").required(true).help("Work package code"))
                .arg(Arg::new("name").long("name").help("New name"))
                .args(node_attribute_args()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a work package and everything below it")
                .arg(Arg::new("code").required(true).help("Work package code")),
        )
        .subcommand(
            Command::new("move")
                .about("Move a work package (and its subtree) under another parent")
                .arg(Arg::new("code").required(true).help("Work package code"))
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("CODE")
                        .help("New parent code (root level if omitted)"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Print the tree in outline order")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("verify")
                .about("Check structural invariants")
                .arg(
                    Arg::new("repair")
                        .long("repair")
                        .action(ArgAction::SetTrue)
                        .help("Fix parent links, children lists and levels"),
                ),
        )
        .subcommand(
            Command::new("rollup")
                .about("Sum budget and hours, average progress")
                .arg(Arg::new("code").help("Subtree root (whole project if omitted)")),
        )
}

fn node_attribute_args() -> Vec<Arg> {
    vec![
        Arg::new("description").long("description").short('d'),
        Arg::new("status").long("status").value_parser(STATUSES),
        Arg::new("progress")
            .long("progress")
            .value_parser(value_parser!(u8).range(0..=100)),
        Arg::new("budget").long("budget").value_parser(value_parser!(f64)),
        Arg::new("hours")
            .long("hours")
            .value_parser(value_parser!(f64))
            .help("Estimated hours"),
        Arg::new("assignee").long("assignee"),
    ]
}

fn phase_command() -> Command {
    Command::new("phase")
        .about("Manage custom phases")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Insert a custom phase")
                .arg(Arg::new("name").required(true).help("Phase name"))
                .arg(after_arg())
                .arg(Arg::new("description").long("description").short('d'))
                .arg(Arg::new("color").long("color")),
        )
        .subcommand(
            Command::new("update")
                .about("Change attributes of a custom phase")
                .arg(Arg::new("id").required(true).help("Phase id"))
                .arg(Arg::new("name").long("name"))
                .arg(Arg::new("description").long("description").short('d'))
                .arg(Arg::new("color").long("color")),
        )
        .subcommand(
            Command::new("delete")
                .about("Remove a custom phase")
                .arg(Arg::new("id").required(true).help("Phase id")),
        )
        .subcommand(
            Command::new("move")
                .about("Re-slot a custom phase")
                .arg(Arg::new("id").required(true).help("Phase id"))
                .arg(after_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("Print the merged phase sequence")
                .arg(json_flag()),
        )
}

fn after_arg() -> Arg {
    Arg::new("after")
        .long("after")
        .value_name("ID")
        .help(format!("Insert after this phase id, or `{END_SENTINEL}` for the tail"))
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn globals_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["pm", "wbs", "show", "--project", "site", "-vv"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("project").map(String::as_str), Some("site"));
        assert_eq!(matches.get_count("verbose"), 2);
    }

    #[test]
    fn rejects_out_of_range_progress() {
        let result = build_cli().try_get_matches_from(["pm", "wbs", "add", "x", "--progress", "101"]);
        assert!(result.is_err());
    }
}
