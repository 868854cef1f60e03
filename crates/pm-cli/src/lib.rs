//! PM command-line interface
//!
//! The `pm` binary edits one project at a time in a directory of JSON
//! snapshots. Work packages are addressed by code (`1.2.1`), phases by id.
//!
//! ```text
//! pm init --methodology waterfall
//! pm wbs add "Website"
//! pm wbs add "Design" --parent 1 --budget 1200
//! pm phase add "Kickoff" --after initiation
//! pm wbs show
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cli;
mod commands;
mod logging;

pub use cli::build_cli;
pub use commands::{execute, resolve_config};
pub use logging::{default_directive, init_tracing};

use anyhow::Context;
use clap::ArgMatches;
use std::ffi::OsString;
use std::io::Write;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse `args` (including the program name) and run the command
///
/// # Errors
/// Fails on invalid arguments or any command error
pub fn run<I, T>(args: I, out: &mut dyn Write) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_cli().try_get_matches_from(args)?;
    execute_and_flush(&matches, out)
}

/// Run the parsed command, then flush `out`
///
/// A flush failure after a successful command is an error of its own. When
/// the command already failed, the flush failure is only logged.
///
/// # Errors
/// Fails on any command error or if `out` cannot be flushed
pub fn execute_and_flush(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<()> {
    let result = execute(matches, out);
    let flushed = out.flush();
    match result {
        Ok(()) => flushed.context("failed to flush output"),
        Err(e) => {
            if let Err(flush) = flushed {
                tracing::warn!("Failed to flush output: {}", flush);
            }
            Err(e)
        }
    }
}
