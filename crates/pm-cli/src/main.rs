use pm_cli::{build_cli, execute_and_flush, init_tracing};
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"), matches.get_flag("log-json"));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match execute_and_flush(&matches, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
