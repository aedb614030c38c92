//! `rulebook-lint` binary

use rulebook_cli::{build_command, execute, init_tracing};
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    init_tracing(matches.get_one::<String>("log-format").is_some_and(|f| f == "json"));

    let mut stdout = std::io::stdout().lock();
    match execute(&matches, &mut stdout) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
