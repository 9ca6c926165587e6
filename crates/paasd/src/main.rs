//! `paasd` binary entry point; delegates to [`paasd::run_daemon`].

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match paasd::run_daemon() {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "paasd: {error}").is_err() {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}
