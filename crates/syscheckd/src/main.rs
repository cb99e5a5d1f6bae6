use std::io::{self, Write};
use std::process::ExitCode;

use syscheckd::run_supervised;

fn main() -> ExitCode {
    match run_supervised() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr(), "syscheckd: {error}");
            ExitCode::FAILURE
        }
    }
}
