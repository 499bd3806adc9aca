//! taskbridge - batch hierarchical item creation for task-management applications

use std::process::ExitCode;

fn main() -> ExitCode {
    match taskbridge::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
