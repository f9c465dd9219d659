use strap_core::error::InstallError;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Parse CLI, set up logging, and dispatch.
    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("strap error: {:#}", err);
        let code = err
            .downcast_ref::<InstallError>()
            .map(InstallError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
