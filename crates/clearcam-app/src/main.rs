//! Main application entry point.

use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting ClearCam");

    clearcam_app::cli::run(clearcam_app::cli::CliArgs::parse())
}
