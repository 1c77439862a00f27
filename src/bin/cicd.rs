// src/bin/cicd.rs

use cicd_tools::{
    cli::{Cli, dispatcher},
    core::{config_store::ConfigStore, logging},
};
use clap::Parser;
use colored::*;
use std::path::Path;

/// Whether the project asked for the whole error chain (`execution.stack_trace`).
fn wants_stack_trace(directory: &Path) -> bool {
    ConfigStore::open(directory)
        .map(|store| store.stack_trace())
        .unwrap_or(false)
}

/// The entry point of `cicd`: sets up logging, dispatches the selected action and
/// performs centralized error handling.
fn main() {
    let cli = Cli::parse();
    let directory = cli.directory.clone();
    logging::init(&directory);

    if let Err(e) = dispatcher::run_cli(cli) {
        if wants_stack_trace(&directory) {
            eprintln!("\n{}: {:?}", "Error".red().bold(), e);
        } else {
            eprintln!("\n{}: {}", "Error".red().bold(), e);
        }
        std::process::exit(1);
    }
}
