// src/cli/handlers/restore.rs

use anyhow::{Result, bail};

use crate::{
    cli::{dispatcher::Session, menu},
    core::{config_store::ConfigStore, detector},
};

/// `--restore`: resets the project configuration to its defaults.
pub fn handle(session: &Session) -> Result<()> {
    let dir = &session.project_dir;
    if !detector::is_project_directory(dir) {
        bail!(format!(t!("restore.not_a_project"), path = dir.display()));
    }

    println!("{}", format!(t!("restore.start"), path = dir.display()));
    let mut store = ConfigStore::open(dir)?;
    store.clear()?;
    log::info!("Configuration at '{}' reset", store.path().display());
    menu::print_success(&session.palette(), t!("restore.done"));
    Ok(())
}
