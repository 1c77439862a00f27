// src/cli/handlers/operate.rs

use anyhow::Result;
use std::path::Path;

use crate::{
    cli::{
        dispatcher::Session,
        handlers::{commons, create},
        menu::{self, ExitLabel},
    },
    core::{
        detector,
        project::{self, ProjectType},
    },
};

/// The default flow: operate on the project in the session directory.
pub fn handle(session: &Session) -> Result<()> {
    operate_on(session, &session.project_dir, ExitLabel::Exit)
}

/// Detects the project in `dir` and opens its operations menu. Unrecognized directories
/// are offered the create flow instead.
pub fn operate_on(session: &Session, dir: &Path, exit: ExitLabel) -> Result<()> {
    let Some(project) = open_project(session, dir)? else {
        let palette = session.palette_for(dir);
        println!(
            "{}",
            palette.warning(&format!(t!("operate.not_a_project"), path = dir.display()))
        );
        if session.prompter().confirm(t!("operate.offer_create"), true)? {
            return create::run(session, exit);
        }
        return Ok(());
    };
    operate_project(session, project.as_ref(), exit)
}

/// Builds the variant detected for `dir`, if any.
pub fn open_project(session: &Session, dir: &Path) -> Result<Option<Box<dyn ProjectType>>> {
    let Some(kind) = detector::detect(dir) else {
        return Ok(None);
    };
    log::info!("Operating on {} project at '{}'", kind, dir.display());
    let context = session.project_context(dir)?;
    Ok(Some(project::build_project(kind, context)))
}

pub fn operate_project(session: &Session, project: &dyn ProjectType, exit: ExitLabel) -> Result<()> {
    if !ensure_environment(session, project)? {
        return Ok(());
    }
    menu::run_project_menu(session, project, exit)
}

/// Makes sure the project has a usable environment before the menu opens. A first-time
/// setup (or a virtual environment that vanished) ends with one install.
/// `false` when the user backed out of the setup.
pub fn ensure_environment(session: &Session, project: &dyn ProjectType) -> Result<bool> {
    let context = project.context();
    let palette = session.palette_for(context.root());

    if context.has_environment() {
        let env = context.environment()?;
        if !env.is_virtual() || env.exists() {
            return Ok(true);
        }
        println!(
            "{}",
            palette.warning(&format!(t!("operate.env_missing"), path = env.root().display()))
        );
        context.recreate_environment()?;
    } else {
        println!("{}", palette.info(t!("operate.no_environment")));
        if !commons::choose_environment(session.prompter(), context)? {
            return Ok(false);
        }
    }

    if let Err(e) = project.install() {
        menu::report_project_error(&palette, &e);
    }
    Ok(true)
}
