// src/cli/handlers/environment.rs

use anyhow::Result;

use crate::{
    cli::{
        dispatcher::Session,
        handlers::{commons, operate},
        menu::{self, ExitLabel},
    },
    core::project::{ProjectResult, ProjectType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvEntry {
    Recreate,
    Delete,
    Create,
}

fn entries(project: &dyn ProjectType) -> Vec<(EnvEntry, String)> {
    let is_virtual = project
        .context()
        .environment()
        .map(|env| env.is_virtual())
        .unwrap_or(false);
    let mut entries = Vec::new();
    if is_virtual {
        entries.push((EnvEntry::Recreate, format!("♻️ {}", t!("env.menu.recreate"))));
        entries.push((EnvEntry::Delete, format!("🗑️ {}", t!("env.menu.delete"))));
    }
    entries.push((EnvEntry::Create, format!("🐍 {}", t!("env.menu.create"))));
    entries
}

/// Removes the virtual environment, creates it again and reinstalls the project.
pub fn recreate(project: &dyn ProjectType) -> ProjectResult<()> {
    let env = project.context().recreate_environment()?;
    log::info!("Environment recreated at '{}'", env.root().display());
    project.install()
}

/// `--env`: the environment menu first, then the operations menu.
pub fn handle(session: &Session) -> Result<()> {
    let dir = &session.project_dir;
    let Some(project) = operate::open_project(session, dir)? else {
        return operate::operate_on(session, dir, ExitLabel::Exit);
    };
    run(session, project.as_ref())?;
    operate::operate_project(session, project.as_ref(), ExitLabel::Exit)
}

/// Loops over the environment menu until the user goes back.
pub fn run(session: &Session, project: &dyn ProjectType) -> Result<()> {
    let context = project.context();
    let palette = session.palette_for(context.root());
    let prompter = session.prompter();

    loop {
        let entries = entries(project);
        let labels: Vec<String> = entries.iter().map(|(_, label)| label.clone()).collect();
        let Some(index) = menu::choose(session, &palette, t!("env.menu.title"), &labels, ExitLabel::Back)?
        else {
            return Ok(());
        };
        let Some((entry, _)) = entries.get(index) else {
            return Ok(());
        };

        let outcome = match entry {
            EnvEntry::Recreate => {
                if !prompter.confirm(t!("env.confirm_recreate"), false)? {
                    continue;
                }
                recreate(project).map(|_| t!("env.recreated"))
            }
            EnvEntry::Delete => {
                if !prompter.confirm(t!("env.confirm_delete"), false)? {
                    continue;
                }
                context.delete_environment().map(|_| t!("env.deleted"))
            }
            EnvEntry::Create => match commons::choose_environment(prompter, context) {
                Ok(true) => project.install().map(|_| t!("env.ready")),
                Ok(false) => continue,
                Err(e) => {
                    menu::report_error(&palette, &e);
                    continue;
                }
            },
        };
        match outcome {
            Ok(message) => menu::print_success(&palette, message),
            Err(e) => menu::report_project_error(&palette, &e),
        }
    }
}
