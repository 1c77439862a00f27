// src/cli/menu.rs

//! Menu rendering shared by the interactive flows.

use anyhow::Result;
use colored::*;

use crate::cli::dispatcher::Session;
use crate::core::project::{ProjectError, ProjectType};
use crate::core::style::Palette;

/// The label of the entry that leaves a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitLabel {
    Back,
    Exit,
}

impl ExitLabel {
    pub fn label(self) -> String {
        match self {
            Self::Back => format!("{} {}", "↩", t!("menu.back")),
            Self::Exit => format!("{} {}", "🚪", t!("menu.exit")),
        }
    }
}

/// Shows `title` over `items` plus the exit entry. `None` means leave the menu.
pub fn choose(
    session: &Session,
    palette: &Palette,
    title: &str,
    items: &[String],
    exit: ExitLabel,
) -> Result<Option<usize>> {
    let mut entries = items.to_vec();
    entries.push(exit.label());
    println!("\n{}", palette.header(title));
    let choice = session.prompter().select(t!("menu.prompt"), &entries, 0)?;
    Ok(choice.filter(|&i| i < items.len()))
}

/// Prints a failure inside a menu; the menu keeps running.
pub fn report_error(palette: &Palette, error: &dyn std::fmt::Display) {
    eprintln!("{}: {}", palette.error("Error"), error);
}

pub fn report_project_error(palette: &Palette, error: &ProjectError) {
    match error {
        ProjectError::Cancelled => println!("{}", palette.warning(t!("menu.cancelled"))),
        other => report_error(palette, other),
    }
}

/// Loops over the operations of `project` until the user leaves.
pub fn run_project_menu(
    session: &Session,
    project: &dyn ProjectType,
    exit: ExitLabel,
) -> Result<()> {
    let palette = session.palette_for(project.context().root());
    let title = format!(
        t!("menu.project.title"),
        kind = project.kind(),
        path = project.context().root().display()
    );

    loop {
        let actions = project.get_menu_actions();
        let labels: Vec<String> = actions.iter().map(|action| action.label()).collect();
        let Some(index) = choose(session, &palette, &title, &labels, exit)? else {
            return Ok(());
        };
        let Some(action) = actions.get(index) else {
            return Ok(());
        };

        log::debug!("Menu action '{}' ({})", action.name, action.owner);
        match action.execute(session.prompter()) {
            Ok(()) => log::debug!("Action '{}' finished", action.name),
            Err(e) => report_project_error(&palette, &e),
        }
        session.prompter().pause()?;
    }
}

/// A one-line summary printed after a flow finishes.
pub fn print_success(palette: &Palette, message: &str) {
    println!("{} {}", palette.success("✓"), message.bold());
}
