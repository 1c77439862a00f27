// src/cli/handlers/create.rs

use anyhow::{Result, anyhow};
use colored::*;
use serde_yaml::Value;
use std::path::PathBuf;

use crate::{
    cli::{
        dispatcher::Session,
        handlers::{commons, operate},
        menu::{self, ExitLabel},
    },
    core::{
        config_store::ConfigStore,
        style::Palette,
        template_manager::TemplateManager,
        template_schema::{self, Answers},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CreateEntry {
    Create,
    List,
    Update,
}

fn entries(session: &Session) -> Vec<(CreateEntry, String)> {
    let mut entries = vec![
        (CreateEntry::Create, format!("✨ {}", t!("create.menu.create"))),
        (CreateEntry::List, format!("📋 {}", t!("create.menu.list"))),
    ];
    let has_record = ConfigStore::open(&session.project_dir)
        .map(|store| store.template_record().is_some())
        .unwrap_or(false);
    if has_record {
        entries.push((CreateEntry::Update, format!("🔄 {}", t!("create.menu.update"))));
    }
    entries
}

/// The create flow, entered with `--create`.
pub fn handle(session: &Session) -> Result<()> {
    run(session, ExitLabel::Exit)
}

/// Loops over the create menu until the user leaves it.
pub fn run(session: &Session, exit: ExitLabel) -> Result<()> {
    let palette = session.palette();
    let manager = session.template_manager();

    loop {
        let entries = entries(session);
        let labels: Vec<String> = entries.iter().map(|(_, label)| label.clone()).collect();
        let Some(index) = menu::choose(session, &palette, t!("create.menu.title"), &labels, exit)?
        else {
            return Ok(());
        };
        let Some((entry, _)) = entries.get(index) else {
            return Ok(());
        };

        let outcome = match entry {
            CreateEntry::Create => create_project(session, &manager, &palette),
            CreateEntry::List => {
                list_templates(&manager, &palette);
                Ok(None)
            }
            CreateEntry::Update => update_project(session, &manager, &palette).map(|_| None),
        };

        match outcome {
            Ok(Some(created)) => {
                let question = t!("create.ask_operate");
                if session.prompter().confirm(question, true)? {
                    return operate::operate_on(session, &created, ExitLabel::Back);
                }
            }
            Ok(None) => {}
            Err(e) => menu::report_error(&palette, &e),
        }
    }
}

fn list_templates(manager: &TemplateManager, palette: &Palette) {
    let templates = manager.list_templates();
    if templates.is_empty() {
        println!(
            "{}",
            palette.warning(&format!(
                t!("create.no_templates"),
                dir = manager.templates_dir().display()
            ))
        );
        return;
    }
    println!("\n{}", palette.header(t!("create.templates.header")));
    for template in templates {
        println!("  {} {}", template.name.cyan().bold(), template.description.dimmed());
    }
}

/// Asks for a template, a name and the template's questions, then renders the project
/// under the session directory. Returns the new project's path.
fn create_project(
    session: &Session,
    manager: &TemplateManager,
    palette: &Palette,
) -> Result<Option<PathBuf>> {
    let prompter = session.prompter();
    let templates = manager.list_templates();
    if templates.is_empty() {
        return Err(anyhow!(format!(
            t!("create.no_templates"),
            dir = manager.templates_dir().display()
        )));
    }

    let labels: Vec<String> = templates
        .iter()
        .map(|t| {
            if t.description.is_empty() {
                t.name.clone()
            } else {
                format!("{} - {}", t.name, t.description)
            }
        })
        .collect();
    let Some(template) = prompter
        .select(t!("create.choose_template"), &labels, 0)?
        .and_then(|i| templates.get(i))
    else {
        return Ok(None);
    };

    let name = commons::sanitize_project_name(&prompter.input(t!("create.ask_name"), None)?);
    if name.is_empty() {
        println!("{}", palette.warning(t!("create.name_required")));
        return Ok(None);
    }

    let schema = manager.load_schema(&template.name)?;
    let mut answers = Answers::new();
    answers.insert("project_name".to_string(), Value::from(name.clone()));
    let answers = commons::ask_template_questions(prompter, &schema, answers)?;

    let destination = session.project_dir.join(&name);
    let created = manager.create_project(&template.name, &destination, &answers)?;
    menu::print_success(
        palette,
        &format!(t!("create.done"), path = created.display()),
    );
    Ok(Some(created))
}

/// Re-applies the recorded template, optionally answering its questions again.
fn update_project(session: &Session, manager: &TemplateManager, palette: &Palette) -> Result<()> {
    let prompter = session.prompter();
    let store = ConfigStore::open(&session.project_dir)?;
    let Some(record) = store.template_record() else {
        return Ok(());
    };

    let recorded = template_schema::answers_from_toml(&record.variables);
    let answers = if prompter.confirm(t!("create.update.ask_reanswer"), false)? {
        let schema = manager.load_schema(&record.name)?;
        let mut seed = Answers::new();
        if let Some(name) = recorded.get("project_name") {
            seed.insert("project_name".to_string(), name.clone());
        }
        commons::ask_template_questions(prompter, &schema, seed)?
    } else {
        Answers::new()
    };

    manager.update_project(&session.project_dir, &answers)?;
    menu::print_success(
        palette,
        &format!(t!("create.update.done"), name = record.name),
    );
    Ok(())
}
