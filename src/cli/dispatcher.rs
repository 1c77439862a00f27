use anyhow::{Context, Result};
use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    cli::{Cli, handlers},
    core::{
        config_store::ConfigStore, paths, project::ProjectContext, style::Palette,
        template_manager::TemplateManager,
    },
    system::{
        executor::{CommandRunner, ProcessRunner},
        prompt::{DialoguerPrompter, Prompter},
    },
};

/// Everything a handler needs for one invocation of the tool.
pub struct Session {
    pub project_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub runner: Rc<dyn CommandRunner>,
    pub prompter: Rc<dyn Prompter>,
}

impl Session {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_dir = paths::resolve_project_dir(&cli.directory)?;
        let templates_dir = paths::resolve_templates_dir(cli.templates.as_deref())?;
        Ok(Self {
            project_dir,
            templates_dir,
            runner: Rc::new(ProcessRunner),
            prompter: Rc::new(DialoguerPrompter),
        })
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    pub fn template_manager(&self) -> TemplateManager {
        TemplateManager::new(self.templates_dir.clone(), self.runner.clone())
    }

    /// The palette of the project in `dir`, or the default one.
    pub fn palette_for(&self, dir: &std::path::Path) -> Palette {
        ConfigStore::open(dir)
            .map(|store| Palette::from_config(&store.styling()))
            .unwrap_or_default()
    }

    pub fn palette(&self) -> Palette {
        self.palette_for(&self.project_dir)
    }

    /// Opens the project in `dir` with this session's runner and templates.
    pub fn project_context(&self, dir: &std::path::Path) -> Result<ProjectContext> {
        let context = ProjectContext::open(dir, self.runner.clone())
            .with_context(|| format!("Could not open project at '{}'", dir.display()))?;
        Ok(context.with_templates(self.template_manager()))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project_dir", &self.project_dir)
            .field("templates_dir", &self.templates_dir)
            .finish()
    }
}

/// Defines a top-level action and its handler.
struct ActionDefinition {
    name: &'static str,
    handler: fn(&Session) -> Result<()>,
}

/// The single source of truth for the actions the command line can select.
static ACTION_REGISTRY: &[ActionDefinition] = &[
    ActionDefinition {
        name: "create",
        handler: handlers::create::handle,
    },
    ActionDefinition {
        name: "env",
        handler: handlers::environment::handle,
    },
    ActionDefinition {
        name: "operate",
        handler: handlers::operate::handle,
    },
    ActionDefinition {
        name: "restore",
        handler: handlers::restore::handle,
    },
];

fn find_action(name: &str) -> Option<&'static ActionDefinition> {
    ACTION_REGISTRY.iter().find(|action| action.name == name)
}

/// Routes parsed arguments to their handler.
pub fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    if cli.version {
        println!("cicd, version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let session = Session::from_cli(&cli)?;
    let action_name = cli.action_name();
    let action = find_action(action_name)
        .ok_or_else(|| anyhow::anyhow!("Unknown action '{}'", action_name))?;
    log::debug!(
        "Dispatching '{}' for '{}'",
        action.name,
        session.project_dir.display()
    );
    (action.handler)(&session)
}
