// src/core/project/mod.rs

//! # Project Variants
//!
//! A project directory is operated through one of three variants. Each variant owns an
//! ordered registry of `OperationDefinition`s; the menu is built from that registry, so the
//! order shown to the user is the order declared here.
//!
//! - **`minimal`**: install, test, build and clean.
//! - **`extended`**: adds pre-commit hooks, versioned releases and deployment.
//! - **`repository`**: adds git clone, pull and push on top of the development tooling.

pub mod context;
pub mod extended;
pub mod minimal;
pub mod operations;
pub mod repository;

pub use context::ProjectContext;

use crate::core::config_store::ConfigError;
use crate::core::template_manager::TemplateError;
use crate::core::versioning::VersionError;
use crate::models::{Operation, OperationDefinition, ProjectKind, ReleaseKind};
use crate::system::environment::EnvironmentError;
use crate::system::executor::ExecutionError;
use crate::system::prompt::{PromptError, Prompter};
use colored::*;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Environment(#[from] EnvironmentError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("No {release} artifacts found in '{path}'. Run a {release} release first.")]
    ArtifactsMissing { path: String, release: ReleaseKind },
    #[error("'{path}' is not a git repository.")]
    NotARepository { path: String },
    #[error("Operation '{operation:?}' is not available for {kind} projects.")]
    UnsupportedOperation { operation: Operation, kind: ProjectKind },
    #[error("Cannot derive a directory name from repository URL '{0}'.")]
    InvalidRepositoryUrl(String),
    #[error("'{0}' is not a valid environment name.")]
    InvalidEnvironmentName(String),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Operation cancelled.")]
    Cancelled,
}

pub type ProjectResult<T> = Result<T, ProjectError>;

type ActionCallback<'a> = Box<dyn Fn(&dyn Prompter) -> ProjectResult<()> + 'a>;

/// One entry of a variant's menu, bound to the project that produced it.
pub struct MenuAction<'a> {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub owner: ProjectKind,
    pub operation: Operation,
    callback: ActionCallback<'a>,
}

impl MenuAction<'_> {
    pub fn label(&self) -> String {
        format!("{} {}", self.icon, self.name)
    }

    pub fn execute(&self, prompter: &dyn Prompter) -> ProjectResult<()> {
        (self.callback)(prompter)
    }
}

impl fmt::Debug for MenuAction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuAction")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("operation", &self.operation)
            .finish()
    }
}

/// The contract every project variant fulfils.
pub trait ProjectType {
    fn kind(&self) -> ProjectKind;

    fn context(&self) -> &ProjectContext;

    /// The variant's operation registry, in menu order.
    fn operations(&self) -> &'static [OperationDefinition];

    /// Runs one operation, asking `prompter` for whatever it needs.
    fn perform(&self, operation: Operation, prompter: &dyn Prompter) -> ProjectResult<()>;

    fn install(&self) -> ProjectResult<()>;

    fn test(&self) -> ProjectResult<()> {
        operations::run_tests(self.context(), crate::models::TestMode::All)
    }

    fn clean(&self) -> ProjectResult<()> {
        operations::clean(self.context())
    }

    fn supports(&self, operation: Operation) -> bool {
        self.operations().iter().any(|def| def.operation == operation)
    }

    fn get_menu_actions(&self) -> Vec<MenuAction<'_>> {
        let owner = self.kind();
        self.operations()
            .iter()
            .map(|def| {
                let operation = def.operation;
                MenuAction {
                    name: def.name,
                    description: def.description,
                    icon: def.icon,
                    owner,
                    operation,
                    callback: Box::new(move |prompter: &dyn Prompter| {
                        self.perform(operation, prompter)
                    }),
                }
            })
            .collect()
    }

    fn help(&self) -> ProjectResult<()> {
        println!(
            "\n{}",
            format!(t!("project.help.header"), kind = self.kind()).bold()
        );
        for def in self.operations() {
            println!("  {} {:<12} {}", def.icon, def.name.cyan(), def.description);
        }
        println!();
        Ok(())
    }
}

/// Rejects operations that are not part of `project`'s registry.
pub(crate) fn ensure_supported(project: &dyn ProjectType, operation: Operation) -> ProjectResult<()> {
    if project.supports(operation) {
        Ok(())
    } else {
        Err(ProjectError::UnsupportedOperation {
            operation,
            kind: project.kind(),
        })
    }
}

/// Instantiates the variant for `kind`.
pub fn build_project(kind: ProjectKind, context: ProjectContext) -> Box<dyn ProjectType> {
    match kind {
        ProjectKind::Minimal => Box::new(minimal::MinimalProject::new(context)),
        ProjectKind::Extended => Box::new(extended::ExtendedProject::new(context)),
        ProjectKind::Repository => Box::new(repository::RepositoryProject::new(context)),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::system::environment::Environment;
    use crate::system::testing::RecordingRunner;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// A context whose environment is a (simulated) virtual environment under `root`.
    pub fn context_with_venv(root: &Path, runner: Rc<RecordingRunner>) -> ProjectContext {
        let ctx = ProjectContext::open(root, runner)
            .expect("open context")
            .with_host(Environment::from_interpreter(PathBuf::from("/usr/bin/python3")));
        ctx.create_virtual_environment(".venv").expect("venv");
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::RecordingRunner;
    use std::rc::Rc;

    const KINDS: [ProjectKind; 3] = [
        ProjectKind::Minimal,
        ProjectKind::Extended,
        ProjectKind::Repository,
    ];

    #[test]
    fn every_variant_owns_its_menu_actions() {
        for kind in KINDS {
            let tmp = tempfile::tempdir().expect("tempdir");
            let ctx = fixtures::context_with_venv(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
            let project = build_project(kind, ctx);

            let actions = project.get_menu_actions();

            assert!(!actions.is_empty());
            assert!(actions.iter().all(|a| a.owner == kind));
            let names: Vec<_> = actions.iter().map(|a| a.name).collect();
            let registry: Vec<_> = project.operations().iter().map(|d| d.name).collect();
            assert_eq!(names, registry);
        }
    }

    #[test]
    fn minimal_menu_is_exactly_the_base_contract() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = fixtures::context_with_venv(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
        let project = build_project(ProjectKind::Minimal, ctx);

        let names: Vec<_> = project.get_menu_actions().iter().map(|a| a.name).collect();

        assert_eq!(names, ["Install", "Test", "Build", "Clean", "Help"]);
    }

    #[test]
    fn unsupported_operations_are_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = fixtures::context_with_venv(tmp.path(), runner.clone());
        let project = build_project(ProjectKind::Minimal, ctx);
        let prompter = crate::system::prompt::scripted::ScriptedPrompter::new([]);
        let before = runner.calls().len();

        let err = project
            .perform(Operation::Deploy, &prompter)
            .expect_err("minimal projects do not deploy");

        assert!(matches!(err, ProjectError::UnsupportedOperation { .. }));
        assert_eq!(runner.calls().len(), before);
    }

    #[test]
    fn menu_action_runs_the_bound_operation() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = fixtures::context_with_venv(tmp.path(), runner.clone());
        let project = build_project(ProjectKind::Minimal, ctx);
        let prompter = crate::system::prompt::scripted::ScriptedPrompter::new([]);

        let actions = project.get_menu_actions();
        let test = actions
            .iter()
            .find(|a| a.operation == Operation::Test)
            .expect("test action");
        test.execute(&prompter).expect("run tests");

        assert!(runner.ran("python", &["-m", "pytest"]));
    }
}
