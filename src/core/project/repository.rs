// src/core/project/repository.rs

use crate::constants::GIT_DIR;
use crate::core::project::extended::{choose_hook_action, choose_test_mode};
use crate::core::project::{
    ProjectContext, ProjectError, ProjectResult, ProjectType, ensure_supported, operations,
};
use crate::core::template_schema::Answers;
use crate::models::{Operation, OperationDefinition, ProjectKind};
use crate::system::executor::OutputMode;
use crate::system::prompt::Prompter;
use colored::*;
use serde_yaml::Value;
use std::path::PathBuf;

static REPOSITORY_OPERATIONS: &[OperationDefinition] = &[
    OperationDefinition {
        operation: Operation::Install,
        name: "Install",
        description: "Install the project with its development extras",
        icon: "📦",
    },
    OperationDefinition {
        operation: Operation::Test,
        name: "Test",
        description: "Run all tests, only the failed ones, or with coverage",
        icon: "🧪",
    },
    OperationDefinition {
        operation: Operation::Build,
        name: "Build",
        description: "Build sdist and wheel into dist/",
        icon: "🔨",
    },
    OperationDefinition {
        operation: Operation::Prehook,
        name: "Pre-commit",
        description: "Enable, disable or run the pre-commit hooks",
        icon: "🪝",
    },
    OperationDefinition {
        operation: Operation::Clone,
        name: "Clone",
        description: "Clone a repository here, optionally applying a template",
        icon: "📥",
    },
    OperationDefinition {
        operation: Operation::Pull,
        name: "Pull",
        description: "Pull the latest changes",
        icon: "⬇️",
    },
    OperationDefinition {
        operation: Operation::Push,
        name: "Push",
        description: "Commit every change and push it",
        icon: "⬆️",
    },
    OperationDefinition {
        operation: Operation::Clean,
        name: "Clean",
        description: "Remove build/, dist/ and *.egg-info",
        icon: "🧹",
    },
    OperationDefinition {
        operation: Operation::Help,
        name: "Help",
        description: "Describe the available operations",
        icon: "❓",
    },
];

/// The directory a clone of `url` lands in: the last path segment without `.git`.
pub fn repository_name(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// A project under git: development tooling plus clone, pull and push.
#[derive(Debug)]
pub struct RepositoryProject {
    context: ProjectContext,
}

impl RepositoryProject {
    pub fn new(context: ProjectContext) -> Self {
        Self { context }
    }

    fn require_repository(&self) -> ProjectResult<()> {
        let root = self.context.root();
        if root.join(GIT_DIR).is_dir() {
            Ok(())
        } else {
            Err(ProjectError::NotARepository {
                path: root.display().to_string(),
            })
        }
    }

    /// Clones `url` into `<root>/<name>` and, when asked, renders `template` over it.
    pub fn clone_repository(&self, url: &str, template: Option<&str>) -> ProjectResult<PathBuf> {
        let name = repository_name(url)
            .ok_or_else(|| ProjectError::InvalidRepositoryUrl(url.to_string()))?;
        let target = self.context.root().join(&name);
        let target_str = target.to_string_lossy().into_owned();

        // git may ask for credentials.
        self.context
            .run_with(OutputMode::Stream, "git", ["clone", url.trim(), target_str.as_str()])?;

        if let Some(template) = template {
            let manager = self.context.templates().ok_or_else(|| {
                crate::core::template_manager::TemplateError::NotFound {
                    name: template.to_string(),
                    dir: String::new(),
                }
            })?;
            let mut answers = Answers::new();
            answers.insert("project_name".to_string(), Value::from(name.clone()));
            manager.apply_template(template, &target, &answers)?;
        }
        println!(
            "{} {}",
            "✓".green(),
            format!(t!("project.clone.done"), path = target.display())
        );
        Ok(target)
    }

    pub fn pull(&self) -> ProjectResult<()> {
        self.require_repository()?;
        self.context.run_with(OutputMode::Stream, "git", ["pull"])?;
        Ok(())
    }

    /// Commits everything with `message` and pushes. A clean tree is not an error.
    pub fn push(&self, message: &str) -> ProjectResult<()> {
        self.require_repository()?;
        if !self.has_changes()? {
            println!("{}", t!("project.push.no_changes").yellow());
            return Ok(());
        }
        self.commit_and_push(message)
    }

    fn has_changes(&self) -> ProjectResult<bool> {
        let status = self
            .context
            .run_with(OutputMode::Silent, "git", ["status", "--porcelain"])?;
        Ok(!status.stdout.trim().is_empty())
    }

    fn commit_and_push(&self, message: &str) -> ProjectResult<()> {
        let ctx = &self.context;
        ctx.run("git", ["add", "."])?;
        ctx.run("git", ["commit", "-m", message])?;
        ctx.run_with(OutputMode::Stream, "git", ["push"])?;
        println!("{} {}", "✓".green(), t!("project.push.done"));
        Ok(())
    }

    fn clone_interactive(&self, prompter: &dyn Prompter) -> ProjectResult<()> {
        let url = prompter.input(t!("project.clone.ask_url"), None)?;
        if url.is_empty() {
            return Err(ProjectError::Cancelled);
        }

        let templates = self
            .context
            .templates()
            .map(|manager| manager.list_templates())
            .unwrap_or_default();
        let template = if templates.is_empty() {
            None
        } else {
            let mut items = vec![t!("project.clone.no_template").to_string()];
            items.extend(templates.iter().map(|t| t.name.clone()));
            match prompter.select(t!("project.clone.choose_template"), &items, 0)? {
                Some(0) | None => None,
                Some(i) => templates.get(i - 1).map(|t| t.name.as_str()),
            }
        };
        self.clone_repository(&url, template).map(|_| ())
    }

    fn push_interactive(&self, prompter: &dyn Prompter) -> ProjectResult<()> {
        self.require_repository()?;
        if !self.has_changes()? {
            println!("{}", t!("project.push.no_changes").yellow());
            return Ok(());
        }
        let message = prompter.input(t!("project.push.ask_message"), Some("Update"))?;
        if message.is_empty() {
            return Err(ProjectError::Cancelled);
        }
        self.commit_and_push(&message)
    }
}

impl ProjectType for RepositoryProject {
    fn kind(&self) -> ProjectKind {
        ProjectKind::Repository
    }

    fn context(&self) -> &ProjectContext {
        &self.context
    }

    fn operations(&self) -> &'static [OperationDefinition] {
        REPOSITORY_OPERATIONS
    }

    fn perform(&self, operation: Operation, prompter: &dyn Prompter) -> ProjectResult<()> {
        ensure_supported(self, operation)?;
        match operation {
            Operation::Install => self.install(),
            Operation::Test => match choose_test_mode(prompter)? {
                Some(mode) => operations::run_tests(&self.context, mode),
                None => Ok(()),
            },
            Operation::Build => operations::build(&self.context),
            Operation::Prehook => match choose_hook_action(prompter)? {
                Some(action) => operations::toggle_prehook(&self.context, action),
                None => Ok(()),
            },
            Operation::Clone => self.clone_interactive(prompter),
            Operation::Pull => self.pull(),
            Operation::Push => self.push_interactive(prompter),
            Operation::Clean => self.clean(),
            _ => self.help(),
        }
    }

    fn install(&self) -> ProjectResult<()> {
        operations::install_editable(&self.context, Some("dev"))
    }
}
