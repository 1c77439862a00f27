//! # Template Manager
//!
//! Lists the templates available on this machine and renders them through the external
//! `copier` engine. The manager never interprets template files itself; it prepares the
//! answers, hands them to the engine, and records which template produced a project so
//! that it can be re-applied later.

use crate::core::config_store::{ConfigError, ConfigStore};
use crate::core::template_schema::{self, Answers, SchemaError, TemplateSchema};
use crate::models::{ProjectKind, TemplateRecord, TemplateSummary};
use crate::system::executor::{CommandRunner, ExecutionError, Invocation, OutputMode};
use chrono::Datelike;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use walkdir::WalkDir;

const ENGINE: &str = "copier";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{name}' not found in '{dir}'.")]
    NotFound { name: String, dir: String },
    #[error("Destination '{path}' already exists and is not empty.")]
    DestinationNotEmpty { path: String },
    #[error("'{path}' has no template record; there is nothing to update.")]
    NoTemplateRecord { path: String },
    #[error("The template engine 'copier' is not installed ({source}). Install it with 'pipx install copier'.")]
    EngineMissing {
        #[source]
        source: ExecutionError,
    },
    #[error("Template engine failed: {0}")]
    Engine(#[source] ExecutionError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ExecutionError> for TemplateError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::Spawn { .. } => Self::EngineMissing { source: error },
            other => Self::Engine(other),
        }
    }
}

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug, Clone)]
pub struct TemplateManager {
    templates_dir: PathBuf,
    runner: Rc<dyn CommandRunner>,
}

impl TemplateManager {
    pub fn new(templates_dir: PathBuf, runner: Rc<dyn CommandRunner>) -> Self {
        Self {
            templates_dir,
            runner,
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Every template directory, sorted by name, with its `_description`.
    /// A missing templates directory yields an empty list.
    pub fn list_templates(&self) -> Vec<TemplateSummary> {
        if !self.templates_dir.is_dir() {
            log::debug!(
                "Templates directory '{}' does not exist",
                self.templates_dir.display()
            );
            return Vec::new();
        }

        WalkDir::new(&self.templates_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                if name.starts_with('.') {
                    return None;
                }
                TemplateSchema::find_file(entry.path())?;
                let description = match TemplateSchema::load(entry.path()) {
                    Ok(schema) => schema.description,
                    Err(e) => {
                        log::warn!("Template '{}' has an unreadable schema: {}", name, e);
                        String::new()
                    }
                };
                Some(TemplateSummary { name, description })
            })
            .collect()
    }

    /// Resolves a template name to its directory.
    pub fn template_path(&self, name: &str) -> TemplateResult<PathBuf> {
        let path = self.templates_dir.join(name);
        if TemplateSchema::find_file(&path).is_some() {
            Ok(path)
        } else {
            Err(TemplateError::NotFound {
                name: name.to_string(),
                dir: self.templates_dir.display().to_string(),
            })
        }
    }

    pub fn load_schema(&self, name: &str) -> TemplateResult<TemplateSchema> {
        Ok(TemplateSchema::load(&self.template_path(name)?)?)
    }

    /// Renders `template_name` into `destination`, which must be missing or empty.
    ///
    /// On success the destination carries a default configuration plus the template
    /// record. A failing engine leaves whatever it produced in place.
    pub fn create_project(
        &self,
        template_name: &str,
        destination: &Path,
        variables: &Answers,
    ) -> TemplateResult<PathBuf> {
        let source = self.template_path(template_name)?;
        if !is_empty_or_missing(destination) {
            return Err(TemplateError::DestinationNotEmpty {
                path: destination.display().to_string(),
            });
        }

        let schema = TemplateSchema::load(&source)?;
        let answers = prepare_answers(&schema, variables);
        self.render(&source, destination, &answers, OutputMode::Progress)?;
        self.record(destination, template_name, &schema, &answers)?;

        log::debug!(
            "Project created from '{}' at '{}'",
            template_name,
            destination.display()
        );
        Ok(destination.to_path_buf())
    }

    /// Renders a template over an existing directory, e.g. a freshly cloned repository.
    /// The engine asks about conflicting files itself.
    pub fn apply_template(
        &self,
        template_name: &str,
        project_path: &Path,
        variables: &Answers,
    ) -> TemplateResult<()> {
        let source = self.template_path(template_name)?;
        let schema = TemplateSchema::load(&source)?;
        let answers = prepare_answers(&schema, variables);
        self.render(&source, project_path, &answers, OutputMode::Stream)?;
        self.record(project_path, template_name, &schema, &answers)
    }

    /// Re-applies the template recorded for `project_path`. Recorded answers are reused
    /// unless `variables` overrides them.
    pub fn update_project(&self, project_path: &Path, variables: &Answers) -> TemplateResult<()> {
        let store = ConfigStore::open(project_path)?;
        let record = store
            .template_record()
            .ok_or_else(|| TemplateError::NoTemplateRecord {
                path: project_path.display().to_string(),
            })?;

        let mut merged = template_schema::answers_from_toml(&record.variables);
        merged.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.apply_template(&record.name, project_path, &merged)
    }

    fn render(
        &self,
        source: &Path,
        destination: &Path,
        answers: &Answers,
        mode: OutputMode,
    ) -> TemplateResult<()> {
        let mut args = vec![
            "copy".to_string(),
            "--trust".to_string(),
            "--defaults".to_string(),
        ];
        for (key, value) in answers {
            args.push("--data".to_string());
            args.push(format!("{}={}", key, data_value(value)));
        }
        args.push(source.to_string_lossy().into_owned());
        args.push(destination.to_string_lossy().into_owned());

        self.runner.run(&Invocation::new(ENGINE, args).mode(mode))?;
        Ok(())
    }

    fn record(
        &self,
        project_path: &Path,
        template_name: &str,
        schema: &TemplateSchema,
        answers: &Answers,
    ) -> TemplateResult<()> {
        let mut store = ConfigStore::open(project_path)?;
        let mut variables = answers.clone();
        variables.remove("current_year");

        store.set_template_record(&TemplateRecord {
            name: template_name.to_string(),
            version: schema.version.clone(),
            kind: schema
                .project_kind
                .or_else(|| ProjectKind::from_template_name(template_name)),
            variables: template_schema::answers_to_toml(&variables),
        })?;
        Ok(())
    }
}

fn is_empty_or_missing(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(_) => false,
    }
}

fn prepare_answers(schema: &TemplateSchema, variables: &Answers) -> Answers {
    let mut provided = variables.clone();
    provided
        .entry("current_year".to_string())
        .or_insert_with(|| Value::from(i64::from(chrono::Local::now().year())));
    schema.process_variables(&provided)
}

/// Formats an answer for `--data key=value`; the engine parses the right-hand side as YAML.
fn data_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
