// src/core/template_schema.rs

use crate::constants::TEMPLATE_SCHEMA_FILES;
use crate::core::expression;
use crate::models::ProjectKind;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Answers to a template's questions, keyed by variable name.
pub type Answers = BTreeMap<String, Value>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No copier.yml or copier.yaml found in '{0}'.")]
    Missing(String),
    #[error("Could not read template schema '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Template schema '{path}' is not valid YAML: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Template schema '{0}' must be a mapping of settings and questions.")]
    NotAMapping(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    Str,
    Int,
    Float,
    Bool,
    Yaml,
}

impl QuestionType {
    fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "int" | "integer" => Self::Int,
            "float" | "number" => Self::Float,
            "bool" | "boolean" => Self::Bool,
            "yaml" | "json" => Self::Yaml,
            _ => Self::Str,
        }
    }

    fn infer(default: Option<&Value>) -> Self {
        match default {
            Some(Value::Bool(_)) => Self::Bool,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Self::Int,
            Some(Value::Number(_)) => Self::Float,
            _ => Self::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub name: String,
    pub kind: QuestionType,
    pub help: Option<String>,
    pub default: Option<Value>,
    pub choices: Vec<Choice>,
    pub when: Option<Value>,
}

impl Question {
    fn from_entry(name: &str, entry: &Value) -> Self {
        let Value::Mapping(spec) = entry else {
            // `name: default` shorthand.
            return Self {
                name: name.to_string(),
                kind: QuestionType::infer(Some(entry)),
                help: None,
                default: Some(entry.clone()),
                choices: Vec::new(),
                when: None,
            };
        };

        let default = spec.get("default").cloned();
        let kind = spec
            .get("type")
            .and_then(Value::as_str)
            .map(QuestionType::from_label)
            .unwrap_or_else(|| QuestionType::infer(default.as_ref()));

        Self {
            name: name.to_string(),
            kind,
            help: spec.get("help").and_then(Value::as_str).map(str::to_string),
            default,
            choices: spec.get("choices").map(parse_choices).unwrap_or_default(),
            when: spec.get("when").cloned(),
        }
    }

    /// The prompt text: the help string, or the variable name.
    pub fn prompt(&self) -> &str {
        self.help.as_deref().unwrap_or(&self.name)
    }

    /// The default with any `{{ ... }}` resolved against earlier answers.
    pub fn resolved_default(&self, answers: &Answers) -> Value {
        match &self.default {
            Some(default) => self
                .coerce(&expression::resolve_default(default, answers))
                .unwrap_or_else(|| expression::resolve_default(default, answers)),
            None => match self.kind {
                QuestionType::Bool => Value::Bool(false),
                _ => self
                    .choices
                    .first()
                    .map(|c| c.value.clone())
                    .unwrap_or_else(|| Value::String(String::new())),
            },
        }
    }

    /// Whether the question applies given the answers collected so far.
    pub fn is_visible(&self, answers: &Answers) -> bool {
        self.when
            .as_ref()
            .is_none_or(|when| expression::condition_holds(when, answers))
    }

    /// Converts a raw answer to this question's type. `None` when it cannot be converted.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self.kind {
            QuestionType::Str => match value {
                Value::Null => None,
                Value::String(_) => Some(value.clone()),
                other => Some(Value::String(expression::to_display(other))),
            },
            QuestionType::Int => match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
                Value::Number(n) => n.to_string().parse::<i64>().ok().map(Value::from),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            QuestionType::Float => match value {
                Value::Number(n) => n.as_f64().map(Value::from),
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::from),
                _ => None,
            },
            QuestionType::Bool => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::Number(n) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
                Value::String(s) => parse_bool(s).map(Value::Bool),
                _ => None,
            },
            QuestionType::Yaml => match value {
                Value::String(s) => serde_yaml::from_str(s).ok(),
                other => Some(other.clone()),
            },
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        self.choices.is_empty()
            || self
                .choices
                .iter()
                .any(|choice| expression::to_display(&choice.value) == expression::to_display(value))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn parse_choices(raw: &Value) -> Vec<Choice> {
    match raw {
        Value::Sequence(items) => items
            .iter()
            .map(|item| Choice {
                label: expression::to_display(item),
                value: item.clone(),
            })
            .collect(),
        Value::Mapping(map) => map
            .iter()
            .map(|(label, value)| Choice {
                label: expression::to_display(label),
                value: value.clone(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// A template's declarative description: settings plus its ordered questions.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSchema {
    pub version: String,
    pub description: String,
    pub project_kind: Option<ProjectKind>,
    pub questions: Vec<Question>,
}

impl TemplateSchema {
    /// Returns the schema file of a template directory, if it has one.
    pub fn find_file(template_dir: &Path) -> Option<PathBuf> {
        TEMPLATE_SCHEMA_FILES
            .iter()
            .map(|name| template_dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn load(template_dir: &Path) -> Result<Self, SchemaError> {
        let path = Self::find_file(template_dir)
            .ok_or_else(|| SchemaError::Missing(template_dir.display().to_string()))?;
        let content = fs::read_to_string(&path).map_err(|e| SchemaError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn parse(content: &str, origin: &str) -> Result<Self, SchemaError> {
        let root: Value = serde_yaml::from_str(content).map_err(|e| SchemaError::Parse {
            path: origin.to_string(),
            source: e,
        })?;
        let map: Mapping = match root {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err(SchemaError::NotAMapping(origin.to_string())),
        };

        let setting = |key: &str| map.get(key).map(expression::to_display);
        let questions = map
            .iter()
            .filter_map(|(key, entry)| {
                let name = key.as_str()?;
                (!name.starts_with('_')).then(|| Question::from_entry(name, entry))
            })
            .collect();

        Ok(Self {
            version: setting("_version").unwrap_or_else(|| "0.1.0".to_string()),
            description: setting("_description").unwrap_or_default(),
            project_kind: setting("_project_type")
                .as_deref()
                .and_then(ProjectKind::from_label),
            questions,
        })
    }

    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.name == name)
    }

    /// Completes `provided` into a full answer set: missing answers take their default,
    /// values are converted to the question's type, and anything outside a question's
    /// choices falls back to the default. Keys without a question are passed through.
    pub fn process_variables(&self, provided: &Answers) -> Answers {
        let mut answers = provided.clone();
        for question in &self.questions {
            let default = question.resolved_default(&answers);
            let value = match provided.get(&question.name) {
                Some(raw) => match question.coerce(raw) {
                    Some(value) if question.accepts(&value) => value,
                    Some(value) => {
                        log::warn!(
                            "'{}' is not a valid choice for '{}'; using the default.",
                            expression::to_display(&value),
                            question.name
                        );
                        default
                    }
                    None => default,
                },
                None => default,
            };
            answers.insert(question.name.clone(), value);
        }
        answers
    }
}

// --- Conversions between template answers and the TOML configuration ---

pub fn yaml_to_toml(value: &Value) -> Option<toml::Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(toml::Value::Boolean(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(toml::Value::Integer)
            .or_else(|| n.as_f64().map(toml::Value::Float)),
        Value::String(s) => Some(toml::Value::String(s.clone())),
        Value::Sequence(items) => Some(toml::Value::Array(
            items.iter().filter_map(yaml_to_toml).collect(),
        )),
        Value::Mapping(map) => Some(toml::Value::Table(
            map.iter()
                .filter_map(|(k, v)| Some((expression::to_display(k), yaml_to_toml(v)?)))
                .collect(),
        )),
        Value::Tagged(tagged) => yaml_to_toml(&tagged.value),
    }
}

pub fn toml_to_yaml(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => Value::from(*f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.iter().map(toml_to_yaml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), toml_to_yaml(v)))
                .collect(),
        ),
    }
}

pub fn answers_to_toml(answers: &Answers) -> BTreeMap<String, toml::Value> {
    answers
        .iter()
        .filter_map(|(k, v)| Some((k.clone(), yaml_to_toml(v)?)))
        .collect()
}

pub fn answers_from_toml(variables: &BTreeMap<String, toml::Value>) -> Answers {
    variables
        .iter()
        .map(|(k, v)| (k.clone(), toml_to_yaml(v)))
        .collect()
}
