// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// --- CONFIGURATION SECTIONS (`.app_cache/config.toml`) ---

/// `[execution]`: how external commands are presented to the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Buffer command output behind a spinner instead of streaming it.
    pub capture_output: bool,
    /// Print the whole error chain when an operation fails.
    pub stack_trace: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            capture_output: true,
            stack_trace: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleHandlerConfig {
    pub enabled: bool,
    pub level: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileHandlerConfig {
    pub enabled: bool,
    pub level: String,
    pub filename: String,
    pub max_bytes: u64,
    pub backup_count: u32,
}

/// `[logging]`: shared by the tool and by the logging bootstrap of generated projects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub console: ConsoleHandlerConfig,
    pub file: FileHandlerConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: "%(asctime)s - %(name)s - %(levelname)s - %(message)s".to_string(),
            console: ConsoleHandlerConfig {
                enabled: true,
                level: "INFO".to_string(),
            },
            file: FileHandlerConfig {
                enabled: false,
                level: "DEBUG".to_string(),
                filename: "cicd.log".to_string(),
                max_bytes: 1_048_576,
                backup_count: 3,
            },
        }
    }
}

/// `[styling]`: named colors used when rendering menus and messages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StylingConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub info: String,
}

impl Default for StylingConfig {
    fn default() -> Self {
        Self {
            primary: "blue".to_string(),
            secondary: "cyan".to_string(),
            success: "green".to_string(),
            warning: "yellow".to_string(),
            error: "red".to_string(),
            info: "white".to_string(),
        }
    }
}

/// The sections every configuration file starts with.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultConfig {
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
    pub styling: StylingConfig,
}

/// Whether a project runs in the host interpreter or in its own virtual environment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Current,
    Virtual,
}

/// `[environment]`: present only once the user has chosen an environment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    #[serde(rename = "type")]
    pub kind: EnvironmentKind,
    /// Root of the virtual environment. Empty for the host interpreter.
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub name: String,
}

/// `[template]`: which template produced the project, used by updates and detection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProjectKind>,
    #[serde(default)]
    pub variables: BTreeMap<String, toml::Value>,
}

// --- PROJECT MODELS ---

/// The behavioral category of a project directory.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Minimal,
    Extended,
    Repository,
}

impl ProjectKind {
    /// Maps the names of the bundled templates to the variant they produce.
    pub fn from_template_name(name: &str) -> Option<Self> {
        match name {
            "simple_project" => Some(Self::Minimal),
            "development_project" => Some(Self::Extended),
            "github_project" => Some(Self::Repository),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "minimal" | "simple" => Some(Self::Minimal),
            "extended" | "development" => Some(Self::Extended),
            "repository" | "github" => Some(Self::Repository),
            _ => None,
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Minimal => "minimal",
            Self::Extended => "extended",
            Self::Repository => "repository",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    Beta,
    Prod,
}

impl ReleaseKind {
    /// Sub-directory of `dist/` that receives the artifacts of this release kind.
    pub fn dist_subdir(self) -> &'static str {
        match self {
            Self::Beta => crate::constants::BETA_DIST_SUBDIR,
            Self::Prod => crate::constants::RELEASE_DIST_SUBDIR,
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beta => "beta",
            Self::Prod => "prod",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    Patch,
    Minor,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestMode {
    All,
    FailedOnly,
    Coverage,
}

impl TestMode {
    pub fn pytest_args(self) -> &'static [&'static str] {
        match self {
            Self::All => &[],
            Self::FailedOnly => &["--last-failed"],
            Self::Coverage => &["--cov"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Enable,
    Disable,
    Run,
}

/// Every operation a project variant can expose in its menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Install,
    Test,
    Build,
    Prehook,
    Release,
    Deploy,
    Clone,
    Pull,
    Push,
    Clean,
    Help,
}

/// A row of a variant's operation registry.
#[derive(Debug)]
pub struct OperationDefinition {
    pub operation: Operation,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// A template as shown by `list_templates`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub name: String,
    pub description: String,
}
