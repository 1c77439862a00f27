// src/core/paths.rs

use crate::constants::{
    APP_CACHE_DIR, CONFIG_FILENAME, TEMPLATES_CONFIG_SUBDIR, TEMPLATES_ENV_VAR,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
    #[error("Directory '{path}' does not exist or is not accessible: {source}")]
    Inaccessible {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the `.app_cache` directory of a project.
pub fn app_cache_dir(project_root: &Path) -> PathBuf {
    project_root.join(APP_CACHE_DIR)
}

/// Returns the path of the project's configuration file.
pub fn config_path(project_root: &Path) -> PathBuf {
    app_cache_dir(project_root).join(CONFIG_FILENAME)
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_user_path(raw: &Path) -> Result<PathBuf, PathError> {
    let raw_str = raw.to_string_lossy();
    let expanded = shellexpand::full(&raw_str).map_err(|e| PathError::Expansion {
        path: raw_str.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Resolves the `--directory` argument into an absolute, simplified path.
/// The directory must exist.
pub fn resolve_project_dir(raw: &Path) -> Result<PathBuf, PathError> {
    let expanded = expand_user_path(raw)?;
    let canonical = dunce::canonicalize(&expanded).map_err(|e| PathError::Inaccessible {
        path: expanded.display().to_string(),
        source: e,
    })?;
    log::debug!("Project directory resolved to '{}'", canonical.display());
    Ok(canonical)
}

/// Determines where templates are looked up.
///
/// Priority: an explicit path (CLI flag), then the `CICD_TOOLS_TEMPLATES`
/// environment variable, then `<config dir>/cicd-tools/templates`.
pub fn resolve_templates_dir(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    if let Some(path) = explicit {
        return expand_user_path(path);
    }
    if let Ok(from_env) = std::env::var(TEMPLATES_ENV_VAR) {
        if !from_env.trim().is_empty() {
            return expand_user_path(Path::new(&from_env));
        }
    }
    let config_dir = dirs::config_dir().ok_or(PathError::ConfigDirNotFound)?;
    Ok(config_dir.join(TEMPLATES_CONFIG_SUBDIR).join("templates"))
}
