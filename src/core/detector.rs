// src/core/detector.rs

use crate::constants::{
    GIT_DIR, GITHUB_DIR, PRE_COMMIT_CONFIG_FILENAME, PYPROJECT_FILENAME, SETUP_PY_FILENAME,
};
use crate::core::config_store::ConfigStore;
use crate::models::ProjectKind;
use std::path::Path;

/// Decides which project variant applies to `project_path`.
///
/// The template record written at creation time wins; otherwise the directory layout
/// decides. Never writes and never fails: anything unreadable counts as absent.
pub fn detect(project_path: &Path) -> Option<ProjectKind> {
    if let Some(kind) = detect_from_config(project_path) {
        log::debug!("Project kind '{}' taken from configuration", kind);
        return Some(kind);
    }
    let kind = detect_from_layout(project_path);
    log::debug!("Project kind detected from layout: {:?}", kind);
    kind
}

/// Whether `path` holds something this tool can operate on.
pub fn is_project_directory(path: &Path) -> bool {
    crate::core::paths::config_path(path).is_file() || detect(path).is_some()
}

fn detect_from_config(project_path: &Path) -> Option<ProjectKind> {
    let store = match ConfigStore::open(project_path) {
        Ok(store) => store,
        Err(e) => {
            log::debug!("Configuration ignored during detection: {}", e);
            return None;
        }
    };
    let record = store.template_record()?;
    record
        .kind
        .or_else(|| ProjectKind::from_template_name(&record.name))
}

fn detect_from_layout(project_path: &Path) -> Option<ProjectKind> {
    let has_dir = |name: &str| project_path.join(name).is_dir();
    let has_file = |name: &str| project_path.join(name).is_file();

    if has_dir(GIT_DIR) || has_dir(GITHUB_DIR) {
        Some(ProjectKind::Repository)
    } else if has_file(PRE_COMMIT_CONFIG_FILENAME) && has_file(PYPROJECT_FILENAME) {
        Some(ProjectKind::Extended)
    } else if has_file(PYPROJECT_FILENAME) || has_file(SETUP_PY_FILENAME) {
        Some(ProjectKind::Minimal)
    } else {
        None
    }
}
