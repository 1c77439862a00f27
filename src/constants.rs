// src/constants.rs

/// The name of the directory holding the tool's state inside a project.
pub const APP_CACHE_DIR: &str = ".app_cache";

/// The name of the project configuration file (inside `.app_cache/`).
pub const CONFIG_FILENAME: &str = "config.toml";

/// The directory name used when the user accepts the default virtual environment.
pub const DEFAULT_VENV_NAME: &str = ".venv";

/// Files that mark a directory as a renderable template, in lookup order.
pub const TEMPLATE_SCHEMA_FILES: &[&str] = &["copier.yml", "copier.yaml"];

/// Sub-directory of the user config dir that holds templates (`~/.config/cicd-tools/templates`).
pub const TEMPLATES_CONFIG_SUBDIR: &str = "cicd-tools";

/// Environment variable overriding the templates directory.
pub const TEMPLATES_ENV_VAR: &str = "CICD_TOOLS_TEMPLATES";

/// Version file read and rewritten by `bump2version`.
pub const BUMPVERSION_FILENAME: &str = ".bumpversion.cfg";

/// Build output directory and its per-release-kind sub-directories.
pub const DIST_DIR: &str = "dist";
pub const BUILD_DIR: &str = "build";
pub const BETA_DIST_SUBDIR: &str = "beta";
pub const RELEASE_DIST_SUBDIR: &str = "release";

/// Marker files used by structural project detection.
pub const PRE_COMMIT_CONFIG_FILENAME: &str = ".pre-commit-config.yaml";
pub const PYPROJECT_FILENAME: &str = "pyproject.toml";
pub const SETUP_PY_FILENAME: &str = "setup.py";
pub const GIT_DIR: &str = ".git";
pub const GITHUB_DIR: &str = ".github";

/// Package index name that `twine` uses for beta uploads.
pub const TEST_PACKAGE_INDEX: &str = "testpypi";
