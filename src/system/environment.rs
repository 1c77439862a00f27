// src/system/environment.rs

use crate::models::{EnvironmentConfig, EnvironmentKind};
use crate::system::executor::{CommandRunner, ExecutionError, Invocation, OutputMode};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("No Python interpreter found on PATH (tried: {tried}).")]
    InterpreterNotFound { tried: String },
    #[error("Could not create virtual environment at '{path}': {source}")]
    Creation {
        path: String,
        #[source]
        source: ExecutionError,
    },
    #[error("Virtual environment at '{path}' was created but contains no interpreter.")]
    Incomplete { path: String },
    #[error("Could not remove environment at '{path}': {source}")]
    Removal {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("The host interpreter is not managed by this tool and cannot be removed.")]
    NotVirtual,
    #[error("No environment is configured for this project.")]
    NotConfigured,
}

/// A Python interpreter context in which project commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    root: PathBuf,
    bin_dir: PathBuf,
    python: PathBuf,
    name: String,
    is_virtual: bool,
}

impl Environment {
    /// Locates the host interpreter on `PATH`.
    pub fn host() -> Result<Self, EnvironmentError> {
        INTERPRETER_CANDIDATES
            .iter()
            .find_map(|candidate| which::which(candidate).ok())
            .map(Self::from_interpreter)
            .ok_or_else(|| EnvironmentError::InterpreterNotFound {
                tried: INTERPRETER_CANDIDATES.join(", "),
            })
    }

    /// Describes the host environment owning the given interpreter binary.
    pub fn from_interpreter(python: PathBuf) -> Self {
        let bin_dir = python.parent().map(Path::to_path_buf).unwrap_or_default();
        let root = bin_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| bin_dir.clone());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "system".to_string());
        Self {
            root,
            bin_dir,
            python,
            name,
            is_virtual: false,
        }
    }

    /// Describes a virtual environment rooted at `root`. Nothing is touched on disk.
    pub fn virtual_at(root: &Path) -> Self {
        let (bin, exe) = if cfg!(windows) {
            ("Scripts", "python.exe")
        } else {
            ("bin", "python")
        };
        let bin_dir = root.join(bin);
        Self {
            python: bin_dir.join(exe),
            bin_dir,
            name: root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            root: root.to_path_buf(),
            is_virtual: true,
        }
    }

    /// Rebuilds an environment from its persisted descriptor. Relative paths are
    /// resolved against the project root.
    pub fn from_config(
        project_root: &Path,
        config: &EnvironmentConfig,
    ) -> Result<Self, EnvironmentError> {
        match config.kind {
            EnvironmentKind::Current => Self::host(),
            EnvironmentKind::Virtual => {
                let root = if config.path.is_absolute() {
                    config.path.clone()
                } else {
                    project_root.join(&config.path)
                };
                Ok(Self::virtual_at(&root))
            }
        }
    }

    /// The descriptor persisted in the `[environment]` section.
    pub fn to_config(&self) -> EnvironmentConfig {
        EnvironmentConfig {
            kind: if self.is_virtual {
                EnvironmentKind::Virtual
            } else {
                EnvironmentKind::Current
            },
            path: if self.is_virtual {
                self.root.clone()
            } else {
                PathBuf::new()
            },
            name: self.name.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Whether the interpreter binary is present.
    pub fn exists(&self) -> bool {
        self.python.is_file()
    }

    /// Provisions the virtual environment with `python -m venv`, reusing a working one.
    pub fn create(
        &self,
        runner: &dyn CommandRunner,
        host: &Self,
        mode: OutputMode,
    ) -> Result<(), EnvironmentError> {
        if !self.is_virtual {
            return Ok(());
        }
        if self.exists() {
            log::debug!("Reusing virtual environment at '{}'", self.root.display());
            return Ok(());
        }

        let root = self.root.to_string_lossy().into_owned();
        let python = host.python.to_string_lossy().into_owned();
        let invocation = Invocation::new(&python, ["-m", "venv", root.as_str()]).mode(mode);
        runner
            .run(&invocation)
            .map_err(|source| EnvironmentError::Creation {
                path: root.clone(),
                source,
            })?;

        if !self.exists() {
            return Err(EnvironmentError::Incomplete { path: root });
        }
        log::debug!("Virtual environment created at '{}'", self.root.display());
        Ok(())
    }

    /// Deletes the environment directory. Removing a missing environment succeeds.
    pub fn remove(&self) -> Result<(), EnvironmentError> {
        if !self.is_virtual {
            return Err(EnvironmentError::NotVirtual);
        }
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                log::debug!("Removed virtual environment '{}'", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EnvironmentError::Removal {
                path: self.root.display().to_string(),
                source: e,
            }),
        }
    }

    /// Builds an invocation that runs inside this environment: its binary directory
    /// is prepended to `PATH` and programs living there are called by absolute path.
    pub fn command<I, S>(&self, program: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resolved = self.resolve_program(program);
        let mut invocation =
            Invocation::new(&resolved.to_string_lossy(), args).env("PATH", self.search_path());
        if self.is_virtual {
            invocation = invocation.env("VIRTUAL_ENV", self.root.as_os_str());
        }
        invocation
    }

    fn resolve_program(&self, program: &str) -> PathBuf {
        let candidates = if cfg!(windows) {
            vec![
                self.bin_dir.join(format!("{}.exe", program)),
                self.bin_dir.join(program),
            ]
        } else {
            vec![self.bin_dir.join(program)]
        };
        candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(program))
    }

    fn search_path(&self) -> OsString {
        let inherited = env::var_os("PATH").unwrap_or_default();
        let entries = std::iter::once(self.bin_dir.clone()).chain(env::split_paths(&inherited));
        env::join_paths(entries).unwrap_or(inherited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::RecordingRunner;

    fn host() -> Environment {
        Environment::from_interpreter(PathBuf::from("/usr/bin/python3"))
    }

    #[test]
    fn host_layout_is_derived_from_the_interpreter() {
        let env = host();
        assert_eq!(env.root(), Path::new("/usr"));
        assert_eq!(env.bin_dir(), Path::new("/usr/bin"));
        assert!(!env.is_virtual());
        assert_eq!(env.to_config().kind, EnvironmentKind::Current);
    }

    #[cfg(unix)]
    #[test]
    fn virtual_layout_uses_bin() {
        let env = Environment::virtual_at(Path::new("/work/demo/.venv"));
        assert_eq!(env.python(), Path::new("/work/demo/.venv/bin/python"));
        assert_eq!(env.name(), ".venv");
        assert!(env.is_virtual());
    }

    #[test]
    fn relative_config_paths_resolve_against_the_project() {
        let config = EnvironmentConfig {
            kind: EnvironmentKind::Virtual,
            path: PathBuf::from("venv"),
            name: "venv".to_string(),
        };
        let env = Environment::from_config(Path::new("/work/demo"), &config).expect("env");
        assert_eq!(env.root(), Path::new("/work/demo/venv"));
    }

    #[test]
    fn command_prepends_the_bin_dir_to_path() {
        let env = Environment::virtual_at(Path::new("/work/demo/.venv"));
        let inv = env.command("pytest", ["-q"]);

        let path = inv.env.get("PATH").expect("PATH set");
        let first = env::split_paths(path).next().expect("first entry");
        assert_eq!(first, env.bin_dir());
        assert_eq!(
            inv.env.get("VIRTUAL_ENV").map(OsString::as_os_str),
            Some(env.root().as_os_str())
        );
        assert!(inv.matches("pytest", &["-q"]));
    }

    #[test]
    fn create_runs_venv_with_the_host_interpreter() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::new().simulating_venv();
        let venv = Environment::virtual_at(&tmp.path().join(".venv"));

        venv.create(&runner, &host(), OutputMode::Silent).expect("create");

        assert!(venv.exists());
        assert!(runner.ran("python3", &["-m", "venv"]));
    }

    #[test]
    fn create_reuses_an_existing_environment() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::new().simulating_venv();
        let venv = Environment::virtual_at(&tmp.path().join(".venv"));
        venv.create(&runner, &host(), OutputMode::Silent).expect("first");

        venv.create(&runner, &host(), OutputMode::Silent).expect("second");

        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn create_reports_a_missing_interpreter_afterwards() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = RecordingRunner::new();
        let venv = Environment::virtual_at(&tmp.path().join(".venv"));

        let err = venv
            .create(&runner, &host(), OutputMode::Silent)
            .expect_err("nothing was created");
        assert!(matches!(err, EnvironmentError::Incomplete { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let venv = Environment::virtual_at(&tmp.path().join(".venv"));
        fs::create_dir_all(venv.bin_dir()).expect("mkdir");

        venv.remove().expect("first remove");
        venv.remove().expect("second remove");

        assert!(!venv.root().exists());
        assert!(matches!(host().remove(), Err(EnvironmentError::NotVirtual)));
    }
}
