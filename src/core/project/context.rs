// src/core/project/context.rs

use crate::core::config_store::{ConfigError, ConfigStore};
use crate::core::template_manager::TemplateManager;
use crate::core::project::{ProjectError, ProjectResult};
use crate::system::environment::{Environment, EnvironmentError};
use crate::system::executor::{CommandOutput, CommandRunner, OutputMode};
use std::cell::{Ref, RefCell, RefMut};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Everything an operation needs: the project root, its configuration, the command runner
/// and the (lazily resolved) environment the commands run in.
#[derive(Debug)]
pub struct ProjectContext {
    root: PathBuf,
    config: RefCell<ConfigStore>,
    runner: Rc<dyn CommandRunner>,
    environment: RefCell<Option<Environment>>,
    host: RefCell<Option<Environment>>,
    templates: Option<TemplateManager>,
}

impl ProjectContext {
    pub fn open(root: &Path, runner: Rc<dyn CommandRunner>) -> Result<Self, ConfigError> {
        Ok(Self {
            root: root.to_path_buf(),
            config: RefCell::new(ConfigStore::open(root)?),
            runner,
            environment: RefCell::new(None),
            host: RefCell::new(None),
            templates: None,
        })
    }

    /// Pins the host interpreter instead of looking it up on `PATH`.
    pub fn with_host(self, host: Environment) -> Self {
        *self.host.borrow_mut() = Some(host);
        self
    }

    /// Makes templates available to operations that render them (clone).
    pub fn with_templates(mut self, templates: TemplateManager) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn templates(&self) -> Option<&TemplateManager> {
        self.templates.as_ref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> Ref<'_, ConfigStore> {
        self.config.borrow()
    }

    pub fn config_mut(&self) -> RefMut<'_, ConfigStore> {
        self.config.borrow_mut()
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// The output mode selected by `execution.capture_output`.
    pub fn output_mode(&self) -> OutputMode {
        if self.config().capture_output() {
            OutputMode::Progress
        } else {
            OutputMode::Stream
        }
    }

    pub fn host(&self) -> Result<Environment, EnvironmentError> {
        if let Some(host) = self.host.borrow().as_ref() {
            return Ok(host.clone());
        }
        let host = Environment::host()?;
        *self.host.borrow_mut() = Some(host.clone());
        Ok(host)
    }

    pub fn has_environment(&self) -> bool {
        self.config().environment().is_some()
    }

    /// The configured environment. Fails with `NotConfigured` until one has been chosen.
    pub fn environment(&self) -> Result<Environment, EnvironmentError> {
        if let Some(env) = self.environment.borrow().as_ref() {
            return Ok(env.clone());
        }
        let config = self
            .config()
            .environment()
            .ok_or(EnvironmentError::NotConfigured)?;
        let env = match config.kind {
            crate::models::EnvironmentKind::Current => self.host()?,
            crate::models::EnvironmentKind::Virtual => Environment::from_config(&self.root, &config)?,
        };
        *self.environment.borrow_mut() = Some(env.clone());
        Ok(env)
    }

    fn adopt(&self, env: Environment) -> ProjectResult<Environment> {
        self.config_mut().set_environment(&env.to_config())?;
        *self.environment.borrow_mut() = Some(env.clone());
        Ok(env)
    }

    fn forget_environment(&self) -> ProjectResult<()> {
        self.config_mut().delete("environment")?;
        *self.environment.borrow_mut() = None;
        Ok(())
    }

    /// Runs the project in the host interpreter from now on.
    pub fn use_host_environment(&self) -> ProjectResult<Environment> {
        let host = self.host()?;
        self.adopt(host)
    }

    /// Creates (or reuses) `<root>/<name>` as a virtual environment and selects it.
    pub fn create_virtual_environment(&self, name: &str) -> ProjectResult<Environment> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::InvalidEnvironmentName(name.to_string()));
        }
        let env = Environment::virtual_at(&self.root.join(name));
        env.create(self.runner(), &self.host()?, self.output_mode())?;
        self.adopt(env)
    }

    /// Deletes the virtual environment and creates it again at the same path.
    ///
    /// The stored descriptor is dropped right after the removal, so a failed creation
    /// leaves the project without an environment.
    pub fn recreate_environment(&self) -> ProjectResult<Environment> {
        let env = self.environment()?;
        if !env.is_virtual() {
            return Err(EnvironmentError::NotVirtual.into());
        }
        env.remove()?;
        self.forget_environment()?;
        env.create(self.runner(), &self.host()?, self.output_mode())?;
        self.adopt(env)
    }

    /// Removes a virtual environment from disk and forgets the configured environment.
    pub fn delete_environment(&self) -> ProjectResult<()> {
        let env = self.environment()?;
        if env.is_virtual() {
            env.remove()?;
        }
        self.forget_environment()
    }

    /// Runs `program` inside the environment, following `execution.capture_output`.
    pub fn run<I, S>(&self, program: &str, args: I) -> ProjectResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_with(self.output_mode(), program, args)
    }

    pub fn run_with<I, S>(&self, mode: OutputMode, program: &str, args: I) -> ProjectResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let env = self.environment()?;
        let invocation = env.command(program, args).current_dir(&self.root).mode(mode);
        Ok(self.runner.run(&invocation)?)
    }

    /// Runs the environment's interpreter, e.g. `python -m pip ...`.
    pub fn run_python<I, S>(&self, mode: OutputMode, args: I) -> ProjectResult<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let env = self.environment()?;
        let python = env.python().to_string_lossy().into_owned();
        self.run_with(mode, &python, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnvironmentKind;
    use crate::system::testing::RecordingRunner;
    use std::fs;

    fn context(root: &Path, runner: Rc<RecordingRunner>) -> ProjectContext {
        ProjectContext::open(root, runner)
            .expect("open")
            .with_host(Environment::from_interpreter(PathBuf::from("/usr/bin/python3")))
    }

    #[test]
    fn environment_is_not_configured_initially() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context(tmp.path(), Rc::new(RecordingRunner::new()));

        assert!(!ctx.has_environment());
        assert!(matches!(ctx.environment(), Err(EnvironmentError::NotConfigured)));
        assert!(ctx.run("pytest", Vec::<String>::new()).is_err());
    }

    #[test]
    fn choosing_the_host_is_persisted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context(tmp.path(), Rc::new(RecordingRunner::new()));

        ctx.use_host_environment().expect("host");

        let stored = ConfigStore::open(tmp.path()).expect("open").environment();
        assert_eq!(stored.map(|e| e.kind), Some(EnvironmentKind::Current));
    }

    #[test]
    fn virtual_environment_is_created_and_persisted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context(tmp.path(), runner.clone());

        let env = ctx.create_virtual_environment("venv").expect("create");

        assert!(env.exists());
        assert_eq!(env.root(), tmp.path().join("venv"));
        let stored = ctx.config().environment().expect("stored");
        assert_eq!(stored.kind, EnvironmentKind::Virtual);
        assert_eq!(stored.path, tmp.path().join("venv"));
    }

    #[test]
    fn recreate_leaves_a_fresh_environment() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context(tmp.path(), runner.clone());
        let env = ctx.create_virtual_environment(".venv").expect("create");
        let leftover = env.root().join("lib").join("stale.txt");
        fs::create_dir_all(leftover.parent().expect("parent")).expect("mkdir");
        fs::write(&leftover, "old").expect("write");

        let recreated = ctx.recreate_environment().expect("recreate");

        assert!(recreated.root().exists());
        assert!(recreated.exists());
        assert!(!leftover.exists());
        assert!(ctx.has_environment());
    }

    #[test]
    fn failed_recreate_leaves_no_environment_configured() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
        ctx.create_virtual_environment(".venv").expect("create");

        let failing = context(
            tmp.path(),
            Rc::new(RecordingRunner::new().failing("python3", &["-m", "venv"], 1)),
        );
        assert!(failing.recreate_environment().is_err());

        assert!(!failing.has_environment());
        assert!(ConfigStore::open(tmp.path()).expect("open").environment().is_none());
    }

    #[test]
    fn delete_removes_the_directory_and_the_descriptor() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
        let env = ctx.create_virtual_environment(".venv").expect("create");

        ctx.delete_environment().expect("delete");

        assert!(!env.root().exists());
        assert!(!ctx.has_environment());
    }

    #[test]
    fn commands_run_in_the_project_root_with_the_configured_mode() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context(tmp.path(), runner.clone());
        ctx.create_virtual_environment(".venv").expect("create");
        ctx.config_mut()
            .set("execution.capture_output", false)
            .expect("set");

        ctx.run("pytest", ["-q"]).expect("run");

        let last = runner.calls().pop().expect("a call");
        assert_eq!(last.cwd.as_deref(), Some(tmp.path()));
        assert_eq!(last.mode, OutputMode::Stream);
        assert!(last.matches("pytest", &["-q"]));
    }
}
