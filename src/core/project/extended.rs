// src/core/project/extended.rs

use crate::constants::{DIST_DIR, TEST_PACKAGE_INDEX};
use crate::core::project::{
    ProjectContext, ProjectError, ProjectResult, ProjectType, ensure_supported, operations,
};
use crate::core::versioning::{self, ProjectVersion};
use crate::models::{
    BumpKind, HookAction, Operation, OperationDefinition, ProjectKind, ReleaseKind, TestMode,
};
use crate::system::executor::OutputMode;
use crate::system::prompt::Prompter;
use colored::*;
use std::path::PathBuf;

static EXTENDED_OPERATIONS: &[OperationDefinition] = &[
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
        operation: Operation::Release,
        name: "Release",
        description: "Bump the version and build a beta or production release",
        icon: "🏷️",
    },
    OperationDefinition {
        operation: Operation::Deploy,
        name: "Deploy",
        description: "Upload a release to TestPyPI (beta) or PyPI (prod)",
        icon: "🚀",
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

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn choose_test_mode(prompter: &dyn Prompter) -> ProjectResult<Option<TestMode>> {
    let items = labels(&["All tests", "Failed only", "With coverage"]);
    let modes = [TestMode::All, TestMode::FailedOnly, TestMode::Coverage];
    Ok(prompter
        .select(t!("project.test.choose"), &items, 0)?
        .and_then(|i| modes.get(i).copied()))
}

pub(crate) fn choose_hook_action(prompter: &dyn Prompter) -> ProjectResult<Option<HookAction>> {
    let items = labels(&["Enable", "Disable", "Run on all files"]);
    let actions = [HookAction::Enable, HookAction::Disable, HookAction::Run];
    Ok(prompter
        .select(t!("project.prehook.choose"), &items, 0)?
        .and_then(|i| actions.get(i).copied()))
}

fn choose_release_kind(prompter: &dyn Prompter) -> ProjectResult<Option<ReleaseKind>> {
    let items = labels(&["Beta", "Prod"]);
    let kinds = [ReleaseKind::Beta, ReleaseKind::Prod];
    Ok(prompter
        .select(t!("project.release.choose_kind"), &items, 0)?
        .and_then(|i| kinds.get(i).copied()))
}

fn choose_bump(prompter: &dyn Prompter) -> ProjectResult<Option<BumpKind>> {
    let items = labels(&["Patch", "Minor", "Major"]);
    let bumps = [BumpKind::Patch, BumpKind::Minor, BumpKind::Major];
    Ok(prompter
        .select(t!("project.release.choose_bump"), &items, 0)?
        .and_then(|i| bumps.get(i).copied()))
}

/// A development setup: dev extras, pre-commit, versioned releases and deployment.
#[derive(Debug)]
pub struct ExtendedProject {
    context: ProjectContext,
}

impl ExtendedProject {
    pub fn new(context: ProjectContext) -> Self {
        Self { context }
    }

    /// Bumps the version with bump2version, builds, and files the artifacts under
    /// `dist/beta` or `dist/release`. Returns the new version.
    pub fn release(
        &self,
        kind: ReleaseKind,
        bump: BumpKind,
        prompter: &dyn Prompter,
    ) -> ProjectResult<ProjectVersion> {
        let ctx = &self.context;
        let current = versioning::read_current_version(ctx.root())?;
        let next = current.next(kind, bump)?;
        log::info!("Releasing {} -> {} ({})", current, next, kind);

        operations::install_if_needed(ctx, "build")?;
        operations::install_if_needed(ctx, "bump2version")?;
        operations::configure_git_identity(ctx, prompter)?;
        operations::clean_dist_root(ctx)?;

        let next_str = next.to_string();
        ctx.run(
            "bump2version",
            ["--allow-dirty", "--new-version", next_str.as_str(), "patch"],
        )?;
        ctx.run_python(ctx.output_mode(), ["-m", "build"])?;
        let files = operations::prepare_release_dir(ctx, kind.dist_subdir())?;

        println!(
            "{} {}",
            "✓".green(),
            format!(
                t!("project.release.done"),
                version = next_str,
                count = files.len(),
                dir = kind.dist_subdir()
            )
        );
        Ok(next)
    }

    /// Uploads the artifacts of a previous release of `kind`.
    pub fn deploy(&self, kind: ReleaseKind) -> ProjectResult<()> {
        let ctx = &self.context;
        let dir = ctx.root().join(DIST_DIR).join(kind.dist_subdir());
        let files: Vec<PathBuf> = operations::glob_in(&dir, "*")?
            .into_iter()
            .filter(|p| p.is_file())
            .collect();
        if files.is_empty() {
            return Err(ProjectError::ArtifactsMissing {
                path: dir.display().to_string(),
                release: kind,
            });
        }

        operations::install_if_needed(ctx, "twine")?;
        let mut args = vec!["upload".to_string()];
        if kind == ReleaseKind::Beta {
            args.push("--repository".to_string());
            args.push(TEST_PACKAGE_INDEX.to_string());
        }
        args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
        // twine may ask for credentials.
        ctx.run_with(OutputMode::Stream, "twine", args)?;
        println!(
            "{} {}",
            "✓".green(),
            format!(t!("project.deploy.done"), kind = kind)
        );
        Ok(())
    }

    fn release_interactive(&self, prompter: &dyn Prompter) -> ProjectResult<()> {
        let Some(kind) = choose_release_kind(prompter)? else {
            return Ok(());
        };
        let bump = match kind {
            ReleaseKind::Beta => BumpKind::Patch,
            ReleaseKind::Prod => match choose_bump(prompter)? {
                Some(bump) => bump,
                None => return Ok(()),
            },
        };
        let current = versioning::read_current_version(self.context.root())?;
        let next = current.next(kind, bump)?;
        let question = format!(t!("project.release.confirm"), current = current, next = next);
        if !prompter.confirm(&question, true)? {
            return Err(ProjectError::Cancelled);
        }
        self.release(kind, bump, prompter).map(|_| ())
    }
}

impl ProjectType for ExtendedProject {
    fn kind(&self) -> ProjectKind {
        ProjectKind::Extended
    }

    fn context(&self) -> &ProjectContext {
        &self.context
    }

    fn operations(&self) -> &'static [OperationDefinition] {
        EXTENDED_OPERATIONS
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
            Operation::Release => self.release_interactive(prompter),
            Operation::Deploy => match choose_release_kind(prompter)? {
                Some(kind) => self.deploy(kind),
                None => Ok(()),
            },
            Operation::Clean => self.clean(),
            _ => self.help(),
        }
    }

    fn install(&self) -> ProjectResult<()> {
        operations::install_editable(&self.context, Some("dev"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::fixtures::context_with_venv;
    use crate::system::prompt::scripted::{Answer, ScriptedPrompter};
    use crate::system::testing::RecordingRunner;
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    fn project(root: &Path, runner: Rc<RecordingRunner>) -> ExtendedProject {
        ExtendedProject::new(context_with_venv(root, runner))
    }

    /// `python -m build` drops an sdist and a wheel into `dist/`.
    fn simulating_build(runner: RecordingRunner, root: &Path) -> RecordingRunner {
        let dist = root.join("dist");
        runner.on("python", &["-m", "build"], move |_| {
            fs::create_dir_all(&dist).expect("mkdir dist");
            fs::write(dist.join("demo-1.0.0.tar.gz"), "sdist").expect("sdist");
            fs::write(dist.join("demo-1.0.0-py3-none-any.whl"), "wheel").expect("wheel");
        })
    }

    #[test]
    fn release_without_version_file_runs_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());
        let before = runner.calls().len();

        let err = project
            .release(ReleaseKind::Beta, BumpKind::Patch, &ScriptedPrompter::new([]))
            .expect_err("no version file");

        assert!(err.to_string().contains("Version not found"));
        assert_eq!(runner.calls().len(), before);
    }

    #[test]
    fn beta_release_bumps_builds_and_files_artifacts() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".bumpversion.cfg"),
            "[bumpversion]\ncurrent_version = 0.9.0\ncommit = True\n",
        )
        .expect("write cfg");
        let runner = Rc::new(simulating_build(
            RecordingRunner::new()
                .simulating_venv()
                .replying("git", &["config", "--get"], "someone\n"),
            tmp.path(),
        ));
        let project = project(tmp.path(), runner.clone());

        let next = project
            .release(ReleaseKind::Beta, BumpKind::Patch, &ScriptedPrompter::new([]))
            .expect("release");

        assert_eq!(next.to_string(), "0.9.0b0");
        assert!(runner.ran(
            "bump2version",
            &["--allow-dirty", "--new-version", "0.9.0b0", "patch"]
        ));
        let beta = tmp.path().join("dist").join("beta");
        assert_eq!(operations::artifacts_in(&beta).expect("list").len(), 2);
        assert!(
            operations::artifacts_in(&tmp.path().join("dist"))
                .expect("list")
                .is_empty()
        );
    }

    #[test]
    fn prod_deploy_without_release_dir_never_uploads() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());

        let err = project.deploy(ReleaseKind::Prod).expect_err("nothing to deploy");

        assert!(matches!(
            err,
            ProjectError::ArtifactsMissing {
                release: ReleaseKind::Prod,
                ..
            }
        ));
        assert!(!runner.ran("twine", &[]));
        assert!(!runner.ran("python", &["-m", "pip", "show", "twine"]));
    }

    #[test]
    fn deploy_finds_artifacts_under_a_bracketed_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("proj[v2]");
        let beta = root.join("dist").join("beta");
        fs::create_dir_all(&beta).expect("mkdir");
        fs::write(beta.join("demo-0.1.1b0.tar.gz"), "sdist").expect("write");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(&root, runner.clone());

        project.deploy(ReleaseKind::Beta).expect("deploy");

        assert!(runner.ran("twine", &["upload", "--repository", "testpypi"]));
    }

    #[test]
    fn beta_deploy_targets_the_test_index() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let beta = tmp.path().join("dist").join("beta");
        fs::create_dir_all(&beta).expect("mkdir");
        fs::write(beta.join("demo-0.1.1b0.tar.gz"), "sdist").expect("write");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());

        project.deploy(ReleaseKind::Beta).expect("deploy");

        let upload = runner
            .calls()
            .into_iter()
            .find(|inv| inv.matches("twine", &["upload"]))
            .expect("twine upload");
        assert_eq!(upload.args[1..3], ["--repository", "testpypi"]);
        assert!(upload.args[3].ends_with("demo-0.1.1b0.tar.gz"));
        assert_eq!(upload.mode, OutputMode::Stream);
    }

    #[test]
    fn install_uses_the_dev_extras() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());

        project.install().expect("install");

        assert!(runner.ran("python", &["-m", "pip", "install", "-e", ".[dev]"]));
    }

    #[test]
    fn test_operation_asks_for_the_mode() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());
        let prompter = ScriptedPrompter::new([Answer::Choose("coverage")]);

        project.perform(Operation::Test, &prompter).expect("tests");

        assert!(runner.ran("python", &["-m", "pytest", "--cov"]));
    }

    #[test]
    fn declined_release_is_cancelled() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join(".bumpversion.cfg"), "current_version = 1.2.3\n")
            .expect("write cfg");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let project = project(tmp.path(), runner.clone());
        let prompter = ScriptedPrompter::new([
            Answer::Choose("Prod"),
            Answer::Choose("Minor"),
            Answer::No,
        ]);

        let err = project
            .perform(Operation::Release, &prompter)
            .expect_err("declined");

        assert!(matches!(err, ProjectError::Cancelled));
        assert!(!runner.ran("bump2version", &[]));
    }
}
