// src/core/project/operations.rs

//! Building blocks shared by the project variants.

use crate::constants::{BUILD_DIR, DIST_DIR};
use crate::core::project::{ProjectContext, ProjectError, ProjectResult};
use crate::models::{HookAction, TestMode};
use crate::system::executor::{ExecutionError, OutputMode};
use crate::system::prompt::Prompter;
use colored::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn io_error(path: &Path, source: std::io::Error) -> ProjectError {
    ProjectError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `pip install -e .`, or `pip install -e .[extras]`.
pub fn install_editable(ctx: &ProjectContext, extras: Option<&str>) -> ProjectResult<()> {
    let target = match extras {
        Some(extras) => format!(".[{}]", extras),
        None => ".".to_string(),
    };
    ctx.run_python(ctx.output_mode(), ["-m", "pip", "install", "-e", target.as_str()])?;
    println!("{} {}", "✓".green(), t!("project.install.done"));
    Ok(())
}

/// Installs `package` unless `pip show` already finds it.
pub fn install_if_needed(ctx: &ProjectContext, package: &str) -> ProjectResult<()> {
    match ctx.run_python(OutputMode::Silent, ["-m", "pip", "show", package]) {
        Ok(_) => {
            log::debug!("Package '{}' already installed", package);
            Ok(())
        }
        Err(ProjectError::Execution(ExecutionError::NonZeroExit { .. })) => {
            log::info!("Installing missing package '{}'", package);
            ctx.run_python(ctx.output_mode(), ["-m", "pip", "install", package])?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub fn run_tests(ctx: &ProjectContext, mode: TestMode) -> ProjectResult<()> {
    let mut args = vec!["-m", "pytest"];
    args.extend_from_slice(mode.pytest_args());
    ctx.run_python(OutputMode::Stream, args)?;
    Ok(())
}

/// Builds sdist and wheel into `dist/`.
pub fn build(ctx: &ProjectContext) -> ProjectResult<()> {
    install_if_needed(ctx, "build")?;
    ctx.run_python(ctx.output_mode(), ["-m", "build"])?;
    println!("{} {}", "✓".green(), t!("project.build.done"));
    Ok(())
}

fn remove_path(path: &Path) -> ProjectResult<bool> {
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => {
            log::debug!("Removed '{}'", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Removes `build/`, `dist/` and every `*.egg-info` at the project root.
pub fn clean(ctx: &ProjectContext) -> ProjectResult<()> {
    let root = ctx.root();
    let mut targets = vec![root.join(BUILD_DIR), root.join(DIST_DIR)];
    targets.extend(glob_in(root, "*.egg-info")?);

    let mut removed = 0;
    for target in &targets {
        if remove_path(target)? {
            removed += 1;
        }
    }
    println!(
        "{} {}",
        "✓".green(),
        format!(t!("project.clean.done"), count = removed)
    );
    Ok(())
}

/// Paths directly inside `dir` matching `pattern`. The directory itself is matched
/// literally, so brackets or wildcards in the project path are harmless.
pub fn glob_in(dir: &Path, pattern: &str) -> ProjectResult<Vec<PathBuf>> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let entries = glob::glob(&full).map_err(|source| ProjectError::Pattern {
        pattern: full.clone(),
        source,
    })?;
    entries
        .map(|entry| {
            entry.map_err(|e| {
                let path = e.path().to_path_buf();
                io_error(&path, e.into_error())
            })
        })
        .collect()
}

/// Regular files directly inside `dir`, sorted. A missing directory has none.
pub fn artifacts_in(dir: &Path) -> ProjectResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(dir, e)),
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Deletes the loose files at the `dist/` root, keeping the release sub-directories.
pub fn clean_dist_root(ctx: &ProjectContext) -> ProjectResult<()> {
    for file in artifacts_in(&ctx.root().join(DIST_DIR))? {
        remove_path(&file)?;
    }
    Ok(())
}

/// Moves the freshly built files from `dist/` into `dist/<subdir>`.
pub fn prepare_release_dir(ctx: &ProjectContext, subdir: &str) -> ProjectResult<Vec<PathBuf>> {
    let dist = ctx.root().join(DIST_DIR);
    let target = dist.join(subdir);
    fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;

    let mut copied = Vec::new();
    for file in artifacts_in(&dist)? {
        let Some(name) = file.file_name() else {
            continue;
        };
        let destination = target.join(name);
        fs::copy(&file, &destination).map_err(|e| io_error(&destination, e))?;
        copied.push(destination);
    }
    clean_dist_root(ctx)?;
    Ok(copied)
}

pub fn toggle_prehook(ctx: &ProjectContext, action: HookAction) -> ProjectResult<()> {
    install_if_needed(ctx, "pre-commit")?;
    let args: &[&str] = match action {
        HookAction::Enable => &["install"],
        HookAction::Disable => &["uninstall"],
        HookAction::Run => &["run", "--all-files"],
    };
    let message = match action {
        HookAction::Enable => t!("project.prehook.enabled"),
        HookAction::Disable => t!("project.prehook.disabled"),
        HookAction::Run => t!("project.prehook.ran"),
    };
    let mode = match action {
        HookAction::Run => OutputMode::Stream,
        _ => ctx.output_mode(),
    };
    ctx.run_with(mode, "pre-commit", args.iter().copied())?;
    println!("{} {}", "✓".green(), message);
    Ok(())
}

fn git_config_value(ctx: &ProjectContext, key: &str) -> ProjectResult<Option<String>> {
    match ctx.run_with(OutputMode::Silent, "git", ["config", "--get", key]) {
        Ok(output) => {
            let value = output.stdout.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        // `git config --get` exits with 1 when the key is unset.
        Err(ProjectError::Execution(ExecutionError::NonZeroExit { .. })) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Makes sure commits made during a release carry an author.
pub fn configure_git_identity(ctx: &ProjectContext, prompter: &dyn Prompter) -> ProjectResult<()> {
    let keys = [
        ("user.name", t!("project.git.ask_name")),
        ("user.email", t!("project.git.ask_email")),
    ];
    for (key, question) in keys {
        if git_config_value(ctx, key)?.is_some() {
            continue;
        }
        let value = prompter.input(question, None)?;
        if value.is_empty() {
            return Err(ProjectError::Cancelled);
        }
        ctx.run_with(OutputMode::Silent, "git", ["config", key, value.as_str()])?;
        log::debug!("Configured git {}", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::fixtures::context_with_venv;
    use crate::system::prompt::scripted::{Answer, ScriptedPrompter};
    use crate::system::testing::RecordingRunner;
    use std::rc::Rc;

    #[test]
    fn install_editable_with_extras() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context_with_venv(tmp.path(), runner.clone());

        install_editable(&ctx, Some("dev")).expect("install");

        assert!(runner.ran("python", &["-m", "pip", "install", "-e", ".[dev]"]));
    }

    #[test]
    fn install_if_needed_skips_installed_packages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context_with_venv(tmp.path(), runner.clone());

        install_if_needed(&ctx, "build").expect("already installed");

        assert!(runner.ran("python", &["-m", "pip", "show", "build"]));
        assert!(!runner.ran("python", &["-m", "pip", "install", "build"]));
    }

    #[test]
    fn install_if_needed_installs_missing_packages() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(
            RecordingRunner::new()
                .simulating_venv()
                .failing("python", &["-m", "pip", "show", "twine"], 1),
        );
        let ctx = context_with_venv(tmp.path(), runner.clone());

        install_if_needed(&ctx, "twine").expect("install");

        assert!(runner.ran("python", &["-m", "pip", "install", "twine"]));
    }

    #[test]
    fn run_tests_passes_the_mode_flags() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(RecordingRunner::new().simulating_venv());
        let ctx = context_with_venv(tmp.path(), runner.clone());

        run_tests(&ctx, TestMode::FailedOnly).expect("tests");

        assert!(runner.ran("python", &["-m", "pytest", "--last-failed"]));
    }

    #[test]
    fn test_failures_surface_their_exit_code() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(
            RecordingRunner::new()
                .simulating_venv()
                .failing("python", &["-m", "pytest"], 5),
        );
        let ctx = context_with_venv(tmp.path(), runner);

        let err = run_tests(&ctx, TestMode::All).expect_err("pytest failed");

        assert!(matches!(err, ProjectError::Execution(ref e) if e.exit_code() == Some(5)));
    }

    #[test]
    fn clean_removes_build_outputs_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context_with_venv(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
        for dir in ["build/lib", "dist", "demo.egg-info", "src"] {
            fs::create_dir_all(tmp.path().join(dir)).expect("mkdir");
        }

        clean(&ctx).expect("clean");

        assert!(!tmp.path().join("build").exists());
        assert!(!tmp.path().join("dist").exists());
        assert!(!tmp.path().join("demo.egg-info").exists());
        assert!(tmp.path().join("src").exists());
        assert!(tmp.path().join(".venv").exists());
    }

    #[test]
    fn clean_matches_egg_info_under_a_bracketed_root() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("proj[v2]");
        fs::create_dir_all(root.join("demo.egg-info")).expect("mkdir");
        fs::create_dir_all(root.join("dist")).expect("mkdir");
        let ctx = context_with_venv(&root, Rc::new(RecordingRunner::new().simulating_venv()));

        clean(&ctx).expect("clean");

        assert!(!root.join("demo.egg-info").exists());
        assert!(!root.join("dist").exists());
    }

    #[test]
    fn glob_in_treats_the_directory_literally() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("a*b?[c]");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("one.whl"), "").expect("write");
        fs::write(dir.join("two.tar.gz"), "").expect("write");

        let wheels = glob_in(&dir, "*.whl").expect("glob");

        assert_eq!(wheels, vec![dir.join("one.whl")]);
    }

    #[test]
    fn glob_in_reports_bad_patterns() {
        let tmp = tempfile::tempdir().expect("tempdir");

        let err = glob_in(tmp.path(), "[").expect_err("unclosed class");

        assert!(matches!(err, ProjectError::Pattern { .. }));
    }

    #[test]
    fn prepare_release_dir_moves_artifacts() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context_with_venv(tmp.path(), Rc::new(RecordingRunner::new().simulating_venv()));
        let dist = tmp.path().join("dist");
        fs::create_dir_all(&dist).expect("mkdir");
        fs::write(dist.join("demo-0.1.1b0.tar.gz"), "sdist").expect("write");
        fs::write(dist.join("demo-0.1.1b0-py3-none-any.whl"), "wheel").expect("write");

        let copied = prepare_release_dir(&ctx, "beta").expect("prepare");

        assert_eq!(copied.len(), 2);
        assert_eq!(artifacts_in(&dist.join("beta")).expect("list").len(), 2);
        assert!(artifacts_in(&dist).expect("list").is_empty());
    }

    #[test]
    fn git_identity_is_only_asked_when_missing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let runner = Rc::new(
            RecordingRunner::new()
                .simulating_venv()
                .replying("git", &["config", "--get", "user.name"], "Ada\n")
                .failing("git", &["config", "--get", "user.email"], 1),
        );
        let ctx = context_with_venv(tmp.path(), runner.clone());
        let prompter = ScriptedPrompter::new([Answer::Text("ada@example.com")]);

        configure_git_identity(&ctx, &prompter).expect("identity");

        assert_eq!(prompter.remaining(), 0);
        assert!(!runner.ran("git", &["config", "user.name", "Ada"]));
        assert!(
            runner
                .command_lines()
                .contains(&"git config user.email ada@example.com".to_string())
        );
    }
}
