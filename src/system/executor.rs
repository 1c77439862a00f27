// src/system/executor.rs

use crate::system::progress;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{command}' could not be executed: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Command '{command}' exited with code {code}.{}", output_excerpt(.stdout, .stderr))]
    NonZeroExit {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },
}

impl ExecutionError {
    /// The exit code reported by the process, if it ran at all.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Keeps the last lines of captured output for error messages.
fn output_excerpt(stdout: &str, stderr: &str) -> String {
    const MAX_LINES: usize = 15;
    let source = if stderr.trim().is_empty() { stdout } else { stderr };
    let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(MAX_LINES);
    let tail = lines.get(start..).unwrap_or_default().join("\n");
    format!("\n{}", tail)
}

/// How a command's output reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit the terminal; nothing is captured.
    Stream,
    /// Buffer everything behind a spinner that shows the latest line.
    Progress,
    /// Buffer everything without any visual feedback.
    Silent,
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, OsString>,
    pub mode: OutputMode,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: BTreeMap::new(),
            mode: OutputMode::Stream,
        }
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<OsString>) -> Self {
        self.env.insert(key.to_string(), value.into());
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// The command line as a shell would show it.
    pub fn command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        shlex::try_join(words).unwrap_or_else(|_| {
            std::iter::once(self.program.clone())
                .chain(self.args.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    /// Whether this runs `program` with exactly `args` as its leading arguments.
    pub fn matches(&self, program: &str, args: &[&str]) -> bool {
        let program_matches = self.program == program
            || Path::new(&self.program)
                .file_stem()
                .is_some_and(|stem| stem == program);
        program_matches
            && self.args.len() >= args.len()
            && self.args.iter().zip(args).all(|(a, b)| a == b)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// The seam between operations and the operating system.
pub trait CommandRunner: std::fmt::Debug {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        execute(invocation)
    }
}

/// Executes an invocation and waits for it. A non-zero exit becomes `NonZeroExit`.
pub fn execute(invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
    if invocation.program.trim().is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let command_line = invocation.command_line();
    log::debug!("Executing ({:?}): {}", invocation.mode, command_line);

    let mut command = StdCommand::new(&invocation.program);
    command.args(&invocation.args).envs(&invocation.env);
    if let Some(cwd) = &invocation.cwd {
        command.current_dir(dunce::simplified(cwd));
    }

    let spawn_err = |source: io::Error| ExecutionError::Spawn {
        command: command_line.clone(),
        source,
    };

    let (status, stdout, stderr) = match invocation.mode {
        OutputMode::Stream => {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .map_err(spawn_err)?;
            (status, String::new(), String::new())
        }
        OutputMode::Silent => {
            let output = command
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(spawn_err)?;
            (
                output.status,
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
        }
        OutputMode::Progress => {
            let label = Path::new(&invocation.program)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| invocation.program.clone());
            run_behind_spinner(&mut command, &label).map_err(spawn_err)?
        }
    };

    let code = status.code().unwrap_or(-1);
    if !status.success() {
        log::debug!("Command '{}' failed with code {}", command_line, code);
        return Err(ExecutionError::NonZeroExit {
            command: command_line,
            code,
            stdout,
            stderr,
        });
    }

    Ok(CommandOutput {
        code,
        stdout,
        stderr,
    })
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct Chunk {
    channel: Channel,
    bytes: Vec<u8>,
}

fn forward_lines<R: Read + Send + 'static>(
    reader: R,
    channel: Channel,
    tx: Sender<Chunk>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        loop {
            let mut bytes = Vec::new();
            match reader.read_until(b'\n', &mut bytes) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Chunk { channel, bytes }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("Stopped reading {:?}: {}", channel, e);
                    break;
                }
            }
        }
    })
}

/// Buffers stdout and stderr byte-for-byte while the spinner tracks the latest line.
fn run_behind_spinner(
    command: &mut StdCommand,
    label: &str,
) -> io::Result<(ExitStatus, String, String)> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let spinner = scopeguard::guard(progress::create_spinner(label), |pb| pb.finish_and_clear());

    let (tx, rx) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(out) = child.stdout.take() {
        readers.push(forward_lines(out, Channel::Stdout, tx.clone()));
    }
    if let Some(err) = child.stderr.take() {
        readers.push(forward_lines(err, Channel::Stderr, tx.clone()));
    }
    drop(tx);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for chunk in rx {
        let line = String::from_utf8_lossy(&chunk.bytes);
        if !line.trim().is_empty() {
            log::trace!("[{}] {}", label, line.trim_end());
            spinner.set_message(progress::spinner_line(label, &line));
        }
        match chunk.channel {
            Channel::Stdout => stdout.extend_from_slice(&chunk.bytes),
            Channel::Stderr => stderr.extend_from_slice(&chunk.bytes),
        }
    }

    for reader in readers {
        if reader.join().is_err() {
            log::warn!("An output reader thread for '{}' panicked", label);
        }
    }

    let status = child.wait()?;
    Ok((
        status,
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, mode: OutputMode) -> Invocation {
        Invocation::new("sh", ["-c", script]).mode(mode)
    }

    #[test]
    fn captured_stdout_is_returned_verbatim() {
        let output = execute(&sh("printf 'hello\\nworld\\n'", OutputMode::Silent)).expect("run");
        assert_eq!(output.stdout, "hello\nworld\n");
        assert_eq!(output.code, 0);
    }

    #[test]
    fn progress_mode_buffers_the_same_bytes() {
        let output =
            execute(&sh("printf 'a\\nb'; printf 'oops' >&2", OutputMode::Progress)).expect("run");
        assert_eq!(output.stdout, "a\nb");
        assert_eq!(output.stderr, "oops");
    }

    #[test]
    fn non_zero_exit_carries_the_code_and_output() {
        let err = execute(&sh("echo broken >&2; exit 3", OutputMode::Silent)).expect_err("fails");
        assert_eq!(err.exit_code(), Some(3));
        assert!(matches!(
            &err,
            ExecutionError::NonZeroExit { stderr, command, .. }
                if stderr == "broken\n" && command.starts_with("sh -c")
        ));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = execute(&Invocation::new("definitely-not-a-real-binary-42", Vec::<String>::new()))
            .expect_err("spawn fails");
        assert!(matches!(err, ExecutionError::Spawn { .. }));
    }

    #[test]
    fn working_directory_and_env_are_applied() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let output = execute(
            &sh("pwd; echo $CICD_PROBE", OutputMode::Silent)
                .current_dir(tmp.path())
                .env("CICD_PROBE", "42"),
        )
        .expect("run");
        let canonical = dunce::canonicalize(tmp.path()).expect("canonical");
        assert!(output.stdout.contains(&*canonical.to_string_lossy()));
        assert!(output.stdout.ends_with("42\n"));
    }

    #[test]
    fn command_line_is_shell_quoted() {
        let inv = Invocation::new("git", ["commit", "-m", "two words"]);
        assert_eq!(inv.command_line(), "git commit -m 'two words'");
        assert!(inv.matches("git", &["commit"]));
        assert!(!inv.matches("git", &["push"]));
    }
}
