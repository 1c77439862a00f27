// src/system/testing.rs

//! A `CommandRunner` that records invocations instead of spawning processes.

use crate::system::environment::Environment;
use crate::system::executor::{CommandOutput, CommandRunner, ExecutionError, Invocation};
use std::cell::RefCell;
use std::fs;
use std::path::Path;

type Effect = Box<dyn Fn(&Invocation)>;

struct Rule {
    program: String,
    args: Vec<String>,
    reply: Reply,
}

enum Reply {
    Fail(i32),
    Stdout(String),
    Effect(Effect),
}

#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<Invocation>>,
    rules: Vec<Rule>,
}

impl std::fmt::Debug for RecordingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingRunner")
            .field("calls", &self.calls.borrow().len())
            .field("rules", &self.rules.len())
            .finish()
    }
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(mut self, program: &str, args: &[&str], reply: Reply) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            reply,
        });
        self
    }

    /// Makes `program args...` exit with `code`.
    pub fn failing(self, program: &str, args: &[&str], code: i32) -> Self {
        self.rule(program, args, Reply::Fail(code))
    }

    /// Makes `program args...` print `stdout`.
    pub fn replying(self, program: &str, args: &[&str], stdout: &str) -> Self {
        self.rule(program, args, Reply::Stdout(stdout.to_string()))
    }

    /// Runs `effect` whenever `program args...` is invoked.
    pub fn on(self, program: &str, args: &[&str], effect: impl Fn(&Invocation) + 'static) -> Self {
        self.rule(program, args, Reply::Effect(Box::new(effect)))
    }

    /// `python -m venv <root>` lays out an interpreter under `<root>`.
    pub fn simulating_venv(self) -> Self {
        let effect = |inv: &Invocation| {
            if let Some(root) = inv.args.get(2) {
                let venv = Environment::virtual_at(Path::new(root));
                fs::create_dir_all(venv.bin_dir()).expect("create bin dir");
                fs::write(venv.python(), "").expect("create interpreter");
            }
        };
        self.on("python3", &["-m", "venv"], effect)
            .on("python", &["-m", "venv"], effect)
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|inv| {
                let program = Path::new(&inv.program)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                std::iter::once(program)
                    .chain(inv.args.iter().cloned())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    pub fn ran(&self, program: &str, args: &[&str]) -> bool {
        self.calls.borrow().iter().any(|inv| inv.matches(program, args))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, ExecutionError> {
        self.calls.borrow_mut().push(invocation.clone());

        let mut output = CommandOutput::default();
        for rule in &self.rules {
            let args: Vec<&str> = rule.args.iter().map(String::as_str).collect();
            if !invocation.matches(&rule.program, &args) {
                continue;
            }
            match &rule.reply {
                Reply::Fail(code) => {
                    return Err(ExecutionError::NonZeroExit {
                        command: invocation.command_line(),
                        code: *code,
                        stdout: String::new(),
                        stderr: String::new(),
                    });
                }
                Reply::Stdout(stdout) => output.stdout.push_str(stdout),
                Reply::Effect(effect) => effect(invocation),
            }
        }
        Ok(output)
    }
}
