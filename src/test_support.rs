//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use camino::Utf8PathBuf;

use crate::config::{DeploymentConfig, RuntimeKind};
use crate::input::InputSource;
use crate::process::{CommandOutput, CommandRunner, ProcessError};
use crate::synth::{CompileError, DEFAULT_OUTPUT_DIR, DeployableUnit, TemplateCompiler};

/// Input source that replays a canned sequence of lines and then reports end
/// of input, mimicking an exhausted console stream.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    /// Creates a scripted source from the given lines.
    #[must_use]
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|line| (*line).to_owned()).collect(),
        }
    }

    /// Creates a source that reports end of input immediately.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a specific exit code.
    pub fn push_exit_code(&self, code: i32) {
        self.push_output(Some(code), "", "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Pushes a response with no exit code to simulate abnormal termination.
    pub fn push_missing_exit_code(&self) {
        self.push_output(None, "", "");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ProcessError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Fake template compiler recording which entry point was used.
#[derive(Clone, Debug, Default)]
pub struct FakeCompiler {
    built: Rc<RefCell<Vec<RuntimeKind>>>,
    fail_with_code: Option<i32>,
}

impl FakeCompiler {
    /// Creates a compiler whose builds always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compiler whose builds fail with the given exit code.
    #[must_use]
    pub fn failing(code: i32) -> Self {
        Self {
            built: Rc::default(),
            fail_with_code: Some(code),
        }
    }

    /// Returns the runtimes built so far, in order.
    #[must_use]
    pub fn built(&self) -> Vec<RuntimeKind> {
        self.built.borrow().clone()
    }

    fn build(
        &self,
        config: &DeploymentConfig,
        runtime: RuntimeKind,
    ) -> Result<DeployableUnit, CompileError> {
        self.built.borrow_mut().push(runtime);
        match self.fail_with_code {
            Some(code) => Err(CompileError::Failed {
                stack_name: config.stack_name.clone(),
                code,
                stderr: String::from("simulated synthesis failure"),
            }),
            None => Ok(DeployableUnit {
                stack_name: config.stack_name.clone(),
                output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            }),
        }
    }
}

impl TemplateCompiler for FakeCompiler {
    fn build_ec2(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError> {
        self.build(config, RuntimeKind::Ec2)
    }

    fn build_fargate(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError> {
        self.build(config, RuntimeKind::Fargate)
    }
}
