//! External command execution and the runner abstraction used for fakes in
//! tests.

use std::ffi::OsString;
use std::process::Command;

use thiserror::Error;

/// Result of running an external command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output; empty when the runner streams instead.
    pub stdout: String,
    /// Captured standard error; empty when the runner streams instead.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Errors raised while spawning external commands.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProcessError {
    /// Raised when the command cannot be started.
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that could not be started.
        program: String,
        /// Human-readable error message.
        message: String,
    },
}

/// Abstraction over command execution to support fakes in tests.
///
/// All invocations are synchronous: the runner blocks until the child exits,
/// with no timeout. A hung external tool therefore hangs the caller; this is
/// an accepted limitation of the deployment workflow.
pub trait CommandRunner {
    /// Runs `program` with the given arguments and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError>;
}

/// Runner that captures stdout and stderr of the child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct CapturingCommandRunner;

impl CommandRunner for CapturingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| ProcessError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runner that lets the child inherit the console so deploy progress from the
/// external tooling is visible as it happens.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamingCommandRunner;

impl CommandRunner for StreamingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| ProcessError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_runner_reports_exit_code_and_output() {
        let runner = CapturingCommandRunner;
        let output = runner
            .run(
                "sh",
                &[OsString::from("-c"), OsString::from("echo out; exit 3")],
            )
            .unwrap_or_else(|err| panic!("sh should spawn: {err}"));
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert!(!output.is_success());
    }

    #[test]
    fn missing_program_surfaces_spawn_error() {
        let runner = CapturingCommandRunner;
        let err = runner
            .run("definitely-not-a-real-binary-4242", &[])
            .expect_err("missing binary should fail to spawn");
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
