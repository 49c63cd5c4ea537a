//! Template-compiler integration.
//!
//! The deployment core never builds resource templates itself; it hands the
//! validated configuration to a [`TemplateCompiler`] and receives an opaque
//! [`DeployableUnit`] back. The real implementation shells out to the CDK
//! CLI, passing the configuration as `--context` entries; tests substitute a
//! fake compiler.

use std::ffi::OsString;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::config::{DeploymentConfig, RuntimeKind};
use crate::process::{CommandRunner, ProcessError};

/// Default directory the template compiler materialises its output into.
pub const DEFAULT_OUTPUT_DIR: &str = "cdk.out";

/// Synthesized resource graph ready for deployment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeployableUnit {
    /// Stack the unit provisions.
    pub stack_name: String,
    /// Directory holding the materialised templates.
    pub output_dir: Utf8PathBuf,
}

/// Errors raised while building a deployable unit.
///
/// Failures here are fatal to the run and are always surfaced with their full
/// cause chain.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Raised when the template compiler cannot be invoked.
    #[error("failed to invoke the template compiler")]
    Spawn(#[from] ProcessError),
    /// Raised when synthesis exits with a non-zero code.
    #[error("template synthesis for stack {stack_name} failed with exit code {code}: {stderr}")]
    Failed {
        /// Stack that failed to synthesize.
        stack_name: String,
        /// Verbatim exit code from the compiler.
        code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// Raised when the compiler terminates without an exit status.
    #[error("template synthesis for stack {stack_name} terminated without an exit status")]
    NoExitStatus {
        /// Stack that failed to synthesize.
        stack_name: String,
    },
    /// Raised when a registered deployment type has no synthesis support yet.
    #[error("{deployment_type} synthesis is not implemented yet")]
    Unsupported {
        /// Deployment type lacking synthesis support.
        deployment_type: String,
    },
}

/// Builds deployable units from a validated configuration.
///
/// The two entry points mirror the two launcher stacks of the underlying CDK
/// application, one per runtime kind.
pub trait TemplateCompiler {
    /// Synthesizes the EC2 launcher stack.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when the compiler cannot be invoked or exits
    /// unsuccessfully.
    fn build_ec2(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError>;

    /// Synthesizes the Fargate launcher stack.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when the compiler cannot be invoked or exits
    /// unsuccessfully.
    fn build_fargate(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError>;
}

/// Template compiler backed by the `cdk` command-line tool.
#[derive(Clone, Debug)]
pub struct CdkSynthesizer<R> {
    runner: R,
    cdk_bin: String,
    output_dir: Utf8PathBuf,
}

impl<R: CommandRunner> CdkSynthesizer<R> {
    /// Creates a synthesizer invoking the `cdk` binary found on the path,
    /// writing into [`DEFAULT_OUTPUT_DIR`].
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            cdk_bin: String::from("cdk"),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Overrides the compiler binary.
    #[must_use]
    pub fn with_cdk_bin(mut self, cdk_bin: impl Into<String>) -> Self {
        self.cdk_bin = cdk_bin.into();
        self
    }

    /// Overrides the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    fn synth(
        &self,
        config: &DeploymentConfig,
        launcher: &str,
    ) -> Result<DeployableUnit, CompileError> {
        let args = build_synth_args(config, launcher, &self.output_dir);
        let output = self.runner.run(&self.cdk_bin, &args)?;
        if output.is_success() {
            return Ok(DeployableUnit {
                stack_name: config.stack_name.clone(),
                output_dir: self.output_dir.clone(),
            });
        }

        match output.code {
            Some(code) => Err(CompileError::Failed {
                stack_name: config.stack_name.clone(),
                code,
                stderr: output.stderr.trim().to_owned(),
            }),
            None => Err(CompileError::NoExitStatus {
                stack_name: config.stack_name.clone(),
            }),
        }
    }
}

impl<R: CommandRunner> TemplateCompiler for CdkSynthesizer<R> {
    fn build_ec2(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError> {
        self.synth(config, "jenkins-ec2")
    }

    fn build_fargate(&self, config: &DeploymentConfig) -> Result<DeployableUnit, CompileError> {
        self.synth(config, "jenkins-fargate")
    }
}

/// Dispatches to the entry point matching the configured runtime.
///
/// # Errors
///
/// Propagates any [`CompileError`] from the chosen entry point.
pub fn build_for_runtime(
    compiler: &dyn TemplateCompiler,
    config: &DeploymentConfig,
) -> Result<DeployableUnit, CompileError> {
    match config.runtime {
        RuntimeKind::Ec2 => compiler.build_ec2(config),
        RuntimeKind::Fargate => compiler.build_fargate(config),
    }
}

fn build_synth_args(
    config: &DeploymentConfig,
    launcher: &str,
    output_dir: &Utf8Path,
) -> Vec<OsString> {
    let mut args = vec![
        OsString::from("synth"),
        OsString::from(config.stack_name.clone()),
        OsString::from("--output"),
        OsString::from(output_dir.as_str()),
        OsString::from("--context"),
        OsString::from(format!("cfc.launcher={launcher}")),
    ];
    for (key, value) in config.context_entries() {
        args.push(OsString::from("--context"));
        args.push(OsString::from(format!("cfc.{key}={value}")));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;

    fn valid_config() -> DeploymentConfig {
        DeploymentConfig::default()
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"))
    }

    #[test]
    fn synth_passes_launcher_and_context_entries() {
        let runner = ScriptedRunner::new();
        runner.push_success();
        let synthesizer = CdkSynthesizer::new(runner.clone());
        let config = valid_config();

        let unit = synthesizer
            .build_fargate(&config)
            .unwrap_or_else(|err| panic!("synth should succeed: {err}"));
        assert_eq!(unit.stack_name, config.stack_name);
        assert_eq!(unit.output_dir, Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));

        let invocations = runner.invocations();
        let invocation = invocations
            .first()
            .unwrap_or_else(|| panic!("synth should invoke the compiler"));
        assert_eq!(invocation.program, "cdk");
        let command = invocation.command_string();
        assert!(command.contains("cfc.launcher=jenkins-fargate"), "{command}");
        assert!(command.contains("cfc.runtime=FARGATE"), "{command}");
        assert!(command.contains("cfc.tier=public"), "{command}");
        assert!(!command.contains("iamProfile"), "{command}");
    }

    #[test]
    fn failed_synth_surfaces_verbatim_exit_code() {
        let runner = ScriptedRunner::new();
        runner.push_failure(2);
        let synthesizer = CdkSynthesizer::new(runner);
        let mut draft = DeploymentConfig::default();
        draft.runtime = RuntimeKind::Ec2;
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));

        let err = synthesizer
            .build_ec2(&config)
            .expect_err("synth should fail");
        assert!(matches!(err, CompileError::Failed { code: 2, .. }), "{err}");
    }

    #[test]
    fn build_for_runtime_dispatches_on_runtime_kind() {
        let runner = ScriptedRunner::new();
        runner.push_success();
        let synthesizer = CdkSynthesizer::new(runner.clone());
        let mut draft = DeploymentConfig::default();
        draft.runtime = RuntimeKind::Ec2;
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));

        build_for_runtime(&synthesizer, &config)
            .unwrap_or_else(|err| panic!("synth should succeed: {err}"));
        let invocations = runner.invocations();
        let invocation = invocations
            .first()
            .unwrap_or_else(|| panic!("synth should invoke the compiler"));
        assert!(
            invocation.command_string().contains("cfc.launcher=jenkins-ec2"),
            "{}",
            invocation.command_string()
        );
    }
}
