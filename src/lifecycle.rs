//! Deployment lifecycle: action menu, stack deletion, cleanup, synthesis,
//! and deploy.
//!
//! The controller drives one run end to end after resolution. Deletion of an
//! existing stack is best-effort: every step of it warns and continues on
//! failure so a missing or half-deleted stack never blocks the redeploy.
//! Synthesis and deploy failures are fatal and surface the external tool's
//! exit code verbatim.

use std::ffi::OsString;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DeploymentConfig, RuntimeKind};
use crate::input::Prompt;
use crate::process::{CommandRunner, ProcessError};
use crate::sidecar::{SidecarDocument, SidecarStore};
use crate::strategy::Strategy;
use crate::synth::{CompileError, DeployableUnit, TemplateCompiler};

/// Errors raised while driving the deployment lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Raised when template synthesis fails.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Raised when the deploy tool cannot be invoked.
    #[error("failed to invoke the deploy tool")]
    Spawn(#[from] ProcessError),
    /// Raised when the deploy exits with a non-zero code.
    #[error("deployment of stack {stack_name} failed with exit code {code}")]
    DeployFailed {
        /// Stack that failed to deploy.
        stack_name: String,
        /// Verbatim exit code from the deploy tool.
        code: i32,
    },
    /// Raised when the deploy terminates without an exit status.
    #[error("deployment of stack {stack_name} terminated without an exit status")]
    DeployNoExitStatus {
        /// Stack that failed to deploy.
        stack_name: String,
    },
}

/// Top-level action chosen for a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DeployChoice {
    /// Synthesize the templates and stop.
    #[default]
    SynthOnly,
    /// Synthesize and deploy.
    Deploy,
    /// Delete any existing stack first, then synthesize and deploy.
    DeleteAndRedeploy,
    /// Do nothing.
    Cancel,
}

impl DeployChoice {
    /// Parses a menu answer ("1" through "4").
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::SynthOnly),
            "2" => Some(Self::Deploy),
            "3" => Some(Self::DeleteAndRedeploy),
            "4" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Post-deletion cleanup action.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum CleanupChoice {
    DeleteSidecar,
    EmptyBuildDir,
    #[default]
    KeepAll,
}

impl CleanupChoice {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::DeleteSidecar),
            "2" => Some(Self::EmptyBuildDir),
            "3" => Some(Self::KeepAll),
            _ => None,
        }
    }
}

/// Result of a completed lifecycle run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The run was cancelled before any action.
    Cancelled,
    /// Templates were synthesized; no deploy was requested.
    Synthesized(DeployableUnit),
    /// The stack was deployed.
    Deployed(DeployableUnit),
}

/// Drives one deployment run against the external tooling.
pub struct LifecycleController<'a, R> {
    runner: &'a R,
    store: &'a SidecarStore,
    aws_bin: String,
    cdk_bin: String,
    build_dir: Utf8PathBuf,
}

impl<'a, R: CommandRunner> LifecycleController<'a, R> {
    /// Creates a controller over the given runner and sidecar store, using
    /// the `aws` and `cdk` binaries found on the path.
    #[must_use]
    pub fn new(runner: &'a R, store: &'a SidecarStore, build_dir: Utf8PathBuf) -> Self {
        Self {
            runner,
            store,
            aws_bin: String::from("aws"),
            cdk_bin: String::from("cdk"),
            build_dir,
        }
    }

    /// Overrides the AWS CLI binary.
    #[must_use]
    pub fn with_aws_bin(mut self, aws_bin: impl Into<String>) -> Self {
        self.aws_bin = aws_bin.into();
        self
    }

    /// Overrides the deploy tool binary.
    #[must_use]
    pub fn with_cdk_bin(mut self, cdk_bin: impl Into<String>) -> Self {
        self.cdk_bin = cdk_bin.into();
        self
    }

    /// Runs the lifecycle for a resolved configuration.
    ///
    /// `choice_arg` is the pre-selected menu option from the command line;
    /// when absent or invalid the action menu is shown.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when synthesis or deploy fails. Stack
    /// deletion and cleanup never fail the run.
    pub fn run(
        &self,
        prompts: &mut dyn Prompt,
        strategy: &dyn Strategy,
        compiler: &dyn TemplateCompiler,
        config: &DeploymentConfig,
        choice_arg: Option<&str>,
    ) -> Result<Outcome, LifecycleError> {
        print_summary(prompts, config);
        let choice = self.select_action(prompts, choice_arg);

        if choice == DeployChoice::Cancel {
            prompts.note("Cancelled; nothing was changed.");
            return Ok(Outcome::Cancelled);
        }

        if choice == DeployChoice::DeleteAndRedeploy {
            self.delete_stack(prompts, config);
        }

        self.save_sidecar(prompts, config);

        let unit = strategy.build(compiler, config)?;
        info!(stack = %unit.stack_name, output_dir = %unit.output_dir, "templates synthesized");

        if choice == DeployChoice::SynthOnly {
            prompts.note(&format!("Templates written to {}", unit.output_dir));
            return Ok(Outcome::Synthesized(unit));
        }

        self.deploy(&unit)?;
        prompts.note(&format!("Stack {} deployed.", unit.stack_name));
        Ok(Outcome::Deployed(unit))
    }

    fn select_action(&self, prompts: &mut dyn Prompt, choice_arg: Option<&str>) -> DeployChoice {
        if let Some(arg) = choice_arg {
            if let Some(choice) = DeployChoice::parse(arg) {
                return choice;
            }
            warn!(value = %arg, "invalid deploy option argument, showing the menu");
        }

        prompts.note("What would you like to do?");
        prompts.note("  1. Synthesize templates only (default)");
        prompts.note("  2. Synthesize and deploy");
        prompts.note("  3. Delete the existing stack, then redeploy");
        prompts.note("  4. Cancel");
        let answer = prompts.raw("Choose an option [1]: ").unwrap_or_default();
        if answer.trim().is_empty() {
            return DeployChoice::SynthOnly;
        }
        DeployChoice::parse(&answer).unwrap_or_else(|| {
            prompts.note("Invalid option, synthesizing only.");
            DeployChoice::SynthOnly
        })
    }

    /// Deletes the existing stack. Every step is best-effort.
    fn delete_stack(&self, prompts: &mut dyn Prompt, config: &DeploymentConfig) {
        let stack = config.stack_name.as_str();
        if !self.aws_step(config, &["cloudformation", "describe-stacks", "--stack-name", stack]) {
            prompts.note(&format!("Stack {stack} does not exist; skipping deletion."));
            return;
        }

        prompts.note(&format!("Deleting stack {stack}..."));
        let deleted =
            self.aws_step(config, &["cloudformation", "delete-stack", "--stack-name", stack]);
        let waited = self.aws_step(
            config,
            &["cloudformation", "wait", "stack-delete-complete", "--stack-name", stack],
        );

        if deleted && waited {
            prompts.note(&format!("Stack {stack} deleted."));
            self.cleanup(prompts);
        } else {
            warn!(stack, "stack deletion did not complete cleanly, continuing with redeploy");
            prompts.note("Stack deletion did not complete cleanly; continuing anyway.");
        }
    }

    /// Runs one AWS CLI step, reporting success as a bool.
    fn aws_step(&self, config: &DeploymentConfig, args: &[&str]) -> bool {
        let mut full_args: Vec<OsString> = args.iter().map(OsString::from).collect();
        full_args.push(OsString::from("--region"));
        full_args.push(OsString::from(config.region.clone()));

        match self.runner.run(&self.aws_bin, &full_args) {
            Ok(output) if output.is_success() => true,
            Ok(output) => {
                warn!(
                    args = args.join(" "),
                    code = output.code,
                    stderr = output.stderr.trim(),
                    "aws command failed"
                );
                false
            }
            Err(err) => {
                warn!(args = args.join(" "), error = %err, "aws command could not be started");
                false
            }
        }
    }

    fn cleanup(&self, prompts: &mut dyn Prompt) {
        prompts.note("Clean up leftover files?");
        prompts.note("  1. Delete the saved deployment configuration");
        prompts.note("  2. Empty the build output directory");
        prompts.note("  3. Keep everything (default)");
        let answer = prompts.raw("Choose an option [3]: ").unwrap_or_default();
        let choice = CleanupChoice::parse(&answer).unwrap_or_default();

        match choice {
            CleanupChoice::DeleteSidecar => match self.store.delete() {
                Ok(true) => prompts.note("Saved configuration deleted."),
                Ok(false) => prompts.note("No saved configuration to delete."),
                Err(err) => {
                    warn!(error = %err, "failed to delete the saved configuration");
                    prompts.note("Could not delete the saved configuration; keeping it.");
                }
            },
            CleanupChoice::EmptyBuildDir => match empty_dir(&self.build_dir) {
                Ok(removed) => {
                    prompts.note(&format!(
                        "Removed {removed} entries from {}.",
                        self.build_dir
                    ));
                }
                Err(err) => {
                    warn!(dir = %self.build_dir, error = %err, "failed to empty the build directory");
                    prompts.note("Could not empty the build directory; keeping it.");
                }
            },
            CleanupChoice::KeepAll => prompts.note("Keeping all files."),
        }
    }

    /// Persists the resolved configuration. A write failure is logged but
    /// never blocks the run.
    fn save_sidecar(&self, prompts: &mut dyn Prompt, config: &DeploymentConfig) {
        match self.store.save(&SidecarDocument::capture(config)) {
            Ok(path) => prompts.note(&format!("Deployment configuration saved to {path}.")),
            Err(err) => {
                warn!(error = %err, "failed to save the deployment configuration");
                prompts.note("Could not save the deployment configuration; continuing.");
            }
        }
    }

    fn deploy(&self, unit: &DeployableUnit) -> Result<(), LifecycleError> {
        let args = vec![
            OsString::from("deploy"),
            OsString::from(unit.stack_name.clone()),
            OsString::from("--app"),
            OsString::from(unit.output_dir.as_str()),
            OsString::from("--require-approval"),
            OsString::from("never"),
        ];

        info!(stack = %unit.stack_name, "deploying");
        let output = self.runner.run(&self.cdk_bin, &args)?;
        if output.is_success() {
            return Ok(());
        }
        match output.code {
            Some(code) => Err(LifecycleError::DeployFailed {
                stack_name: unit.stack_name.clone(),
                code,
            }),
            None => Err(LifecycleError::DeployNoExitStatus {
                stack_name: unit.stack_name.clone(),
            }),
        }
    }
}

fn print_summary(prompts: &mut dyn Prompt, config: &DeploymentConfig) {
    prompts.note("Deployment summary:");
    prompts.note(&format!("  Stack:            {}", config.stack_name));
    prompts.note(&format!("  Environment:      {}", config.environment));
    prompts.note(&format!("  Type:             {}", config.deployment_type));
    prompts.note(&format!("  Runtime:          {}", config.runtime));
    prompts.note(&format!("  Topology:         {}", config.topology));
    prompts.note(&format!(
        "  Security profile: {} (IAM {})",
        config.security_profile, config.iam_profile
    ));
    if config.domain.is_empty() {
        prompts.note("  Domain:           (none)");
    } else {
        prompts.note(&format!(
            "  Domain:           {}.{} (SSL {})",
            config.subdomain,
            config.domain,
            if config.enable_ssl { "on" } else { "off" }
        ));
    }
    prompts.note(&format!(
        "  Network:          {} (WAF {}, CloudFront {})",
        config.network_mode, config.waf_enabled, config.cloudfront_enabled
    ));
    prompts.note(&format!(
        "  Capacity:         {}-{} (auto-scaling {}, CPU target {}%)",
        config.min_capacity,
        config.max_capacity,
        if config.auto_scaling { "on" } else { "off" },
        config.cpu_target_utilization
    ));
    if config.runtime == RuntimeKind::Ec2 {
        prompts.note(&format!("  Instance type:    {}", config.instance_type));
    }
    prompts.note(&format!(
        "  Sizing:           {} CPU units, {} MiB",
        config.cpu, config.memory_mb
    ));
    prompts.note(&format!("  Auth:             {}", config.auth_mode));
    prompts.note(&format!(
        "  Operations:       monitoring {}, encryption {}, log retention {}d",
        config.enable_monitoring, config.enable_encryption, config.log_retention_days
    ));
    prompts.note(&format!(
        "  Health check:     grace {}s, every {}s, timeout {}s, {}/{} thresholds",
        config.health_check.grace_period_seconds,
        config.health_check.interval_seconds,
        config.health_check.timeout_seconds,
        config.health_check.healthy_threshold,
        config.health_check.unhealthy_threshold
    ));
    prompts.note(&format!("  Region:           {}", config.region));
}

/// Removes every entry of `dir_path`, returning how many were removed.
/// A missing directory counts as already empty.
fn empty_dir(dir_path: &Utf8Path) -> io::Result<u32> {
    let dir = match Dir::open_ambient_dir(dir_path, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err),
    };

    let mut removed = 0;
    for next in dir.entries()? {
        let entry = next?;
        let name = entry.file_name()?;
        if entry.file_type()?.is_dir() {
            dir.remove_dir_all(&name)?;
        } else {
            dir.remove_file(&name)?;
        }
        removed += 1;
    }
    Ok(removed)
}
