//! Core library for the CloudForge interactive deployer.
//!
//! The crate resolves a deployment configuration from saved state, command
//! line, prompts, and ambient hints, then drives the deployment lifecycle
//! (synthesize → deploy, with optional delete-and-redeploy) through external
//! CDK and AWS tooling behind test-friendly seams.

pub mod config;
pub mod iam;
pub mod input;
pub mod lifecycle;
pub mod process;
pub mod resolver;
pub mod sidecar;
pub mod strategy;
pub mod synth;
pub mod test_support;

pub use config::{
    DEFAULT_STACK_NAME, DeploymentConfig, Environment, HealthCheck, NetworkMode, RuntimeKind,
    SecurityProfile, TopologyKind, ValidationError,
};
pub use iam::IamProfile;
pub use input::{ConsoleInput, InputSource, Prompt, Prompter};
pub use lifecycle::{DeployChoice, LifecycleController, LifecycleError, Outcome};
pub use process::{
    CapturingCommandRunner, CommandOutput, CommandRunner, ProcessError, StreamingCommandRunner,
};
pub use resolver::{Ambient, Resolution, ResolveError, Resolver};
pub use sidecar::{SIDECAR_FILE_NAME, SidecarDocument, SidecarError, SidecarStore};
pub use strategy::{JenkinsStrategy, Strategy, StrategyError, StrategyRegistry};
pub use synth::{
    CdkSynthesizer, CompileError, DEFAULT_OUTPUT_DIR, DeployableUnit, TemplateCompiler,
    build_for_runtime,
};
