//! Command-line interface definitions for the `cloudforge-deploy` binary.
//!
//! This module centralises the clap parser structure so both the main binary
//! and the build script can reuse it when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `cloudforge-deploy` binary.
///
/// Both arguments are optional: with no arguments the deployer collects its
/// configuration interactively (or resumes from a saved
/// `deployment-context.json`) and presents the deployment menu.
#[derive(Debug, Parser)]
#[command(
    name = "cloudforge-deploy",
    about = "Interactive deployer for Jenkins CI infrastructure on EC2 or Fargate"
)]
pub(crate) struct Cli {
    /// Stack name override.
    ///
    /// Takes precedence over the stack name in a saved deployment context and
    /// skips the stack-name prompt during interactive collection. No other
    /// saved field is overridden.
    #[arg(value_name = "STACK_NAME")]
    pub(crate) stack_name: Option<String>,

    /// Deployment option: 1 = synthesize only, 2 = deploy, 3 = delete
    /// existing stack and redeploy, 4 = cancel.
    ///
    /// When absent the deployer presents a numbered menu; invalid values fall
    /// back to synthesize-only.
    #[arg(value_name = "DEPLOY_OPTION")]
    pub(crate) deploy_option: Option<String>,
}
