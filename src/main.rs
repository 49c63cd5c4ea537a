//! Binary entry point for the CloudForge interactive deployer.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use cloudforge_deploy::{
    Ambient, CapturingCommandRunner, CdkSynthesizer, ConsoleInput, DEFAULT_OUTPUT_DIR,
    LifecycleError, LifecycleController, Prompt, Prompter, ResolveError, Resolver, SidecarStore,
    StrategyError, StrategyRegistry, StreamingCommandRunner,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("{0}")]
    Strategy(#[from] StrategyError),
    #[error("deployment failed: {0}")]
    Lifecycle(#[from] LifecycleError),
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<i32, CliError> {
    let registry = StrategyRegistry::builtin();
    let store = SidecarStore::new(Utf8PathBuf::from("."));
    let resolver = Resolver::new(&registry, &store, Ambient::from_env());

    let mut prompts = Prompter::new(ConsoleInput, io::stdout());
    prompts.note("CloudForge interactive deployer");
    prompts.note("");

    let resolution = resolver.resolve(&mut prompts, cli.stack_name.as_deref())?;
    let strategy = registry.get(&resolution.config.deployment_type)?;

    // Synthesis output is captured for error reporting; the deploy itself
    // streams to the console so stack progress is visible live.
    let compiler = CdkSynthesizer::new(CapturingCommandRunner);
    let runner = StreamingCommandRunner;
    let controller =
        LifecycleController::new(&runner, &store, Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
    controller.run(
        &mut prompts,
        strategy,
        &compiler,
        &resolution.config,
        cli.deploy_option.as_deref(),
    )?;

    Ok(0)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
