//! Deployment strategies and their registry.
//!
//! Each deployment type pairs an interactive collection step, which asks only
//! the questions relevant to that type, with a build step that compiles the
//! configuration into a deployable unit. The registry maps type names to
//! strategies and is the single source of the supported-type list shown in
//! prompts and error messages.

use thiserror::Error;

use crate::config::{
    AuthMode, CAPACITY_BOUNDS, CPU_TARGET_BOUNDS, DeploymentConfig, EC2_INSTANCE_TYPES,
    HEALTH_GRACE_BOUNDS, HEALTH_INTERVAL_BOUNDS, HEALTH_THRESHOLD_BOUNDS, HEALTH_TIMEOUT_BOUNDS,
    LOG_RETENTION_NAMES, MIN_CAPACITY_BOUNDS, NetworkMode, REGION_CHOICES, RuntimeKind,
    SecurityProfile, TopologyKind,
};
use crate::input::Prompt;
use crate::synth::{CompileError, DeployableUnit, TemplateCompiler, build_for_runtime};

/// Errors raised while looking up a deployment strategy.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StrategyError {
    /// Raised when no strategy is registered under the requested name.
    #[error("unknown deployment type {deployment_type}; supported types: {supported}")]
    Unknown {
        /// Name that matched no registered strategy.
        deployment_type: String,
        /// Comma-separated list of registered type names.
        supported: String,
    },
}

/// A deployment type: what to ask for and how to build it.
pub trait Strategy {
    /// Registered name of the deployment type.
    fn name(&self) -> &'static str;

    /// One-line description shown in the type selection menu.
    fn description(&self) -> &'static str;

    /// Collects the type-specific configuration interactively.
    ///
    /// Core fields (stack name, environment, domain) are already populated
    /// when this runs; the strategy fills in everything it owns.
    fn collect(&self, prompts: &mut dyn Prompt, config: &mut DeploymentConfig);

    /// Compiles the collected configuration into a deployable unit.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when synthesis fails or the type has no
    /// synthesis support.
    fn build(
        &self,
        compiler: &dyn TemplateCompiler,
        config: &DeploymentConfig,
    ) -> Result<DeployableUnit, CompileError>;
}

/// Registry of the available deployment strategies, in menu order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Builds the registry of built-in deployment types.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            strategies: vec![
                Box::new(JenkinsStrategy),
                Box::new(S3WebsiteStrategy),
                Box::new(S3WebsiteMailerStrategy),
            ],
        }
    }

    /// Returns the registered type names in menu order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    /// Returns name/description pairs for the selection menu.
    #[must_use]
    pub fn menu(&self) -> Vec<(&'static str, &'static str)> {
        self.strategies
            .iter()
            .map(|strategy| (strategy.name(), strategy.description()))
            .collect()
    }

    /// Looks up a strategy by its registered name.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::Unknown`] when no strategy carries the name.
    pub fn get(&self, name: &str) -> Result<&dyn Strategy, StrategyError> {
        self.strategies
            .iter()
            .find(|strategy| strategy.name() == name)
            .map(|strategy| &**strategy)
            .ok_or_else(|| StrategyError::Unknown {
                deployment_type: name.to_owned(),
                supported: self.names().join(", "),
            })
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Jenkins CI server on EC2 or Fargate.
pub struct JenkinsStrategy;

impl JenkinsStrategy {
    fn collect_capacity(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        config.min_capacity =
            prompts.int_in_range("Minimum instance capacity", config.min_capacity, MIN_CAPACITY_BOUNDS);
        config.max_capacity =
            prompts.int_in_range("Maximum instance capacity", config.max_capacity, CAPACITY_BOUNDS);
        if config.max_capacity > 1 {
            prompts.note("Auto-scaling will be enabled between the configured capacities.");
            config.cpu_target_utilization = prompts.int_in_range(
                "CPU target utilization %",
                config.cpu_target_utilization,
                CPU_TARGET_BOUNDS,
            );
        }
    }

    fn collect_compute(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        if config.runtime == RuntimeKind::Ec2 {
            config.instance_type =
                prompts.choice("EC2 instance type", EC2_INSTANCE_TYPES, &config.instance_type);
        }
        config.cpu =
            prompts.int_in_range("CPU units", config.cpu, config.runtime.cpu_bounds());
        config.memory_mb =
            prompts.int_in_range("Memory (MiB)", config.memory_mb, config.runtime.memory_bounds());
    }

    fn collect_auth(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        let answer = prompts.choice(
            "Authentication mode",
            AuthMode::ALL_NAMES,
            config.auth_mode.as_str(),
        );
        config.auth_mode = AuthMode::parse(&answer).unwrap_or(config.auth_mode);
        if config.auth_mode != AuthMode::None {
            config.sso_instance_arn =
                prompts.required("SSO instance ARN", &config.sso_instance_arn);
            config.sso_group_id = prompts.required("SSO group ID", &config.sso_group_id);
            config.sso_target_account_id =
                prompts.required("SSO target account ID", &config.sso_target_account_id);
        }
    }

    fn collect_network(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        let answer = prompts.choice(
            "Network mode",
            NetworkMode::ALL_NAMES,
            config.network_mode.as_str(),
        );
        config.network_mode = NetworkMode::parse(&answer).unwrap_or(config.network_mode);
        config.waf_enabled = prompts.yes_no("Enable WAF", config.waf_enabled);
        config.cloudfront_enabled =
            prompts.yes_no("Enable CloudFront", config.cloudfront_enabled);
    }

    fn collect_operations(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        config.enable_monitoring =
            prompts.yes_no("Enable monitoring", config.enable_monitoring);
        if config.enable_monitoring {
            let retention = prompts.choice_from_set(
                "Log retention (days)",
                LOG_RETENTION_NAMES,
                &config.log_retention_days.to_string(),
            );
            config.log_retention_days = retention.parse().unwrap_or(config.log_retention_days);
        }
        config.enable_encryption =
            prompts.yes_no("Enable encryption at rest", config.enable_encryption);
    }

    fn collect_health_check(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        let health = &mut config.health_check;
        health.grace_period_seconds = prompts.int_in_range(
            "Health check grace period (seconds)",
            health.grace_period_seconds,
            HEALTH_GRACE_BOUNDS,
        );
        health.interval_seconds = prompts.int_in_range(
            "Health check interval (seconds)",
            health.interval_seconds,
            HEALTH_INTERVAL_BOUNDS,
        );
        health.timeout_seconds = prompts.int_in_range(
            "Health check timeout (seconds)",
            health.timeout_seconds,
            HEALTH_TIMEOUT_BOUNDS,
        );
        health.healthy_threshold = prompts.int_in_range(
            "Healthy threshold count",
            health.healthy_threshold,
            HEALTH_THRESHOLD_BOUNDS,
        );
        health.unhealthy_threshold = prompts.int_in_range(
            "Unhealthy threshold count",
            health.unhealthy_threshold,
            HEALTH_THRESHOLD_BOUNDS,
        );
    }
}

impl Strategy for JenkinsStrategy {
    fn name(&self) -> &'static str {
        "jenkins"
    }

    fn description(&self) -> &'static str {
        "Jenkins CI server on EC2 or Fargate"
    }

    fn collect(&self, prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        let runtime =
            prompts.choice("Runtime", RuntimeKind::ALL_NAMES, config.runtime.as_str());
        config.runtime = RuntimeKind::parse(&runtime).unwrap_or(config.runtime);

        let topology = prompts.choice(
            "Topology",
            &[
                TopologyKind::JenkinsSingleNode.as_str(),
                TopologyKind::JenkinsService.as_str(),
            ],
            config.topology.as_str(),
        );
        config.topology = TopologyKind::parse(&topology).unwrap_or(config.topology);

        let security = prompts.choice(
            "Security profile",
            SecurityProfile::ALL_NAMES,
            config.security_profile.as_str(),
        );
        config.security_profile =
            SecurityProfile::parse(&security).unwrap_or(config.security_profile);

        Self::collect_capacity(prompts, config);
        Self::collect_compute(prompts, config);
        Self::collect_auth(prompts, config);
        Self::collect_network(prompts, config);
        Self::collect_operations(prompts, config);
        Self::collect_health_check(prompts, config);

        config.region = prompts.choice(
            "AWS region",
            REGION_CHOICES,
            region_default(&config.region),
        );
    }

    fn build(
        &self,
        compiler: &dyn TemplateCompiler,
        config: &DeploymentConfig,
    ) -> Result<DeployableUnit, CompileError> {
        build_for_runtime(compiler, config)
    }
}

fn region_default(current: &str) -> &str {
    if REGION_CHOICES.contains(&current) {
        current
    } else {
        REGION_CHOICES.first().copied().unwrap_or("us-east-1")
    }
}

/// Static website served from S3. Synthesis support is not wired up yet.
pub struct S3WebsiteStrategy;

impl Strategy for S3WebsiteStrategy {
    fn name(&self) -> &'static str {
        "s3-website"
    }

    fn description(&self) -> &'static str {
        "Static website hosted on S3"
    }

    fn collect(&self, prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        collect_website(prompts, config);
    }

    fn build(
        &self,
        _compiler: &dyn TemplateCompiler,
        _config: &DeploymentConfig,
    ) -> Result<DeployableUnit, CompileError> {
        Err(CompileError::Unsupported {
            deployment_type: self.name().to_owned(),
        })
    }
}

/// Static website with a contact-form mailer. Synthesis support is not wired
/// up yet.
pub struct S3WebsiteMailerStrategy;

impl Strategy for S3WebsiteMailerStrategy {
    fn name(&self) -> &'static str {
        "s3-website-mailer"
    }

    fn description(&self) -> &'static str {
        "Static website on S3 with a contact-form mailer"
    }

    fn collect(&self, prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
        collect_website(prompts, config);
    }

    fn build(
        &self,
        _compiler: &dyn TemplateCompiler,
        _config: &DeploymentConfig,
    ) -> Result<DeployableUnit, CompileError> {
        Err(CompileError::Unsupported {
            deployment_type: self.name().to_owned(),
        })
    }
}

fn collect_website(prompts: &mut dyn Prompt, config: &mut DeploymentConfig) {
    config.topology = TopologyKind::S3Website;
    config.cloudfront_enabled =
        prompts.yes_no("Enable CloudFront", config.cloudfront_enabled);
    config.region = prompts.choice(
        "AWS region",
        REGION_CHOICES,
        region_default(&config.region),
    );
}
