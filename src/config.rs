//! Canonical deployment configuration: typed model, defaults, validation,
//! and normalisation.
//!
//! A [`DeploymentConfig`] is assembled by the resolver from whichever sources
//! are available, then sealed with [`DeploymentConfig::validated`] before it
//! reaches the lifecycle controller. Validation fails fast on the first field
//! outside its admissible range or set, naming the field, the offending
//! value, and the bound. Derived fields (auto-scaling, IAM profile) are
//! recomputed during validation and never trusted from any source.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::iam::IamProfile;

/// Default stack name offered by the interactive prompt.
pub const DEFAULT_STACK_NAME: &str = "my-cloudforge-stack";

/// Network tier recorded in the template-compiler context.
pub const NETWORK_TIER: &str = "public";

/// EC2 instance types offered by the interactive prompt. The first entry is
/// the default.
pub const EC2_INSTANCE_TYPES: &[&str] = &[
    "t3.micro",
    "t3.small",
    "t3.medium",
    "t3.large",
    "t3.xlarge",
    "t3.2xlarge",
];

/// Admissible log retention periods, in days.
pub const LOG_RETENTION_CHOICES: &[u32] = &[1, 3, 7, 14, 30, 60, 90, 120, 150, 180, 365];

/// String form of [`LOG_RETENTION_CHOICES`], for prompts.
pub const LOG_RETENTION_NAMES: &[&str] = &[
    "1", "3", "7", "14", "30", "60", "90", "120", "150", "180", "365",
];

/// Regions offered by the interactive prompt. The first entry is the default.
pub const REGION_CHOICES: &[&str] = &["us-east-1", "us-west-2", "eu-west-1", "ap-southeast-1"];

/// Inclusive bounds for a numeric configuration field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bounds {
    /// Smallest admissible value.
    pub min: u32,
    /// Largest admissible value.
    pub max: u32,
}

impl Bounds {
    /// Returns `true` when `value` lies inside the bounds.
    #[must_use]
    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(self, field: &'static str, value: u32) -> Result<(), ValidationError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Bounds for the minimum instance capacity prompt.
pub const MIN_CAPACITY_BOUNDS: Bounds = Bounds { min: 1, max: 10 };
/// Bounds for instance capacity as enforced by validation (1 ≤ min ≤ max ≤ 20).
pub const CAPACITY_BOUNDS: Bounds = Bounds { min: 1, max: 20 };
/// Bounds for the CPU target utilisation percentage.
pub const CPU_TARGET_BOUNDS: Bounds = Bounds { min: 10, max: 90 };
/// Bounds for the health check grace period, in seconds.
pub const HEALTH_GRACE_BOUNDS: Bounds = Bounds { min: 60, max: 900 };
/// Bounds for the health check interval, in seconds.
pub const HEALTH_INTERVAL_BOUNDS: Bounds = Bounds { min: 5, max: 300 };
/// Bounds for the health check timeout, in seconds.
pub const HEALTH_TIMEOUT_BOUNDS: Bounds = Bounds { min: 2, max: 60 };
/// Bounds for the healthy and unhealthy threshold counts.
pub const HEALTH_THRESHOLD_BOUNDS: Bounds = Bounds { min: 1, max: 10 };

/// Deployment environment tag.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Environment {
    /// Development environment.
    #[default]
    Dev,
    /// Staging environment.
    Staging,
    /// Production environment.
    Prod,
}

impl Environment {
    /// All admissible values in prompt order.
    pub const ALL: [Self; 3] = [Self::Dev, Self::Staging, Self::Prod];

    /// Canonical names in prompt order.
    pub const ALL_NAMES: &'static [&'static str] = &["dev", "staging", "prod"];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Compute runtime backing the deployment. The two variants are mutually
/// exclusive and select distinct template-compiler entry points.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RuntimeKind {
    /// Container runtime on Fargate.
    #[default]
    Fargate,
    /// Virtual machine runtime on EC2.
    Ec2,
}

impl RuntimeKind {
    /// All admissible values in prompt order.
    pub const ALL: [Self; 2] = [Self::Fargate, Self::Ec2];

    /// Canonical names in prompt order.
    pub const ALL_NAMES: &'static [&'static str] = &["FARGATE", "EC2"];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fargate => "FARGATE",
            Self::Ec2 => "EC2",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Admissible CPU units for this runtime.
    #[must_use]
    pub const fn cpu_bounds(self) -> Bounds {
        Bounds {
            min: 256,
            max: 4096,
        }
    }

    /// Admissible memory sizes for this runtime, in megabytes.
    #[must_use]
    pub const fn memory_bounds(self) -> Bounds {
        Bounds {
            min: 512,
            max: 8192,
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Topology shape provisioned by the template compiler.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TopologyKind {
    /// A single Jenkins controller node.
    JenkinsSingleNode,
    /// A load-balanced Jenkins service.
    #[default]
    JenkinsService,
    /// A static website served from object storage.
    S3Website,
}

impl TopologyKind {
    /// All admissible values.
    pub const ALL: [Self; 3] = [Self::JenkinsSingleNode, Self::JenkinsService, Self::S3Website];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JenkinsSingleNode => "JENKINS_SINGLE_NODE",
            Self::JenkinsService => "JENKINS_SERVICE",
            Self::S3Website => "S3_WEBSITE",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Security posture, ordered from laxest to strictest.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SecurityProfile {
    /// Relaxed controls for development.
    Dev,
    /// Intermediate controls for staging.
    #[default]
    Staging,
    /// Strict controls for production.
    Production,
}

impl SecurityProfile {
    /// All admissible values in prompt order.
    pub const ALL: [Self; 3] = [Self::Dev, Self::Staging, Self::Production];

    /// Canonical names in prompt order.
    pub const ALL_NAMES: &'static [&'static str] = &["DEV", "STAGING", "PRODUCTION"];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "DEV",
            Self::Staging => "STAGING",
            Self::Production => "PRODUCTION",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Ordinal strictness, higher means stricter operational controls.
    #[must_use]
    pub const fn strictness(self) -> u8 {
        match self {
            Self::Dev => 0,
            Self::Staging => 1,
            Self::Production => 2,
        }
    }
}

impl fmt::Display for SecurityProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Network exposure mode for the deployment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NetworkMode {
    /// Public subnets without NAT gateways.
    #[default]
    PublicNoNat,
    /// Private subnets behind NAT gateways.
    PrivateWithNat,
}

impl NetworkMode {
    /// All admissible values in prompt order.
    pub const ALL: [Self; 2] = [Self::PublicNoNat, Self::PrivateWithNat];

    /// Canonical names in prompt order.
    pub const ALL_NAMES: &'static [&'static str] = &["public-no-nat", "private-with-nat"];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PublicNoNat => "public-no-nat",
            Self::PrivateWithNat => "private-with-nat",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Authentication mode for the deployed service.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AuthMode {
    /// No authentication in front of the service.
    #[default]
    None,
    /// OIDC authentication terminated at the load balancer.
    AlbOidc,
    /// OIDC authentication handled by Jenkins itself.
    JenkinsOidc,
}

impl AuthMode {
    /// All admissible values in prompt order.
    pub const ALL: [Self; 3] = [Self::None, Self::AlbOidc, Self::JenkinsOidc];

    /// Canonical names in prompt order.
    pub const ALL_NAMES: &'static [&'static str] = &["none", "alb-oidc", "jenkins-oidc"];

    /// Canonical string form used in prompts and the sidecar document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::AlbOidc => "alb-oidc",
            Self::JenkinsOidc => "jenkins-oidc",
        }
    }

    /// Parses the canonical form, ignoring ASCII case and surrounding space.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Health check tuple applied to the deployed service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HealthCheck {
    /// Grace period before the first check, in seconds.
    pub grace_period_seconds: u32,
    /// Interval between checks, in seconds.
    pub interval_seconds: u32,
    /// Per-check timeout, in seconds. Must be shorter than the interval.
    pub timeout_seconds: u32,
    /// Consecutive successes required to mark an instance healthy.
    pub healthy_threshold: u32,
    /// Consecutive failures required to mark an instance unhealthy.
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            grace_period_seconds: 300,
            interval_seconds: 30,
            timeout_seconds: 5,
            healthy_threshold: 2,
            unhealthy_threshold: 3,
        }
    }
}

/// Canonical resolved configuration for one deployment run.
///
/// Instances are produced by the resolver and sealed by
/// [`DeploymentConfig::validated`]; the lifecycle controller receives the
/// result by value and never mutates it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentConfig {
    /// Unique stack name, user-chosen or defaulted.
    pub stack_name: String,
    /// Environment tag.
    pub environment: Environment,
    /// Registry key of the strategy that collects and deploys this config.
    pub deployment_type: String,
    /// Custom domain, empty when none is configured.
    pub domain: String,
    /// Subdomain under `domain`, empty when none is configured.
    pub subdomain: String,
    /// Whether to provision a TLS certificate. Forced off when `domain` is
    /// empty: TLS is meaningless without a domain to certify.
    pub enable_ssl: bool,
    /// Compute runtime.
    pub runtime: RuntimeKind,
    /// Topology shape.
    pub topology: TopologyKind,
    /// Security posture.
    pub security_profile: SecurityProfile,
    /// IAM capability profile derived from `security_profile`. Never
    /// persisted; recomputed on every validation so the pair cannot drift.
    pub iam_profile: IamProfile,
    /// Network exposure mode.
    pub network_mode: NetworkMode,
    /// Whether the web application firewall is enabled.
    pub waf_enabled: bool,
    /// Whether the CDN distribution is enabled.
    pub cloudfront_enabled: bool,
    /// Minimum instance capacity.
    pub min_capacity: u32,
    /// Maximum instance capacity.
    pub max_capacity: u32,
    /// CPU target utilisation percentage; meaningful only when auto-scaling.
    pub cpu_target_utilization: u32,
    /// Derived auto-scaling flag: true iff `max_capacity > 1`.
    pub auto_scaling: bool,
    /// EC2 instance type; meaningful only when `runtime` is EC2.
    pub instance_type: String,
    /// Compute units allocated to the service.
    pub cpu: u32,
    /// Memory allocated to the service, in megabytes.
    pub memory_mb: u32,
    /// Authentication mode.
    pub auth_mode: AuthMode,
    /// SSO instance ARN; required when `auth_mode` is not `none`.
    pub sso_instance_arn: String,
    /// SSO group identifier; required when `auth_mode` is not `none`.
    pub sso_group_id: String,
    /// SSO target account identifier; required when `auth_mode` is not `none`.
    pub sso_target_account_id: String,
    /// Whether monitoring is enabled.
    pub enable_monitoring: bool,
    /// Whether encryption at rest is enabled.
    pub enable_encryption: bool,
    /// Log retention in days, one of [`LOG_RETENTION_CHOICES`].
    pub log_retention_days: u32,
    /// Target region.
    pub region: String,
    /// Health check settings.
    pub health_check: HealthCheck,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            stack_name: String::from(DEFAULT_STACK_NAME),
            environment: Environment::Dev,
            deployment_type: String::from("jenkins"),
            domain: String::new(),
            subdomain: String::new(),
            enable_ssl: false,
            runtime: RuntimeKind::Fargate,
            topology: TopologyKind::JenkinsService,
            security_profile: SecurityProfile::Staging,
            iam_profile: IamProfile::for_security(SecurityProfile::Staging),
            network_mode: NetworkMode::PublicNoNat,
            waf_enabled: false,
            cloudfront_enabled: false,
            min_capacity: 1,
            max_capacity: 3,
            cpu_target_utilization: 60,
            auto_scaling: true,
            instance_type: String::from("t3.micro"),
            cpu: 1024,
            memory_mb: 2048,
            auth_mode: AuthMode::None,
            sso_instance_arn: String::new(),
            sso_group_id: String::new(),
            sso_target_account_id: String::new(),
            enable_monitoring: true,
            enable_encryption: true,
            log_retention_days: 7,
            region: String::from("us-east-1"),
            health_check: HealthCheck::default(),
        }
    }
}

impl DeploymentConfig {
    /// Normalises derived fields and checks every invariant, consuming the
    /// draft and returning the canonical configuration.
    ///
    /// Normalisation happens first so a saved document claiming
    /// `enableSsl=true` with an empty domain resolves to SSL off rather than
    /// a validation failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered, identifying the
    /// field, the offending value, and the admissible range or set.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.normalize();
        self.check_fields()?;
        self.check_cross_rules()?;
        Ok(self)
    }

    /// Recomputes every derived field from its source of truth.
    fn normalize(&mut self) {
        if self.domain.trim().is_empty() {
            self.domain.clear();
            self.subdomain.clear();
            self.enable_ssl = false;
        }
        self.auto_scaling = self.max_capacity > 1;
        self.iam_profile = IamProfile::for_security(self.security_profile);
    }

    fn check_fields(&self) -> Result<(), ValidationError> {
        if self.stack_name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                field: "stackName",
            });
        }
        CAPACITY_BOUNDS.check("minInstanceCapacity", self.min_capacity)?;
        CAPACITY_BOUNDS.check("maxInstanceCapacity", self.max_capacity)?;
        CPU_TARGET_BOUNDS.check("cpuTargetUtilization", self.cpu_target_utilization)?;
        self.runtime.cpu_bounds().check("cpu", self.cpu)?;
        self.runtime.memory_bounds().check("memory", self.memory_mb)?;
        if self.runtime == RuntimeKind::Ec2
            && !EC2_INSTANCE_TYPES.contains(&self.instance_type.as_str())
        {
            return Err(ValidationError::InvalidChoice {
                field: "instanceType",
                value: self.instance_type.clone(),
                allowed: EC2_INSTANCE_TYPES.join(", "),
            });
        }
        if !LOG_RETENTION_CHOICES.contains(&self.log_retention_days) {
            return Err(ValidationError::InvalidChoice {
                field: "logRetentionDays",
                value: self.log_retention_days.to_string(),
                allowed: LOG_RETENTION_CHOICES
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
        if self.region.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "region" });
        }
        HEALTH_GRACE_BOUNDS.check("healthCheckGracePeriod", self.health_check.grace_period_seconds)?;
        HEALTH_INTERVAL_BOUNDS.check("healthCheckInterval", self.health_check.interval_seconds)?;
        HEALTH_TIMEOUT_BOUNDS.check("healthCheckTimeout", self.health_check.timeout_seconds)?;
        HEALTH_THRESHOLD_BOUNDS.check("healthyThreshold", self.health_check.healthy_threshold)?;
        HEALTH_THRESHOLD_BOUNDS.check("unhealthyThreshold", self.health_check.unhealthy_threshold)?;
        Ok(())
    }

    fn check_cross_rules(&self) -> Result<(), ValidationError> {
        if self.min_capacity > self.max_capacity {
            return Err(ValidationError::CapacityOrder {
                min: self.min_capacity,
                max: self.max_capacity,
            });
        }
        if self.health_check.timeout_seconds >= self.health_check.interval_seconds {
            return Err(ValidationError::HealthCheckTiming {
                timeout: self.health_check.timeout_seconds,
                interval: self.health_check.interval_seconds,
            });
        }
        if self.auth_mode != AuthMode::None {
            self.check_auth_field("ssoInstanceArn", &self.sso_instance_arn)?;
            self.check_auth_field("ssoGroupId", &self.sso_group_id)?;
            self.check_auth_field("ssoTargetAccountId", &self.sso_target_account_id)?;
        }
        Ok(())
    }

    fn check_auth_field(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingAuthField {
                field,
                auth_mode: self.auth_mode,
            });
        }
        Ok(())
    }

    /// Flat string map handed to the template compiler and mirrored into the
    /// sidecar document. Auth linkage keys appear only when an auth mode is
    /// active; the EC2 instance type only for the EC2 runtime. The derived
    /// IAM profile is deliberately absent.
    #[must_use]
    pub fn context_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        let mut put = |key: &str, value: String| {
            entries.insert(String::from(key), value);
        };
        put("env", self.environment.to_string());
        put("tier", String::from(NETWORK_TIER));
        put("deploymentType", self.deployment_type.clone());
        put("runtime", self.runtime.to_string());
        put("topology", self.topology.to_string());
        put("securityProfile", self.security_profile.to_string());
        put("stackName", self.stack_name.clone());
        put("domain", self.domain.clone());
        put("subdomain", self.subdomain.clone());
        put("enableSsl", self.enable_ssl.to_string());
        put("networkMode", self.network_mode.to_string());
        put("wafEnabled", self.waf_enabled.to_string());
        put("cloudfrontEnabled", self.cloudfront_enabled.to_string());
        put("minInstanceCapacity", self.min_capacity.to_string());
        put("maxInstanceCapacity", self.max_capacity.to_string());
        put("cpuTargetUtilization", self.cpu_target_utilization.to_string());
        put("enableAutoScaling", self.auto_scaling.to_string());
        if self.runtime == RuntimeKind::Ec2 {
            put("instanceType", self.instance_type.clone());
        }
        put("cpu", self.cpu.to_string());
        put("memory", self.memory_mb.to_string());
        put("authMode", self.auth_mode.to_string());
        put("enableMonitoring", self.enable_monitoring.to_string());
        put("enableEncryption", self.enable_encryption.to_string());
        put("logRetentionDays", self.log_retention_days.to_string());
        put("region", self.region.clone());
        put("healthCheckGracePeriod", self.health_check.grace_period_seconds.to_string());
        put("healthCheckInterval", self.health_check.interval_seconds.to_string());
        put("healthCheckTimeout", self.health_check.timeout_seconds.to_string());
        put("healthyThreshold", self.health_check.healthy_threshold.to_string());
        put("unhealthyThreshold", self.health_check.unhealthy_threshold.to_string());
        if self.auth_mode != AuthMode::None {
            put("ssoInstanceArn", self.sso_instance_arn.clone());
            put("ssoGroupId", self.sso_group_id.clone());
            put("ssoTargetAccountId", self.sso_target_account_id.clone());
        }
        entries
    }
}

/// Errors raised while validating a draft configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// Raised when a required string field is empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Raised when a numeric field lies outside its admissible range.
    #[error("{field} is {value}; admissible range is {min}-{max}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: u32,
        /// Smallest admissible value.
        min: u32,
        /// Largest admissible value.
        max: u32,
    },
    /// Raised when a field is not a member of its enumerated set.
    #[error("{field} is {value:?}; admissible values are {allowed}")]
    InvalidChoice {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: String,
        /// Comma-separated admissible values.
        allowed: String,
    },
    /// Raised when the minimum capacity exceeds the maximum.
    #[error("minInstanceCapacity {min} exceeds maxInstanceCapacity {max}")]
    CapacityOrder {
        /// Configured minimum capacity.
        min: u32,
        /// Configured maximum capacity.
        max: u32,
    },
    /// Raised when the health check timeout is not shorter than the interval.
    #[error("healthCheckTimeout {timeout}s must be shorter than healthCheckInterval {interval}s")]
    HealthCheckTiming {
        /// Configured timeout, in seconds.
        timeout: u32,
        /// Configured interval, in seconds.
        interval: u32,
    },
    /// Raised when an identity linkage field is empty under an active auth
    /// mode.
    #[error("{field} is required when authMode is {auth_mode}")]
    MissingAuthField {
        /// Name of the offending field.
        field: &'static str,
        /// Active authentication mode.
        auth_mode: AuthMode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_validates() {
        let config = DeploymentConfig::default()
            .validated()
            .unwrap_or_else(|err| panic!("default config should validate: {err}"));
        assert_eq!(config.max_capacity, 3);
        assert!(config.auto_scaling);
        assert_eq!(config.iam_profile, IamProfile::Standard);
    }

    #[test]
    fn empty_domain_forces_ssl_off() {
        let mut draft = DeploymentConfig::default();
        draft.enable_ssl = true;
        draft.subdomain = String::from("ci");
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));
        assert!(!config.enable_ssl);
        assert!(config.subdomain.is_empty());
    }

    #[test]
    fn non_empty_domain_preserves_requested_ssl() {
        let mut draft = DeploymentConfig::default();
        draft.domain = String::from("example.com");
        draft.subdomain = String::from("ci");
        draft.enable_ssl = true;
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));
        assert!(config.enable_ssl);
        assert_eq!(config.subdomain, "ci");
    }

    #[test]
    fn auto_scaling_follows_max_capacity_exhaustively() {
        for max in 1..=20_u32 {
            for min in 1..=max {
                let mut draft = DeploymentConfig::default();
                draft.min_capacity = min;
                draft.max_capacity = max;
                let config = draft
                    .validated()
                    .unwrap_or_else(|err| panic!("{min}-{max} should validate: {err}"));
                assert_eq!(config.auto_scaling, max > 1, "min={min} max={max}");
            }
        }
    }

    #[test]
    fn capacity_order_is_enforced() {
        let mut draft = DeploymentConfig::default();
        draft.min_capacity = 5;
        draft.max_capacity = 2;
        let err = draft.validated().expect_err("min > max should fail");
        assert_eq!(err, ValidationError::CapacityOrder { min: 5, max: 2 });
    }

    #[rstest]
    #[case(0, "minInstanceCapacity")]
    #[case(21, "minInstanceCapacity")]
    fn capacity_bounds_are_enforced(#[case] min: u32, #[case] field: &'static str) {
        let mut draft = DeploymentConfig::default();
        draft.min_capacity = min;
        draft.max_capacity = 20;
        let err = draft.validated().expect_err("capacity should be rejected");
        let ValidationError::OutOfRange {
            field: reported, value, min: low, max: high,
        } = err
        else {
            panic!("expected OutOfRange");
        };
        assert_eq!(reported, field);
        assert_eq!(value, min);
        assert_eq!((low, high), (1, 20));
    }

    #[test]
    fn health_check_timeout_must_undercut_interval() {
        let mut draft = DeploymentConfig::default();
        draft.health_check.timeout_seconds = 30;
        draft.health_check.interval_seconds = 30;
        let err = draft.validated().expect_err("timeout == interval should fail");
        assert_eq!(
            err,
            ValidationError::HealthCheckTiming {
                timeout: 30,
                interval: 30,
            }
        );
    }

    #[test]
    fn auth_fields_required_only_under_active_mode() {
        let mut draft = DeploymentConfig::default();
        draft.auth_mode = AuthMode::AlbOidc;
        let err = draft.clone().validated().expect_err("missing SSO fields");
        assert!(matches!(
            err,
            ValidationError::MissingAuthField {
                field: "ssoInstanceArn",
                ..
            }
        ));

        draft.auth_mode = AuthMode::None;
        draft
            .validated()
            .unwrap_or_else(|err2| panic!("none mode needs no SSO fields: {err2}"));
    }

    #[test]
    fn auth_fields_survive_validation_under_none_mode() {
        let mut draft = DeploymentConfig::default();
        draft.sso_group_id = String::from("group-1");
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));
        assert_eq!(config.sso_group_id, "group-1");
    }

    #[test]
    fn invalid_instance_type_names_field_value_and_set() {
        let mut draft = DeploymentConfig::default();
        draft.runtime = RuntimeKind::Ec2;
        draft.instance_type = String::from("m5.enormous");
        let err = draft.validated().expect_err("unknown instance type");
        let message = err.to_string();
        assert!(message.contains("instanceType"), "{message}");
        assert!(message.contains("m5.enormous"), "{message}");
        assert!(message.contains("t3.micro"), "{message}");
    }

    #[test]
    fn instance_type_is_ignored_for_fargate() {
        let mut draft = DeploymentConfig::default();
        draft.instance_type = String::from("m5.enormous");
        draft
            .validated()
            .unwrap_or_else(|err| panic!("fargate ignores instance type: {err}"));
    }

    #[test]
    fn context_entries_gate_conditional_keys() {
        let mut draft = DeploymentConfig::default();
        draft.runtime = RuntimeKind::Ec2;
        draft.auth_mode = AuthMode::AlbOidc;
        draft.sso_instance_arn = String::from("arn:aws:sso:::instance/x");
        draft.sso_group_id = String::from("g");
        draft.sso_target_account_id = String::from("123456789012");
        let config = draft
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));
        let entries = config.context_entries();
        assert_eq!(entries.get("instanceType").map(String::as_str), Some("t3.micro"));
        assert_eq!(entries.get("ssoGroupId").map(String::as_str), Some("g"));
        assert!(!entries.contains_key("iamProfile"));

        let plain = DeploymentConfig::default()
            .validated()
            .unwrap_or_else(|err| panic!("config should validate: {err}"));
        let plain_entries = plain.context_entries();
        assert!(!plain_entries.contains_key("instanceType"));
        assert!(!plain_entries.contains_key("ssoInstanceArn"));
    }

    #[test]
    fn name_lists_match_their_enums() {
        assert_eq!(
            Environment::ALL.map(Environment::as_str).as_slice(),
            Environment::ALL_NAMES
        );
        assert_eq!(
            RuntimeKind::ALL.map(RuntimeKind::as_str).as_slice(),
            RuntimeKind::ALL_NAMES
        );
        assert_eq!(
            SecurityProfile::ALL.map(SecurityProfile::as_str).as_slice(),
            SecurityProfile::ALL_NAMES
        );
        assert_eq!(
            NetworkMode::ALL.map(NetworkMode::as_str).as_slice(),
            NetworkMode::ALL_NAMES
        );
        assert_eq!(AuthMode::ALL.map(AuthMode::as_str).as_slice(), AuthMode::ALL_NAMES);
        let retention_names: Vec<String> = LOG_RETENTION_CHOICES
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(retention_names, LOG_RETENTION_NAMES);
    }

    #[rstest]
    #[case("dev", Some(Environment::Dev))]
    #[case("PROD", Some(Environment::Prod))]
    #[case(" staging ", Some(Environment::Staging))]
    #[case("qa", None)]
    fn environment_parse_is_case_insensitive(
        #[case] input: &str,
        #[case] expected: Option<Environment>,
    ) {
        assert_eq!(Environment::parse(input), expected);
    }
}
