//! Sidecar persistence for the resolved deployment configuration.
//!
//! The sidecar is a flat JSON document (`deployment-context.json`) holding
//! the stack name and a string-typed context block mirroring every
//! configuration field. Reads are forward compatible: missing keys take the
//! configuration defaults and malformed values fall back to the default with
//! a warning, so documents written by older versions keep loading. The
//! derived IAM profile is never written; it is recomputed from the persisted
//! security profile on every load.

use std::collections::BTreeMap;
use std::io;

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{
    AuthMode, DeploymentConfig, Environment, HealthCheck, NetworkMode, RuntimeKind,
    SecurityProfile, TopologyKind,
};

/// File name of the persisted deployment context.
pub const SIDECAR_FILE_NAME: &str = "deployment-context.json";

/// Errors raised while reading or writing the sidecar document.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// Raised when file system operations fail.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when the document cannot be parsed at all.
    #[error("failed to parse {path}: {message}")]
    Malformed {
        /// Path that could not be parsed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// On-disk shape of the sidecar document.
///
/// All context values are strings ("true"/"false" for booleans); the encoder
/// takes care of escaping embedded quotes.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SidecarDocument {
    /// Stack name of the persisted run.
    #[serde(rename = "stackName", default)]
    pub stack_name: String,
    /// Flat key/value block mirroring the configuration fields.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}

impl SidecarDocument {
    /// Captures a validated configuration into its persistable form.
    #[must_use]
    pub fn capture(config: &DeploymentConfig) -> Self {
        Self {
            stack_name: config.stack_name.clone(),
            context: config.context_entries(),
        }
    }

    /// Restores a draft configuration from the document.
    ///
    /// Every field is reparsed with the same parsers as interactive input;
    /// the caller re-validates the draft, which also re-derives the IAM
    /// profile from the restored security profile. Missing or malformed keys
    /// take the field default.
    #[must_use]
    pub fn restore(&self) -> DeploymentConfig {
        let defaults = DeploymentConfig::default();
        let ctx = &self.context;

        let stack_name = if self.stack_name.trim().is_empty() {
            self.string_field("stackName", &defaults.stack_name)
        } else {
            self.stack_name.clone()
        };

        let health_check = HealthCheck {
            grace_period_seconds: self.u32_field(
                "healthCheckGracePeriod",
                defaults.health_check.grace_period_seconds,
            ),
            interval_seconds: self
                .u32_field("healthCheckInterval", defaults.health_check.interval_seconds),
            timeout_seconds: self
                .u32_field("healthCheckTimeout", defaults.health_check.timeout_seconds),
            healthy_threshold: self
                .u32_field("healthyThreshold", defaults.health_check.healthy_threshold),
            unhealthy_threshold: self
                .u32_field("unhealthyThreshold", defaults.health_check.unhealthy_threshold),
        };

        DeploymentConfig {
            stack_name,
            environment: self.enum_field("env", Environment::parse, defaults.environment),
            deployment_type: self.string_field("deploymentType", &defaults.deployment_type),
            domain: ctx.get("domain").cloned().unwrap_or_default(),
            subdomain: ctx.get("subdomain").cloned().unwrap_or_default(),
            enable_ssl: self.bool_field("enableSsl", defaults.enable_ssl),
            runtime: self.enum_field("runtime", RuntimeKind::parse, defaults.runtime),
            topology: self.enum_field("topology", TopologyKind::parse, defaults.topology),
            security_profile: self.enum_field(
                "securityProfile",
                SecurityProfile::parse,
                defaults.security_profile,
            ),
            iam_profile: defaults.iam_profile,
            network_mode: self.enum_field("networkMode", NetworkMode::parse, defaults.network_mode),
            waf_enabled: self.bool_field("wafEnabled", defaults.waf_enabled),
            cloudfront_enabled: self.bool_field("cloudfrontEnabled", defaults.cloudfront_enabled),
            min_capacity: self.u32_field("minInstanceCapacity", defaults.min_capacity),
            max_capacity: self.u32_field("maxInstanceCapacity", defaults.max_capacity),
            cpu_target_utilization: self
                .u32_field("cpuTargetUtilization", defaults.cpu_target_utilization),
            auto_scaling: defaults.auto_scaling,
            instance_type: self.string_field("instanceType", &defaults.instance_type),
            cpu: self.u32_field("cpu", defaults.cpu),
            memory_mb: self.u32_field("memory", defaults.memory_mb),
            auth_mode: self.enum_field("authMode", AuthMode::parse, defaults.auth_mode),
            sso_instance_arn: ctx.get("ssoInstanceArn").cloned().unwrap_or_default(),
            sso_group_id: ctx.get("ssoGroupId").cloned().unwrap_or_default(),
            sso_target_account_id: ctx.get("ssoTargetAccountId").cloned().unwrap_or_default(),
            enable_monitoring: self.bool_field("enableMonitoring", defaults.enable_monitoring),
            enable_encryption: self.bool_field("enableEncryption", defaults.enable_encryption),
            log_retention_days: self.u32_field("logRetentionDays", defaults.log_retention_days),
            region: self.string_field("region", &defaults.region),
            health_check,
        }
    }

    fn string_field(&self, key: &str, default: &str) -> String {
        self.context.get(key).map_or_else(
            || {
                debug!(key, default, "sidecar key absent, using default");
                default.to_owned()
            },
            Clone::clone,
        )
    }

    fn u32_field(&self, key: &str, default: u32) -> u32 {
        let Some(raw) = self.context.get(key) else {
            debug!(key, default, "sidecar key absent, using default");
            return default;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default, "malformed sidecar value, using default");
            default
        })
    }

    fn bool_field(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.context.get(key) else {
            debug!(key, default, "sidecar key absent, using default");
            return default;
        };
        match raw.trim() {
            value if value.eq_ignore_ascii_case("true") => true,
            value if value.eq_ignore_ascii_case("false") => false,
            value => {
                warn!(key, %value, default, "malformed sidecar value, using default");
                default
            }
        }
    }

    fn enum_field<T: Copy + std::fmt::Display>(
        &self,
        key: &str,
        parse: fn(&str) -> Option<T>,
        default: T,
    ) -> T {
        let Some(raw) = self.context.get(key) else {
            debug!(key, %default, "sidecar key absent, using default");
            return default;
        };
        parse(raw).unwrap_or_else(|| {
            warn!(key, value = %raw, %default, "malformed sidecar value, using default");
            default
        })
    }
}

/// Reads and writes the sidecar document in a fixed directory.
#[derive(Clone, Debug)]
pub struct SidecarStore {
    dir: Utf8PathBuf,
}

impl SidecarStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub const fn new(dir: Utf8PathBuf) -> Self {
        Self { dir }
    }

    /// Full path of the sidecar file, for messages.
    #[must_use]
    pub fn path(&self) -> Utf8PathBuf {
        self.dir.join(SIDECAR_FILE_NAME)
    }

    fn open_dir(&self) -> Result<Dir, SidecarError> {
        Dir::open_ambient_dir(&self.dir, ambient_authority()).map_err(|err| SidecarError::Io {
            path: self.dir.clone(),
            message: err.to_string(),
        })
    }

    /// Loads the persisted document, returning `None` when no sidecar exists.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::Io`] when the file cannot be read and
    /// [`SidecarError::Malformed`] when it cannot be parsed at all.
    pub fn load(&self) -> Result<Option<SidecarDocument>, SidecarError> {
        let dir = match Dir::open_ambient_dir(&self.dir, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SidecarError::Io {
                    path: self.dir.clone(),
                    message: err.to_string(),
                });
            }
        };

        let contents = match dir.read_to_string(SIDECAR_FILE_NAME) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SidecarError::Io {
                    path: self.path(),
                    message: err.to_string(),
                });
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|err| SidecarError::Malformed {
                path: self.path(),
                message: err.to_string(),
            })
    }

    /// Writes the document, replacing any previous sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError`] when the directory cannot be opened or the
    /// file cannot be written.
    pub fn save(&self, document: &SidecarDocument) -> Result<Utf8PathBuf, SidecarError> {
        let rendered =
            serde_json::to_string_pretty(document).map_err(|err| SidecarError::Malformed {
                path: self.path(),
                message: err.to_string(),
            })?;

        let dir = self.open_dir()?;
        dir.write(SIDECAR_FILE_NAME, rendered)
            .map_err(|err| SidecarError::Io {
                path: self.path(),
                message: err.to_string(),
            })?;
        Ok(self.path())
    }

    /// Deletes the sidecar file. Returns `false` when none existed.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::Io`] when the file exists but cannot be
    /// removed.
    pub fn delete(&self) -> Result<bool, SidecarError> {
        let dir = match Dir::open_ambient_dir(&self.dir, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(err) => {
                return Err(SidecarError::Io {
                    path: self.dir.clone(),
                    message: err.to_string(),
                });
            }
        };

        match dir.remove_file(SIDECAR_FILE_NAME) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(SidecarError::Io {
                path: self.path(),
                message: err.to_string(),
            }),
        }
    }
}
