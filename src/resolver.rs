//! Configuration resolution.
//!
//! The resolver assembles one [`DeploymentConfig`] per run from the available
//! sources, in precedence order: an explicit stack-name override from the
//! command line, the saved sidecar document, interactive prompts, ambient
//! environment hints, and finally the built-in defaults. A readable sidecar
//! replaces the interactive session wholesale; the command-line override
//! applies to the stack name only and never reaches any other field.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{DEFAULT_STACK_NAME, DeploymentConfig, Environment, ValidationError};
use crate::input::Prompt;
use crate::sidecar::{SidecarDocument, SidecarStore};
use crate::strategy::{StrategyError, StrategyRegistry};

/// Errors raised while resolving a deployment configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Raised when the requested deployment type has no registered strategy.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    /// Raised when the assembled configuration fails validation.
    #[error("invalid deployment configuration: {0}")]
    Validation(#[from] ValidationError),
}

/// Ambient environment hints consulted when no stronger source provides a
/// value.
#[derive(Clone, Debug, Default)]
pub struct Ambient {
    /// Default region, typically from `CDK_DEFAULT_REGION`.
    pub default_region: Option<String>,
}

impl Ambient {
    /// Reads the ambient hints from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            default_region: std::env::var("CDK_DEFAULT_REGION")
                .ok()
                .map(|region| region.trim().to_owned())
                .filter(|region| !region.is_empty()),
        }
    }
}

/// Outcome of a resolution run.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// Validated configuration for this run.
    pub config: DeploymentConfig,
    /// Whether the configuration came from a saved sidecar document.
    pub from_sidecar: bool,
}

/// Assembles and validates the configuration for one deployment run.
pub struct Resolver<'a> {
    registry: &'a StrategyRegistry,
    store: &'a SidecarStore,
    ambient: Ambient,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given registry, sidecar store, and ambient
    /// hints.
    #[must_use]
    pub const fn new(
        registry: &'a StrategyRegistry,
        store: &'a SidecarStore,
        ambient: Ambient,
    ) -> Self {
        Self {
            registry,
            store,
            ambient,
        }
    }

    /// Resolves the configuration for this run.
    ///
    /// A readable sidecar wins over the interactive session; an unreadable
    /// one is logged and ignored so a corrupt file never blocks a deploy.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the configured deployment type is
    /// unknown or the assembled configuration fails validation.
    pub fn resolve(
        &self,
        prompts: &mut dyn Prompt,
        stack_override: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        match self.load_sidecar() {
            Some(document) => self.resolve_saved(prompts, &document, stack_override),
            None => self.resolve_interactive(prompts, stack_override),
        }
    }

    fn load_sidecar(&self) -> Option<SidecarDocument> {
        match self.store.load() {
            Ok(document) => document,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable sidecar, collecting interactively");
                None
            }
        }
    }

    fn resolve_saved(
        &self,
        prompts: &mut dyn Prompt,
        document: &SidecarDocument,
        stack_override: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        prompts.note(&format!(
            "Using saved deployment configuration from {}",
            self.store.path()
        ));

        let mut draft = document.restore();
        if let Some(name) = stack_override {
            draft.stack_name = name.to_owned();
        }
        if draft.region.trim().is_empty()
            && let Some(region) = &self.ambient.default_region
        {
            draft.region = region.clone();
        }

        // The saved type must still be deployable with this binary.
        self.registry.get(&draft.deployment_type)?;

        let config = draft.validated()?;
        info!(
            stack = %config.stack_name,
            deployment_type = %config.deployment_type,
            "resolved configuration from sidecar"
        );
        Ok(Resolution {
            config,
            from_sidecar: true,
        })
    }

    fn resolve_interactive(
        &self,
        prompts: &mut dyn Prompt,
        stack_override: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let mut draft = DeploymentConfig::default();
        if let Some(region) = &self.ambient.default_region {
            draft.region = region.clone();
        }

        draft.stack_name = match stack_override {
            Some(name) => name.to_owned(),
            None => prompts.required("Stack name", DEFAULT_STACK_NAME),
        };

        let environment =
            prompts.choice("Environment", Environment::ALL_NAMES, draft.environment.as_str());
        draft.environment = Environment::parse(&environment).unwrap_or(draft.environment);

        for (name, description) in self.registry.menu() {
            prompts.note(&format!("  {name}: {description}"));
        }
        let names = self.registry.names();
        let chosen = prompts.choice("Deployment type", &names, &draft.deployment_type);
        // Resolve the strategy before asking anything type-specific, so an
        // unknown type is rejected without collecting a single answer.
        let strategy = self.registry.get(&chosen)?;
        draft.deployment_type = chosen;

        draft.domain = prompts.optional("Custom domain (empty for none)", "");
        if !draft.domain.trim().is_empty() {
            draft.subdomain = prompts.optional("Subdomain", "");
            draft.enable_ssl = prompts.yes_no("Enable SSL certificate", true);
        }

        strategy.collect(prompts, &mut draft);

        let config = draft.validated()?;
        info!(
            stack = %config.stack_name,
            deployment_type = %config.deployment_type,
            "resolved configuration interactively"
        );
        Ok(Resolution {
            config,
            from_sidecar: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuntimeKind, SecurityProfile};
    use crate::iam::IamProfile;
    use crate::input::Prompter;
    use crate::sidecar::SIDECAR_FILE_NAME;
    use crate::test_support::ScriptedInput;
    use camino::Utf8PathBuf;
    use cap_std::{ambient_authority, fs_utf8::Dir};
    use tempfile::TempDir;

    fn prompter(lines: &[&str]) -> Prompter<ScriptedInput, Vec<u8>> {
        Prompter::new(ScriptedInput::new(lines), Vec::new())
    }

    fn temp_store(tmp: &TempDir) -> SidecarStore {
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp path should be utf8: {}", path.display()));
        SidecarStore::new(dir)
    }

    fn resolver_parts() -> (StrategyRegistry, TempDir) {
        let registry = StrategyRegistry::builtin();
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        (registry, tmp)
    }

    fn save_config(store: &SidecarStore, config: &DeploymentConfig) {
        store
            .save(&SidecarDocument::capture(config))
            .unwrap_or_else(|err| panic!("save: {err}"));
    }

    #[test]
    fn saved_sidecar_wins_over_prompts() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let mut saved = DeploymentConfig::default();
        saved.stack_name = String::from("saved-stack");
        saved.runtime = RuntimeKind::Ec2;
        saved.security_profile = SecurityProfile::Production;
        let saved = saved
            .validated()
            .unwrap_or_else(|err| panic!("saved config should validate: {err}"));
        save_config(&store, &saved);

        let resolver = Resolver::new(&registry, &store, Ambient::default());
        // No scripted answers at all: the sidecar path must not prompt.
        let mut prompts = prompter(&[]);
        let resolution = resolver
            .resolve(&mut prompts, None)
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        assert!(resolution.from_sidecar);
        assert_eq!(resolution.config, saved);
        assert_eq!(resolution.config.iam_profile, IamProfile::Minimal);
    }

    #[test]
    fn stack_override_applies_only_to_the_stack_name() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let mut saved = DeploymentConfig::default();
        saved.stack_name = String::from("saved-stack");
        saved.runtime = RuntimeKind::Ec2;
        let saved = saved
            .validated()
            .unwrap_or_else(|err| panic!("saved config should validate: {err}"));
        save_config(&store, &saved);

        let resolver = Resolver::new(&registry, &store, Ambient::default());
        let mut prompts = prompter(&[]);
        let resolution = resolver
            .resolve(&mut prompts, Some("cli-stack"))
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        assert_eq!(resolution.config.stack_name, "cli-stack");
        assert_eq!(resolution.config.runtime, RuntimeKind::Ec2);
    }

    #[test]
    fn saved_unknown_deployment_type_is_rejected() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let document = SidecarDocument {
            stack_name: String::from("saved-stack"),
            context: [(String::from("deploymentType"), String::from("lambda"))]
                .into_iter()
                .collect(),
        };
        store.save(&document).unwrap_or_else(|err| panic!("save: {err}"));

        let resolver = Resolver::new(&registry, &store, Ambient::default());
        let mut prompts = prompter(&[]);
        let err = resolver
            .resolve(&mut prompts, None)
            .expect_err("unknown type should fail");
        assert!(matches!(err, ResolveError::Strategy(_)), "{err}");
    }

    #[test]
    fn unreadable_sidecar_falls_back_to_interactive() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let dir_path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp path should be utf8: {}", path.display()));
        let dir = Dir::open_ambient_dir(&dir_path, ambient_authority())
            .unwrap_or_else(|err| panic!("open dir: {err}"));
        dir.write(SIDECAR_FILE_NAME, "{not json")
            .unwrap_or_else(|err| panic!("seed sidecar: {err}"));

        let resolver = Resolver::new(&registry, &store, Ambient::default());
        let mut prompts = prompter(&[]);
        let resolution = resolver
            .resolve(&mut prompts, None)
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        assert!(!resolution.from_sidecar);
        assert_eq!(resolution.config.stack_name, DEFAULT_STACK_NAME);
    }

    #[test]
    fn interactive_defaults_resolve_without_a_sidecar() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let resolver = Resolver::new(&registry, &store, Ambient::default());
        let mut prompts = prompter(&[]);

        let resolution = resolver
            .resolve(&mut prompts, None)
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        assert!(!resolution.from_sidecar);
        let config = &resolution.config;
        assert_eq!(config.stack_name, DEFAULT_STACK_NAME);
        assert_eq!(config.deployment_type, "jenkins");
        assert_eq!(config.runtime, RuntimeKind::Fargate);
        assert_eq!(config.region, "us-east-1");
        assert!(config.domain.is_empty());
        assert!(!config.enable_ssl);
    }

    #[test]
    fn interactive_session_collects_an_ec2_production_stack() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let resolver = Resolver::new(&registry, &store, Ambient::default());
        // Stack from the command line; prod environment, jenkins type, no
        // domain, EC2 runtime, default topology, PRODUCTION security,
        // capacities 1..5, then defaults to the end.
        let mut prompts = prompter(&[
            "prod",
            "jenkins",
            "",
            "EC2",
            "",
            "PRODUCTION",
            "1",
            "5",
        ]);

        let resolution = resolver
            .resolve(&mut prompts, Some("demo"))
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        let config = &resolution.config;
        assert_eq!(config.stack_name, "demo");
        assert_eq!(config.environment, Environment::Prod);
        assert_eq!(config.runtime, RuntimeKind::Ec2);
        assert_eq!(config.security_profile, SecurityProfile::Production);
        assert_eq!(config.iam_profile, IamProfile::Minimal);
        assert_eq!(config.min_capacity, 1);
        assert_eq!(config.max_capacity, 5);
        assert!(config.auto_scaling);
        assert_eq!(config.instance_type, "t3.micro");
    }

    #[test]
    fn interactive_session_collects_a_fixed_size_dev_stack() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let resolver = Resolver::new(&registry, &store, Ambient::default());
        // Default environment and type, no domain, EC2 runtime, default
        // topology, DEV security, fixed capacity 1..1 (no scaling prompt),
        // default instance type and everything after it.
        let mut prompts = prompter(&["", "", "", "EC2", "", "DEV", "1", "1"]);

        let resolution = resolver
            .resolve(&mut prompts, Some("demo"))
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        let config = &resolution.config;
        assert_eq!(config.stack_name, "demo");
        assert_eq!(config.runtime, RuntimeKind::Ec2);
        assert_eq!(config.security_profile, SecurityProfile::Dev);
        assert_eq!(config.iam_profile, IamProfile::Extended);
        assert_eq!((config.min_capacity, config.max_capacity), (1, 1));
        assert!(!config.auto_scaling);
        assert_eq!(config.cpu_target_utilization, 60);
        assert_eq!(config.instance_type, "t3.micro");
    }

    #[test]
    fn ambient_region_seeds_the_interactive_default() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let ambient = Ambient {
            default_region: Some(String::from("eu-west-1")),
        };
        let resolver = Resolver::new(&registry, &store, ambient);
        let mut prompts = prompter(&[]);

        let resolution = resolver
            .resolve(&mut prompts, None)
            .unwrap_or_else(|err| panic!("resolve: {err}"));
        assert_eq!(resolution.config.region, "eu-west-1");
    }

    #[test]
    fn persisted_ssl_claim_without_domain_resolves_off() {
        let (registry, tmp) = resolver_parts();
        let store = temp_store(&tmp);
        let document = SidecarDocument {
            stack_name: String::from("saved-stack"),
            context: [(String::from("enableSsl"), String::from("true"))]
                .into_iter()
                .collect(),
        };
        store.save(&document).unwrap_or_else(|err| panic!("save: {err}"));

        let resolver = Resolver::new(&registry, &store, Ambient::default());
        let mut prompts = prompter(&[]);
        let resolution = resolver
            .resolve(&mut prompts, None)
            .unwrap_or_else(|err| panic!("resolve: {err}"));

        assert!(resolution.from_sidecar);
        assert!(!resolution.config.enable_ssl);
    }
}
