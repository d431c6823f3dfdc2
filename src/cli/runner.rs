//! Runner: turns parsed arguments into validated configuration and drives the engine

use crate::cli::args::{Args, Command, PurgeArgs, UnarchiveArgs};
use crate::cli::config::{
    AuthConfig, FailurePolicy, PurgeConfig, RegistryConfig, UnarchiveConfig,
};
use crate::common::traits::{StdoutAudit, Validatable};
use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::purge::{Purger, cutoff_from};
use crate::registry::auth::{display_host, login_url};
use crate::registry::{RegistryApi, RegistryClientBuilder};
use chrono::Utc;
use std::sync::Arc;

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, output })
    }

    pub fn output(&self) -> &Logger {
        &self.output
    }

    pub async fn run(&self) -> Result<()> {
        let registry_config = self.registry_config()?;
        let auth_config = self.auth_config()?;

        match &self.args.command {
            Command::Purge(purge_args) => {
                // Age and filter are checked before any registry call.
                let config = self.purge_config(purge_args)?;
                let purger = self.purger(&registry_config, auth_config).await?;
                purger.purge(&config).await?;
            }
            Command::Unarchive(unarchive_args) => {
                let config = self.unarchive_config(unarchive_args)?;
                let purger = self.purger(&registry_config, auth_config).await?;
                purger.unarchive(&config).await?;
            }
        }

        self.output.success(&format!(
            "Completed in {}",
            self.output.format_duration(self.output.elapsed())
        ));
        Ok(())
    }

    fn registry_config(&self) -> Result<RegistryConfig> {
        if self.args.registry.trim().is_empty() {
            return Err(PurgeError::Config(
                "A registry name is required (--registry)".to_string(),
            ));
        }
        let config = RegistryConfig::new(login_url(&self.args.registry))
            .with_skip_tls(self.args.skip_tls)
            .with_timeout(self.args.timeout);
        config.validate()?;
        Ok(config)
    }

    fn auth_config(&self) -> Result<Option<AuthConfig>> {
        let auth = match (&self.args.token, &self.args.username, &self.args.password) {
            (Some(token), None, None) => AuthConfig::Token(token.clone()),
            (Some(_), _, _) => {
                return Err(PurgeError::Config(
                    "A token cannot be combined with username and password".to_string(),
                ));
            }
            (None, Some(username), Some(password)) => {
                AuthConfig::basic(username.clone(), password.clone())
            }
            (None, None, None) => return Ok(None),
            _ => {
                return Err(PurgeError::Config(
                    "Username and password must be given together".to_string(),
                ));
            }
        };
        auth.validate()?;
        Ok(Some(auth))
    }

    fn purge_config(&self, args: &PurgeArgs) -> Result<PurgeConfig> {
        let cutoff = cutoff_from(&args.ago, Utc::now())?;
        let failure_policy = if args.continue_on_error {
            FailurePolicy::Continue
        } else {
            FailurePolicy::FailFast
        };

        let config = PurgeConfig::new(args.repository.clone(), cutoff)
            .with_filter(args.filter.clone())
            .with_archive_repository(args.archive_repository.clone())
            .with_page_size(args.page_size)
            .with_failure_policy(failure_policy)
            .with_dangling_only(args.dangling);
        config.validate()?;
        Ok(config)
    }

    fn unarchive_config(&self, args: &UnarchiveArgs) -> Result<UnarchiveConfig> {
        let config = UnarchiveConfig::new(args.archive_repository.clone(), args.reference.clone())
            .with_tag_name(args.tag_name.clone())
            .with_repository(args.repository.clone());
        config.validate()?;
        Ok(config)
    }

    async fn purger(
        &self,
        registry_config: &RegistryConfig,
        auth_config: Option<AuthConfig>,
    ) -> Result<Purger> {
        self.output
            .detail(&format!("Registry: {}", registry_config.login_url));
        if registry_config.skip_tls {
            self.output
                .warning("TLS certificate verification is disabled");
        }
        if auth_config.is_some() {
            self.output.step("Using provided credentials");
        } else {
            self.output
                .step("No credentials provided - attempting anonymous access");
        }

        let client = RegistryClientBuilder::from_config(registry_config)
            .with_auth(auth_config)
            .with_logger(self.output.clone())
            .build()?;

        client.test_connectivity().await?;
        self.output.verbose("Registry connectivity verified");

        let registry: Arc<dyn RegistryApi> = Arc::new(client);
        Ok(Purger::new(registry, Arc::new(StdoutAudit::new()), self.output.clone())
            .with_login_url(display_host(&registry_config.login_url)))
    }
}
