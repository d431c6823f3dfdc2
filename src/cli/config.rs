//! Configuration management module
//!
//! Immutable configuration values handed to each engine entry point. They are
//! assembled and validated once by the runner before any registry call.

use crate::common::traits::Validatable;
use crate::error::{PurgeError, Result};
use crate::purge::filter::TagSelector;
use crate::registry::api::DEFAULT_PAGE_SIZE;
use chrono::{DateTime, Utc};

/// Page sizes the registry accepts
pub const MAX_PAGE_SIZE: usize = 1000;

/// Authentication configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Basic { username: String, password: String },
    Token(String),
}

impl AuthConfig {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Validatable for AuthConfig {
    type Error = PurgeError;

    fn validate(&self) -> Result<()> {
        match self {
            AuthConfig::Basic { username, password } => {
                if username.is_empty() {
                    return Err(PurgeError::Config("Username cannot be empty".to_string()));
                }
                if password.is_empty() {
                    return Err(PurgeError::Config("Password cannot be empty".to_string()));
                }
            }
            AuthConfig::Token(token) => {
                if token.is_empty() {
                    return Err(PurgeError::Config("Token cannot be empty".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Registry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub login_url: String,
    pub skip_tls: bool,
    pub timeout: u64,
}

impl RegistryConfig {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            skip_tls: false,
            timeout: 300,
        }
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Validatable for RegistryConfig {
    type Error = PurgeError;

    fn validate(&self) -> Result<()> {
        if self.login_url.is_empty() {
            return Err(PurgeError::Config(
                "Registry name cannot be empty".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(PurgeError::Config(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a run does when one item of a page fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop after the failing page; the first error is the run's result
    #[default]
    FailFast,
    /// Log the failure and keep going; the run fails at the end if anything failed
    Continue,
}

/// Purge run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeConfig {
    pub repository: String,
    /// Tags last updated strictly before this instant are eligible
    pub cutoff: DateTime<Utc>,
    pub filter: Option<String>,
    pub archive_repository: Option<String>,
    pub page_size: usize,
    pub failure_policy: FailurePolicy,
    /// Skip the tag pass and only sweep dangling manifests
    pub dangling_only: bool,
}

impl PurgeConfig {
    pub fn new(repository: impl Into<String>, cutoff: DateTime<Utc>) -> Self {
        Self {
            repository: repository.into(),
            cutoff,
            filter: None,
            archive_repository: None,
            page_size: DEFAULT_PAGE_SIZE,
            failure_policy: FailurePolicy::FailFast,
            dangling_only: false,
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    pub fn with_archive_repository(mut self, archive_repository: Option<String>) -> Self {
        self.archive_repository = archive_repository.filter(|a| !a.is_empty());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_dangling_only(mut self, dangling_only: bool) -> Self {
        self.dangling_only = dangling_only;
        self
    }
}

impl Validatable for PurgeConfig {
    type Error = PurgeError;

    fn validate(&self) -> Result<()> {
        if self.repository.is_empty() {
            return Err(PurgeError::Config(
                "Repository cannot be empty".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(PurgeError::Config(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.archive_repository.as_deref() == Some(self.repository.as_str()) {
            return Err(PurgeError::Config(
                "Archive repository must differ from the purged repository".to_string(),
            ));
        }
        TagSelector::new(self.filter.as_deref(), self.cutoff)?;
        Ok(())
    }
}

/// Unarchive configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnarchiveConfig {
    pub archive_repository: String,
    pub reference: String,
    pub tag_name: Option<String>,
    /// Overrides the repository recorded in the archive record
    pub repository: Option<String>,
}

impl UnarchiveConfig {
    pub fn new(archive_repository: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            archive_repository: archive_repository.into(),
            reference: reference.into(),
            tag_name: None,
            repository: None,
        }
    }

    pub fn with_tag_name(mut self, tag_name: Option<String>) -> Self {
        self.tag_name = tag_name.filter(|t| !t.is_empty());
        self
    }

    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository.filter(|r| !r.is_empty());
        self
    }
}

impl Validatable for UnarchiveConfig {
    type Error = PurgeError;

    fn validate(&self) -> Result<()> {
        if self.archive_repository.is_empty() {
            return Err(PurgeError::Config(
                "Archive repository cannot be empty".to_string(),
            ));
        }
        crate::digest::DigestUtils::extract_hex_part(&self.reference)?;
        Ok(())
    }
}
