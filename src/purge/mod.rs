//! Retention engine
//!
//! A purge run walks the tags of one repository page by page, deletes (or
//! archives) the ones selected by age and name, then sweeps the manifests no tag
//! points at any more. Pages are processed strictly one after another; the items
//! of one page are handled concurrently.

pub mod archive;
pub mod coordinator;
pub mod dangling;
pub mod duration;
pub mod filter;
pub mod pager;
pub mod record;
pub mod tags;
pub mod unarchive;

pub use archive::{Archiver, archive_tag_name};
pub use coordinator::{PageCoordinator, Tally};
pub use duration::{cutoff_from, parse_ago};
pub use filter::TagSelector;
pub use record::{ARCHIVE_METADATA_KEY, ArchiveRecord, ArchivedTag};

use crate::cli::config::PurgeConfig;
use crate::common::traits::{AuditSink, Validatable};
use crate::error::Result;
use crate::logging::Logger;
use crate::registry::api::RegistryApi;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a complete purge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    pub tags: Tally,
    pub manifests: Tally,
    pub elapsed: Duration,
}

/// Runs purge, dangling sweep and unarchive against one registry
pub struct Purger {
    registry: Arc<dyn RegistryApi>,
    audit: Arc<dyn AuditSink>,
    output: Logger,
    login_url: String,
}

impl Purger {
    pub fn new(registry: Arc<dyn RegistryApi>, audit: Arc<dyn AuditSink>, output: Logger) -> Self {
        Self {
            registry,
            audit,
            output,
            login_url: String::new(),
        }
    }

    /// Host prefix used in audit lines, e.g. `myregistry.azurecr.io`
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Delete (or archive) old tags, then sweep dangling manifests.
    ///
    /// With `dangling_only` set the tag pass is skipped. Under
    /// [`crate::cli::config::FailurePolicy::Continue`] both passes run to the end
    /// and the run fails with `Incomplete` if any item failed.
    pub async fn purge(&self, config: &PurgeConfig) -> Result<PurgeSummary> {
        config.validate()?;
        let started = std::time::Instant::now();
        self.output.info(&format!(
            "Purging {} (tags last updated before {})",
            self.qualified(&config.repository),
            config.cutoff.to_rfc3339()
        ));

        let tags = if config.dangling_only {
            Tally::default()
        } else {
            self.purge_tags(config).await?
        };
        let manifests = self.purge_dangling(config).await?;

        let summary = PurgeSummary {
            tags,
            manifests,
            elapsed: started.elapsed(),
        };
        self.report(config, &summary);

        tags.merge(manifests).into_result()?;
        Ok(summary)
    }

    fn report(&self, config: &PurgeConfig, summary: &PurgeSummary) {
        let disposed = if config.archive_repository.is_some() {
            "Manifests archived"
        } else {
            "Manifests deleted"
        };
        self.output.summary_kv(
            "Purge Summary",
            &[
                ("Repository", config.repository.clone()),
                ("Tags deleted", summary.tags.succeeded.to_string()),
                (disposed, summary.manifests.succeeded.to_string()),
                (
                    "Failures",
                    (summary.tags.failed + summary.manifests.failed).to_string(),
                ),
                ("Elapsed", self.output.format_duration(summary.elapsed)),
            ],
        );
    }

    /// `<login>/<repository>`, or the bare repository when no login URL is set
    fn qualified(&self, repository: &str) -> String {
        if self.login_url.is_empty() {
            repository.to_string()
        } else {
            format!("{}/{}", self.login_url, repository)
        }
    }

    fn audit_tag(&self, repository: &str, tag: &str) {
        self.audit
            .record(&format!("{}:{}", self.qualified(repository), tag));
    }

    fn audit_manifest(&self, repository: &str, digest: &str) {
        self.audit
            .record(&format!("{}@{}", self.qualified(repository), digest));
    }

    fn archiver(&self) -> Archiver<'_> {
        Archiver::new(self.registry.as_ref(), &self.output)
    }
}
