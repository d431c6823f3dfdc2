//! Dangling sweep: dispose of manifests no tag points at

use super::Purger;
use super::coordinator::{PageCoordinator, Tally};
use super::pager::manifest_pages;
use crate::cli::config::PurgeConfig;
use crate::error::Result;
use chrono::Utc;
use futures::TryStreamExt;

impl Purger {
    /// Delete, or archive when an archive repository is configured, every
    /// manifest of `config.repository` that has no tags at enumeration time.
    pub async fn purge_dangling(&self, config: &PurgeConfig) -> Result<Tally> {
        let repository = config.repository.as_str();
        let archive_repository = config.archive_repository.as_deref();

        self.output
            .section(&format!("Sweeping dangling manifests of {}", repository));
        if let Some(archive) = archive_repository {
            self.output.detail(&format!("Archiving into {}", archive));
        }

        let mut coordinator = PageCoordinator::new(config.failure_policy, self.output.clone());
        let mut pages = std::pin::pin!(manifest_pages(
            self.registry.as_ref(),
            repository,
            config.page_size
        ));

        while let Some(page) = pages.try_next().await? {
            let dangling: Vec<&str> = page
                .iter()
                .filter(|manifest| manifest.is_dangling())
                .map(|manifest| manifest.digest.as_str())
                .collect();
            self.output.verbose(&format!(
                "Page of {} manifests, {} dangling",
                page.len(),
                dangling.len()
            ));
            if dangling.is_empty() {
                continue;
            }

            coordinator
                .run_page(dangling, |digest| {
                    self.dispose(repository, archive_repository, digest)
                })
                .await?;
        }

        let tally = coordinator.tally();
        let verb = if archive_repository.is_some() {
            "archived"
        } else {
            "deleted"
        };
        self.output
            .step(&format!("{} dangling manifests {}", tally.succeeded, verb));
        Ok(tally)
    }

    async fn dispose(
        &self,
        repository: &str,
        archive_repository: Option<&str>,
        digest: &str,
    ) -> Result<usize> {
        match archive_repository {
            Some(archive) => {
                let archived = self
                    .archiver()
                    .archive(repository, archive, digest, None, Utc::now())
                    .await
                    .map_err(|e| e.context(&format!("archive {}@{}", repository, digest)))?;
                if archived.is_none() {
                    self.output.warning(&format!(
                        "Skipping {}@{}: manifest lists and indexes are not archived",
                        repository, digest
                    ));
                    return Ok(0);
                }
            }
            None => {
                self.registry
                    .delete_manifest(repository, digest)
                    .await
                    .map_err(|e| e.context(&format!("{}@{}", repository, digest)))?;
            }
        }
        self.audit_manifest(repository, digest);
        Ok(1)
    }
}
