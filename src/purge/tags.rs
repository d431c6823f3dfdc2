//! Tag pass: remove tags older than the cutoff

use super::Purger;
use super::coordinator::{PageCoordinator, Tally};
use super::filter::TagSelector;
use super::pager::tag_pages;
use crate::cli::config::PurgeConfig;
use crate::error::Result;
use crate::registry::api::TagAttributes;
use chrono::Utc;
use futures::TryStreamExt;

/// Condemned tags of one page that share a digest, in listing order
fn group_by_digest<'a>(tags: &[&'a TagAttributes]) -> Vec<(&'a str, Vec<&'a str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for tag in tags {
        match groups.iter_mut().find(|(digest, _)| *digest == tag.digest) {
            Some((_, names)) => names.push(tag.name.as_str()),
            None => groups.push((tag.digest.as_str(), vec![tag.name.as_str()])),
        }
    }
    groups
}

impl Purger {
    /// Delete every tag of `config.repository` selected by age and filter.
    ///
    /// When an archive repository is configured each condemned tag is first
    /// appended to the archive record of its digest; the manifest itself is moved
    /// later by the dangling sweep. Returns the pass totals without turning
    /// logged failures into an error.
    pub async fn purge_tags(&self, config: &PurgeConfig) -> Result<Tally> {
        let selector = TagSelector::new(config.filter.as_deref(), config.cutoff)?;
        let repository = config.repository.as_str();

        self.output.section(&format!("Purging tags of {}", repository));
        self.output.detail(&format!("Cutoff: {}", selector.cutoff().to_rfc3339()));
        if let Some(filter) = &config.filter {
            self.output.detail(&format!("Filter: {}", filter));
        }

        let mut coordinator = PageCoordinator::new(config.failure_policy, self.output.clone());
        let mut pages = std::pin::pin!(tag_pages(
            self.registry.as_ref(),
            repository,
            config.page_size
        ));

        while let Some(page) = pages.try_next().await? {
            let condemned = selector.select(&page);
            self.output.verbose(&format!(
                "Page of {} tags, {} selected",
                page.len(),
                condemned.len()
            ));
            if condemned.is_empty() {
                continue;
            }

            if config.archive_repository.is_some() {
                // A tag is only untagged once its digest's record was persisted.
                let recorded = coordinator
                    .run_stage(group_by_digest(&condemned), |(digest, names)| {
                        self.record(repository, digest, names)
                    })
                    .await?;
                coordinator
                    .run_page(recorded.into_iter().flatten(), |tag| {
                        self.untag(repository, tag)
                    })
                    .await?;
            } else {
                coordinator
                    .run_page(condemned, |tag| self.untag(repository, &tag.name))
                    .await?;
            }
        }

        let tally = coordinator.tally();
        self.output.step(&format!("{} tags deleted", tally.succeeded));
        Ok(tally)
    }

    async fn untag(&self, repository: &str, tag: &str) -> Result<usize> {
        self.registry
            .delete_tag(repository, tag)
            .await
            .map_err(|e| e.context(&format!("{}:{}", repository, tag)))?;
        self.audit_tag(repository, tag);
        Ok(1)
    }

    /// Append `tags` to the record of `digest` in a single write
    async fn record<'t>(
        &self,
        repository: &str,
        digest: &str,
        tags: Vec<&'t str>,
    ) -> Result<Vec<&'t str>> {
        self.archiver()
            .record_tags(repository, digest, &tags, Utc::now())
            .await
            .map_err(|e| e.context(&format!("{}@{}", repository, digest)))?;
        Ok(tags)
    }
}
