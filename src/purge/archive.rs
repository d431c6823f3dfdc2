//! Reversible removal of manifests into an archive repository
//!
//! Archiving a manifest never copies blob bytes: the config and layer blobs are
//! mounted into the archive repository, the manifest is pushed there under a
//! synthesized tag together with its [`ArchiveRecord`], and only then is it
//! deleted from the source repository. Any failure before that last step leaves
//! the source untouched.

use crate::digest::DigestUtils;
use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::purge::record::{ARCHIVE_METADATA_KEY, ArchiveRecord};
use crate::registry::api::RegistryApi;
use crate::registry::manifest::ManifestBody;
use chrono::{DateTime, Utc};

/// Tag a digest is stored under in `archive_repository`: the repository's last
/// path segment followed by the first eight hex characters of the hash.
pub fn archive_tag_name(archive_repository: &str, digest: &str) -> Result<String> {
    let short = DigestUtils::short_hash(digest)?;
    let logical_name = archive_repository
        .rsplit('/')
        .next()
        .unwrap_or(archive_repository);
    Ok(format!("{}{}", logical_name, short))
}

pub struct Archiver<'a> {
    registry: &'a dyn RegistryApi,
    output: &'a Logger,
}

impl<'a> Archiver<'a> {
    pub fn new(registry: &'a dyn RegistryApi, output: &'a Logger) -> Self {
        Self { registry, output }
    }

    /// Fetch and decode the record stored on `digest` in `repository`, if any
    pub async fn load_record(&self, repository: &str, digest: &str) -> Result<Option<ArchiveRecord>> {
        let stored = self
            .registry
            .get_manifest_metadata(repository, digest, ARCHIVE_METADATA_KEY)
            .await?;
        stored.as_deref().map(ArchiveRecord::decode).transpose()
    }

    /// Append `tags` to the record of `digest` and persist it on the source
    /// manifest. A missing record is created.
    pub async fn record_tags(
        &self,
        repository: &str,
        digest: &str,
        tags: &[&str],
        now: DateTime<Utc>,
    ) -> Result<ArchiveRecord> {
        let mut record = self
            .load_record(repository, digest)
            .await?
            .unwrap_or_else(|| ArchiveRecord::new(digest, repository, now));

        for tag in tags {
            record.append(tag, now);
        }
        record.touch(now);

        self.persist_on_manifest(repository, digest, &record).await?;
        Ok(record)
    }

    /// Move `digest` out of `repository` into `archive_repository`.
    ///
    /// `tag`, when given, is appended to the record first. Returns the tag the
    /// manifest now has in the archive repository, or `None` when the manifest
    /// is a list or index and was left in place.
    ///
    /// A record already stored under the archive tag must describe the same
    /// digest and source repository; its entries are carried over. Anything else
    /// is a `Metadata` error raised before any write.
    pub async fn archive(
        &self,
        repository: &str,
        archive_repository: &str,
        digest: &str,
        tag: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let archive_tag = archive_tag_name(archive_repository, digest)?;

        let manifest = self.registry.get_manifest(repository, digest).await?;
        if manifest.is_index() {
            return Ok(None);
        }

        let prior = self
            .load_archived_record(archive_repository, &archive_tag)
            .await?;
        if let Some(prior) = &prior {
            if prior.digest != digest || prior.original_repository != repository {
                return Err(PurgeError::Metadata(format!(
                    "{}:{} already holds {}@{}",
                    archive_repository, archive_tag, prior.original_repository, prior.digest
                )));
            }
        }

        let tags: Vec<&str> = tag.into_iter().collect();
        let mut record = self.record_tags(repository, digest, &tags, now).await?;
        if let Some(mut prior) = prior {
            prior.absorb(record, now);
            record = prior;
        }

        DigestUtils::verify_data_integrity(&manifest.content, digest)?;

        self.mount_blobs(&manifest, archive_repository, repository).await?;

        self.registry
            .put_manifest(archive_repository, &archive_tag, &manifest)
            .await?;

        let encoded = record.encode()?;
        self.registry
            .update_tag_metadata(archive_repository, &archive_tag, ARCHIVE_METADATA_KEY, &encoded)
            .await
            .map_err(|e| {
                PurgeError::Metadata(format!(
                    "Failed to attach archive record to {}:{}: {}",
                    archive_repository, archive_tag, e
                ))
            })?;

        self.registry.delete_manifest(repository, digest).await?;

        self.output.verbose(&format!(
            "Archived {}@{} as {}:{}",
            repository, digest, archive_repository, archive_tag
        ));
        Ok(Some(archive_tag))
    }

    /// Record attached to `archive_tag`, if the tag exists and carries one
    pub async fn load_archived_record(
        &self,
        archive_repository: &str,
        archive_tag: &str,
    ) -> Result<Option<ArchiveRecord>> {
        let stored = self
            .registry
            .get_tag_metadata(archive_repository, archive_tag, ARCHIVE_METADATA_KEY)
            .await?;
        stored.as_deref().map(ArchiveRecord::decode).transpose()
    }

    /// Mount the config and every layer of `manifest` from `source` into `destination`
    pub async fn mount_blobs(
        &self,
        manifest: &ManifestBody,
        destination: &str,
        source: &str,
    ) -> Result<()> {
        for blob in manifest.blob_references()? {
            self.registry.mount_blob(destination, &blob, source).await?;
        }
        Ok(())
    }

    async fn persist_on_manifest(
        &self,
        repository: &str,
        digest: &str,
        record: &ArchiveRecord,
    ) -> Result<()> {
        let encoded = record.encode()?;
        self.registry
            .update_manifest_metadata(repository, digest, ARCHIVE_METADATA_KEY, &encoded)
            .await
            .map_err(|e| {
                PurgeError::Metadata(format!(
                    "Failed to store archive record on {}@{}: {}",
                    repository, digest, e
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn archive_tag_uses_last_path_segment() {
        assert_eq!(archive_tag_name("archive", DIGEST).unwrap(), "archive01234567");
        assert_eq!(
            archive_tag_name("team/archive", DIGEST).unwrap(),
            "archive01234567"
        );
    }

    #[test]
    fn archive_tag_needs_a_digest() {
        assert!(matches!(
            archive_tag_name("archive", "v1"),
            Err(PurgeError::Validation(_))
        ));
    }
}
