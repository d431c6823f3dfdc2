//! Restore an archived manifest into its repository

use super::Purger;
use super::archive::archive_tag_name;
use crate::cli::config::UnarchiveConfig;
use crate::common::traits::Validatable;
use crate::digest::DigestUtils;
use crate::error::{PurgeError, Result};

impl Purger {
    /// Bring `config.reference` back from the archive repository.
    ///
    /// The manifest is pushed under `config.tag_name` when given, otherwise under
    /// every tag recorded in its archive record (in record order). A record
    /// without tags, from a manifest that was already dangling when archived,
    /// restores the manifest by digest only. The archive-side tag is removed
    /// last. Returns the references the manifest was pushed under.
    pub async fn unarchive(&self, config: &UnarchiveConfig) -> Result<Vec<String>> {
        config.validate()?;
        let archive_repository = config.archive_repository.as_str();
        let digest = config.reference.as_str();
        let archive_tag = archive_tag_name(archive_repository, digest)?;

        self.output.section(&format!(
            "Unarchiving {} from {}:{}",
            digest, archive_repository, archive_tag
        ));

        let record = self
            .archiver()
            .load_archived_record(archive_repository, &archive_tag)
            .await?
            .ok_or_else(|| {
                PurgeError::Metadata(format!(
                    "No archive record on {}:{}",
                    archive_repository, archive_tag
                ))
            })?;
        if record.digest != digest {
            return Err(PurgeError::Metadata(format!(
                "{}:{} holds {}, not {}",
                archive_repository, archive_tag, record.digest, digest
            )));
        }

        let destination = config
            .repository
            .as_deref()
            .unwrap_or(&record.original_repository);
        let references: Vec<&str> = match config.tag_name.as_deref() {
            Some(tag_name) => vec![tag_name],
            None => record.tag_names(),
        };
        self.output.detail(&format!("Destination: {}", destination));

        let manifest = self
            .registry
            .get_manifest(archive_repository, &archive_tag)
            .await?;
        DigestUtils::verify_data_integrity(&manifest.content, digest)?;

        self.archiver()
            .mount_blobs(&manifest, destination, archive_repository)
            .await?;

        let mut restored = Vec::with_capacity(references.len().max(1));
        if references.is_empty() {
            self.registry
                .put_manifest(destination, digest, &manifest)
                .await?;
            self.audit_manifest(destination, digest);
            restored.push(digest.to_string());
        }
        for tag in references {
            self.registry.put_manifest(destination, tag, &manifest).await?;
            self.audit_tag(destination, tag);
            restored.push(tag.to_string());
        }

        self.registry
            .delete_tag(archive_repository, &archive_tag)
            .await?;
        self.output.success(&format!(
            "Restored {} reference(s) into {}",
            restored.len(),
            destination
        ));
        Ok(restored)
    }
}
