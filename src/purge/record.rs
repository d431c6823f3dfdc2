//! The archive record: which tags were purged from a digest, and when
//!
//! Stored as a JSON metadata document under [`ARCHIVE_METADATA_KEY`], first on the
//! source manifest and then on the archive-side tag. Entries are only ever
//! appended.

use crate::error::{PurgeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key the archive record lives under
pub const ARCHIVE_METADATA_KEY: &str = "acrarchiveinfo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTag {
    pub name: String,
    pub archive_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub digest: String,
    #[serde(rename = "originalRepo")]
    pub original_repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<ArchivedTag>,
}

impl ArchiveRecord {
    pub fn new(digest: &str, original_repository: &str, now: DateTime<Utc>) -> Self {
        Self {
            digest: digest.to_string(),
            original_repository: original_repository.to_string(),
            last_update_time: Some(now),
            tags: Vec::new(),
        }
    }

    /// Record one more purged tag
    pub fn append(&mut self, tag: &str, now: DateTime<Utc>) {
        self.tags.push(ArchivedTag {
            name: tag.to_string(),
            archive_time: now,
        });
        self.last_update_time = Some(now);
    }

    /// Carry over the entries of `newer` that this record does not hold yet
    pub fn absorb(&mut self, newer: ArchiveRecord, now: DateTime<Utc>) {
        for tag in newer.tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self.touch(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_update_time = Some(now);
    }

    /// Recorded tag names, first occurrence order, without repeats
    pub fn tag_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            if !names.contains(&tag.name.as_str()) {
                names.push(&tag.name);
            }
        }
        names
    }

    pub fn decode(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PurgeError::Metadata(format!("Failed to decode archive record: {}", e)))
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PurgeError::Metadata(format!("Failed to encode archive record: {}", e)))
    }
}
