//! The registry operations the purge engine depends on
//!
//! [`RegistryApi`] is the seam between the engine and the wire client. The HTTP
//! implementation lives in [`crate::registry::client`]; anything else that speaks
//! the same operations (an in-memory registry in tests, for instance) can be
//! plugged in instead.

use crate::error::Result;
use crate::registry::manifest::ManifestBody;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A tag and the manifest it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAttributes {
    pub name: String,
    pub digest: String,
    pub last_update_time: DateTime<Utc>,
}

/// A manifest and the tags currently referencing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAttributes {
    pub digest: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ManifestAttributes {
    /// No tag references this manifest
    pub fn is_dangling(&self) -> bool {
        self.tags.as_ref().is_none_or(|tags| tags.is_empty())
    }
}

/// Listing parameters: ordering, cursor and page size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub order_by: Option<String>,
    pub last: Option<String>,
    pub page_size: usize,
}

impl PageQuery {
    pub fn first(page_size: usize) -> Self {
        Self {
            order_by: None,
            last: None,
            page_size,
        }
    }

    pub fn after(&self, last: impl Into<String>) -> Self {
        Self {
            order_by: self.order_by.clone(),
            last: Some(last.into()),
            page_size: self.page_size,
        }
    }
}

/// Registry operations consumed by the purge engine.
///
/// Listing calls return an empty page once the cursor has passed the last entry.
/// Metadata getters return `Ok(None)` when no document is stored under `key`.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    async fn list_tags(&self, repository: &str, query: &PageQuery) -> Result<Vec<TagAttributes>>;

    async fn list_manifests(
        &self,
        repository: &str,
        query: &PageQuery,
    ) -> Result<Vec<ManifestAttributes>>;

    async fn delete_tag(&self, repository: &str, tag: &str) -> Result<()>;

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()>;

    async fn get_manifest(&self, repository: &str, reference: &str) -> Result<ManifestBody>;

    async fn put_manifest(
        &self,
        repository: &str,
        reference: &str,
        manifest: &ManifestBody,
    ) -> Result<()>;

    async fn get_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
    ) -> Result<Option<String>>;

    async fn update_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
        value: &str,
    ) -> Result<()>;

    async fn get_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
    ) -> Result<Option<String>>;

    async fn update_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
        value: &str,
    ) -> Result<()>;

    /// Make `digest` from `source_repository` available in `destination_repository`
    /// without uploading its bytes again.
    async fn mount_blob(
        &self,
        destination_repository: &str,
        digest: &str,
        source_repository: &str,
    ) -> Result<()>;
}
