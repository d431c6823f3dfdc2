//! Manifest bodies as exchanged with the registry
//!
//! A manifest is kept as the exact bytes the registry served so that pushing it
//! elsewhere reproduces the same digest. Only the blob references are decoded.

use crate::error::{PurgeError, Result};
use serde::Deserialize;

pub const DOCKER_MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const DOCKER_MANIFEST_LIST_V2: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
pub const OCI_IMAGE_MANIFEST_V1: &str = "application/vnd.oci.image.manifest.v1+json";
pub const OCI_IMAGE_INDEX_V1: &str = "application/vnd.oci.image.index.v1+json";

/// Accept header covering every manifest type the registry may return
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageManifest {
    media_type: Option<String>,
    config: Option<Descriptor>,
    #[serde(default)]
    layers: Vec<Descriptor>,
}

/// Raw manifest document plus its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestBody {
    pub media_type: String,
    pub content: Vec<u8>,
}

impl ManifestBody {
    pub fn new(media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            content,
        }
    }

    /// Build a body from bytes, taking the media type from the document itself
    /// when the transport did not report one.
    pub fn from_bytes(content_type: Option<&str>, content: Vec<u8>) -> Self {
        let media_type = content_type
            .filter(|ct| !ct.is_empty() && *ct != "application/json")
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string())
            .or_else(|| {
                serde_json::from_slice::<ImageManifest>(&content)
                    .ok()
                    .and_then(|m| m.media_type)
            })
            .unwrap_or_else(|| DOCKER_MANIFEST_V2.to_string());

        Self {
            media_type,
            content,
        }
    }

    /// Manifest list or OCI index rather than a single image
    pub fn is_index(&self) -> bool {
        self.media_type == DOCKER_MANIFEST_LIST_V2 || self.media_type == OCI_IMAGE_INDEX_V1
    }

    /// Digests of the config blob followed by every layer blob, in document order
    pub fn blob_references(&self) -> Result<Vec<String>> {
        if self.is_index() {
            return Err(PurgeError::Validation(format!(
                "Manifest lists are not supported for archival ({})",
                self.media_type
            )));
        }

        let manifest: ImageManifest = serde_json::from_slice(&self.content).map_err(|e| {
            PurgeError::Validation(format!("Failed to parse image manifest: {}", e))
        })?;

        let config = manifest.config.ok_or_else(|| {
            PurgeError::Validation("Image manifest has no config descriptor".to_string())
        })?;

        let mut digests = Vec::with_capacity(manifest.layers.len() + 1);
        digests.push(config.digest);
        digests.extend(manifest.layers.into_iter().map(|layer| layer.digest));
        Ok(digests)
    }
}
