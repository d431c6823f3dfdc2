//! Manifest operations for registry client
//!
//! - Paged manifest listing with tag sets (GET /acr/v1/{name}/_manifests)
//! - Manifest download (GET /v2/{name}/manifests/{reference})
//! - Manifest upload (PUT /v2/{name}/manifests/{reference})
//! - Manifest removal by digest (DELETE /v2/{name}/manifests/{digest})

use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::registry::api::{ManifestAttributes, PageQuery};
use crate::registry::auth::Auth;
use crate::registry::manifest::{MANIFEST_ACCEPT, ManifestBody};
use crate::registry::operations::tag_operations::paging_params;
use crate::registry::operations::{error_from_response, send};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ManifestAttributeList {
    #[serde(default)]
    manifests: Option<Vec<ManifestAttributes>>,
}

#[derive(Clone)]
pub struct ManifestOperations {
    client: Client,
    address: String,
    auth: Auth,
    output: Logger,
}

impl ManifestOperations {
    pub fn new(client: Client, address: String, auth: Auth, output: Logger) -> Self {
        Self {
            client,
            address,
            auth,
            output,
        }
    }

    /// List one page of manifests, starting after `query.last`
    pub async fn list_manifests(
        &self,
        repository: &str,
        query: &PageQuery,
    ) -> Result<Vec<ManifestAttributes>> {
        let url = format!("{}/acr/v1/{}/_manifests", self.address, repository);
        self.output.detail(&format!(
            "Listing manifests for {} after {:?}",
            repository, query.last
        ));

        let request = self
            .auth
            .apply(self.client.get(&url))
            .query(&paging_params(query));
        let response = send(request, &self.output, "manifest listing").await?;

        if !response.status().is_success() {
            return Err(
                error_from_response(response, &format!("list manifests of {}", repository)).await,
            );
        }

        let body = response.text().await.map_err(|e| {
            PurgeError::Transport(format!("Failed to read manifests response: {}", e))
        })?;
        let list: ManifestAttributeList = serde_json::from_str(&body).map_err(|e| {
            PurgeError::Transport(format!("Failed to parse manifests response: {}", e))
        })?;

        Ok(list.manifests.unwrap_or_default())
    }

    /// Download a manifest by tag or digest, keeping the exact bytes served
    pub async fn get_manifest(&self, repository: &str, reference: &str) -> Result<ManifestBody> {
        let url = format!("{}/v2/{}/manifests/{}", self.address, repository, reference);
        self.output
            .verbose(&format!("Pulling manifest {}/{}", repository, reference));

        let request = self
            .auth
            .apply(self.client.get(&url))
            .header(ACCEPT, MANIFEST_ACCEPT);
        let response = send(request, &self.output, "manifest pull").await?;

        if !response.status().is_success() {
            return Err(error_from_response(
                response,
                &format!("get manifest {}/{}", repository, reference),
            )
            .await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let data = response.bytes().await.map_err(|e| {
            PurgeError::Transport(format!("Failed to read manifest response: {}", e))
        })?;

        Ok(ManifestBody::from_bytes(content_type.as_deref(), data.to_vec()))
    }

    /// Upload a manifest under a tag or digest
    pub async fn put_manifest(
        &self,
        repository: &str,
        reference: &str,
        manifest: &ManifestBody,
    ) -> Result<()> {
        let url = format!("{}/v2/{}/manifests/{}", self.address, repository, reference);
        self.output.verbose(&format!(
            "Pushing manifest {}:{} ({})",
            repository, reference, manifest.media_type
        ));

        let request = self
            .auth
            .apply(self.client.put(&url))
            .header(CONTENT_TYPE, manifest.media_type.as_str())
            .body(manifest.content.clone());
        let response = send(request, &self.output, "manifest push").await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(
                response,
                &format!("put manifest {}:{}", repository, reference),
            )
            .await)
        }
    }

    /// Delete a manifest by digest, which also drops every tag pointing at it
    pub async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        let url = format!("{}/v2/{}/manifests/{}", self.address, repository, digest);
        self.output
            .verbose(&format!("Deleting manifest {}@{}", repository, digest));

        let request = self.auth.apply(self.client.delete(&url));
        let response = send(request, &self.output, "manifest deletion").await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(
                response,
                &format!("delete manifest {}@{}", repository, digest),
            )
            .await)
        }
    }
}
