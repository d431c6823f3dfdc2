//! Metadata operations for registry client
//!
//! Free-form JSON documents attached to manifests and tags under a key:
//! - GET/PUT /acr/v1/{name}/_manifests/{digest}/_metadata/{key}
//! - GET/PUT /acr/v1/{name}/_tags/{tag}/_metadata/{key}
//!
//! A 404 on read means no document is stored under the key.

use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::registry::auth::Auth;
use crate::registry::operations::{error_from_response, send};
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

#[derive(Clone)]
pub struct MetadataOperations {
    client: Client,
    address: String,
    auth: Auth,
    output: Logger,
}

impl MetadataOperations {
    pub fn new(client: Client, address: String, auth: Auth, output: Logger) -> Self {
        Self {
            client,
            address,
            auth,
            output,
        }
    }

    fn manifest_url(&self, repository: &str, digest: &str, key: &str) -> String {
        format!(
            "{}/acr/v1/{}/_manifests/{}/_metadata/{}",
            self.address, repository, digest, key
        )
    }

    fn tag_url(&self, repository: &str, tag: &str, key: &str) -> String {
        format!(
            "{}/acr/v1/{}/_tags/{}/_metadata/{}",
            self.address, repository, tag, key
        )
    }

    pub async fn get_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let url = self.manifest_url(repository, digest, key);
        self.get(&url, &format!("get metadata {} of {}@{}", key, repository, digest))
            .await
    }

    pub async fn update_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let url = self.manifest_url(repository, digest, key);
        self.put(
            &url,
            value,
            &format!("update metadata {} of {}@{}", key, repository, digest),
        )
        .await
    }

    pub async fn get_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let url = self.tag_url(repository, tag, key);
        self.get(&url, &format!("get metadata {} of {}:{}", key, repository, tag))
            .await
    }

    pub async fn update_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let url = self.tag_url(repository, tag, key);
        self.put(
            &url,
            value,
            &format!("update metadata {} of {}:{}", key, repository, tag),
        )
        .await
    }

    async fn get(&self, url: &str, operation: &str) -> Result<Option<String>> {
        self.output.detail(operation);

        let request = self.auth.apply(self.client.get(url));
        let response = send(request, &self.output, "metadata read").await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body = response.text().await.map_err(|e| {
                    PurgeError::Transport(format!("Failed to read metadata response: {}", e))
                })?;
                Ok(Some(body))
            }
            _ => Err(error_from_response(response, operation).await),
        }
    }

    async fn put(&self, url: &str, value: &str, operation: &str) -> Result<()> {
        self.output.detail(operation);

        let request = self
            .auth
            .apply(self.client.put(url))
            .header(CONTENT_TYPE, "application/json")
            .body(value.to_string());
        let response = send(request, &self.output, "metadata update").await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, operation).await)
        }
    }
}
