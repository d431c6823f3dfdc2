//! HTTP implementation of [`RegistryApi`]
//!
//! [`RegistryClient`] owns one `reqwest` client and hands it to the operation
//! groups in [`crate::registry::operations`]. Build it with [`RegistryClientBuilder`].

use crate::cli::config::{AuthConfig, RegistryConfig};
use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::registry::api::{ManifestAttributes, PageQuery, RegistryApi, TagAttributes};
use crate::registry::auth::{Auth, registry_address};
use crate::registry::manifest::ManifestBody;
use crate::registry::operations::{
    BlobOperations, ManifestOperations, MetadataOperations, TagOperations, send,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct RegistryClientBuilder {
    address: String,
    auth_config: Option<AuthConfig>,
    skip_tls: bool,
    timeout: u64,
    output: Logger,
}

impl RegistryClientBuilder {
    pub fn new(login_url: &str) -> Self {
        Self {
            address: registry_address(login_url),
            auth_config: None,
            skip_tls: false,
            timeout: 300,
            output: Logger::new(false),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(&config.login_url)
            .with_skip_tls(config.skip_tls)
            .with_timeout(config.timeout)
    }

    pub fn with_auth(mut self, auth_config: Option<AuthConfig>) -> Self {
        self.auth_config = auth_config;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let mut builder = Client::builder().timeout(Duration::from_secs(self.timeout));
        if self.skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        let client = builder
            .build()
            .map_err(|e| PurgeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let parsed = url::Url::parse(&self.address)?;
        if parsed.host_str().is_none() {
            return Err(PurgeError::Config(format!(
                "Registry address has no host: {}",
                self.address
            )));
        }

        let auth = Auth::from_config(self.auth_config.as_ref());
        let address = self.address.trim_end_matches('/').to_string();

        Ok(RegistryClient {
            tags: TagOperations::new(client.clone(), address.clone(), auth.clone(), self.output.clone()),
            manifests: ManifestOperations::new(
                client.clone(),
                address.clone(),
                auth.clone(),
                self.output.clone(),
            ),
            metadata: MetadataOperations::new(
                client.clone(),
                address.clone(),
                auth.clone(),
                self.output.clone(),
            ),
            blobs: BlobOperations::new(client.clone(), address.clone(), auth.clone(), self.output.clone()),
            client,
            address,
            auth,
            output: self.output,
        })
    }
}

#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    address: String,
    auth: Auth,
    output: Logger,
    tags: TagOperations,
    manifests: ManifestOperations,
    metadata: MetadataOperations,
    blobs: BlobOperations,
}

impl RegistryClient {
    pub fn builder(login_url: &str) -> RegistryClientBuilder {
        RegistryClientBuilder::new(login_url)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Check that the registry answers the v2 API and accepts our credentials
    pub async fn test_connectivity(&self) -> Result<()> {
        self.output.verbose("Testing registry connectivity...");

        let url = format!("{}/v2/", self.address);
        let request = self.auth.apply(self.client.get(&url));
        let response = send(request, &self.output, "connectivity check").await?;

        self.output
            .verbose(&format!("Registry response status: {}", response.status()));

        match response.status().as_u16() {
            200..=299 => Ok(()),
            401 | 403 => Err(PurgeError::Registry {
                status: response.status().as_u16(),
                code: "UNAUTHORIZED".to_string(),
                message: format!("credentials rejected by {}", self.address),
            }),
            _ => Err(PurgeError::Registry {
                status: response.status().as_u16(),
                code: "UNSUPPORTED".to_string(),
                message: format!("registry API v2 not available at {}", self.address),
            }),
        }
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn list_tags(&self, repository: &str, query: &PageQuery) -> Result<Vec<TagAttributes>> {
        self.tags.list_tags(repository, query).await
    }

    async fn list_manifests(
        &self,
        repository: &str,
        query: &PageQuery,
    ) -> Result<Vec<ManifestAttributes>> {
        self.manifests.list_manifests(repository, query).await
    }

    async fn delete_tag(&self, repository: &str, tag: &str) -> Result<()> {
        self.tags.delete_tag(repository, tag).await
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        self.manifests.delete_manifest(repository, digest).await
    }

    async fn get_manifest(&self, repository: &str, reference: &str) -> Result<ManifestBody> {
        self.manifests.get_manifest(repository, reference).await
    }

    async fn put_manifest(
        &self,
        repository: &str,
        reference: &str,
        manifest: &ManifestBody,
    ) -> Result<()> {
        self.manifests.put_manifest(repository, reference, manifest).await
    }

    async fn get_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.metadata.get_manifest_metadata(repository, digest, key).await
    }

    async fn update_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.metadata
            .update_manifest_metadata(repository, digest, key, value)
            .await
    }

    async fn get_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.metadata.get_tag_metadata(repository, tag, key).await
    }

    async fn update_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.metadata
            .update_tag_metadata(repository, tag, key, value)
            .await
    }

    async fn mount_blob(
        &self,
        destination_repository: &str,
        digest: &str,
        source_repository: &str,
    ) -> Result<()> {
        self.blobs
            .mount_blob(destination_repository, digest, source_repository)
            .await
    }
}
