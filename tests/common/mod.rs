//! In-memory registry used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use registry_purger::digest::DigestUtils;
use registry_purger::error::{PurgeError, Result};
use registry_purger::registry::manifest::{DOCKER_MANIFEST_V2, OCI_IMAGE_INDEX_V1};
use registry_purger::registry::{
    ManifestAttributes, ManifestBody, PageQuery, RegistryApi, TagAttributes,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Repository {
    /// name -> (digest, last update)
    tags: BTreeMap<String, (String, DateTime<Utc>)>,
    manifests: BTreeMap<String, ManifestBody>,
    blobs: BTreeSet<String>,
    /// (digest, key) -> document
    manifest_metadata: HashMap<(String, String), String>,
    /// (tag, key) -> document
    tag_metadata: HashMap<(String, String), String>,
}

#[derive(Default)]
struct State {
    repositories: HashMap<String, Repository>,
    failing_tag_deletes: HashSet<String>,
    failing_manifest_deletes: HashSet<String>,
    fail_mounts: bool,
    fail_manifest_metadata_updates: bool,
    list_tags_calls: usize,
    list_manifests_calls: usize,
}

#[derive(Default)]
pub struct FakeRegistry {
    state: Mutex<State>,
}

fn not_found(what: &str) -> PurgeError {
    PurgeError::Registry {
        status: 404,
        code: "NOT_FOUND".to_string(),
        message: format!("{} not found", what),
    }
}

fn server_error(what: &str) -> PurgeError {
    PurgeError::Registry {
        status: 500,
        code: "SERVER_ERROR".to_string(),
        message: format!("{} failed", what),
    }
}

/// A small image manifest whose blobs are derived from `seed`
pub fn image_manifest(seed: &str) -> ManifestBody {
    let config = DigestUtils::compute_docker_digest(format!("config-{}", seed).as_bytes());
    let layer = DigestUtils::compute_docker_digest(format!("layer-{}", seed).as_bytes());
    let document = serde_json::json!({
        "schemaVersion": 2,
        "mediaType": DOCKER_MANIFEST_V2,
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": 7,
            "digest": config,
        },
        "layers": [{
            "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
            "size": 7,
            "digest": layer,
        }],
    });
    ManifestBody::new(DOCKER_MANIFEST_V2, serde_json::to_vec(&document).unwrap())
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an image in `repository` and return its digest
    pub fn push_image(&self, repository: &str, seed: &str) -> String {
        let manifest = image_manifest(seed);
        let digest = DigestUtils::compute_docker_digest(&manifest.content);
        let blobs = manifest.blob_references().unwrap();

        let mut state = self.state.lock().unwrap();
        let repo = state.repositories.entry(repository.to_string()).or_default();
        repo.blobs.extend(blobs);
        repo.manifests.insert(digest.clone(), manifest);
        digest
    }

    /// Store an OCI index over `children` in `repository` and return its digest
    pub fn push_index(&self, repository: &str, children: &[&str]) -> String {
        let manifests: Vec<serde_json::Value> = children
            .iter()
            .map(|child| {
                serde_json::json!({
                    "mediaType": DOCKER_MANIFEST_V2,
                    "size": 7,
                    "digest": child,
                })
            })
            .collect();
        let document = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": OCI_IMAGE_INDEX_V1,
            "manifests": manifests,
        });
        let manifest = ManifestBody::new(OCI_IMAGE_INDEX_V1, serde_json::to_vec(&document).unwrap());
        let digest = DigestUtils::compute_docker_digest(&manifest.content);

        let mut state = self.state.lock().unwrap();
        let repo = state.repositories.entry(repository.to_string()).or_default();
        repo.manifests.insert(digest.clone(), manifest);
        digest
    }

    /// Point `tag` at `digest`, last updated `age` ago
    pub fn tag(&self, repository: &str, tag: &str, digest: &str, age: Duration) {
        let mut state = self.state.lock().unwrap();
        let repo = state.repositories.entry(repository.to_string()).or_default();
        repo.tags
            .insert(tag.to_string(), (digest.to_string(), Utc::now() - age));
    }

    /// Push an image and tag it in one go
    pub fn push_tagged(&self, repository: &str, tag: &str, age: Duration) -> String {
        let digest = self.push_image(repository, tag);
        self.tag(repository, tag, &digest, age);
        digest
    }

    pub fn fail_tag_delete(&self, tag: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_tag_deletes
            .insert(tag.to_string());
    }

    pub fn fail_manifest_delete(&self, digest: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_manifest_deletes
            .insert(digest.to_string());
    }

    pub fn fail_mounts(&self) {
        self.state.lock().unwrap().fail_mounts = true;
    }

    pub fn fail_manifest_metadata_updates(&self) {
        self.state.lock().unwrap().fail_manifest_metadata_updates = true;
    }

    pub fn tag_names(&self, repository: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(repository)
            .map(|repo| repo.tags.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tag_digest(&self, repository: &str, tag: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(repository)
            .and_then(|repo| repo.tags.get(tag))
            .map(|(digest, _)| digest.clone())
    }

    pub fn has_manifest(&self, repository: &str, digest: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(repository)
            .is_some_and(|repo| repo.manifests.contains_key(digest))
    }

    pub fn stored_manifest(&self, repository: &str, digest: &str) -> Option<ManifestBody> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(repository)
            .and_then(|repo| repo.manifests.get(digest).cloned())
    }

    pub fn manifest_document(&self, repository: &str, digest: &str, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.repositories.get(repository).and_then(|repo| {
            repo.manifest_metadata
                .get(&(digest.to_string(), key.to_string()))
                .cloned()
        })
    }

    pub fn tag_document(&self, repository: &str, tag: &str, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.repositories.get(repository).and_then(|repo| {
            repo.tag_metadata
                .get(&(tag.to_string(), key.to_string()))
                .cloned()
        })
    }

    pub fn list_tags_calls(&self) -> usize {
        self.state.lock().unwrap().list_tags_calls
    }

    pub fn list_manifests_calls(&self) -> usize {
        self.state.lock().unwrap().list_manifests_calls
    }
}

#[async_trait]
impl RegistryApi for FakeRegistry {
    async fn list_tags(&self, repository: &str, query: &PageQuery) -> Result<Vec<TagAttributes>> {
        let mut state = self.state.lock().unwrap();
        state.list_tags_calls += 1;
        let Some(repo) = state.repositories.get(repository) else {
            return Ok(Vec::new());
        };
        Ok(repo
            .tags
            .iter()
            .filter(|(name, _)| query.last.as_ref().is_none_or(|last| *name > last))
            .take(query.page_size)
            .map(|(name, (digest, time))| TagAttributes {
                name: name.clone(),
                digest: digest.clone(),
                last_update_time: *time,
            })
            .collect())
    }

    async fn list_manifests(
        &self,
        repository: &str,
        query: &PageQuery,
    ) -> Result<Vec<ManifestAttributes>> {
        let mut state = self.state.lock().unwrap();
        state.list_manifests_calls += 1;
        let Some(repo) = state.repositories.get(repository) else {
            return Ok(Vec::new());
        };
        Ok(repo
            .manifests
            .keys()
            .filter(|digest| query.last.as_ref().is_none_or(|last| *digest > last))
            .take(query.page_size)
            .map(|digest| {
                let tags: Vec<String> = repo
                    .tags
                    .iter()
                    .filter(|(_, (target, _))| target == digest)
                    .map(|(name, _)| name.clone())
                    .collect();
                ManifestAttributes {
                    digest: digest.clone(),
                    tags: if tags.is_empty() { None } else { Some(tags) },
                }
            })
            .collect())
    }

    async fn delete_tag(&self, repository: &str, tag: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_tag_deletes.contains(tag) {
            return Err(server_error(&format!("delete tag {}", tag)));
        }
        let repo = state
            .repositories
            .get_mut(repository)
            .ok_or_else(|| not_found(repository))?;
        repo.tags.remove(tag).ok_or_else(|| not_found(tag))?;
        repo.tag_metadata.retain(|(name, _), _| name != tag);
        Ok(())
    }

    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_manifest_deletes.contains(digest) {
            return Err(server_error(&format!("delete manifest {}", digest)));
        }
        let repo = state
            .repositories
            .get_mut(repository)
            .ok_or_else(|| not_found(repository))?;
        repo.manifests.remove(digest).ok_or_else(|| not_found(digest))?;
        repo.tags.retain(|_, (target, _)| target.as_str() != digest);
        repo.manifest_metadata.retain(|(target, _), _| target != digest);
        Ok(())
    }

    async fn get_manifest(&self, repository: &str, reference: &str) -> Result<ManifestBody> {
        let state = self.state.lock().unwrap();
        let repo = state
            .repositories
            .get(repository)
            .ok_or_else(|| not_found(repository))?;
        let digest = if reference.starts_with("sha256:") {
            reference.to_string()
        } else {
            repo.tags
                .get(reference)
                .map(|(digest, _)| digest.clone())
                .ok_or_else(|| not_found(reference))?
        };
        repo.manifests
            .get(&digest)
            .cloned()
            .ok_or_else(|| not_found(&digest))
    }

    async fn put_manifest(
        &self,
        repository: &str,
        reference: &str,
        manifest: &ManifestBody,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let repo = state.repositories.entry(repository.to_string()).or_default();

        for blob in manifest.blob_references()? {
            if !repo.blobs.contains(&blob) {
                return Err(PurgeError::Registry {
                    status: 400,
                    code: "BLOB_UNKNOWN".to_string(),
                    message: format!("blob {} not in {}", blob, repository),
                });
            }
        }

        let digest = DigestUtils::compute_docker_digest(&manifest.content);
        if reference.starts_with("sha256:") && reference != digest {
            return Err(PurgeError::Registry {
                status: 400,
                code: "DIGEST_INVALID".to_string(),
                message: format!("{} does not match content", reference),
            });
        }
        repo.manifests.insert(digest.clone(), manifest.clone());
        if !reference.starts_with("sha256:") {
            repo.tags.insert(reference.to_string(), (digest, Utc::now()));
        }
        Ok(())
    }

    async fn get_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.repositories.get(repository).and_then(|repo| {
            repo.manifest_metadata
                .get(&(digest.to_string(), key.to_string()))
                .cloned()
        }))
    }

    async fn update_manifest_metadata(
        &self,
        repository: &str,
        digest: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_manifest_metadata_updates {
            return Err(server_error("update manifest metadata"));
        }
        let repo = state
            .repositories
            .get_mut(repository)
            .ok_or_else(|| not_found(repository))?;
        if !repo.manifests.contains_key(digest) {
            return Err(not_found(digest));
        }
        repo.manifest_metadata
            .insert((digest.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn get_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
    ) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.repositories.get(repository).and_then(|repo| {
            repo.tag_metadata
                .get(&(tag.to_string(), key.to_string()))
                .cloned()
        }))
    }

    async fn update_tag_metadata(
        &self,
        repository: &str,
        tag: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let repo = state
            .repositories
            .get_mut(repository)
            .ok_or_else(|| not_found(repository))?;
        if !repo.tags.contains_key(tag) {
            return Err(not_found(tag));
        }
        repo.tag_metadata
            .insert((tag.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn mount_blob(
        &self,
        destination_repository: &str,
        digest: &str,
        source_repository: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mounts {
            return Err(PurgeError::Registry {
                status: 202,
                code: "BLOB_MOUNT_NOT_PERFORMED".to_string(),
                message: format!("mount of {} not performed", digest),
            });
        }
        let known = state
            .repositories
            .get(source_repository)
            .is_some_and(|repo| repo.blobs.contains(digest));
        if !known {
            return Err(not_found(digest));
        }
        state
            .repositories
            .entry(destination_repository.to_string())
            .or_default()
            .blobs
            .insert(digest.to_string());
        Ok(())
    }
}
