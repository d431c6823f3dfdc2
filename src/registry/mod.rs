//! Registry module for container registry interactions
//!
//! This module provides the [`RegistryApi`] seam the purge engine is written
//! against, and its HTTP implementation [`RegistryClient`] covering tag and
//! manifest listing, deletion, manifest transfer, metadata documents and
//! cross-repository blob mounts.

pub mod api;
pub mod auth;
pub mod client;
pub mod manifest;
pub mod operations;

pub use api::{DEFAULT_PAGE_SIZE, ManifestAttributes, PageQuery, RegistryApi, TagAttributes};
pub use auth::{Auth, login_url};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use manifest::ManifestBody;
