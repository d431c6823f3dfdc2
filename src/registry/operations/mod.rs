//! Registry operations module - internal modular organization
//!
//! Each operation group wraps one family of registry endpoints. They share the
//! HTTP client, the base address and the authorization header of the owning
//! [`crate::registry::RegistryClient`].

pub mod blob_operations;
pub mod manifest_operations;
pub mod metadata_operations;
pub mod tag_operations;

pub use blob_operations::BlobOperations;
pub use manifest_operations::ManifestOperations;
pub use metadata_operations::MetadataOperations;
pub use tag_operations::TagOperations;

use crate::error::Result;
use crate::error::handlers::{HttpErrorHandler, NetworkErrorHandler};
use crate::logging::Logger;
use reqwest::{RequestBuilder, Response};

/// Send a request, classifying transport failures
pub(crate) async fn send(request: RequestBuilder, output: &Logger, context: &str) -> Result<Response> {
    request.send().await.map_err(|e| {
        output.debug(&format!("{} request failed: {}", context, e));
        NetworkErrorHandler::handle_network_error(&e, context)
    })
}

/// Turn a non-success response into a registry error carrying the decoded body
pub(crate) async fn error_from_response(response: Response, operation: &str) -> crate::error::PurgeError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());
    HttpErrorHandler::registry_error(status, &body, operation)
}
