//! Blob operations for registry client
//!
//! Cross-repository blob mount (POST /v2/{name}/blobs/uploads/?mount={digest}&from={repo}).
//! The registry answers 201 when the blob was linked into the destination
//! repository. A 202 means it opened an upload session instead, which this tool
//! never completes, so it is reported as a failure.

use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::registry::auth::Auth;
use crate::registry::operations::{error_from_response, send};
use reqwest::Client;
use reqwest::StatusCode;

#[derive(Clone)]
pub struct BlobOperations {
    client: Client,
    address: String,
    auth: Auth,
    output: Logger,
}

impl BlobOperations {
    pub fn new(client: Client, address: String, auth: Auth, output: Logger) -> Self {
        Self {
            client,
            address,
            auth,
            output,
        }
    }

    pub async fn mount_blob(
        &self,
        destination_repository: &str,
        digest: &str,
        source_repository: &str,
    ) -> Result<()> {
        let url = format!("{}/v2/{}/blobs/uploads/", self.address, destination_repository);
        self.output.detail(&format!(
            "Mounting {} from {} into {}",
            digest, source_repository, destination_repository
        ));

        let request = self
            .auth
            .apply(self.client.post(&url))
            .query(&[("mount", digest), ("from", source_repository)]);
        let response = send(request, &self.output, "blob mount").await?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::ACCEPTED => Err(PurgeError::Registry {
                status: StatusCode::ACCEPTED.as_u16(),
                code: "BLOB_MOUNT_NOT_PERFORMED".to_string(),
                message: format!(
                    "registry did not mount {} from {} into {}",
                    digest, source_repository, destination_repository
                ),
            }),
            _ => Err(error_from_response(
                response,
                &format!(
                    "mount {} from {} into {}",
                    digest, source_repository, destination_repository
                ),
            )
            .await),
        }
    }
}
