//! Tag operations for registry client
//!
//! - Paged tag listing with attributes (GET /acr/v1/{name}/_tags)
//! - Tag removal (DELETE /acr/v1/{name}/_tags/{reference})

use crate::error::{PurgeError, Result};
use crate::logging::Logger;
use crate::registry::api::{PageQuery, TagAttributes};
use crate::registry::auth::Auth;
use crate::registry::operations::{error_from_response, send};
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TagAttributeList {
    #[serde(default)]
    tags: Option<Vec<TagAttributes>>,
}

#[derive(Clone)]
pub struct TagOperations {
    client: Client,
    address: String,
    auth: Auth,
    output: Logger,
}

impl TagOperations {
    pub fn new(client: Client, address: String, auth: Auth, output: Logger) -> Self {
        Self {
            client,
            address,
            auth,
            output,
        }
    }

    /// List one page of tags, starting after `query.last`
    pub async fn list_tags(&self, repository: &str, query: &PageQuery) -> Result<Vec<TagAttributes>> {
        let url = format!("{}/acr/v1/{}/_tags", self.address, repository);
        self.output.detail(&format!(
            "Listing tags for {} after {:?}",
            repository, query.last
        ));

        let request = self
            .auth
            .apply(self.client.get(&url))
            .query(&paging_params(query));
        let response = send(request, &self.output, "tag listing").await?;

        if !response.status().is_success() {
            return Err(error_from_response(response, &format!("list tags of {}", repository)).await);
        }

        let body = response.text().await.map_err(|e| {
            PurgeError::Transport(format!("Failed to read tags response: {}", e))
        })?;
        let list: TagAttributeList = serde_json::from_str(&body).map_err(|e| {
            PurgeError::Transport(format!("Failed to parse tags response: {}", e))
        })?;

        Ok(list.tags.unwrap_or_default())
    }

    /// Remove a tag; the manifest it pointed at stays
    pub async fn delete_tag(&self, repository: &str, tag: &str) -> Result<()> {
        let url = format!("{}/acr/v1/{}/_tags/{}", self.address, repository, tag);
        self.output.verbose(&format!("Deleting tag {}:{}", repository, tag));

        let request = self.auth.apply(self.client.delete(&url));
        let response = send(request, &self.output, "tag deletion").await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response, &format!("delete tag {}:{}", repository, tag)).await)
        }
    }
}

/// Query string shared by the tag and manifest listings
pub(crate) fn paging_params(query: &PageQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("n", query.page_size.to_string())];
    if let Some(order_by) = &query.order_by {
        params.push(("orderby", order_by.clone()));
    }
    if let Some(last) = &query.last {
        params.push(("last", last.clone()));
    }
    params
}
