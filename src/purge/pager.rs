//! Cursor-driven enumeration of paged registry listings
//!
//! Listings are exposed as a lazy stream of pages. Each page's last key becomes
//! the cursor of the next request and an empty page ends the stream. A failed
//! request is yielded once and terminates the stream.

use crate::error::{PurgeError, Result};
use crate::registry::api::{ManifestAttributes, PageQuery, RegistryApi, TagAttributes};
use futures::Stream;
use futures::stream;
use std::future::Future;

/// Entries that can resume a listing
pub trait CursorKey {
    fn cursor_key(&self) -> &str;
}

impl CursorKey for TagAttributes {
    fn cursor_key(&self) -> &str {
        &self.name
    }
}

impl CursorKey for ManifestAttributes {
    fn cursor_key(&self) -> &str {
        &self.digest
    }
}

/// Walk a listing to completion, one `fetch` per page.
///
/// The stream is pull-driven: the next page is requested only when the consumer
/// asks for it, so a consumer that finishes its work on a page before polling
/// again never overlaps two pages.
pub fn paginate<T, F, Fut>(first: PageQuery, fetch: F) -> impl Stream<Item = Result<Vec<T>>>
where
    T: CursorKey,
    F: FnMut(PageQuery) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    stream::try_unfold((Some(first), fetch), |(query, mut fetch)| async move {
        let Some(query) = query else {
            return Ok::<_, PurgeError>(None);
        };

        let page = fetch(query.clone()).await?;
        let Some(last) = page.last() else {
            return Ok(None);
        };

        let next = query.after(last.cursor_key());
        Ok(Some((page, (Some(next), fetch))))
    })
}

/// Pages of tags in `repository`
pub fn tag_pages<'a>(
    registry: &'a dyn RegistryApi,
    repository: &'a str,
    page_size: usize,
) -> impl Stream<Item = Result<Vec<TagAttributes>>> + 'a {
    paginate(PageQuery::first(page_size), move |query| async move {
        registry.list_tags(repository, &query).await
    })
}

/// Pages of manifests in `repository`
pub fn manifest_pages<'a>(
    registry: &'a dyn RegistryApi,
    repository: &'a str,
    page_size: usize,
) -> impl Stream<Item = Result<Vec<ManifestAttributes>>> + 'a {
    paginate(PageQuery::first(page_size), move |query| async move {
        registry.list_manifests(repository, &query).await
    })
}
