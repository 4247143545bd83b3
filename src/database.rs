//! Typed data-access facade over the document and blob stores.
//!
//! Each getter composes a store path from caller-supplied identifiers,
//! issues a single read, and applies the matching model decode. Enforcement
//! of who may read what happens inside the store backend (a trust boundary
//! external to this code); the facade never filters results in-process and
//! never collapses permission-denied into not-found.

use std::sync::Arc;

use tracing::debug;

use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::models::{
    AnalysisSnapshot, DocumentModel, Series, SeriesUser, TAG_CATEGORIES_FIELD,
};
use crate::store::{BlobStore, DocumentStore, FileHandle, HttpStore, ListFilter};

/// The dashboard's database handle, bound to one identity's credentials.
///
/// Every call is a fresh round trip: no caching, no retries, no request
/// coalescing. Calls are independent reads and may be issued concurrently
/// without coordination.
pub struct Database {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl Database {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { documents, blobs }
    }

    /// Production wiring: both stores speak to the managed backend,
    /// authenticated as the signed-in identity's ID token.
    pub fn connect(config: Arc<BackendConfig>, id_token: Option<String>) -> Self {
        let store = Arc::new(HttpStore::new(config, id_token));
        Self::new(store.clone(), store)
    }

    /// Gets the user object for the given series and user key.
    ///
    /// Returns `Ok(None)` if no such user document exists.
    pub async fn get_user(
        &self,
        series_id: &str,
        user_key: &str,
    ) -> Result<Option<SeriesUser>, StoreError> {
        self.get_decoded(&format!("series/{series_id}/users/{user_key}"))
            .await
    }

    /// Gets the series document itself.
    pub async fn get_series(&self, series_id: &str) -> Result<Option<Series>, StoreError> {
        self.get_decoded(&format!("series/{series_id}")).await
    }

    /// Gets the specified analysis snapshot.
    pub async fn get_analysis_snapshot(
        &self,
        series_id: &str,
        snapshot_id: &str,
    ) -> Result<Option<AnalysisSnapshot>, StoreError> {
        self.get_decoded(&format!("series/{series_id}/snapshots/{snapshot_id}"))
            .await
    }

    /// Gets the analysis snapshots within a series, in the store's natural
    /// collection order.
    ///
    /// When `filter_tag_categories` is supplied, only snapshots tagged with
    /// any of those categories are returned; the filter runs on the store's
    /// query engine against the denormalized `tag_categories` field, not
    /// in-process.
    pub async fn get_analysis_snapshots(
        &self,
        series_id: &str,
        filter_tag_categories: Option<&[String]>,
    ) -> Result<Vec<AnalysisSnapshot>, StoreError> {
        let path = format!("series/{series_id}/snapshots");
        let filter = filter_tag_categories.map(|categories| ListFilter::ArrayContainsAny {
            field: TAG_CATEGORIES_FIELD,
            values: categories.to_vec(),
        });
        debug!(%path, ?filter, "listing analysis snapshots");
        self.documents
            .list_documents(&path, filter.as_ref())
            .await?
            .iter()
            .map(|fields| AnalysisSnapshot::decode(fields).map_err(Into::into))
            .collect()
    }

    /// Resolves a time-limited download URL for a snapshot file and opens a
    /// streaming fetch of its content.
    ///
    /// The returned handle may itself fail to read if the store rejected the
    /// resolution step.
    pub async fn get_file(
        &self,
        series_id: &str,
        snapshot_id: &str,
        filename: &str,
    ) -> Result<FileHandle, StoreError> {
        let path = format!("series/{series_id}/snapshots/{snapshot_id}/files/{filename}");
        debug!(%path, "fetching snapshot file");
        let url = self.blobs.download_url(&path).await?;
        self.blobs.fetch(&url).await
    }

    async fn get_decoded<M: DocumentModel>(&self, path: &str) -> Result<Option<M>, StoreError> {
        debug!(%path, "fetching document");
        self.documents
            .get_document(path)
            .await?
            .as_ref()
            .map(M::decode)
            .transpose()
            .map_err(Into::into)
    }
}
