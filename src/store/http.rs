//! `reqwest`-backed client for the managed backend's REST surface.
//!
//! Documents are served under
//! `{document_endpoint}/projects/{project}/documents/{path}` as
//! `{"fields": {...}}` objects; collection listings come back as
//! `{"documents": [...]}` in collection order. Blobs are resolved via
//! `{blob_endpoint}/b/{bucket}/o/{object}` into a time-limited download URL
//! and then fetched as a byte stream.
//!
//! Every call is a fresh round trip: no caching, no retries, no request
//! coalescing. Timeouts are whatever the transport applies.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{BlobStore, DocumentStore, FileHandle, ListFilter};
use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::models::Fields;

/// One HTTP connection pool per process, created on first use and reused for
/// the process lifetime. There is no explicit teardown.
fn shared_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(Client::new)
}

/// A document/blob store client bound to one identity's credentials.
pub struct HttpStore {
    client: Client,
    config: Arc<BackendConfig>,
    /// Bearer ID token of the signed-in identity, if any. The backend's rule
    /// evaluator decides what an unauthenticated read may see.
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct DocumentBody {
    fields: Fields,
}

#[derive(Deserialize)]
struct ListBody {
    #[serde(default)]
    documents: Vec<DocumentBody>,
}

#[derive(Deserialize)]
struct BlobMetadata {
    #[serde(rename = "downloadTokens")]
    download_tokens: String,
}

impl HttpStore {
    pub fn new(config: Arc<BackendConfig>, id_token: Option<String>) -> Self {
        Self {
            client: shared_client().clone(),
            config,
            id_token,
        }
    }

    fn document_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/documents/{}",
            self.config.document_endpoint, self.config.project_id, path
        )
    }

    fn blob_url(&self, path: &str) -> String {
        format!(
            "{}/b/{}/o/{}",
            self.config.blob_endpoint,
            self.config.bucket,
            urlencoding::encode(path)
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps the backend's rejection statuses onto the error taxonomy.
    /// Not-found is handled per call site because it is not a failure for
    /// document reads.
    fn check_status(response: &Response, path: &str) -> Result<(), StoreError> {
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::PermissionDenied {
                path: path.to_owned(),
            }),
            status => Err(StoreError::Status {
                status: status.as_u16(),
                path: path.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, StoreError> {
        debug!(path, "fetching document");
        let response = self
            .authorized(self.client.get(self.document_url(path)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(&response, path)?;
        let body: DocumentBody = response.json().await?;
        Ok(Some(body.fields))
    }

    async fn list_documents(
        &self,
        path: &str,
        filter: Option<&ListFilter>,
    ) -> Result<Vec<Fields>, StoreError> {
        debug!(path, ?filter, "listing documents");
        let mut request = self.authorized(self.client.get(self.document_url(path)));
        if let Some(ListFilter::ArrayContainsAny { field, values }) = filter {
            request = request.query(&[
                ("arrayContainsAny", *field),
                ("values", values.join(",").as_str()),
            ]);
        }
        let response = request.send().await?;
        Self::check_status(&response, path)?;
        let body: ListBody = response.json().await?;
        Ok(body.documents.into_iter().map(|d| d.fields).collect())
    }
}

#[async_trait]
impl BlobStore for HttpStore {
    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        debug!(path, "resolving download url");
        let url = self.blob_url(path);
        let response = self.authorized(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                path: path.to_owned(),
            });
        }
        Self::check_status(&response, path)?;
        let metadata: BlobMetadata = response.json().await?;
        Ok(format!(
            "{url}?alt=media&token={}",
            metadata.download_tokens
        ))
    }

    async fn fetch(&self, url: &str) -> Result<FileHandle, StoreError> {
        let response = self.client.get(url).send().await?;
        Self::check_status(&response, url)?;
        Ok(FileHandle::new(
            response.bytes_stream().map(|c| c.map_err(Into::into)).boxed(),
        ))
    }
}
