//! Backend seams: the document store and blob store the facade reads from.
//!
//! [`HttpStore`] talks to the managed backend; [`MemoryStore`] is the
//! in-process analogue used by the test suites and local development. Both
//! sit behind the same traits so [`crate::Database`] never knows which one
//! it is bound to.

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::{MemoryBackend, MemoryStore};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::StoreError;
use crate::models::Fields;

/// A query constraint evaluated by the store's own engine, never in-process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListFilter {
    /// Matches documents whose array field `field` contains any of `values`.
    ArrayContainsAny {
        field: &'static str,
        values: Vec<String>,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a single document. `Ok(None)` means the document does not
    /// exist; a rejected read is `Err(StoreError::PermissionDenied)`.
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, StoreError>;

    /// Lists the documents in a collection, in the store's natural collection
    /// order, optionally constrained by `filter`.
    async fn list_documents(
        &self,
        path: &str,
        filter: Option<&ListFilter>,
    ) -> Result<Vec<Fields>, StoreError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolves a time-limited download URL for the blob at `path`. This is
    /// where the store's permission check runs.
    async fn download_url(&self, path: &str) -> Result<String, StoreError>;

    /// Issues a streaming fetch of a previously resolved download URL.
    async fn fetch(&self, url: &str) -> Result<FileHandle, StoreError>;
}

/// A handle onto a blob's content stream.
///
/// Reading the handle may still fail if the store rejected or revoked the
/// resolution step; callers see that as an `Err` chunk.
pub struct FileHandle {
    stream: BoxStream<'static, Result<Bytes, StoreError>>,
}

impl FileHandle {
    pub fn new(stream: BoxStream<'static, Result<Bytes, StoreError>>) -> Self {
        Self { stream }
    }

    /// A handle over a single in-memory chunk.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            stream: stream::iter([Ok(bytes)]).boxed(),
        }
    }

    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, StoreError>> {
        self.stream
    }

    /// Drains the stream into one buffer.
    pub async fn bytes(mut self) -> Result<Bytes, StoreError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle").finish_non_exhaustive()
    }
}
