//! In-process store backend, the local analogue of the managed backend's
//! emulator.
//!
//! Holds documents and blobs in ordered maps and evaluates the
//! [`crate::rules`] rule set on every read against the identity a handle is
//! bound to, so local reads agree with production enforcement. Seeding goes
//! through the backend directly, bypassing rules the way the ingestion
//! process writes past them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{BlobStore, DocumentStore, FileHandle, ListFilter};
use crate::auth::Identity;
use crate::error::StoreError;
use crate::models::{AnalysisSnapshot, DocumentModel, Fields, SeriesUser};
use crate::rules::{self, Resource};

const MEMORY_URL_SCHEME: &str = "memory://";

/// Shared backing state. One backend is seeded once and handed out as
/// per-identity [`MemoryStore`] handles.
#[derive(Default)]
pub struct MemoryBackend {
    documents: RwLock<BTreeMap<String, Fields>>,
    blobs: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Writes a document with rules disabled (the seeding path).
    pub async fn insert_document(&self, path: impl Into<String>, fields: Fields) {
        self.documents.write().await.insert(path.into(), fields);
    }

    /// Writes a blob with rules disabled (the seeding path).
    pub async fn insert_blob(&self, path: impl Into<String>, content: impl Into<Bytes>) {
        self.blobs.write().await.insert(path.into(), content.into());
    }

    pub async fn clear(&self) {
        self.documents.write().await.clear();
        self.blobs.write().await.clear();
    }

    /// A store handle whose reads are evaluated as `identity`. `None` is an
    /// unauthenticated caller.
    pub fn for_identity(self: &Arc<Self>, identity: Option<Identity>) -> MemoryStore {
        MemoryStore {
            backend: Arc::clone(self),
            identity,
        }
    }
}

/// A per-identity handle onto a [`MemoryBackend`].
pub struct MemoryStore {
    backend: Arc<MemoryBackend>,
    identity: Option<Identity>,
}

impl MemoryStore {
    fn denied(path: &str) -> StoreError {
        StoreError::PermissionDenied {
            path: path.to_owned(),
        }
    }

    /// The caller's own user document under the series, if any. This is what
    /// the rule set consults for membership-based reads.
    fn member(
        &self,
        documents: &BTreeMap<String, Fields>,
        series_id: &str,
    ) -> Result<Option<SeriesUser>, StoreError> {
        let Some(identity) = &self.identity else {
            return Ok(None);
        };
        let path = format!("series/{series_id}/users/{}", identity.email);
        documents
            .get(&path)
            .map(SeriesUser::decode)
            .transpose()
            .map_err(Into::into)
    }
}

fn matches_filter(fields: &Fields, filter: Option<&ListFilter>) -> bool {
    match filter {
        None => true,
        Some(ListFilter::ArrayContainsAny { field, values }) => fields
            .get(*field)
            .and_then(Value::as_array)
            .map_or(false, |items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|item| values.iter().any(|v| v == item))
            }),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, StoreError> {
        // Paths outside the store's scheme hit the rule set's default deny.
        let Some(resource) = Resource::parse(path) else {
            return Err(Self::denied(path));
        };
        let documents = self.backend.documents.read().await;
        let allowed = match resource {
            Resource::User { user_key, .. } => {
                rules::can_read_user(self.identity.as_ref(), user_key)
            }
            Resource::Series { series_id } => {
                rules::can_read_series(self.member(&documents, series_id)?.as_ref())
            }
            Resource::Snapshot { series_id, .. } => {
                let member = self.member(&documents, series_id)?;
                match documents.get(path) {
                    Some(fields) => {
                        rules::can_read_snapshot(member.as_ref(), &AnalysisSnapshot::decode(fields)?)
                    }
                    // A missing snapshot has no tags to grant through, so
                    // only read_all members get as far as the empty result.
                    None => member.map_or(false, |m| m.snapshot_permissions.read_all),
                }
            }
            Resource::SnapshotCollection { .. } | Resource::File { .. } => false,
        };
        if !allowed {
            return Err(Self::denied(path));
        }
        Ok(documents.get(path).cloned())
    }

    async fn list_documents(
        &self,
        path: &str,
        filter: Option<&ListFilter>,
    ) -> Result<Vec<Fields>, StoreError> {
        let Some(Resource::SnapshotCollection { series_id }) = Resource::parse(path) else {
            return Err(Self::denied(path));
        };
        let documents = self.backend.documents.read().await;
        let member = self.member(&documents, series_id)?;
        if !rules::admits_snapshot_query(member.as_ref(), filter) {
            return Err(Self::denied(path));
        }
        let prefix = format!("{path}/");
        Ok(documents
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter(|(key, _)| !key[prefix.len()..].contains('/'))
            .filter(|(_, fields)| matches_filter(fields, filter))
            .map(|(_, fields)| fields.clone())
            .collect())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        let Some(Resource::File {
            series_id,
            snapshot_id,
            filename,
        }) = Resource::parse(path)
        else {
            return Err(Self::denied(path));
        };
        let documents = self.backend.documents.read().await;
        let member = self.member(&documents, series_id)?;
        let snapshot_path = format!("series/{series_id}/snapshots/{snapshot_id}");
        let snapshot = documents
            .get(&snapshot_path)
            .map(AnalysisSnapshot::decode)
            .transpose()?;
        let allowed = snapshot
            .as_ref()
            .map_or(false, |s| rules::can_read_file(member.as_ref(), s, filename));
        if !allowed {
            return Err(Self::denied(path));
        }
        if !self.backend.blobs.read().await.contains_key(path) {
            return Err(StoreError::NotFound {
                path: path.to_owned(),
            });
        }
        Ok(format!("{MEMORY_URL_SCHEME}{path}"))
    }

    async fn fetch(&self, url: &str) -> Result<FileHandle, StoreError> {
        let Some(path) = url.strip_prefix(MEMORY_URL_SCHEME) else {
            return Err(StoreError::NotFound {
                path: url.to_owned(),
            });
        };
        // The permission check ran at resolution time; the handle only fails
        // here if the blob disappeared in between.
        match self.backend.blobs.read().await.get(path) {
            Some(content) => Ok(FileHandle::from_bytes(content.clone())),
            None => Err(StoreError::NotFound {
                path: path.to_owned(),
            }),
        }
    }
}
