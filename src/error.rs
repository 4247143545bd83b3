//! Error taxonomy for store reads.
//!
//! "Document does not exist" is not an error: single-document getters return
//! `Ok(None)` for an absent document so callers can render not-found and
//! permission-denied differently. Everything that is a failure lands in
//! [`StoreError`].

use thiserror::Error;

/// A document exists but does not match the expected shape.
///
/// This is schema drift between the ingestion process and this client, so it
/// fails loudly instead of defaulting the field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's rule evaluator rejected the read. Never collapsed into
    /// not-found; the UI treats the two differently.
    #[error("permission denied reading `{path}`")]
    PermissionDenied { path: String },

    /// A blob resolution step found no object at the path.
    #[error("`{path}` not found")]
    NotFound { path: String },

    /// Network, timeout or service failure. Propagated unmodified; the
    /// facade performs no retries.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The backend answered with an unexpected status code.
    #[error("backend returned status {status} for `{path}`")]
    Status { status: u16, path: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(Box::new(err))
    }
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }
}
