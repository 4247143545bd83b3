//! Static backend connection parameters, supplied once at process start.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable `{0}`")]
    MissingVar(&'static str),
}

/// Connection parameters for the managed document and blob stores.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Backend project id the document store is scoped to.
    pub project_id: String,
    /// Base URL of the document store's REST surface.
    pub document_endpoint: String,
    /// Base URL of the blob store's REST surface.
    pub blob_endpoint: String,
    /// Blob store bucket holding snapshot files.
    pub bucket: String,
}

impl BackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: required_var("SERIES_DATA_PROJECT_ID")?,
            document_endpoint: required_var("SERIES_DATA_DOCUMENT_ENDPOINT")?,
            blob_endpoint: required_var("SERIES_DATA_BLOB_ENDPOINT")?,
            bucket: required_var("SERIES_DATA_BUCKET")?,
        })
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
