use serde_json::Value;

use super::{require_str, DocumentModel, Fields};
use crate::error::DecodeError;

/// The parent document for all analysis done within a series.
///
/// A series is a collection of radio shows that were analysed together.
/// Series documents are created by the ingestion process and are read-only
/// from this layer's perspective.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Series {
    /// Unique id of this series.
    pub series_id: String,
    /// User-facing display name of this series.
    pub series_name: String,
    /// Display name of the project this series ran under. Multiple series
    /// may have run under the same project.
    pub project_name: String,
    /// Name of the engagement database pool that holds this series' data.
    pub pool_name: String,
}

impl DocumentModel for Series {
    fn encode(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("series_id".into(), Value::from(self.series_id.clone()));
        fields.insert("series_name".into(), Value::from(self.series_name.clone()));
        fields.insert("project_name".into(), Value::from(self.project_name.clone()));
        fields.insert("pool_name".into(), Value::from(self.pool_name.clone()));
        fields
    }

    fn decode(fields: &Fields) -> Result<Self, DecodeError> {
        Ok(Series {
            series_id: require_str(fields, "series_id")?.to_owned(),
            series_name: require_str(fields, "series_name")?.to_owned(),
            project_name: require_str(fields, "project_name")?.to_owned(),
            pool_name: require_str(fields, "pool_name")?.to_owned(),
        })
    }
}
