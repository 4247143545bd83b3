use std::collections::BTreeSet;

use serde_json::Value;

use super::{require_array, require_str, string_items, DocumentModel, Fields};
use crate::error::DecodeError;

/// Wire field holding the denormalized tag-category set, kept so the store's
/// query engine can filter snapshots without decoding the nested tag list.
pub(crate) const TAG_CATEGORIES_FIELD: &str = "tag_categories";

/// A category label attached to an analysis snapshot, e.g. "latest" or
/// "final-analysis". Tag categories scope snapshot visibility per user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotTag {
    pub tag_category: String,
}

impl SnapshotTag {
    pub fn new(tag_category: impl Into<String>) -> Self {
        Self {
            tag_category: tag_category.into(),
        }
    }
}

/// A versioned set of output files plus category tags, produced by one
/// analysis run within a series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisSnapshot {
    /// Names of the files this snapshot references.
    pub files: Vec<String>,
    pub tags: Vec<SnapshotTag>,
}

impl AnalysisSnapshot {
    pub fn new(files: Vec<String>, tags: Vec<SnapshotTag>) -> Self {
        Self { files, tags }
    }

    /// The distinct tag categories across this snapshot's tags. Recomputed on
    /// demand; the nested tag list is the source of truth.
    pub fn unique_tag_categories(&self) -> BTreeSet<String> {
        self.tags.iter().map(|t| t.tag_category.clone()).collect()
    }
}

impl DocumentModel for AnalysisSnapshot {
    fn encode(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            "files".into(),
            Value::from(self.files.clone()),
        );
        fields.insert(
            "tags".into(),
            Value::Array(
                self.tags
                    .iter()
                    .map(|t| {
                        let mut tag = Fields::new();
                        tag.insert("tag_category".into(), Value::from(t.tag_category.clone()));
                        Value::Object(tag)
                    })
                    .collect(),
            ),
        );
        // Denormalized copy of the distinct categories, written redundantly
        // because the store's query engine cannot filter on a nested list's
        // projected field.
        fields.insert(
            TAG_CATEGORIES_FIELD.into(),
            Value::from(
                self.unique_tag_categories()
                    .into_iter()
                    .collect::<Vec<String>>(),
            ),
        );
        fields
    }

    fn decode(fields: &Fields) -> Result<Self, DecodeError> {
        let files = string_items("files", require_array(fields, "files")?)?;
        let tags = require_array(fields, "tags")?
            .iter()
            .map(|v| {
                let tag = v.as_object().ok_or(DecodeError::WrongType {
                    field: "tags",
                    expected: "array of objects",
                })?;
                Ok(SnapshotTag::new(require_str(tag, "tag_category")?))
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;
        // `tag_categories` is an index over `tags`, not decoded state.
        Ok(AnalysisSnapshot::new(files, tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let snapshot = AnalysisSnapshot::new(
            vec!["test_file_1.txt".into(), "participants.csv".into()],
            vec![SnapshotTag::new("latest"), SnapshotTag::new("final-analysis")],
        );
        assert_eq!(AnalysisSnapshot::decode(&snapshot.encode()), Ok(snapshot));
    }

    #[test]
    fn round_trips_when_empty() {
        let snapshot = AnalysisSnapshot::new(vec![], vec![]);
        assert_eq!(AnalysisSnapshot::decode(&snapshot.encode()), Ok(snapshot));
    }

    #[test]
    fn encode_materializes_distinct_tag_categories() {
        let snapshot = AnalysisSnapshot::new(
            vec![],
            vec![
                SnapshotTag::new("latest"),
                SnapshotTag::new("latest"),
                SnapshotTag::new("final-analysis"),
            ],
        );
        let fields = snapshot.encode();
        assert_eq!(
            fields[TAG_CATEGORIES_FIELD],
            Value::from(vec!["final-analysis", "latest"])
        );
    }

    #[test]
    fn unique_tag_categories_deduplicates() {
        let snapshot = AnalysisSnapshot::new(
            vec![],
            vec![SnapshotTag::new("latest"), SnapshotTag::new("latest")],
        );
        assert_eq!(snapshot.unique_tag_categories().len(), 1);
    }

    #[test]
    fn decode_fails_on_malformed_tag() {
        let mut fields = AnalysisSnapshot::new(vec![], vec![]).encode();
        fields.insert("tags".into(), Value::from(vec!["latest"]));
        assert_eq!(
            AnalysisSnapshot::decode(&fields),
            Err(DecodeError::WrongType {
                field: "tags",
                expected: "array of objects"
            })
        );
    }
}
