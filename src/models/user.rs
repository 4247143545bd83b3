use std::collections::BTreeMap;

use serde_json::Value;

use super::{require_array, require_bool, require_object, require_str, string_items};
use super::{DocumentModel, Fields};
use crate::error::DecodeError;

/// The permissions a user has for analysis snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotPermissions {
    /// Whether the user can read all the analysis snapshots in the series.
    pub read_all: bool,
    /// Which snapshot tag categories can be read, e.g.
    /// `["final-analysis", "latest"]`. Only consulted when `read_all` is
    /// false.
    pub read_tag_categories: Vec<String>,
}

impl SnapshotPermissions {
    pub fn new(read_all: bool, read_tag_categories: Vec<String>) -> Self {
        Self {
            read_all,
            read_tag_categories,
        }
    }
}

/// Per-file permission verbs, as an ordered map of
/// filename -> list of verbs, e.g. `{"participants.csv": ["read"]}`.
pub type FilePermissions = BTreeMap<String, Vec<String>>;

/// An analysis dashboard user, for the purpose of controlling permissions to
/// one series. Keyed by email address.
///
/// The permission data here and the enforcement in the backing store's rule
/// set must be kept synchronized: this layer only requests data, enforcement
/// happens at the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesUser {
    pub email: String,
    pub snapshot_permissions: SnapshotPermissions,
    pub file_permissions: FilePermissions,
}

impl SeriesUser {
    pub fn new(
        email: impl Into<String>,
        snapshot_permissions: SnapshotPermissions,
        file_permissions: FilePermissions,
    ) -> Self {
        Self {
            email: email.into(),
            snapshot_permissions,
            file_permissions,
        }
    }
}

impl DocumentModel for SeriesUser {
    fn encode(&self) -> Fields {
        let mut permissions = Fields::new();
        permissions.insert(
            "read_all".into(),
            Value::from(self.snapshot_permissions.read_all),
        );
        permissions.insert(
            "read_tag_categories".into(),
            Value::from(self.snapshot_permissions.read_tag_categories.clone()),
        );

        let mut file_permissions = Fields::new();
        for (filename, verbs) in &self.file_permissions {
            file_permissions.insert(filename.clone(), Value::from(verbs.clone()));
        }

        let mut fields = Fields::new();
        fields.insert("email".into(), Value::from(self.email.clone()));
        fields.insert("snapshot_permissions".into(), Value::Object(permissions));
        fields.insert("file_permissions".into(), Value::Object(file_permissions));
        fields
    }

    fn decode(fields: &Fields) -> Result<Self, DecodeError> {
        let permissions = require_object(fields, "snapshot_permissions")?;
        let snapshot_permissions = SnapshotPermissions::new(
            require_bool(permissions, "read_all")?,
            string_items(
                "read_tag_categories",
                require_array(permissions, "read_tag_categories")?,
            )?,
        );

        let mut file_permissions = FilePermissions::new();
        for (filename, verbs) in require_object(fields, "file_permissions")? {
            let verbs = verbs.as_array().ok_or(DecodeError::WrongType {
                field: "file_permissions",
                expected: "object of arrays",
            })?;
            file_permissions.insert(filename.clone(), string_items("file_permissions", verbs)?);
        }

        Ok(SeriesUser::new(
            require_str(fields, "email")?,
            snapshot_permissions,
            file_permissions,
        ))
    }
}
