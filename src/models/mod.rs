//! Document models and their encode/decode contract.
//!
//! Each model maps bidirectionally to the generic document representation
//! used on the wire ([`Fields`]). Encoding materializes any denormalized
//! fields the store's query engine needs; decoding rebuilds nested value
//! objects and fails loudly on shape mismatches.

mod series;
mod snapshot;
mod user;

pub use series::Series;
pub use snapshot::{AnalysisSnapshot, SnapshotTag};
pub(crate) use snapshot::TAG_CATEGORIES_FIELD;
pub use user::{FilePermissions, SeriesUser, SnapshotPermissions};

use crate::error::DecodeError;
use serde_json::Value;

/// Generic document representation: a flat-keyed JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// Bidirectional mapping between an in-memory record and its wire document.
///
/// Round-trip law: `decode(&encode(&x)) == Ok(x)` for every valid instance.
pub trait DocumentModel: Sized {
    fn encode(&self) -> Fields;
    fn decode(fields: &Fields) -> Result<Self, DecodeError>;
}

fn require<'a>(fields: &'a Fields, field: &'static str) -> Result<&'a Value, DecodeError> {
    fields.get(field).ok_or(DecodeError::MissingField(field))
}

pub(crate) fn require_str<'a>(
    fields: &'a Fields,
    field: &'static str,
) -> Result<&'a str, DecodeError> {
    require(fields, field)?.as_str().ok_or(DecodeError::WrongType {
        field,
        expected: "string",
    })
}

pub(crate) fn require_bool(fields: &Fields, field: &'static str) -> Result<bool, DecodeError> {
    require(fields, field)?.as_bool().ok_or(DecodeError::WrongType {
        field,
        expected: "boolean",
    })
}

pub(crate) fn require_array<'a>(
    fields: &'a Fields,
    field: &'static str,
) -> Result<&'a Vec<Value>, DecodeError> {
    require(fields, field)?.as_array().ok_or(DecodeError::WrongType {
        field,
        expected: "array",
    })
}

pub(crate) fn require_object<'a>(
    fields: &'a Fields,
    field: &'static str,
) -> Result<&'a Fields, DecodeError> {
    require(fields, field)?
        .as_object()
        .ok_or(DecodeError::WrongType {
            field,
            expected: "object",
        })
}

/// Decodes an array of strings, rejecting any non-string item.
pub(crate) fn string_items(
    field: &'static str,
    values: &[Value],
) -> Result<Vec<String>, DecodeError> {
    values
        .iter()
        .map(|v| {
            v.as_str().map(str::to_owned).ok_or(DecodeError::WrongType {
                field,
                expected: "array of strings",
            })
        })
        .collect()
}
