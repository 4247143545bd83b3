//! Procedural mirror of the permission rules installed on the managed
//! backend.
//!
//! In production the backend's own rule evaluator enforces these on every
//! read; the facade never filters in-process. The in-memory store applies
//! this module so that local reads agree with production semantics, and the
//! integration tests exercise it as the authoritative description of who may
//! read what.

use crate::auth::Identity;
use crate::models::{AnalysisSnapshot, SeriesUser};
use crate::store::ListFilter;

/// The verb a `file_permissions` entry must carry for a blob read.
pub const READ_VERB: &str = "read";

/// A parsed store path, one variant per protected resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource<'a> {
    Series {
        series_id: &'a str,
    },
    User {
        series_id: &'a str,
        user_key: &'a str,
    },
    Snapshot {
        series_id: &'a str,
        snapshot_id: &'a str,
    },
    SnapshotCollection {
        series_id: &'a str,
    },
    File {
        series_id: &'a str,
        snapshot_id: &'a str,
        filename: &'a str,
    },
}

impl<'a> Resource<'a> {
    /// Parses a document or blob path into the resource it addresses.
    /// Returns `None` for paths outside the store's path scheme.
    pub fn parse(path: &'a str) -> Option<Self> {
        let mut segments = path.split('/');
        if segments.next()? != "series" {
            return None;
        }
        let series_id = segments.next()?;
        let resource = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (None, ..) => Resource::Series { series_id },
            (Some("users"), Some(user_key), None, _) => Resource::User {
                series_id,
                user_key,
            },
            (Some("snapshots"), None, ..) => Resource::SnapshotCollection { series_id },
            (Some("snapshots"), Some(snapshot_id), None, _) => Resource::Snapshot {
                series_id,
                snapshot_id,
            },
            (Some("snapshots"), Some(snapshot_id), Some("files"), Some(filename)) => {
                if segments.next().is_some() {
                    return None;
                }
                Resource::File {
                    series_id,
                    snapshot_id,
                    filename,
                }
            }
            _ => return None,
        };
        Some(resource)
    }
}

/// A user may read their own user document and no other's. Unauthenticated
/// callers read nothing.
pub fn can_read_user(identity: Option<&Identity>, user_key: &str) -> bool {
    identity.map_or(false, |i| i.email == user_key)
}

/// Series documents are readable by anyone with a user document under the
/// series.
pub fn can_read_series(member: Option<&SeriesUser>) -> bool {
    member.is_some()
}

/// A snapshot is readable iff the member holds `read_all` or the snapshot's
/// tag categories intersect the member's readable categories.
pub fn can_read_snapshot(member: Option<&SeriesUser>, snapshot: &AnalysisSnapshot) -> bool {
    let Some(member) = member else {
        return false;
    };
    if member.snapshot_permissions.read_all {
        return true;
    }
    snapshot
        .unique_tag_categories()
        .iter()
        .any(|c| member.snapshot_permissions.read_tag_categories.contains(c))
}

/// A file blob is readable iff the owning snapshot both grants access and
/// lists the file, AND the member's `file_permissions` entry for that file
/// exists and includes the read verb. The two gates compose with AND: a
/// snapshot grant without a file entry denies, and a file entry without a
/// snapshot grant denies.
pub fn can_read_file(
    member: Option<&SeriesUser>,
    snapshot: &AnalysisSnapshot,
    filename: &str,
) -> bool {
    if !can_read_snapshot(member, snapshot) {
        return false;
    }
    if !snapshot.files.iter().any(|f| f == filename) {
        return false;
    }
    member
        .and_then(|m| m.file_permissions.get(filename))
        .map_or(false, |verbs| verbs.iter().any(|v| v == READ_VERB))
}

/// Whether a snapshot-collection query is provably safe for the member.
///
/// The rule evaluator admits a list read only when every document the query
/// can match is readable: any query for a `read_all` member, or a
/// tag-category filter whose values all fall inside the member's readable
/// categories. An unfiltered query from a tag-scoped member is rejected
/// outright rather than partially answered.
pub fn admits_snapshot_query(member: Option<&SeriesUser>, filter: Option<&ListFilter>) -> bool {
    let Some(member) = member else {
        return false;
    };
    if member.snapshot_permissions.read_all {
        return true;
    }
    match filter {
        Some(ListFilter::ArrayContainsAny { field, values }) => {
            *field == crate::models::TAG_CATEGORIES_FIELD
                && !values.is_empty()
                && values
                    .iter()
                    .all(|v| member.snapshot_permissions.read_tag_categories.contains(v))
        }
        None => false,
    }
}
