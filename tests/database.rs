//! Store-scenario tests for the database facade, run against the in-memory
//! backend with the rule set enforced on every read.

use std::sync::Arc;

use series_data::auth::Identity;
use series_data::models::{
    AnalysisSnapshot, DocumentModel, FilePermissions, Series, SeriesUser, SnapshotPermissions,
    SnapshotTag,
};
use series_data::store::{MemoryBackend, MemoryStore};
use series_data::{Database, StoreError};

fn series() -> Series {
    Series {
        series_id: "test-series".into(),
        series_name: "Test Series".into(),
        project_name: "Test Project".into(),
        pool_name: "Pool-Test".into(),
    }
}

fn untagged_snapshot() -> AnalysisSnapshot {
    AnalysisSnapshot::new(vec!["test_file_1.txt".into()], vec![])
}

fn tagged_snapshot() -> AnalysisSnapshot {
    AnalysisSnapshot::new(
        vec!["test_file_1.txt".into()],
        vec![SnapshotTag::new("latest")],
    )
}

fn read_entry() -> FilePermissions {
    FilePermissions::from([("test_file_1.txt".to_owned(), vec!["read".to_owned()])])
}

/// Seeds the backend with the standard test fixture:
///
/// - `user1`: read_all, no file permission entries
/// - `user2`: tag-scoped to "latest", read entry for `test_file_1.txt`
/// - `user3`: no snapshot access, read entry for `test_file_1.txt`
/// - `user4`: tag-scoped to "latest", entry without the read verb
/// - snapshot 1 untagged, snapshot 2 tagged "latest", both listing
///   `test_file_1.txt` with contents v1/v2
async fn seeded_backend() -> Arc<MemoryBackend> {
    let backend = MemoryBackend::new();
    backend
        .insert_document("series/series-1", series().encode())
        .await;

    let users = [
        SeriesUser::new(
            "user1@example.com",
            SnapshotPermissions::new(true, vec![]),
            FilePermissions::new(),
        ),
        SeriesUser::new(
            "user2@example.com",
            SnapshotPermissions::new(false, vec!["latest".into()]),
            read_entry(),
        ),
        SeriesUser::new(
            "user3@example.com",
            SnapshotPermissions::new(false, vec![]),
            read_entry(),
        ),
        SeriesUser::new(
            "user4@example.com",
            SnapshotPermissions::new(false, vec!["latest".into()]),
            FilePermissions::from([("test_file_1.txt".to_owned(), vec!["list".to_owned()])]),
        ),
    ];
    for user in users {
        backend
            .insert_document(
                format!("series/series-1/users/{}", user.email),
                user.encode(),
            )
            .await;
    }

    backend
        .insert_document("series/series-1/snapshots/1", untagged_snapshot().encode())
        .await;
    backend
        .insert_document("series/series-1/snapshots/2", tagged_snapshot().encode())
        .await;
    backend
        .insert_blob(
            "series/series-1/snapshots/1/files/test_file_1.txt",
            "Test Dataset 1 v1",
        )
        .await;
    backend
        .insert_blob(
            "series/series-1/snapshots/2/files/test_file_1.txt",
            "Test Dataset 1 v2",
        )
        .await;
    backend
}

fn database_for(backend: &Arc<MemoryBackend>, email: Option<&str>) -> Database {
    let identity = email.map(|email| Identity {
        user_id: email.split('@').next().unwrap().to_owned(),
        email: email.to_owned(),
    });
    let store: Arc<MemoryStore> = Arc::new(backend.for_identity(identity));
    Database::new(store.clone(), store)
}

fn assert_denied<T: std::fmt::Debug>(result: Result<T, StoreError>) {
    match result {
        Err(err) if err.is_permission_denied() => {}
        other => panic!("expected permission denied, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthenticated_caller_cannot_read_any_user_document() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, None);
    assert_denied(db.get_user("series-1", "user1@example.com").await);
    assert_denied(db.get_user("series-1", "user2@example.com").await);
}

#[tokio::test]
async fn user_can_read_their_own_user_document() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    let user = db
        .get_user("series-1", "user1@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        user,
        SeriesUser::new(
            "user1@example.com",
            SnapshotPermissions::new(true, vec![]),
            FilePermissions::new(),
        )
    );
}

#[tokio::test]
async fn user_cannot_read_another_users_document() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_denied(db.get_user("series-1", "user2@example.com").await);
}

#[tokio::test]
async fn read_all_user_reads_every_snapshot_via_single_get() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_eq!(
        db.get_analysis_snapshot("series-1", "1").await.unwrap(),
        Some(untagged_snapshot())
    );
    assert_eq!(
        db.get_analysis_snapshot("series-1", "2").await.unwrap(),
        Some(tagged_snapshot())
    );
}

#[tokio::test]
async fn read_all_user_lists_every_snapshot() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_eq!(
        db.get_analysis_snapshots("series-1", None).await.unwrap(),
        vec![untagged_snapshot(), tagged_snapshot()]
    );
}

#[tokio::test]
async fn tag_scoped_user_only_reads_tagged_snapshots_via_single_get() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user2@example.com"));
    assert_denied(db.get_analysis_snapshot("series-1", "1").await);
    assert_eq!(
        db.get_analysis_snapshot("series-1", "2").await.unwrap(),
        Some(tagged_snapshot())
    );
}

#[tokio::test]
async fn tag_scoped_user_must_filter_list_reads() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user2@example.com"));
    assert_denied(db.get_analysis_snapshots("series-1", None).await);
    assert_eq!(
        db.get_analysis_snapshots("series-1", Some(&["latest".to_owned()]))
            .await
            .unwrap(),
        vec![tagged_snapshot()]
    );
}

#[tokio::test]
async fn series_document_decodes_for_members() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_eq!(db.get_series("series-1").await.unwrap(), Some(series()));
}

#[tokio::test]
async fn missing_snapshot_is_not_found_rather_than_denied() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_eq!(db.get_analysis_snapshot("series-1", "999").await.unwrap(), None);
}

#[tokio::test]
async fn file_read_requires_both_snapshot_grant_and_read_entry() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user2@example.com"));

    // Snapshot 1 is untagged, so its copy of the file is off limits.
    assert_denied(db.get_file("series-1", "1", "test_file_1.txt").await);

    let content = db
        .get_file("series-1", "2", "test_file_1.txt")
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(content.as_ref(), b"Test Dataset 1 v2");
}

#[tokio::test]
async fn file_entry_without_read_verb_denies() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user4@example.com"));
    assert_denied(db.get_file("series-1", "2", "test_file_1.txt").await);
}

#[tokio::test]
async fn snapshot_gate_dominates_file_entry() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user3@example.com"));
    assert_denied(db.get_file("series-1", "1", "test_file_1.txt").await);
    assert_denied(db.get_file("series-1", "2", "test_file_1.txt").await);
}

#[tokio::test]
async fn read_all_without_file_entries_reads_no_files() {
    let backend = seeded_backend().await;
    let db = database_for(&backend, Some("user1@example.com"));
    assert_denied(db.get_file("series-1", "1", "test_file_1.txt").await);
    assert_denied(db.get_file("series-1", "2", "test_file_1.txt").await);
}

#[tokio::test]
async fn malformed_document_fails_loudly() {
    let backend = seeded_backend().await;
    backend
        .insert_document(
            "series/series-1/snapshots/3",
            serde_json::json!({ "files": [] }).as_object().cloned().unwrap(),
        )
        .await;
    let db = database_for(&backend, Some("user1@example.com"));
    match db.get_analysis_snapshot("series-1", "3").await {
        Err(StoreError::Decode(_)) => {}
        other => panic!("expected decode failure, got {other:?}"),
    }
}
