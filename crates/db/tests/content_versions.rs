//! Integration tests for the version store.
//!
//! Exercises `quire_db::versioning` against a real database:
//! - Sequential, gapless version numbers per subject
//! - Default and explicit summaries, sources, contributors
//! - `latest_version` / `version_at` lookups
//! - Contributor sets and counts
//! - Uniqueness and immutability enforced by the schema
//! - Concurrent writers never share a version number

use assert_matches::assert_matches;
use quire_core::error::CoreError;
use quire_core::subject::Versionable;
use quire_core::versioning::{NewVersion, VersionSource};
use quire_db::error::DbError;
use quire_db::models::content_version::CreateContentVersion;
use quire_db::models::page::{CreatePage, Page};
use quire_db::repositories::{ContentVersionRepo, PageRepo};
use quire_db::versioning;
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn paragraphs(texts: &[&str]) -> Value {
    json!({
        "time": 1700000000000i64,
        "blocks": texts
            .iter()
            .map(|t| json!({ "type": "paragraph", "data": { "text": t } }))
            .collect::<Vec<_>>(),
        "version": "2.28.0"
    })
}

/// A page created with empty content, so it starts without versions.
async fn blank_page(pool: &PgPool, path: &str) -> Page {
    PageRepo::create(
        pool,
        &CreatePage {
            title: "About".to_string(),
            path: path.to_string(),
            content: None,
        },
        None,
    )
    .await
    .unwrap()
}

fn manual(contributor: Option<i64>) -> NewVersion {
    NewVersion {
        contributor,
        ..NewVersion::default()
    }
}

// ---------------------------------------------------------------------------
// Test: sequential numbering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_sequential_versions_are_gapless(pool: PgPool) {
    let page = blank_page(&pool, "/about").await;
    assert_eq!(versioning::version_count(&pool, &page).await.unwrap(), 0);

    for _ in 0..5 {
        versioning::create_version(&pool, &page, &manual(None))
            .await
            .unwrap();
    }

    let numbers: Vec<i32> = versioning::versions(&pool, &page)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version_number)
        .collect();
    assert_eq!(numbers, vec![5, 4, 3, 2, 1], "newest first, no gaps");
    assert_eq!(versioning::version_count(&pool, &page).await.unwrap(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_numbering_is_per_subject(pool: PgPool) {
    let a = blank_page(&pool, "/a").await;
    let b = blank_page(&pool, "/b").await;

    let a1 = versioning::create_version(&pool, &a, &manual(None)).await.unwrap();
    let a2 = versioning::create_version(&pool, &a, &manual(None)).await.unwrap();
    let b1 = versioning::create_version(&pool, &b, &manual(None)).await.unwrap();

    assert_eq!(a1.version_number, 1);
    assert_eq!(a2.version_number, 2);
    assert_eq!(b1.version_number, 1, "other subjects start their own sequence");
    assert_eq!(b1.subject(), b.subject_ref());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_writers_never_share_a_number(pool: PgPool) {
    let page = blank_page(&pool, "/busy").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = pool.clone();
        let page = page.clone();
        handles.push(tokio::spawn(async move {
            versioning::create_version(&pool, &page, &manual(Some(i)))
                .await
                .map(|v| v.version_number)
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
}

// ---------------------------------------------------------------------------
// Test: captured fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_defaults(pool: PgPool) {
    let page = blank_page(&pool, "/defaults").await;

    let version = versioning::create_version(&pool, &page, &NewVersion::default())
        .await
        .unwrap();

    assert!(version.id > 0);
    assert_eq!(version.subject_type, "page");
    assert_eq!(version.subject_id, page.id);
    assert_eq!(version.version_number, 1);
    assert_eq!(version.change_summary, "Updated About");
    assert_eq!(version.source, "manual");
    assert_eq!(version.source_kind().unwrap(), VersionSource::Manual);
    assert_eq!(version.contributor_id, None);
    assert_eq!(version.content, page.content, "full copy of live content");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_version_explicit_fields(pool: PgPool) {
    let page = PageRepo::create(
        &pool,
        &CreatePage {
            title: "Team".to_string(),
            path: "/team".to_string(),
            content: Some(paragraphs(&["Hello"])),
        },
        None,
    )
    .await
    .unwrap();

    let version = versioning::create_version(
        &pool,
        &page,
        &NewVersion {
            contributor: Some(42),
            change_summary: Some("Reviewed copy".to_string()),
            source: VersionSource::Manual,
        },
    )
    .await
    .unwrap();

    assert_eq!(version.version_number, 2, "creation already recorded version 1");
    assert_eq!(version.change_summary, "Reviewed copy");
    assert_eq!(version.contributor_id, Some(42));
    assert_eq!(version.document().blocks.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_summary_rejected(pool: PgPool) {
    let page = blank_page(&pool, "/blank").await;

    let result = versioning::create_version(
        &pool,
        &page,
        &NewVersion {
            change_summary: Some("   ".to_string()),
            ..NewVersion::default()
        },
    )
    .await;

    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
    assert_eq!(versioning::version_count(&pool, &page).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Test: lookups
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_latest_and_version_at(pool: PgPool) {
    let page = blank_page(&pool, "/lookups").await;
    assert!(versioning::latest_version(&pool, &page).await.unwrap().is_none());

    versioning::create_version(&pool, &page, &manual(Some(1))).await.unwrap();
    versioning::create_version(&pool, &page, &manual(Some(2))).await.unwrap();

    let latest = versioning::latest_version(&pool, &page).await.unwrap().unwrap();
    assert_eq!(latest.version_number, 2);
    assert_eq!(latest.contributor_id, Some(2));

    let first = versioning::version_at(&pool, &page, 1).await.unwrap().unwrap();
    assert_eq!(first.contributor_id, Some(1));

    assert!(versioning::version_at(&pool, &page, 3).await.unwrap().is_none());
    assert!(versioning::version_at(&pool, &page, 0).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: contributors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_contributors_collapse_duplicates(pool: PgPool) {
    let page = blank_page(&pool, "/contributors").await;

    versioning::create_version(&pool, &page, &manual(Some(7))).await.unwrap();
    versioning::create_version(&pool, &page, &manual(Some(7))).await.unwrap();
    assert_eq!(versioning::contributors_count(&pool, &page).await.unwrap(), 1);

    versioning::create_version(&pool, &page, &manual(Some(8))).await.unwrap();
    assert_eq!(versioning::contributors_count(&pool, &page).await.unwrap(), 2);

    versioning::create_version(&pool, &page, &manual(None)).await.unwrap();
    assert_eq!(
        versioning::contributors_count(&pool, &page).await.unwrap(),
        2,
        "system versions have no contributor"
    );

    let mut ids = versioning::contributors(&pool, &page).await.unwrap();
    ids.sort_unstable();
    assert_eq!(ids, vec![7, 8]);
}

// ---------------------------------------------------------------------------
// Test: schema guarantees
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_version_number_is_validation_error(pool: PgPool) {
    let page = blank_page(&pool, "/dup").await;
    versioning::create_version(&pool, &page, &manual(None)).await.unwrap();

    let err = sqlx::query(
        "INSERT INTO content_versions (subject_type, subject_id, version_number, content, change_summary)
         VALUES ('page', $1, 1, '{}'::jsonb, 'dup')",
    )
    .bind(page.id)
    .execute(&pool)
    .await
    .unwrap_err();

    let err = DbError::from(err);
    assert!(err.is_validation(), "unexpected error: {err}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_versions_are_immutable(pool: PgPool) {
    let page = blank_page(&pool, "/immutable").await;
    let version = versioning::create_version(&pool, &page, &manual(None)).await.unwrap();

    let result = sqlx::query("UPDATE content_versions SET change_summary = 'edited' WHERE id = $1")
        .bind(version.id)
        .execute(&pool)
        .await;
    assert!(result.is_err(), "versions must reject updates");

    let reloaded = versioning::version_at(&pool, &page, 1).await.unwrap().unwrap();
    assert_eq!(reloaded.change_summary, version.change_summary);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_source_rejected_by_schema(pool: PgPool) {
    let page = blank_page(&pool, "/source").await;
    let mut tx = pool.begin().await.unwrap();
    let result = ContentVersionRepo::insert_next(
        &mut tx,
        &CreateContentVersion {
            subject_type: "page".to_string(),
            subject_id: page.id,
            content: json!({}),
            contributor_id: None,
            change_summary: "Imported".to_string(),
            source: "import".to_string(),
        },
    )
    .await;

    let err = DbError::from(result.unwrap_err());
    assert!(err.is_validation(), "unexpected error: {err}");
}
