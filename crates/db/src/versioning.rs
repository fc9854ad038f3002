//! Version store and restore orchestration.
//!
//! These functions are the entry points callers use: explicit version
//! creation, history reads, the post-save hook repositories run, restores,
//! and diffs between stored snapshots.

use quire_core::diff::{diff, BlockDiff};
use quire_core::subject::Versionable;
use quire_core::types::{ContributorId, VersionNumber};
use quire_core::versioning::{
    capture_content, plan_restore, resolve_change_summary, restore_summary,
    should_auto_version, NewVersion, SaveChanges, VersionSource,
};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;
use crate::models::content_version::{ContentVersion, CreateContentVersion};
use crate::repositories::ContentVersionRepo;
use crate::store::SubjectStore;

/// Outcome of a successful restore.
#[derive(Debug, Clone)]
pub struct Restored<S> {
    /// The subject as written by the restore.
    pub subject: S,
    /// The version recording the restore.
    pub version: ContentVersion,
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Snapshot `subject` as a new version in its own transaction.
///
/// Always allowed, whatever the subject type's auto-version setting.
pub async fn create_version<S: Versionable>(
    pool: &PgPool,
    subject: &S,
    input: &NewVersion,
) -> Result<ContentVersion, DbError> {
    let mut tx = pool.begin().await?;
    let version = create_version_in(&mut tx, subject, input).await?;
    tx.commit().await?;
    Ok(version)
}

/// Snapshot `subject` as a new version inside the caller's transaction.
pub async fn create_version_in<S: Versionable>(
    conn: &mut PgConnection,
    subject: &S,
    input: &NewVersion,
) -> Result<ContentVersion, DbError> {
    let change_summary = resolve_change_summary(subject, input.change_summary.as_deref())?;
    let subject_ref = subject.subject_ref();

    ContentVersionRepo::lock_subject(conn, &subject_ref).await?;
    let version = ContentVersionRepo::insert_next(
        conn,
        &CreateContentVersion {
            subject_type: subject_ref.subject_type,
            subject_id: subject_ref.subject_id,
            content: capture_content(subject),
            contributor_id: input.contributor,
            change_summary,
            source: input.source.as_str().to_string(),
        },
    )
    .await?;

    tracing::info!(
        subject_type = %version.subject_type,
        subject_id = version.subject_id,
        version_number = version.version_number,
        source = %version.source,
        "Content version created"
    );
    Ok(version)
}

/// Post-save hook: record an `auto` version if the save warrants one.
///
/// `before` is `None` when the subject was just inserted. Runs inside the
/// caller's transaction so the write and its version commit together.
pub async fn record_save<S: Versionable>(
    conn: &mut PgConnection,
    before: Option<&S>,
    after: &S,
    contributor: Option<ContributorId>,
) -> Result<Option<ContentVersion>, DbError> {
    if !S::CONFIG.auto_version_on_save {
        return Ok(None);
    }

    let changes = match before {
        Some(before) => SaveChanges::between(before, after),
        None => SaveChanges::created(after),
    };

    let subject_ref = after.subject_ref();
    ContentVersionRepo::lock_subject(conn, &subject_ref).await?;
    let has_versions = ContentVersionRepo::count_by_subject(&mut *conn, &subject_ref).await? > 0;

    if !should_auto_version(after, has_versions, &changes) {
        tracing::debug!(
            subject = %subject_ref,
            has_versions,
            ?changes,
            "Save does not warrant a version"
        );
        return Ok(None);
    }

    let input = NewVersion {
        contributor,
        change_summary: None,
        source: VersionSource::Auto,
    };
    create_version_in(conn, after, &input).await.map(Some)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// The version with the highest number, if any.
pub async fn latest_version<S: Versionable>(
    pool: &PgPool,
    subject: &S,
) -> Result<Option<ContentVersion>, DbError> {
    Ok(ContentVersionRepo::find_latest(pool, &subject.subject_ref()).await?)
}

/// The version with exactly this number, if any.
pub async fn version_at<S: Versionable>(
    pool: &PgPool,
    subject: &S,
    version_number: VersionNumber,
) -> Result<Option<ContentVersion>, DbError> {
    Ok(ContentVersionRepo::find_by_number(pool, &subject.subject_ref(), version_number).await?)
}

/// Full history, newest first.
pub async fn versions<S: Versionable>(
    pool: &PgPool,
    subject: &S,
) -> Result<Vec<ContentVersion>, DbError> {
    Ok(ContentVersionRepo::list_by_subject(pool, &subject.subject_ref()).await?)
}

pub async fn version_count<S: Versionable>(pool: &PgPool, subject: &S) -> Result<i64, DbError> {
    Ok(ContentVersionRepo::count_by_subject(pool, &subject.subject_ref()).await?)
}

/// Distinct contributors across all versions, in no particular order.
/// System versions (no contributor) are not counted.
pub async fn contributors<S: Versionable>(
    pool: &PgPool,
    subject: &S,
) -> Result<Vec<ContributorId>, DbError> {
    Ok(ContentVersionRepo::contributors(pool, &subject.subject_ref()).await?)
}

pub async fn contributors_count<S: Versionable>(
    pool: &PgPool,
    subject: &S,
) -> Result<i64, DbError> {
    Ok(ContentVersionRepo::count_contributors(pool, &subject.subject_ref()).await?)
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// Roll `subject` back to version `version_number` and record the restore
/// as a new `restore` version.
///
/// Returns `Ok(None)` without writing anything when the version (or the
/// subject's row) does not exist. The content write and the new version
/// share one transaction; an error from either rolls both back.
pub async fn restore<S: SubjectStore>(
    pool: &PgPool,
    subject: &S,
    version_number: VersionNumber,
    contributor: Option<ContributorId>,
) -> Result<Option<Restored<S>>, DbError> {
    let subject_ref = subject.subject_ref();
    let mut tx = pool.begin().await?;

    // Row lock before the version lock, matching the order repository
    // updates take them in.
    let Some(live) = S::find_for_update(&mut tx, subject_ref.subject_id).await? else {
        tracing::warn!(subject = %subject_ref, "Restore subject not found");
        return Ok(None);
    };

    ContentVersionRepo::lock_subject(&mut tx, &subject_ref).await?;
    let Some(target) =
        ContentVersionRepo::find_by_number(&mut *tx, &subject_ref, version_number).await?
    else {
        tracing::warn!(subject = %subject_ref, version_number, "Restore target version not found");
        return Ok(None);
    };

    let plan = plan_restore(&live, &target.content);
    let restored = S::apply_restore(&mut tx, subject_ref.subject_id, &plan).await?;

    let input = NewVersion {
        contributor,
        change_summary: Some(restore_summary(version_number)),
        source: VersionSource::Restore,
    };
    let version = create_version_in(&mut tx, &restored, &input).await?;
    tx.commit().await?;

    tracing::info!(
        subject = %subject_ref,
        restored_to = version_number,
        version_number = version.version_number,
        "Subject restored"
    );
    Ok(Some(Restored {
        subject: restored,
        version,
    }))
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Diff two stored versions. `None` if either is missing.
pub async fn diff_versions<S: Versionable>(
    pool: &PgPool,
    subject: &S,
    from: VersionNumber,
    to: VersionNumber,
) -> Result<Option<BlockDiff>, DbError> {
    let subject_ref = subject.subject_ref();
    let older = ContentVersionRepo::find_by_number(pool, &subject_ref, from).await?;
    let newer = ContentVersionRepo::find_by_number(pool, &subject_ref, to).await?;
    Ok(match (older, newer) {
        (Some(older), Some(newer)) => Some(diff(&older.content, &newer.content)),
        _ => None,
    })
}

/// Diff a stored version against the subject's persisted content.
///
/// The row is reloaded, so a stale `subject` still diffs against what is
/// stored. `None` if the version or the row is missing.
pub async fn diff_with_live<S: SubjectStore>(
    pool: &PgPool,
    subject: &S,
    version_number: VersionNumber,
) -> Result<Option<BlockDiff>, DbError> {
    let subject_ref = subject.subject_ref();
    let mut conn = pool.acquire().await?;

    let Some(version) =
        ContentVersionRepo::find_by_number(&mut *conn, &subject_ref, version_number).await?
    else {
        return Ok(None);
    };
    let Some(live) = S::find(&mut conn, subject_ref.subject_id).await? else {
        return Ok(None);
    };
    Ok(Some(diff(&version.content, &capture_content(&live))))
}
