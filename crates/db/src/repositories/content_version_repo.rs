//! Repository for the `content_versions` table.
//!
//! Versions are append-only. Version numbers are assigned inside the insert
//! as `MAX + 1` while the caller holds the per-subject advisory lock (see
//! [`ContentVersionRepo::lock_subject`]).

use quire_core::subject::SubjectRef;
use quire_core::types::{ContributorId, VersionNumber};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::content_version::{ContentVersion, CreateContentVersion};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, subject_type, subject_id, version_number, content, \
    contributor_id, change_summary, source, created_at";

/// Provides append and read operations for content versions.
pub struct ContentVersionRepo;

impl ContentVersionRepo {
    // ── Writes ───────────────────────────────────────────────────────

    /// Take the per-subject advisory lock for the rest of the current
    /// transaction. Serializes version-number assignment for one subject.
    pub async fn lock_subject(
        conn: &mut PgConnection,
        subject: &SubjectRef,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(subject.lock_key())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Insert a version with the next version number for its subject.
    ///
    /// Callers must hold [`lock_subject`](Self::lock_subject) in the same
    /// transaction; the unique constraint rejects any number that still
    /// collides.
    pub async fn insert_next(
        conn: &mut PgConnection,
        input: &CreateContentVersion,
    ) -> Result<ContentVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO content_versions
                (subject_type, subject_id, version_number, content, contributor_id, change_summary, source)
             VALUES (
                $1, $2,
                (SELECT COALESCE(MAX(version_number), 0) + 1 FROM content_versions
                  WHERE subject_type = $1 AND subject_id = $2),
                $3, $4, $5, $6
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(&input.subject_type)
            .bind(input.subject_id)
            .bind(&input.content)
            .bind(input.contributor_id)
            .bind(&input.change_summary)
            .bind(&input.source)
            .fetch_one(&mut *conn)
            .await
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Find the version with the highest version number.
    pub async fn find_latest<'e, E: PgExecutor<'e>>(
        executor: E,
        subject: &SubjectRef,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE subject_type = $1 AND subject_id = $2
             ORDER BY version_number DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(&subject.subject_type)
            .bind(subject.subject_id)
            .fetch_optional(executor)
            .await
    }

    /// Find a specific version of a subject.
    pub async fn find_by_number<'e, E: PgExecutor<'e>>(
        executor: E,
        subject: &SubjectRef,
        version_number: VersionNumber,
    ) -> Result<Option<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE subject_type = $1 AND subject_id = $2 AND version_number = $3"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(&subject.subject_type)
            .bind(subject.subject_id)
            .bind(version_number)
            .fetch_optional(executor)
            .await
    }

    /// List all versions of a subject, newest first.
    pub async fn list_by_subject(
        pool: &PgPool,
        subject: &SubjectRef,
    ) -> Result<Vec<ContentVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM content_versions
             WHERE subject_type = $1 AND subject_id = $2
             ORDER BY version_number DESC"
        );
        sqlx::query_as::<_, ContentVersion>(&query)
            .bind(&subject.subject_type)
            .bind(subject.subject_id)
            .fetch_all(pool)
            .await
    }

    /// Number of versions recorded for a subject.
    pub async fn count_by_subject<'e, E: PgExecutor<'e>>(
        executor: E,
        subject: &SubjectRef,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM content_versions \
             WHERE subject_type = $1 AND subject_id = $2",
        )
        .bind(&subject.subject_type)
        .bind(subject.subject_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Distinct non-null contributors across a subject's versions.
    pub async fn contributors(
        pool: &PgPool,
        subject: &SubjectRef,
    ) -> Result<Vec<ContributorId>, sqlx::Error> {
        let rows: Vec<(ContributorId,)> = sqlx::query_as(
            "SELECT DISTINCT contributor_id FROM content_versions \
             WHERE subject_type = $1 AND subject_id = $2 AND contributor_id IS NOT NULL",
        )
        .bind(&subject.subject_type)
        .bind(subject.subject_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Count of distinct non-null contributors.
    pub async fn count_contributors(
        pool: &PgPool,
        subject: &SubjectRef,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT contributor_id) FROM content_versions \
             WHERE subject_type = $1 AND subject_id = $2",
        )
        .bind(&subject.subject_type)
        .bind(subject.subject_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
