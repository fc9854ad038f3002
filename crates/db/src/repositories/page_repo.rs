//! Repository for the `pages` table.
//!
//! Creates and updates run the post-save versioning hook in the same
//! transaction as the write.

use async_trait::async_trait;
use quire_core::content::empty_document;
use quire_core::error::CoreError;
use quire_core::types::{ContributorId, DbId};
use quire_core::versioning::RestorePlan;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::error::DbError;
use crate::models::page::{CreatePage, Page, UpdatePage};
use crate::store::SubjectStore;
use crate::versioning;

/// Column list for pages queries.
const COLUMNS: &str = "id, title, path, content, created_at, updated_at";

/// Provides CRUD operations for pages.
pub struct PageRepo;

impl PageRepo {
    /// Create a page. Records version 1 when the initial content is non-empty.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePage,
        contributor: Option<ContributorId>,
    ) -> Result<Page, DbError> {
        let content = input.content.clone().unwrap_or_else(empty_document);
        let query = format!(
            "INSERT INTO pages (title, path, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let page = sqlx::query_as::<_, Page>(&query)
            .bind(&input.title)
            .bind(&input.path)
            .bind(&content)
            .fetch_one(&mut *tx)
            .await?;

        versioning::record_save(&mut tx, None, &page, contributor).await?;
        tx.commit().await?;
        Ok(page)
    }

    /// Find a page by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update a page. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no page with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePage,
        contributor: Option<ContributorId>,
    ) -> Result<Option<Page>, DbError> {
        let mut tx = pool.begin().await?;
        let Some(before) = Self::lock_by_id(&mut tx, id).await? else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE pages SET
                title = COALESCE($2, title),
                path = COALESCE($3, path),
                content = COALESCE($4, content)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let after = sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.path)
            .bind(&input.content)
            .fetch_one(&mut *tx)
            .await?;

        versioning::record_save(&mut tx, Some(&before), &after, contributor).await?;
        tx.commit().await?;
        Ok(Some(after))
    }

    /// Load a page with `FOR UPDATE`, holding the row lock for the transaction.
    pub async fn lock_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Replace a page's content without running the versioning hook.
    pub async fn set_content(
        conn: &mut PgConnection,
        id: DbId,
        content: &serde_json::Value,
    ) -> Result<Page, sqlx::Error> {
        let query = format!("UPDATE pages SET content = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .bind(content)
            .fetch_one(&mut *conn)
            .await
    }
}

#[async_trait]
impl SubjectStore for Page {
    async fn find(conn: &mut PgConnection, id: DbId) -> Result<Option<Self>, sqlx::Error> {
        PageRepo::find_by_id(conn, id).await
    }

    async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Self>, sqlx::Error> {
        PageRepo::lock_by_id(conn, id).await
    }

    async fn apply_restore(
        conn: &mut PgConnection,
        id: DbId,
        plan: &RestorePlan,
    ) -> Result<Self, DbError> {
        match plan {
            RestorePlan::Content(content) => Ok(PageRepo::set_content(conn, id, content).await?),
            RestorePlan::Attributes(_) => Err(DbError::Core(CoreError::Validation(
                "Pages restore from content snapshots only".into(),
            ))),
        }
    }
}
