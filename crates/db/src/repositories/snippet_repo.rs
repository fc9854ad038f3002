//! Repository for the `snippets` table.

use async_trait::async_trait;
use quire_core::error::CoreError;
use quire_core::types::{ContributorId, DbId};
use quire_core::versioning::RestorePlan;
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::error::DbError;
use crate::models::snippet::{CreateSnippet, Snippet, UpdateSnippet, ATTR_BODY, ATTR_NAME};
use crate::store::SubjectStore;
use crate::versioning;

/// Column list for snippets queries.
const COLUMNS: &str = "id, name, body, css_class, created_at, updated_at";

/// Provides CRUD operations for snippets.
pub struct SnippetRepo;

impl SnippetRepo {
    /// Create a snippet.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSnippet,
        contributor: Option<ContributorId>,
    ) -> Result<Snippet, DbError> {
        let query = format!(
            "INSERT INTO snippets (name, body, css_class)
             VALUES ($1, COALESCE($2, ''), $3)
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let snippet = sqlx::query_as::<_, Snippet>(&query)
            .bind(&input.name)
            .bind(&input.body)
            .bind(&input.css_class)
            .fetch_one(&mut *tx)
            .await?;

        versioning::record_save(&mut tx, None, &snippet, contributor).await?;
        tx.commit().await?;
        Ok(snippet)
    }

    /// Find a snippet by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Snippet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM snippets WHERE id = $1");
        sqlx::query_as::<_, Snippet>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Update a snippet. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no snippet with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSnippet,
        contributor: Option<ContributorId>,
    ) -> Result<Option<Snippet>, DbError> {
        let mut tx = pool.begin().await?;
        let Some(before) = Self::lock_by_id(&mut tx, id).await? else {
            return Ok(None);
        };

        let query = format!(
            "UPDATE snippets SET
                name = COALESCE($2, name),
                body = COALESCE($3, body),
                css_class = COALESCE($4, css_class)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let after = sqlx::query_as::<_, Snippet>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.body)
            .bind(&input.css_class)
            .fetch_one(&mut *tx)
            .await?;

        versioning::record_save(&mut tx, Some(&before), &after, contributor).await?;
        tx.commit().await?;
        Ok(Some(after))
    }

    /// Load a snippet with `FOR UPDATE`, holding the row lock for the transaction.
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Snippet>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM snippets WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Snippet>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Overwrite the versioned attributes present in `attrs`; absent ones
    /// keep their current value.
    pub async fn set_attributes(
        conn: &mut PgConnection,
        id: DbId,
        attrs: &Map<String, Value>,
    ) -> Result<Snippet, DbError> {
        let name = string_attr(attrs, ATTR_NAME)?;
        let body = string_attr(attrs, ATTR_BODY)?;
        let query = format!(
            "UPDATE snippets SET
                name = COALESCE($2, name),
                body = COALESCE($3, body)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let snippet = sqlx::query_as::<_, Snippet>(&query)
            .bind(id)
            .bind(name)
            .bind(body)
            .fetch_one(&mut *conn)
            .await?;
        Ok(snippet)
    }
}

/// Captured attribute as text. Absent or null means "leave unchanged".
fn string_attr<'a>(attrs: &'a Map<String, Value>, name: &str) -> Result<Option<&'a str>, DbError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(DbError::Core(CoreError::Validation(format!(
            "Snippet attribute '{name}' must be a string, got {other}"
        )))),
    }
}

#[async_trait]
impl SubjectStore for Snippet {
    async fn find(conn: &mut PgConnection, id: DbId) -> Result<Option<Self>, sqlx::Error> {
        SnippetRepo::find_by_id(conn, id).await
    }

    async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Self>, sqlx::Error> {
        SnippetRepo::lock_by_id(conn, id).await
    }

    async fn apply_restore(
        conn: &mut PgConnection,
        id: DbId,
        plan: &RestorePlan,
    ) -> Result<Self, DbError> {
        match plan {
            RestorePlan::Attributes(attrs) => SnippetRepo::set_attributes(conn, id, attrs).await,
            RestorePlan::Content(_) => Err(DbError::Core(CoreError::Validation(
                "Snippets restore from attribute snapshots only".into(),
            ))),
        }
    }
}
