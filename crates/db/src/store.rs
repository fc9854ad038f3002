//! Persistence capability a subject type needs for restores.

use async_trait::async_trait;
use quire_core::subject::Versionable;
use quire_core::types::DbId;
use quire_core::versioning::RestorePlan;
use sqlx::PgConnection;

use crate::error::DbError;

/// A versionable type backed by its own table.
///
/// The locking and writing methods run on a connection the caller has
/// already placed inside a transaction.
#[async_trait]
pub trait SubjectStore: Versionable + Sized + Send + Sync {
    /// Load the persisted row without locking it.
    async fn find(conn: &mut PgConnection, id: DbId) -> Result<Option<Self>, sqlx::Error>;

    /// Load the live row and lock it until the transaction ends.
    async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Self>, sqlx::Error>;

    /// Write a restore plan to the live row and return the updated subject.
    async fn apply_restore(
        conn: &mut PgConnection,
        id: DbId,
        plan: &RestorePlan,
    ) -> Result<Self, DbError>;
}
