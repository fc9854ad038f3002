use quire_core::error::CoreError;

/// PostgreSQL SQLSTATE codes treated as validation failures.
const UNIQUE_VIOLATION: &str = "23505";
const NOT_NULL_VIOLATION: &str = "23502";
const CHECK_VIOLATION: &str = "23514";

/// Error type for persistence operations.
///
/// Constraint violations reported by PostgreSQL are classified into
/// [`CoreError::Validation`] on conversion; every other `sqlx` error is
/// carried through as [`DbError::Database`].
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A domain-level error from `quire_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Core(CoreError::Validation(_)))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code();
            let is_constraint = matches!(
                code.as_deref(),
                Some(UNIQUE_VIOLATION | NOT_NULL_VIOLATION | CHECK_VIOLATION)
            );
            if is_constraint {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return DbError::Core(CoreError::Validation(format!(
                    "Constraint {constraint} violated: {}",
                    db_err.message()
                )));
            }
        }
        DbError::Database(err)
    }
}
