/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Opaque identity of whoever authored a version. Stored, never interpreted.
pub type ContributorId = DbId;

/// Per-subject version numbers start at 1.
pub type VersionNumber = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
