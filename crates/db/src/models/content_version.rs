//! Content version model.
//!
//! Versions are immutable snapshots of a subject's content. There is no
//! update DTO; the table rejects updates.

use quire_core::content::ContentDocument;
use quire_core::error::CoreError;
use quire_core::subject::SubjectRef;
use quire_core::types::{ContributorId, DbId, Timestamp, VersionNumber};
use quire_core::versioning::VersionSource;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `content_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentVersion {
    pub id: DbId,
    pub subject_type: String,
    pub subject_id: DbId,
    pub version_number: VersionNumber,
    pub content: serde_json::Value,
    pub contributor_id: Option<ContributorId>,
    pub change_summary: String,
    pub source: String,
    pub created_at: Timestamp,
}

impl ContentVersion {
    pub fn subject(&self) -> SubjectRef {
        SubjectRef::new(self.subject_type.clone(), self.subject_id)
    }

    pub fn source_kind(&self) -> Result<VersionSource, CoreError> {
        VersionSource::from_str(&self.source)
    }

    /// The captured content parsed as a block document.
    pub fn document(&self) -> ContentDocument {
        ContentDocument::from_value(&self.content)
    }
}

/// DTO for inserting a version. The version number is assigned on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentVersion {
    pub subject_type: String,
    pub subject_id: DbId,
    pub content: serde_json::Value,
    pub contributor_id: Option<ContributorId>,
    pub change_summary: String,
    pub source: String,
}
