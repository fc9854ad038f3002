//! CMS page model.
//!
//! Pages keep their body in a block-document `content` column and record a
//! version automatically whenever that content changes.

use quire_core::subject::{SubjectConfig, Versionable};
use quire_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Page {
    pub id: DbId,
    pub title: String,
    pub path: String,
    pub content: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Versionable for Page {
    const CONFIG: SubjectConfig = SubjectConfig::new("page").auto_version_on_save();

    fn subject_id(&self) -> DbId {
        self.id
    }

    fn content(&self) -> Option<&serde_json::Value> {
        Some(&self.content)
    }

    fn label(&self) -> Option<&str> {
        Some(&self.title)
    }
}

/// DTO for creating a new page.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePage {
    pub title: String,
    pub path: String,
    /// Defaults to an empty block document.
    pub content: Option<serde_json::Value>,
}

/// DTO for updating a page. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePage {
    pub title: Option<String>,
    pub path: Option<String>,
    pub content: Option<serde_json::Value>,
}
