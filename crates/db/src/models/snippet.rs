//! Reusable HTML snippet model.
//!
//! Snippets have no `content` column. Their `name` and `body` are the
//! versioned attributes; `css_class` is presentation only. Auto-versioning
//! is left off, so versions are recorded only by explicit calls.

use quire_core::subject::{SubjectConfig, Versionable};
use quire_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

pub const ATTR_NAME: &str = "name";
pub const ATTR_BODY: &str = "body";

/// A row from the `snippets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Snippet {
    pub id: DbId,
    pub name: String,
    pub body: String,
    pub css_class: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Versionable for Snippet {
    const CONFIG: SubjectConfig =
        SubjectConfig::new("snippet").versionable_attributes(&[ATTR_NAME, ATTR_BODY]);

    fn subject_id(&self) -> DbId {
        self.id
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            ATTR_NAME => Some(Value::String(self.name.clone())),
            ATTR_BODY => Some(Value::String(self.body.clone())),
            _ => None,
        }
    }

    fn label(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// DTO for creating a new snippet.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSnippet {
    pub name: String,
    pub body: Option<String>,
    pub css_class: Option<String>,
}

/// DTO for updating a snippet. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSnippet {
    pub name: Option<String>,
    pub body: Option<String>,
    pub css_class: Option<String>,
}
