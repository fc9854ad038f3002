//! The versionable-subject capability.
//!
//! Any entity type can own versioned content by implementing
//! [`Versionable`]. Versions refer back to their subject through a
//! [`SubjectRef`] (type tag + id) rather than a concrete Rust type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::DbId;

/// Static, per-type versioning configuration.
///
/// Declared once alongside the subject type; never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectConfig {
    /// Tag stored in `content_versions.subject_type`.
    pub subject_type: &'static str,
    /// Whether saves record a version automatically.
    pub auto_version_on_save: bool,
    /// Attributes captured when the type has no `content` field. Changes to
    /// these also count toward auto-versioning.
    pub versionable_attributes: &'static [&'static str],
}

impl SubjectConfig {
    /// Configuration with auto-versioning off and no versionable attributes.
    pub const fn new(subject_type: &'static str) -> Self {
        Self {
            subject_type,
            auto_version_on_save: false,
            versionable_attributes: &[],
        }
    }

    pub const fn auto_version_on_save(mut self) -> Self {
        self.auto_version_on_save = true;
        self
    }

    pub const fn versionable_attributes(mut self, attrs: &'static [&'static str]) -> Self {
        self.versionable_attributes = attrs;
        self
    }
}

/// An entity whose content is versioned.
pub trait Versionable {
    const CONFIG: SubjectConfig;

    fn subject_id(&self) -> DbId;

    /// The `content` document, or `None` when the type has no content field.
    ///
    /// A type *with* a content field that currently holds null returns
    /// `Some(&Value::Null)`.
    fn content(&self) -> Option<&Value> {
        None
    }

    /// Current value of a named attribute, `None` if the type has no such
    /// attribute.
    fn attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Human-readable label used for default change summaries.
    fn label(&self) -> Option<&str> {
        None
    }

    fn subject_ref(&self) -> SubjectRef {
        SubjectRef::new(Self::CONFIG.subject_type, self.subject_id())
    }
}

/// Polymorphic reference to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    pub subject_type: String,
    pub subject_id: DbId,
}

impl SubjectRef {
    pub fn new(subject_type: impl Into<String>, subject_id: DbId) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id,
        }
    }

    /// Key used to serialise version-number assignment for this subject.
    pub fn lock_key(&self) -> String {
        format!("{}:{}", self.subject_type, self.subject_id)
    }
}

impl std::fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.subject_type, self.subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        id: DbId,
    }

    impl Versionable for Note {
        const CONFIG: SubjectConfig = SubjectConfig::new("note");

        fn subject_id(&self) -> DbId {
            self.id
        }
    }

    #[test]
    fn config_defaults_are_off_and_empty() {
        let config = SubjectConfig::new("note");
        assert!(!config.auto_version_on_save);
        assert!(config.versionable_attributes.is_empty());
    }

    #[test]
    fn config_builders_set_fields() {
        const CONFIG: SubjectConfig = SubjectConfig::new("snippet")
            .auto_version_on_save()
            .versionable_attributes(&["name", "body"]);
        assert!(CONFIG.auto_version_on_save);
        assert_eq!(CONFIG.versionable_attributes, &["name", "body"]);
    }

    #[test]
    fn subject_ref_uses_type_tag() {
        let note = Note { id: 7 };
        let r = note.subject_ref();
        assert_eq!(r, SubjectRef::new("note", 7));
        assert_eq!(r.to_string(), "note#7");
        assert_eq!(r.lock_key(), "note:7");
        assert!(note.content().is_none());
        assert!(note.label().is_none());
    }
}
