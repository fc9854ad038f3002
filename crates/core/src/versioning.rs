//! Version-store rules that don't need a database: sources, summaries,
//! what to capture, when a save earns a version, and what a restore writes.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::content::{blocks_of, BLOCKS_KEY};
use crate::error::CoreError;
use crate::subject::Versionable;
use crate::types::VersionNumber;

// ---------------------------------------------------------------------------
// Source constants
// ---------------------------------------------------------------------------

/// An explicit save by a caller.
pub const SOURCE_MANUAL: &str = "manual";
/// Recorded by the post-save hook.
pub const SOURCE_AUTO: &str = "auto";
/// Recorded by a restore.
pub const SOURCE_RESTORE: &str = "restore";

/// All valid version sources.
pub const VALID_SOURCES: &[&str] = &[SOURCE_MANUAL, SOURCE_AUTO, SOURCE_RESTORE];

/// Name of the document field on content-bearing subjects.
pub const CONTENT_FIELD: &str = "content";

/// Default summary for subjects without a usable label.
pub const DEFAULT_SUMMARY: &str = "Content updated";

/// Maximum length of a change summary.
pub const MAX_CHANGE_SUMMARY_LEN: usize = 1_000;

// ---------------------------------------------------------------------------
// VersionSource
// ---------------------------------------------------------------------------

/// How a version came to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionSource {
    #[default]
    Manual,
    Auto,
    Restore,
}

impl VersionSource {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => SOURCE_MANUAL,
            Self::Auto => SOURCE_AUTO,
            Self::Restore => SOURCE_RESTORE,
        }
    }

    /// Parse from a string, returning an error for unknown sources.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            SOURCE_MANUAL => Ok(Self::Manual),
            SOURCE_AUTO => Ok(Self::Auto),
            SOURCE_RESTORE => Ok(Self::Restore),
            other => Err(CoreError::Validation(format!(
                "Unknown version source: '{other}'. Valid sources: {}",
                VALID_SOURCES.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// `"Updated {label}"`, or [`DEFAULT_SUMMARY`] when the label is missing or blank.
pub fn default_change_summary(label: Option<&str>) -> String {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => format!("Updated {l}"),
        _ => DEFAULT_SUMMARY.to_string(),
    }
}

/// Summary recorded on the version a restore appends.
pub fn restore_summary(version_number: VersionNumber) -> String {
    format!("Restored to version {version_number}")
}

/// Validate an explicit change summary (non-blank, <= 1000 chars).
pub fn validate_change_summary(summary: &str) -> Result<(), CoreError> {
    if summary.trim().is_empty() {
        return Err(CoreError::Validation(
            "Change summary must not be empty".into(),
        ));
    }
    if summary.chars().count() > MAX_CHANGE_SUMMARY_LEN {
        return Err(CoreError::Validation(format!(
            "Change summary must be at most {MAX_CHANGE_SUMMARY_LEN} characters"
        )));
    }
    Ok(())
}

/// Use the explicit summary if given (validated), otherwise derive one from
/// the subject's label.
pub fn resolve_change_summary<S: Versionable>(
    subject: &S,
    summary: Option<&str>,
) -> Result<String, CoreError> {
    match summary {
        Some(s) => {
            validate_change_summary(s)?;
            Ok(s.to_string())
        }
        None => Ok(default_change_summary(subject.label())),
    }
}

/// Parameters for an explicit version creation. All optional.
#[derive(Debug, Clone, Default)]
pub struct NewVersion {
    pub contributor: Option<crate::types::ContributorId>,
    pub change_summary: Option<String>,
    pub source: VersionSource,
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// The full, self-contained content a new version stores.
///
/// Content-field subjects store the document verbatim when it is a mapping,
/// otherwise wrapped as `{"data": <content>}`. Other subjects store their
/// declared versionable attributes.
pub fn capture_content<S: Versionable>(subject: &S) -> Value {
    match subject.content() {
        Some(content @ Value::Object(_)) => content.clone(),
        Some(other) => serde_json::json!({ "data": other }),
        None => Value::Object(versionable_attributes_of(subject)),
    }
}

fn versionable_attributes_of<S: Versionable>(subject: &S) -> Map<String, Value> {
    S::CONFIG
        .versionable_attributes
        .iter()
        .filter_map(|name| {
            subject
                .attribute(name)
                .map(|value| ((*name).to_string(), value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Save changes and the auto-version predicate
// ---------------------------------------------------------------------------

/// Fields that changed on one save, as seen by the post-save hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveChanges {
    changed: BTreeSet<String>,
}

impl SaveChanges {
    /// Compare a subject before and after an update.
    pub fn between<S: Versionable>(before: &S, after: &S) -> Self {
        let mut changed = BTreeSet::new();
        if before.content() != after.content() {
            changed.insert(CONTENT_FIELD.to_string());
        }
        for name in S::CONFIG.versionable_attributes {
            if before.attribute(name) != after.attribute(name) {
                changed.insert((*name).to_string());
            }
        }
        Self { changed }
    }

    /// Changes implied by inserting a new subject: non-null fields count,
    /// and content must also be non-empty.
    pub fn created<S: Versionable>(subject: &S) -> Self {
        let mut changed = BTreeSet::new();
        if subject.content().is_some_and(is_meaningful_content) {
            changed.insert(CONTENT_FIELD.to_string());
        }
        for name in S::CONFIG.versionable_attributes {
            if subject.attribute(name).is_some_and(|v| !v.is_null()) {
                changed.insert((*name).to_string());
            }
        }
        Self { changed }
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.changed.insert(field.to_string());
        self
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// Whether the captured snapshot would differ.
    ///
    /// For content-field subjects that is the `content` field; for
    /// attribute subjects it is any versionable attribute.
    pub fn captured_content_changed<S: Versionable>(&self, subject: &S) -> bool {
        if subject.content().is_some() {
            self.contains(CONTENT_FIELD)
        } else {
            self.any_versionable_attribute::<S>()
        }
    }

    fn any_versionable_attribute<S: Versionable>(&self) -> bool {
        S::CONFIG
            .versionable_attributes
            .iter()
            .any(|name| self.contains(name))
    }
}

/// Block documents count only when they hold at least one block, whatever
/// editor metadata (`time`, `version`) rides along.
fn is_meaningful_content(content: &Value) -> bool {
    match content {
        Value::Null => false,
        Value::Object(obj) if obj.contains_key(BLOCKS_KEY) => !blocks_of(content).is_empty(),
        Value::Object(obj) => !obj.is_empty(),
        _ => true,
    }
}

/// Whether the post-save hook should record a version.
///
/// Requires the type to opt in, then: (has a version already, or the
/// captured content changed) and (content or a versionable attribute
/// changed).
pub fn should_auto_version<S: Versionable>(
    subject: &S,
    has_versions: bool,
    changes: &SaveChanges,
) -> bool {
    if !S::CONFIG.auto_version_on_save {
        return false;
    }
    let content_changed = changes.captured_content_changed(subject);
    let relevant_change =
        changes.contains(CONTENT_FIELD) || changes.any_versionable_attribute::<S>();
    (has_versions || content_changed) && relevant_change
}

// ---------------------------------------------------------------------------
// Restore planning
// ---------------------------------------------------------------------------

/// What a restore writes back to the live subject.
#[derive(Debug, Clone, PartialEq)]
pub enum RestorePlan {
    /// Replace the `content` field wholesale.
    Content(Value),
    /// Update only these declared attributes.
    Attributes(Map<String, Value>),
}

/// Decide how to roll `subject` back to `snapshot`.
///
/// Attribute subjects only take declared attributes that the snapshot
/// actually captured.
pub fn plan_restore<S: Versionable>(subject: &S, snapshot: &Value) -> RestorePlan {
    if subject.content().is_some() {
        return RestorePlan::Content(snapshot.clone());
    }
    let attrs = snapshot
        .as_object()
        .map(|captured| {
            S::CONFIG
                .versionable_attributes
                .iter()
                .filter_map(|name| {
                    captured
                        .get(*name)
                        .map(|value| ((*name).to_string(), value.clone()))
                })
                .collect()
        })
        .unwrap_or_default();
    RestorePlan::Attributes(attrs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
