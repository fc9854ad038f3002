//! Block document model: what "content" means for storage and comparison.
//!
//! A document is a JSON mapping with an ordered `blocks` sequence plus the
//! editor's `time` and `version` bookkeeping fields. The `version` field is
//! the editor format version, unrelated to content version numbers.
//!
//! Parsing is lenient throughout. Anything that is not a recognised shape
//! degrades to an empty block sequence rather than an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Block type constants
// ---------------------------------------------------------------------------

pub const BLOCK_PARAGRAPH: &str = "paragraph";
pub const BLOCK_HEADER: &str = "header";
pub const BLOCK_LIST: &str = "list";
pub const BLOCK_QUOTE: &str = "quote";

/// Block types whose canonical text is their `data.text` field.
pub const TEXT_BLOCK_TYPES: &[&str] = &[BLOCK_PARAGRAPH, BLOCK_HEADER, BLOCK_QUOTE];

/// Document key holding the block sequence.
pub const BLOCKS_KEY: &str = "blocks";

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A single typed unit of content.
///
/// Keys other than `type` and `data` (editor ids, tunes, ...) are kept in
/// `extra` so a block serializes back to what was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub block_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(block_type: impl Into<String>, data: Value) -> Self {
        Self {
            block_type: block_type.into(),
            data,
            extra: Map::new(),
        }
    }

    /// Shorthand for a paragraph block with the given text.
    pub fn paragraph(text: &str) -> Self {
        Self::new(BLOCK_PARAGRAPH, serde_json::json!({ "text": text }))
    }

    /// Build a block from an arbitrary JSON value.
    ///
    /// Returns `None` for non-mapping values. A missing `type` becomes the
    /// empty string; a non-string `type` is stringified.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let block_type = match obj.get("type") {
            None | Some(Value::Null) => String::new(),
            Some(other) => stringify(other),
        };
        let data = obj.get("data").cloned().unwrap_or(Value::Null);
        let extra = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "type" && k.as_str() != "data")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self {
            block_type,
            data,
            extra,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut obj = self.extra.clone();
        obj.insert("type".into(), Value::String(self.block_type.clone()));
        obj.insert("data".into(), self.data.clone());
        Value::Object(obj)
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A parsed block document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ContentDocument {
    /// Parse a document leniently. Never fails; malformed input yields an
    /// empty document.
    pub fn from_value(value: &Value) -> Self {
        let time = value.get("time").and_then(Value::as_i64);
        let version = value
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            time,
            blocks: blocks_of(value),
            version,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(time) = self.time {
            obj.insert("time".into(), Value::from(time));
        }
        obj.insert(
            BLOCKS_KEY.into(),
            Value::Array(self.blocks.iter().map(Block::to_value).collect()),
        );
        if let Some(version) = &self.version {
            obj.insert("version".into(), Value::String(version.clone()));
        }
        Value::Object(obj)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// The value new subjects start with: `{"blocks": []}`.
pub fn empty_document() -> Value {
    serde_json::json!({ "blocks": [] })
}

/// Whether `value` is a recognised document structure (a JSON mapping).
pub fn is_document(value: &Value) -> bool {
    value.is_object()
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Ordered blocks of a document.
///
/// Empty when `document` is not a mapping or has no `blocks` sequence.
/// Non-mapping entries inside the sequence are skipped.
pub fn blocks_of(document: &Value) -> Vec<Block> {
    document
        .as_object()
        .and_then(|obj| obj.get(BLOCKS_KEY))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Block::from_value).collect())
        .unwrap_or_default()
}

/// Canonical text of a block, the unit of comparison when diffing.
///
/// Unknown block types compare by their type tag so they stay distinct
/// from one another instead of all collapsing to `""`.
pub fn text_of(block: &Block) -> String {
    let ty = block.block_type.as_str();
    if TEXT_BLOCK_TYPES.contains(&ty) {
        return block.data.get("text").map(stringify).unwrap_or_default();
    }
    if ty == BLOCK_LIST {
        return match block.data.get("items") {
            Some(Value::Array(items)) => items
                .iter()
                .map(list_item_text)
                .collect::<Vec<_>>()
                .join(" "),
            Some(other) => stringify(other),
            None => String::new(),
        };
    }
    block.block_type.clone()
}

/// Nested-list editors store items as `{"content": .., "items": [..]}`.
fn list_item_text(item: &Value) -> String {
    match item {
        Value::Object(obj) => match obj.get("content") {
            Some(content) => stringify(content),
            None => item.to_string(),
        },
        other => stringify(other),
    }
}

/// Strings verbatim, null as empty, everything else as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
