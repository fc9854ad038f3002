//! Presence-based block diff between two documents.
//!
//! Blocks are matched by canonical text membership, not by position. A
//! block's fate depends only on whether its text appears anywhere in the
//! other document, so reordered blocks read as unchanged and an edited
//! block reads as one removal plus one addition.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::content::{blocks_of, is_document, text_of, Block};

/// Block-level classification of two documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockDiff {
    /// Blocks of the newer document whose text the older one lacks.
    pub added: Vec<Block>,
    /// Blocks of the older document whose text the newer one lacks.
    pub removed: Vec<Block>,
    /// Blocks of the older document whose text the newer one also has.
    pub unchanged: Vec<Block>,
}

/// Block counts of a [`BlockDiff`], for list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl BlockDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            added: self.added.len(),
            removed: self.removed.len(),
            unchanged: self.unchanged.len(),
        }
    }
}

/// Compare a historical document against a newer one.
///
/// Returns the all-empty diff when either argument is not a mapping.
pub fn diff(version_document: &Value, current_document: &Value) -> BlockDiff {
    if !is_document(version_document) || !is_document(current_document) {
        return BlockDiff::default();
    }
    diff_blocks(&blocks_of(version_document), &blocks_of(current_document))
}

/// Classify two already-extracted block sequences.
pub fn diff_blocks(version_blocks: &[Block], current_blocks: &[Block]) -> BlockDiff {
    let version_texts = text_set(version_blocks);
    let current_texts = text_set(current_blocks);

    let (unchanged, removed): (Vec<Block>, Vec<Block>) = version_blocks
        .iter()
        .cloned()
        .partition(|b| current_texts.contains(&text_of(b)));

    let added = current_blocks
        .iter()
        .filter(|b| !version_texts.contains(&text_of(b)))
        .cloned()
        .collect();

    BlockDiff {
        added,
        removed,
        unchanged,
    }
}

/// Whether `block`'s canonical text matches any block in `others`.
pub fn block_present_in(block: &Block, others: &[Block]) -> bool {
    let text = text_of(block);
    others.iter().any(|other| text_of(other) == text)
}

fn text_set(blocks: &[Block]) -> HashSet<String> {
    blocks.iter().map(text_of).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
