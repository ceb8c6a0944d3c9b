//! Content block types.
//!
//! Message content is either a plain string or an ordered list of content
//! blocks. A block is a JSON mapping carrying a `type` key — `text` blocks
//! are understood structurally, everything else (images, documents,
//! provider extensions) is carried opaquely and round-trips untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single content block: a JSON mapping with a `type` key.
///
/// Only `{"type": "text", "text": ...}` blocks are interpreted; all other
/// shapes pass through opaquely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBlock(Map<String, Value>);

impl ContentBlock {
    /// Create a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        let mut map = Map::new();
        let _ = map.insert("type".into(), Value::String("text".into()));
        let _ = map.insert("text".into(), Value::String(text.into()));
        Self(map)
    }

    /// Wrap an arbitrary tagged mapping as a block.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The block's `type` tag, if present.
    #[must_use]
    pub fn block_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// The text of a `text` block, `None` for any other block shape.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if self.block_type() != Some("text") {
            return None;
        }
        self.0.get("text").and_then(Value::as_str)
    }

    /// Returns `true` if this is a `text` block.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.as_text().is_some()
    }

    /// The underlying mapping.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    // A "plain" text block carries only the tag and the text; only those
    // coalesce, never blocks with sibling keys.
    fn plain_text(&self) -> Option<&str> {
        if self.0.len() == 2 { self.as_text() } else { None }
    }
}

/// Message content: a plain string or an ordered list of content blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text.
    Text(String),
    /// Structured content blocks.
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::Blocks(blocks)
    }
}

impl MessageContent {
    /// Returns the string if this is plain text content, `None` otherwise.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blocks(_) => None,
        }
    }

    /// Returns the block list if this is block content, `None` otherwise.
    #[must_use]
    pub fn blocks(&self) -> Option<&[ContentBlock]> {
        match self {
            Self::Text(_) => None,
            Self::Blocks(blocks) => Some(blocks),
        }
    }

    /// Flatten to renderable text: plain text as-is, block content as its
    /// text blocks joined with newlines.
    #[must_use]
    pub fn flatten_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Coerce to a block list. Plain text becomes a single text block.
    #[must_use]
    pub fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            Self::Text(text) => vec![ContentBlock::text(text)],
            Self::Blocks(blocks) => blocks,
        }
    }

    /// Concatenate two contents.
    ///
    /// Two strings concatenate directly. Otherwise both sides coerce to
    /// block lists and the lists concatenate; a pair of plain text blocks
    /// meeting at the seam combines into one.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Text(mut left), Self::Text(right)) => {
                left.push_str(&right);
                Self::Text(left)
            }
            (left, right) => {
                let mut blocks = left.into_blocks();
                let mut rest = right.into_blocks();
                let coalesced = match (blocks.last(), rest.first()) {
                    (Some(last), Some(first)) => match (last.plain_text(), first.plain_text()) {
                        (Some(a), Some(b)) => Some(ContentBlock::text(format!("{a}{b}"))),
                        _ => None,
                    },
                    _ => None,
                };
                if let Some(seam) = coalesced {
                    let _ = blocks.pop();
                    let _ = rest.remove(0);
                    blocks.push(seam);
                }
                blocks.append(&mut rest);
                Self::Blocks(blocks)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
