//! Partial (streaming) message variants.
//!
//! Every message variant has a chunk counterpart. Chunks support a merge
//! operation (`+`) that concatenates content and unions the remaining
//! fields, so a stream of partial messages — or a run of whole messages
//! lifted into chunks — collapses into one value. Converting a chunk back
//! to a plain message drops the partial marker and the transient
//! streaming deltas.

use std::ops::Add;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::MessageContent;
use crate::messages::{Message, MessageKind, MessageType};

// ─────────────────────────────────────────────────────────────────────────────
// Streaming tool-call deltas
// ─────────────────────────────────────────────────────────────────────────────

/// A streamed fragment of a tool call.
///
/// `arguments` accumulates the call's JSON text across deltas; `index`
/// correlates fragments of the same call within a stream.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    /// Tool call ID, when the fragment carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool name, when the fragment carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Partial JSON argument text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// Position of the call this fragment belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// MessageChunk
// ─────────────────────────────────────────────────────────────────────────────

/// A partial message: the same shape as [`Message`], marked as streaming.
///
/// The variant payload is private, as on [`Message`]. Ai chunks may carry
/// [`ToolCallChunk`] deltas; these are transient and are dropped when the
/// chunk is finalized into a plain message.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageChunk {
    pub(crate) kind: MessageKind,
    /// Accumulated content.
    pub content: MessageContent,
    /// Optional name identifier.
    pub name: Option<String>,
    /// Optional ID.
    pub id: Option<String>,
    /// Open extension mapping.
    pub metadata: Map<String, Value>,
    /// Streaming tool-call deltas (ai chunks only).
    pub tool_call_chunks: Vec<ToolCallChunk>,
}

impl MessageChunk {
    /// Create a chunk from a variant payload and content.
    #[must_use]
    pub fn new(kind: MessageKind, content: impl Into<MessageContent>) -> Self {
        Self {
            kind,
            content: content.into(),
            name: None,
            id: None,
            metadata: Map::new(),
            tool_call_chunks: Vec::new(),
        }
    }

    /// The variant payload.
    #[must_use]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The variant tag.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }

    /// Merge another chunk into this one.
    ///
    /// Content concatenates (see [`MessageContent::merge`]); `name` and
    /// `id` are first-non-null-wins; tool calls and deltas concatenate;
    /// metadata keys union. Both chunks are expected to share a variant —
    /// on a mismatch the left tag wins (the run merger never requests a
    /// heterogeneous merge).
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let mut tool_call_chunks = self.tool_call_chunks;
        tool_call_chunks.extend(other.tool_call_chunks);
        Self {
            kind: merge_kinds(self.kind, other.kind),
            content: self.content.merge(other.content),
            name: self.name.or(other.name),
            id: self.id.or(other.id),
            metadata: merge_metadata(self.metadata, other.metadata),
            tool_call_chunks,
        }
    }
}

impl Add for MessageChunk {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.merge(rhs)
    }
}

impl From<Message> for MessageChunk {
    fn from(message: Message) -> Self {
        Self {
            kind: message.kind,
            content: message.content,
            name: message.name,
            id: message.id,
            metadata: message.metadata,
            tool_call_chunks: Vec::new(),
        }
    }
}

impl From<MessageChunk> for Message {
    /// Finalize a chunk: the partial marker and any streaming deltas are
    /// dropped, everything else carries over.
    fn from(chunk: MessageChunk) -> Self {
        Self {
            kind: chunk.kind,
            content: chunk.content,
            name: chunk.name,
            id: chunk.id,
            metadata: chunk.metadata,
        }
    }
}

fn merge_kinds(left: MessageKind, right: MessageKind) -> MessageKind {
    match (left, right) {
        (MessageKind::Ai { mut tool_calls }, MessageKind::Ai { tool_calls: more }) => {
            tool_calls.extend(more);
            MessageKind::Ai { tool_calls }
        }
        (MessageKind::Tool { tool_call_id }, MessageKind::Tool { tool_call_id: other }) => {
            MessageKind::Tool {
                tool_call_id: tool_call_id.or(other),
            }
        }
        (left, _) => left,
    }
}

// Key union. Conflicting strings concatenate, conflicting objects union
// shallowly, anything else is first-wins.
fn merge_metadata(mut left: Map<String, Value>, right: Map<String, Value>) -> Map<String, Value> {
    for (key, incoming) in right {
        match left.get_mut(&key) {
            None => {
                let _ = left.insert(key, incoming);
            }
            Some(existing) => match (existing, incoming) {
                (Value::String(a), Value::String(ref b)) => a.push_str(b),
                (Value::Object(a), Value::Object(b)) => {
                    for (k, v) in b {
                        if !a.contains_key(&k) {
                            let _ = a.insert(k, v);
                        }
                    }
                }
                _ => {}
            },
        }
    }
    left
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ToolCall;
    use serde_json::json;

    fn human_chunk(text: &str) -> MessageChunk {
        MessageChunk::new(MessageKind::Human, text)
    }

    // -- merge --

    #[test]
    fn merge_concatenates_text() {
        let merged = human_chunk("hel") + human_chunk("lo");
        assert_eq!(merged.content.as_text(), Some("hello"));
        assert_eq!(merged.message_type(), MessageType::Human);
    }

    #[test]
    fn merge_name_and_id_first_wins() {
        let mut left = human_chunk("a");
        left.name = Some("alice".into());
        let mut right = human_chunk("b");
        right.name = Some("bob".into());
        right.id = Some("m-2".into());

        let merged = left.merge(right);
        assert_eq!(merged.name.as_deref(), Some("alice"));
        assert_eq!(merged.id.as_deref(), Some("m-2"));
    }

    #[test]
    fn merge_concatenates_tool_calls() {
        let left = MessageChunk::new(
            MessageKind::Ai {
                tool_calls: vec![ToolCall::new("tc-1", "bash", Map::new())],
            },
            "",
        );
        let right = MessageChunk::new(
            MessageKind::Ai {
                tool_calls: vec![ToolCall::new("tc-2", "read", Map::new())],
            },
            "",
        );
        let merged = left + right;
        let MessageKind::Ai { tool_calls } = merged.kind() else {
            panic!("expected ai kind");
        };
        assert_eq!(tool_calls.len(), 2);
    }

    #[test]
    fn merge_concatenates_deltas() {
        let mut left = MessageChunk::new(MessageKind::Ai { tool_calls: Vec::new() }, "");
        left.tool_call_chunks = vec![ToolCallChunk {
            name: Some("bash".into()),
            arguments: Some("{\"cmd".into()),
            index: Some(0),
            ..ToolCallChunk::default()
        }];
        let mut right = MessageChunk::new(MessageKind::Ai { tool_calls: Vec::new() }, "");
        right.tool_call_chunks = vec![ToolCallChunk {
            arguments: Some("\": \"ls\"}".into()),
            index: Some(0),
            ..ToolCallChunk::default()
        }];
        let merged = left + right;
        assert_eq!(merged.tool_call_chunks.len(), 2);
    }

    #[test]
    fn merge_metadata_strings_concatenate() {
        let mut left = human_chunk("");
        let _ = left.metadata.insert("stream".into(), json!("ab"));
        let mut right = human_chunk("");
        let _ = right.metadata.insert("stream".into(), json!("cd"));
        let _ = right.metadata.insert("extra".into(), json!(1));

        let merged = left.merge(right);
        assert_eq!(merged.metadata["stream"], json!("abcd"));
        assert_eq!(merged.metadata["extra"], json!(1));
    }

    #[test]
    fn merge_metadata_objects_union() {
        let mut left = human_chunk("");
        let _ = left.metadata.insert("inner".into(), json!({"a": 1}));
        let mut right = human_chunk("");
        let _ = right.metadata.insert("inner".into(), json!({"a": 9, "b": 2}));

        let merged = left.merge(right);
        assert_eq!(merged.metadata["inner"], json!({"a": 1, "b": 2}));
    }

    #[test]
    fn tool_call_id_first_non_null_wins() {
        let left = MessageChunk::new(MessageKind::Tool { tool_call_id: None }, "a");
        let right = MessageChunk::new(
            MessageKind::Tool {
                tool_call_id: Some("tc-9".into()),
            },
            "b",
        );
        let merged = left + right;
        assert_eq!(
            merged.kind(),
            &MessageKind::Tool {
                tool_call_id: Some("tc-9".into())
            }
        );
    }

    // -- conversions --

    #[test]
    fn message_roundtrips_through_chunk() {
        let message = Message::ai("done").with_name("model").with_id("m-7");
        let chunk = MessageChunk::from(message.clone());
        assert!(chunk.tool_call_chunks.is_empty());
        assert_eq!(Message::from(chunk), message);
    }

    #[test]
    fn finalizing_drops_deltas() {
        let mut chunk = MessageChunk::new(MessageKind::Ai { tool_calls: Vec::new() }, "x");
        chunk.tool_call_chunks = vec![ToolCallChunk::default()];
        let message = Message::from(chunk);
        assert_eq!(message, Message::ai("x"));
    }
}
