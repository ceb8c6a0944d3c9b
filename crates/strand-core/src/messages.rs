//! Message types for conversation transcripts.
//!
//! A [`Message`] is a tagged value: the variant tag ([`MessageType`]) is
//! fixed at construction, while content and identifiers stay mutable.
//! Six variants cover the transcript vocabulary: system, human, ai, tool,
//! function, and chat (free-form role label).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content::MessageContent;

// ─────────────────────────────────────────────────────────────────────────────
// MessageType
// ─────────────────────────────────────────────────────────────────────────────

/// Variant tag for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// System instruction.
    System,
    /// Human turn.
    Human,
    /// Model turn.
    Ai,
    /// Tool result.
    Tool,
    /// Legacy function result.
    Function,
    /// Free-form role label.
    Chat,
}

impl MessageType {
    /// All variants, in canonical order.
    pub const ALL: [Self; 6] = [
        Self::System,
        Self::Human,
        Self::Ai,
        Self::Tool,
        Self::Function,
        Self::Chat,
    ];

    /// Canonical lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "human",
            Self::Ai => "ai",
            Self::Tool => "tool",
            Self::Function => "function",
            Self::Chat => "chat",
        }
    }

    /// Chunk-suffixed label used by the stored form.
    #[must_use]
    pub fn chunk_label(self) -> &'static str {
        match self {
            Self::System => "system_chunk",
            Self::Human => "human_chunk",
            Self::Ai => "ai_chunk",
            Self::Tool => "tool_chunk",
            Self::Function => "function_chunk",
            Self::Chat => "chat_chunk",
        }
    }

    /// Resolve a role string to a variant tag.
    ///
    /// Accepts the canonical labels plus the `user` and `assistant`
    /// aliases. `chat` is deliberately absent: chat messages carry a
    /// caller-chosen role and are never built from a role string.
    #[must_use]
    pub fn from_role_label(label: &str) -> Option<Self> {
        match label {
            "system" => Some(Self::System),
            "human" | "user" => Some(Self::Human),
            "ai" | "assistant" => Some(Self::Ai),
            "tool" => Some(Self::Tool),
            "function" => Some(Self::Function),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool call
// ─────────────────────────────────────────────────────────────────────────────

/// A structured tool call carried by an ai message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique tool call ID.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Tool arguments (JSON object).
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a tool call.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MessageKind
// ─────────────────────────────────────────────────────────────────────────────

/// Variant payload of a message.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageKind {
    /// System instruction.
    System,
    /// Human turn.
    Human,
    /// Model turn, optionally carrying tool calls.
    Ai {
        /// Structured tool calls emitted with this turn.
        tool_calls: Vec<ToolCall>,
    },
    /// Tool result, referencing the call it answers.
    Tool {
        /// ID of the tool call this result corresponds to.
        tool_call_id: Option<String>,
    },
    /// Legacy function result.
    Function,
    /// Message with a caller-chosen role label.
    Chat {
        /// The role label.
        role: String,
    },
}

impl MessageKind {
    /// The variant tag for this payload.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::System => MessageType::System,
            Self::Human => MessageType::Human,
            Self::Ai { .. } => MessageType::Ai,
            Self::Tool { .. } => MessageType::Tool,
            Self::Function => MessageType::Function,
            Self::Chat { .. } => MessageType::Chat,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// A canonical conversation message.
///
/// The variant payload is private: the tag is immutable once the message
/// exists. Content, identifiers, and metadata are ordinary mutable fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub(crate) kind: MessageKind,
    /// Message content.
    pub content: MessageContent,
    /// Optional name identifier.
    pub name: Option<String>,
    /// Optional ID, distinct from `name`; used for filtering.
    pub id: Option<String>,
    /// Open extension mapping (e.g. a legacy `function_call` entry).
    pub metadata: Map<String, Value>,
}

impl Message {
    /// Create a message from a variant payload and content.
    #[must_use]
    pub fn new(kind: MessageKind, content: impl Into<MessageContent>) -> Self {
        Self {
            kind,
            content: content.into(),
            name: None,
            id: None,
            metadata: Map::new(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::System, content)
    }

    /// Create a human message.
    #[must_use]
    pub fn human(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Human, content)
    }

    /// Create an ai message with no tool calls.
    #[must_use]
    pub fn ai(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Ai { tool_calls: Vec::new() }, content)
    }

    /// Create an ai message carrying tool calls.
    #[must_use]
    pub fn ai_with_tool_calls(
        content: impl Into<MessageContent>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        Self::new(MessageKind::Ai { tool_calls }, content)
    }

    /// Create a tool result message.
    #[must_use]
    pub fn tool(content: impl Into<MessageContent>, tool_call_id: Option<String>) -> Self {
        Self::new(MessageKind::Tool { tool_call_id }, content)
    }

    /// Create a legacy function result message.
    #[must_use]
    pub fn function(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Function, content)
    }

    /// Create a chat message with a caller-chosen role label.
    #[must_use]
    pub fn chat(role: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self::new(MessageKind::Chat { role: role.into() }, content)
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

    /// Returns `true` if this is a system message.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self.kind, MessageKind::System)
    }

    /// Returns `true` if this is a human message.
    #[must_use]
    pub fn is_human(&self) -> bool {
        matches!(self.kind, MessageKind::Human)
    }

    /// Returns `true` if this is an ai message.
    #[must_use]
    pub fn is_ai(&self) -> bool {
        matches!(self.kind, MessageKind::Ai { .. })
    }

    /// Set the name identifier.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Replace the metadata mapping.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
