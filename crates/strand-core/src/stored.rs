//! At-rest serialized form.
//!
//! Messages and chunks persist as a `{type, data}` envelope. The `type`
//! label is one of 12 values: the six canonical variant labels plus their
//! `_chunk`-suffixed counterparts. Decoding dispatches on the label and
//! rejects anything else with [`CoreError::UnrecognizedSerializedType`].
//!
//! [`Message`] and [`MessageChunk`] implement `Serialize`/`Deserialize`
//! through this envelope, so `serde_json` round-trips are lossless for
//! every variant.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

use crate::chunk::{MessageChunk, ToolCallChunk};
use crate::content::MessageContent;
use crate::errors::CoreError;
use crate::messages::{Message, MessageKind, MessageType, ToolCall};

// ─────────────────────────────────────────────────────────────────────────────
// Envelope
// ─────────────────────────────────────────────────────────────────────────────

/// Serialized envelope for a message or chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Variant label, plain or `_chunk`-suffixed.
    #[serde(rename = "type")]
    pub message_type: String,
    /// The field payload.
    pub data: Value,
}

/// Result of decoding an envelope: either side of the 12-label space.
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedMessage {
    /// A plain message label.
    Plain(Message),
    /// A `_chunk`-suffixed label.
    Chunk(MessageChunk),
}

// Field bag under `data`. Unknown keys are rejected by omission: anything
// not listed here belongs in `metadata`.
#[derive(Deserialize)]
struct StoredData {
    content: MessageContent,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    tool_call_id: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
    #[serde(default)]
    tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Encode a message into its stored envelope.
#[must_use]
pub fn encode_message(message: &Message) -> StoredMessage {
    StoredMessage {
        message_type: message.message_type().label().to_owned(),
        data: Value::Object(encode_data(
            message.kind(),
            &message.content,
            message.name.as_ref(),
            message.id.as_ref(),
            &message.metadata,
            &[],
        )),
    }
}

/// Encode a chunk into its stored envelope.
#[must_use]
pub fn encode_chunk(chunk: &MessageChunk) -> StoredMessage {
    StoredMessage {
        message_type: chunk.message_type().chunk_label().to_owned(),
        data: Value::Object(encode_data(
            chunk.kind(),
            &chunk.content,
            chunk.name.as_ref(),
            chunk.id.as_ref(),
            &chunk.metadata,
            &chunk.tool_call_chunks,
        )),
    }
}

fn encode_data(
    kind: &MessageKind,
    content: &MessageContent,
    name: Option<&String>,
    id: Option<&String>,
    metadata: &Map<String, Value>,
    tool_call_chunks: &[ToolCallChunk],
) -> Map<String, Value> {
    let mut data = Map::new();
    let _ = data.insert("content".into(), content_to_value(content));
    if let Some(name) = name {
        let _ = data.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(id) = id {
        let _ = data.insert("id".into(), Value::String(id.clone()));
    }
    match kind {
        MessageKind::Ai { tool_calls } if !tool_calls.is_empty() => {
            let calls = tool_calls.iter().map(tool_call_to_value).collect();
            let _ = data.insert("tool_calls".into(), Value::Array(calls));
        }
        MessageKind::Tool {
            tool_call_id: Some(tool_call_id),
        } => {
            let _ = data.insert("tool_call_id".into(), Value::String(tool_call_id.clone()));
        }
        MessageKind::Chat { role } => {
            let _ = data.insert("role".into(), Value::String(role.clone()));
        }
        _ => {}
    }
    if !tool_call_chunks.is_empty() {
        let chunks = tool_call_chunks.iter().map(tool_call_chunk_to_value).collect();
        let _ = data.insert("tool_call_chunks".into(), Value::Array(chunks));
    }
    if !metadata.is_empty() {
        let _ = data.insert("metadata".into(), Value::Object(metadata.clone()));
    }
    data
}

fn content_to_value(content: &MessageContent) -> Value {
    match content {
        MessageContent::Text(text) => Value::String(text.clone()),
        MessageContent::Blocks(blocks) => Value::Array(
            blocks
                .iter()
                .map(|block| Value::Object(block.as_map().clone()))
                .collect(),
        ),
    }
}

fn tool_call_to_value(call: &ToolCall) -> Value {
    let mut map = Map::new();
    let _ = map.insert("id".into(), Value::String(call.id.clone()));
    let _ = map.insert("name".into(), Value::String(call.name.clone()));
    let _ = map.insert("arguments".into(), Value::Object(call.arguments.clone()));
    Value::Object(map)
}

fn tool_call_chunk_to_value(chunk: &ToolCallChunk) -> Value {
    let mut map = Map::new();
    if let Some(id) = &chunk.id {
        let _ = map.insert("id".into(), Value::String(id.clone()));
    }
    if let Some(name) = &chunk.name {
        let _ = map.insert("name".into(), Value::String(name.clone()));
    }
    if let Some(arguments) = &chunk.arguments {
        let _ = map.insert("arguments".into(), Value::String(arguments.clone()));
    }
    if let Some(index) = chunk.index {
        let _ = map.insert("index".into(), Value::from(index));
    }
    Value::Object(map)
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a stored envelope.
///
/// # Errors
///
/// [`CoreError::UnrecognizedSerializedType`] for a label outside the 12
/// recognized values; [`CoreError::MalformedData`] if the payload under a
/// recognized label fails to parse.
pub fn decode_message(stored: &StoredMessage) -> Result<DecodedMessage, CoreError> {
    let (message_type, is_chunk) = resolve_label(&stored.message_type)?;
    let mut data: StoredData =
        serde_json::from_value(stored.data.clone()).map_err(|source| CoreError::MalformedData {
            label: stored.message_type.clone(),
            source,
        })?;
    let kind = kind_from_data(message_type, &mut data);
    if is_chunk {
        let mut chunk = MessageChunk::new(kind, data.content);
        chunk.name = data.name;
        chunk.id = data.id;
        chunk.metadata = data.metadata;
        chunk.tool_call_chunks = data.tool_call_chunks;
        Ok(DecodedMessage::Chunk(chunk))
    } else {
        let mut message = Message::new(kind, data.content);
        message.name = data.name;
        message.id = data.id;
        message.metadata = data.metadata;
        Ok(DecodedMessage::Plain(message))
    }
}

/// Decode a sequence of stored envelopes, order-preserving.
///
/// # Errors
///
/// Fails on the first envelope [`decode_message`] rejects.
pub fn decode_messages(stored: &[StoredMessage]) -> Result<Vec<DecodedMessage>, CoreError> {
    let decoded: Vec<DecodedMessage> = stored.iter().map(decode_message).collect::<Result<_, _>>()?;
    trace!(count = decoded.len(), "decoded stored messages");
    Ok(decoded)
}

fn resolve_label(label: &str) -> Result<(MessageType, bool), CoreError> {
    for message_type in MessageType::ALL {
        if label == message_type.label() {
            return Ok((message_type, false));
        }
        if label == message_type.chunk_label() {
            return Ok((message_type, true));
        }
    }
    Err(CoreError::UnrecognizedSerializedType { got: label.to_owned() })
}

fn kind_from_data(message_type: MessageType, data: &mut StoredData) -> MessageKind {
    match message_type {
        MessageType::System => MessageKind::System,
        MessageType::Human => MessageKind::Human,
        MessageType::Ai => MessageKind::Ai {
            tool_calls: std::mem::take(&mut data.tool_calls),
        },
        MessageType::Tool => MessageKind::Tool {
            tool_call_id: data.tool_call_id.take(),
        },
        MessageType::Function => MessageKind::Function,
        MessageType::Chat => MessageKind::Chat {
            role: data.role.take().unwrap_or_default(),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serde integration
// ─────────────────────────────────────────────────────────────────────────────

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_message(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = StoredMessage::deserialize(deserializer)?;
        match decode_message(&stored).map_err(D::Error::custom)? {
            DecodedMessage::Plain(message) => Ok(message),
            DecodedMessage::Chunk(_) => Err(D::Error::custom(format!(
                "expected a plain message, got chunk type '{}'",
                stored.message_type
            ))),
        }
    }
}

impl Serialize for MessageChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_chunk(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MessageChunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = StoredMessage::deserialize(deserializer)?;
        match decode_message(&stored).map_err(D::Error::custom)? {
            DecodedMessage::Chunk(chunk) => Ok(chunk),
            DecodedMessage::Plain(_) => Err(D::Error::custom(format!(
                "expected a chunk, got plain message type '{}'",
                stored.message_type
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
