//! Message normalization.
//!
//! Callers hand over messages in whatever shape they have — canonical
//! values, plain strings, `(role, content)` pairs, JSON mappings, or raw
//! JSON — and get back canonical [`Message`] values. Dispatch is an
//! explicit match over a closed input union; anything unmatched fails
//! with a named error instead of being duck-typed through.

use serde_json::{Map, Value};

use strand_core::{ContentBlock, Message, MessageContent, MessageKind, MessageType};

use crate::errors::TransformError;

// ─────────────────────────────────────────────────────────────────────────────
// MessageLike
// ─────────────────────────────────────────────────────────────────────────────

/// Any supported message input shape.
#[derive(Clone, Debug)]
pub enum MessageLike {
    /// Already-canonical message, passed through untouched.
    Message(Message),
    /// Plain string: shorthand for a human message.
    Text(String),
    /// `(role_or_type, content)` pair.
    Pair(String, String),
    /// Mapping with `role` (or `type`) and `content` keys.
    Mapping(Map<String, Value>),
    /// Untyped JSON, dispatched dynamically by shape.
    Json(Value),
}

impl From<Message> for MessageLike {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for MessageLike {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for MessageLike {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<(&str, &str)> for MessageLike {
    fn from((role, content): (&str, &str)) -> Self {
        Self::Pair(role.to_owned(), content.to_owned())
    }
}

impl From<(String, String)> for MessageLike {
    fn from((role, content): (String, String)) -> Self {
        Self::Pair(role, content)
    }
}

impl From<Value> for MessageLike {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization
// ─────────────────────────────────────────────────────────────────────────────

/// Normalize one input into a canonical message.
///
/// # Errors
///
/// [`TransformError::UnsupportedInputShape`] when dynamic JSON dispatch
/// matches no supported shape, [`TransformError::UnknownMessageType`] for
/// a role string outside the accepted table, and
/// [`TransformError::MissingRequiredField`] for a mapping without
/// role/type or content.
pub fn normalize(input: MessageLike) -> Result<Message, TransformError> {
    match input {
        MessageLike::Message(message) => Ok(message),
        MessageLike::Text(text) => Ok(Message::human(text)),
        MessageLike::Pair(role, content) => {
            let mut map = Map::new();
            let _ = map.insert("role".into(), Value::String(role));
            let _ = map.insert("content".into(), Value::String(content));
            from_mapping(map)
        }
        MessageLike::Mapping(map) => from_mapping(map),
        MessageLike::Json(value) => from_value(value),
    }
}

/// Normalize a sequence of inputs, order-preserving and 1:1.
///
/// # Errors
///
/// Fails on the first input [`normalize`] rejects.
pub fn normalize_all<I>(inputs: I) -> Result<Vec<Message>, TransformError>
where
    I: IntoIterator<Item = MessageLike>,
{
    inputs.into_iter().map(normalize).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Shape dispatch
// ─────────────────────────────────────────────────────────────────────────────

fn from_value(value: Value) -> Result<Message, TransformError> {
    match value {
        Value::String(text) => Ok(Message::human(text)),
        Value::Array(items) => {
            if let [Value::String(role), Value::String(content)] = items.as_slice() {
                return normalize(MessageLike::Pair(role.clone(), content.clone()));
            }
            Err(TransformError::UnsupportedInputShape {
                shape: format!("array of length {}", items.len()),
            })
        }
        Value::Object(map) => from_mapping(map),
        other => Err(TransformError::UnsupportedInputShape {
            shape: value_shape(&other).to_owned(),
        }),
    }
}

fn value_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn from_mapping(mut map: Map<String, Value>) -> Result<Message, TransformError> {
    // role XOR type; both keys are consumed either way
    let from_role = map.remove("role");
    let from_type = map.remove("type");
    let role = match from_role.or(from_type) {
        Some(Value::String(role)) => role,
        Some(_) => {
            return Err(TransformError::UnsupportedInputShape {
                shape: "mapping with a non-string role".into(),
            });
        }
        None => return Err(TransformError::MissingRequiredField { field: "role" }),
    };
    let Some(message_type) = MessageType::from_role_label(&role) else {
        return Err(TransformError::UnknownMessageType { got: role });
    };

    let content = match map.remove("content") {
        Some(value) => content_from_value(value)?,
        None => return Err(TransformError::MissingRequiredField { field: "content" }),
    };

    let name = take_string(&mut map, "name")?;
    let id = take_string(&mut map, "id")?;

    // variant-specific keys are only plucked for the variant that owns
    // them; on any other role they stay behind and fold into metadata
    let kind = match message_type {
        MessageType::System => MessageKind::System,
        MessageType::Human => MessageKind::Human,
        MessageType::Ai => MessageKind::Ai {
            tool_calls: take_tool_calls(&mut map)?,
        },
        MessageType::Tool => MessageKind::Tool {
            tool_call_id: take_string(&mut map, "tool_call_id")?,
        },
        MessageType::Function => MessageKind::Function,
        MessageType::Chat => MessageKind::Chat { role },
    };

    let mut message = Message::new(kind, content);
    message.name = name;
    message.id = id;
    message.metadata = map;
    Ok(message)
}

fn content_from_value(value: Value) -> Result<MessageContent, TransformError> {
    match value {
        Value::String(text) => Ok(MessageContent::Text(text)),
        Value::Array(items) => {
            let mut blocks = Vec::with_capacity(items.len());
            for item in items {
                blocks.push(block_from_value(item)?);
            }
            Ok(MessageContent::Blocks(blocks))
        }
        other => Err(TransformError::UnsupportedInputShape {
            shape: format!("mapping with {} content", value_shape(&other)),
        }),
    }
}

fn block_from_value(value: Value) -> Result<ContentBlock, TransformError> {
    match value {
        // bare strings inside a block list read as text blocks
        Value::String(text) => Ok(ContentBlock::text(text)),
        Value::Object(map) => Ok(ContentBlock::from_map(map)),
        other => Err(TransformError::UnsupportedInputShape {
            shape: format!("content block of {} shape", value_shape(&other)),
        }),
    }
}

fn take_string(
    map: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, TransformError> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(TransformError::UnsupportedInputShape {
            shape: format!("mapping with a non-string '{key}'"),
        }),
    }
}

fn take_tool_calls(
    map: &mut Map<String, Value>,
) -> Result<Vec<strand_core::ToolCall>, TransformError> {
    match map.remove("tool_calls") {
        None => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value).map_err(|_| TransformError::UnsupportedInputShape {
                shape: "mapping with malformed 'tool_calls'".into(),
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
