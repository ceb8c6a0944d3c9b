//! # strand-core
//!
//! Foundation types for conversation transcripts.
//!
//! This crate provides the shared vocabulary the rest of the workspace
//! builds on:
//!
//! - **Messages**: [`Message`] with a fixed variant tag ([`MessageType`])
//!   over system, human, ai, tool, function, and chat roles
//! - **Content blocks**: [`MessageContent`] as plain text or an ordered
//!   list of [`ContentBlock`] mappings
//! - **Chunks**: [`MessageChunk`] partial/streaming counterparts with a
//!   merge (`+`) operation
//! - **Stored form**: the `{type, data}` envelope with 12-label dispatch
//! - **Errors**: [`CoreError`] via `thiserror`

#![deny(unsafe_code)]

pub mod chunk;
pub mod content;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod stored;

pub use chunk::{MessageChunk, ToolCallChunk};
pub use content::{ContentBlock, MessageContent};
pub use errors::CoreError;
pub use messages::{Message, MessageKind, MessageType, ToolCall};
pub use stored::{
    DecodedMessage, StoredMessage, decode_message, decode_messages, encode_chunk, encode_message,
};
