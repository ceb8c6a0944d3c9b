//! Rendering a transcript to a single buffer string.

use strand_core::{Message, MessageKind};

/// Default prefix for human messages.
pub const HUMAN_PREFIX: &str = "Human";
/// Default prefix for ai messages.
pub const AI_PREFIX: &str = "AI";

/// Render messages as `"{role}: {content}"` lines joined by newlines,
/// with the default role prefixes.
#[must_use]
pub fn buffer_string(messages: &[Message]) -> String {
    get_buffer_string(messages, HUMAN_PREFIX, AI_PREFIX)
}

/// Render messages as `"{role}: {content}"` lines joined by newlines.
///
/// Human and ai labels are caller-chosen; system, function, and tool
/// messages use fixed labels; a chat message uses its own role. Block
/// content renders as its text blocks joined by newlines. An ai message
/// carrying a legacy `function_call` metadata entry gets that value's
/// JSON appended as a suffix.
#[must_use]
pub fn get_buffer_string(messages: &[Message], human_prefix: &str, ai_prefix: &str) -> String {
    let mut lines = Vec::with_capacity(messages.len());
    for message in messages {
        let role = match message.kind() {
            MessageKind::Human => human_prefix,
            MessageKind::Ai { .. } => ai_prefix,
            MessageKind::System => "System",
            MessageKind::Function => "Function",
            MessageKind::Tool { .. } => "Tool",
            MessageKind::Chat { role } => role.as_str(),
        };
        let mut line = format!("{role}: {}", message.content.flatten_text());
        if matches!(message.kind(), MessageKind::Ai { .. }) {
            if let Some(function_call) = message.metadata.get("function_call") {
                line.push_str(&function_call.to_string());
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
