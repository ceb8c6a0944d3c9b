//! Merging runs of same-variant messages.

use tracing::trace;

use strand_core::{Message, MessageChunk, MessageKind};

/// Merge maximal runs of same-variant messages into single messages.
///
/// Adjacent messages sharing a variant tag are lifted into chunks,
/// combined with the chunk merge operation, and finalized back into one
/// message; any variant change is a run boundary. Chat messages only
/// belong to the same run when their role labels agree — conflicting
/// roles are emitted side by side rather than merged. Empty input yields
/// empty output; the input is never mutated.
#[must_use]
pub fn merge_message_runs(messages: &[Message]) -> Vec<Message> {
    let mut merged: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        let current = message.clone();
        match merged.pop() {
            None => merged.push(current),
            Some(last) if same_run(&last, &current) => {
                let combined = MessageChunk::from(last) + MessageChunk::from(current);
                merged.push(Message::from(combined));
            }
            Some(last) => {
                merged.push(last);
                merged.push(current);
            }
        }
    }
    trace!(input = messages.len(), output = merged.len(), "merged message runs");
    merged
}

fn same_run(left: &Message, right: &Message) -> bool {
    if let (MessageKind::Chat { role: a }, MessageKind::Chat { role: b }) =
        (left.kind(), right.kind())
    {
        return a == b;
    }
    left.message_type() == right.message_type()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
