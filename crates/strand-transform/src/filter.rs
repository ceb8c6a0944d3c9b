//! Predicate filtering over message sequences.

use strand_core::{Message, MessageType};

/// Criteria matched against a message's name, variant tag, or ID.
///
/// A criterion that is `None` matches nothing; a criterion that is
/// `Some` matches when the message's corresponding field is listed.
#[derive(Clone, Debug, Default)]
pub struct FilterCriteria {
    /// Names to match.
    pub names: Option<Vec<String>>,
    /// Variant tags to match.
    pub types: Option<Vec<MessageType>>,
    /// IDs to match.
    pub ids: Option<Vec<String>>,
}

impl FilterCriteria {
    /// Criteria matching nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the names to match.
    #[must_use]
    pub fn with_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the variant tags to match.
    #[must_use]
    pub fn with_types(mut self, types: impl IntoIterator<Item = MessageType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Set the IDs to match.
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    fn matches(&self, message: &Message) -> bool {
        if let (Some(names), Some(name)) = (&self.names, &message.name) {
            if names.contains(name) {
                return true;
            }
        }
        if let Some(types) = &self.types {
            if types.contains(&message.message_type()) {
                return true;
            }
        }
        if let (Some(ids), Some(id)) = (&self.ids, &message.id) {
            if ids.contains(id) {
                return true;
            }
        }
        false
    }
}

/// Filter messages by name, variant tag, and ID.
///
/// Exclusion is evaluated first: a message matching any `exclude`
/// criterion is dropped. A surviving message is kept only if it matches
/// some `include` criterion — so with no include criteria supplied at
/// all, nothing is kept. That asymmetry is long-standing observed
/// behavior and is preserved rather than defaulting to keep-everything.
/// Relative order of survivors is preserved.
#[must_use]
pub fn filter_messages(
    messages: &[Message],
    include: &FilterCriteria,
    exclude: &FilterCriteria,
) -> Vec<Message> {
    messages
        .iter()
        .filter(|message| !exclude.matches(message) && include.matches(message))
        .cloned()
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
