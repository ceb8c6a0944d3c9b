//! Token-budget trimming.
//!
//! [`trim_messages`] keeps the longest prefix (`first`) or suffix
//! (`last`) of a message sequence whose token count, per an externally
//! supplied counter, stays within budget. The cut point can be snapped to
//! a variant boundary (`end_on`/`start_on`), a leading system message can
//! be pinned outside the budget (`keep_system`), and the boundary message
//! can be partially included by dropping trailing content blocks or
//! splitting its text (`allow_partial`).
//!
//! ## Algorithm
//!
//! 1. Probe candidate prefixes from the full length downward; keep the
//!    longest one the counter accepts. The empty prefix is never probed.
//! 2. With `allow_partial`, try to extend the cut by one truncated copy
//!    of the first excluded message: drop its trailing content blocks one
//!    at a time (re-testing after each drop), then fall back to splitting
//!    its text into units and dropping those.
//! 3. Walk the cut backward to the requested boundary variant.
//!
//! The `last` strategy runs the same search over a reversed view and
//! reverses the result back.
//!
//! The counter is called O(n²) times in the worst case and once per
//! candidate truncation; nothing is cached or parallelized — callers
//! needing to bound cost should supply a memoizing counter. Counter and
//! splitter failures propagate unmodified.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use strand_core::{ContentBlock, Message, MessageContent, MessageType};

use crate::errors::{ExternalError, TransformError};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Which end of the sequence survives trimming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimStrategy {
    /// Keep the longest fitting prefix.
    First,
    /// Keep the longest fitting suffix.
    #[default]
    Last,
}

impl FromStr for TrimStrategy {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(TransformError::UnrecognizedStrategy { got: other.to_owned() }),
        }
    }
}

/// Options for [`trim_messages`].
#[derive(Clone, Debug, Default)]
pub struct TrimOptions {
    /// Maximum accepted total per the token counter.
    pub max_tokens: usize,
    /// Which end of the sequence survives.
    pub strategy: TrimStrategy,
    /// Allow partially including the boundary message by truncating its
    /// content.
    pub allow_partial: bool,
    /// Snap the kept prefix to end on this variant. `First` only.
    pub end_on: Option<MessageType>,
    /// Snap the kept suffix to start on this variant. `Last` only.
    pub start_on: Option<MessageType>,
    /// Pin a leading system message outside the budget. `Last` only.
    pub keep_system: bool,
}

/// Externally supplied token counting callable.
///
/// The two variants make the counter's calling convention explicit
/// instead of inspecting the callable at runtime.
pub enum TokenCounter<'a> {
    /// Counts one message; totals are summed across a candidate sequence.
    PerMessage(&'a dyn Fn(&Message) -> Result<usize, ExternalError>),
    /// Counts a whole candidate sequence in one call.
    Sequence(&'a dyn Fn(&[Message]) -> Result<usize, ExternalError>),
}

impl TokenCounter<'_> {
    fn count(&self, messages: &[Message]) -> Result<usize, ExternalError> {
        match self {
            Self::PerMessage(counter) => {
                let mut total = 0;
                for message in messages {
                    total += counter(message)?;
                }
                Ok(total)
            }
            Self::Sequence(counter) => counter(messages),
        }
    }
}

/// Externally supplied text splitting callable.
pub type TextSplitter = dyn Fn(&str) -> Result<Vec<String>, ExternalError>;

fn default_text_splitter(text: &str) -> Result<Vec<String>, ExternalError> {
    Ok(text.split('\n').map(str::to_owned).collect())
}

// ─────────────────────────────────────────────────────────────────────────────
// Trimming
// ─────────────────────────────────────────────────────────────────────────────

/// Trim messages to fit a token budget, splitting text on newlines when
/// partial inclusion is allowed.
///
/// # Errors
///
/// [`TransformError::IncompatibleOptions`] when an option contradicts the
/// strategy; counter failures pass through as
/// [`TransformError::External`].
pub fn trim_messages(
    messages: &[Message],
    options: &TrimOptions,
    counter: &TokenCounter<'_>,
) -> Result<Vec<Message>, TransformError> {
    trim_messages_with_splitter(messages, options, counter, &default_text_splitter)
}

/// [`trim_messages`] with a caller-supplied text splitter for partial
/// inclusion.
///
/// # Errors
///
/// As [`trim_messages`]; splitter failures also pass through as
/// [`TransformError::External`].
pub fn trim_messages_with_splitter(
    messages: &[Message],
    options: &TrimOptions,
    counter: &TokenCounter<'_>,
    splitter: &TextSplitter,
) -> Result<Vec<Message>, TransformError> {
    validate_options(options)?;
    match options.strategy {
        TrimStrategy::First => first_n_tokens(
            messages.to_vec(),
            options.max_tokens,
            counter,
            options.allow_partial,
            options.end_on,
            splitter,
        ),
        TrimStrategy::Last => last_n_tokens(messages, options, counter, splitter),
    }
}

fn validate_options(options: &TrimOptions) -> Result<(), TransformError> {
    match options.strategy {
        TrimStrategy::First => {
            if options.start_on.is_some() {
                return Err(TransformError::IncompatibleOptions {
                    detail: "`start_on` is only supported with the `last` strategy".into(),
                });
            }
            if options.keep_system {
                return Err(TransformError::IncompatibleOptions {
                    detail: "`keep_system` is only supported with the `last` strategy".into(),
                });
            }
        }
        TrimStrategy::Last => {
            if options.end_on.is_some() {
                return Err(TransformError::IncompatibleOptions {
                    detail: "`end_on` is only supported with the `first` strategy".into(),
                });
            }
        }
    }
    Ok(())
}

fn first_n_tokens(
    mut messages: Vec<Message>,
    max_tokens: usize,
    counter: &TokenCounter<'_>,
    allow_partial: bool,
    end_on: Option<MessageType>,
    splitter: &TextSplitter,
) -> Result<Vec<Message>, TransformError> {
    let total = messages.len();
    let mut kept = 0;
    for dropped in 0..total {
        if counter.count(&messages[..total - dropped])? <= max_tokens {
            kept = total - dropped;
            break;
        }
    }

    if kept < total && allow_partial {
        kept = include_partial_boundary(&mut messages, kept, max_tokens, counter, splitter)?;
    }

    if let Some(boundary) = end_on {
        while kept > 0 && messages[kept - 1].message_type() != boundary {
            kept -= 1;
        }
    }

    trace!(total, kept, max_tokens, "boundary search complete");
    messages.truncate(kept);
    Ok(messages)
}

// Try to extend the cut by one truncated copy of the boundary message.
// Returns the new kept count (unchanged when nothing fits).
fn include_partial_boundary(
    messages: &mut [Message],
    kept: usize,
    max_tokens: usize,
    counter: &TokenCounter<'_>,
    splitter: &TextSplitter,
) -> Result<usize, TransformError> {
    let boundary = messages[kept].clone();

    // Drop trailing content blocks, largest remainder first; at least one
    // block always stays.
    if let MessageContent::Blocks(blocks) = &boundary.content {
        for remaining in (1..blocks.len()).rev() {
            let mut truncated = boundary.clone();
            truncated.content = MessageContent::Blocks(blocks[..remaining].to_vec());
            if fits(&messages[..kept], &truncated, max_tokens, counter)? {
                messages[kept] = truncated;
                return Ok(kept + 1);
            }
        }
    }

    // Fall back to splitting the boundary text into units and dropping
    // those the same way. The re-wrapped units replace the whole content;
    // non-text blocks do not survive this path.
    let Some(text) = boundary_text(&boundary.content) else {
        return Ok(kept);
    };
    let units = splitter(&text)?;
    for remaining in (1..units.len()).rev() {
        let mut truncated = boundary.clone();
        truncated.content = MessageContent::Blocks(
            units[..remaining]
                .iter()
                .map(|unit| ContentBlock::text(unit.as_str()))
                .collect(),
        );
        if fits(&messages[..kept], &truncated, max_tokens, counter)? {
            messages[kept] = truncated;
            return Ok(kept + 1);
        }
    }
    Ok(kept)
}

fn fits(
    prefix: &[Message],
    truncated: &Message,
    max_tokens: usize,
    counter: &TokenCounter<'_>,
) -> Result<bool, TransformError> {
    let mut candidate = prefix.to_vec();
    candidate.push(truncated.clone());
    Ok(counter.count(&candidate)? <= max_tokens)
}

// The text eligible for split-based truncation: the first text block of
// block content, or the whole plain string. Empty text is not worth
// splitting.
fn boundary_text(content: &MessageContent) -> Option<String> {
    let text = match content {
        MessageContent::Blocks(blocks) => blocks.iter().find_map(ContentBlock::as_text)?.to_owned(),
        MessageContent::Text(text) => text.clone(),
    };
    (!text.is_empty()).then_some(text)
}

fn last_n_tokens(
    messages: &[Message],
    options: &TrimOptions,
    counter: &TokenCounter<'_>,
    splitter: &TextSplitter,
) -> Result<Vec<Message>, TransformError> {
    // A pinned system message sits outside the reversed search and never
    // consumes budget; reattaching it can push the result past
    // `max_tokens`. Long-standing behavior, preserved.
    let pinned = options.keep_system && messages.first().is_some_and(Message::is_system);
    let (system, rest) = if pinned {
        (messages.first().cloned(), &messages[1..])
    } else {
        (None, messages)
    };

    let reversed: Vec<Message> = rest.iter().rev().cloned().collect();
    let trimmed = first_n_tokens(
        reversed,
        options.max_tokens,
        counter,
        options.allow_partial,
        // "start on X" is "end on X" in the reversed frame
        options.start_on,
        splitter,
    )?;
    let mut result: Vec<Message> = trimmed.into_iter().rev().collect();
    if let Some(system) = system {
        result.insert(0, system);
    }
    Ok(result)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn one_token_each(_: &Message) -> Result<usize, ExternalError> {
        Ok(1)
    }

    fn char_count(message: &Message) -> Result<usize, ExternalError> {
        Ok(message.content.flatten_text().chars().filter(|c| *c != '\n').count())
    }

    fn humans(texts: &[&str]) -> Vec<Message> {
        texts.iter().map(|t| Message::human(*t)).collect()
    }

    fn options(strategy: TrimStrategy, max_tokens: usize) -> TrimOptions {
        TrimOptions {
            max_tokens,
            strategy,
            ..TrimOptions::default()
        }
    }

    // -- strategy basics --

    #[test]
    fn first_keeps_longest_fitting_prefix() {
        let messages = humans(&["a", "b", "c", "d"]);
        let trimmed = trim_messages(
            &messages,
            &options(TrimStrategy::First, 2),
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, humans(&["a", "b"]));
    }

    #[test]
    fn last_keeps_longest_fitting_suffix() {
        let messages = humans(&["a", "b", "c", "d"]);
        let trimmed = trim_messages(
            &messages,
            &options(TrimStrategy::Last, 2),
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, humans(&["c", "d"]));
    }

    #[test]
    fn everything_fits_is_identity() {
        let messages = humans(&["a", "b"]);
        let trimmed = trim_messages(
            &messages,
            &options(TrimStrategy::First, 10),
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, messages);
    }

    #[test]
    fn nothing_fits_is_empty() {
        let messages = humans(&["a", "b"]);
        for strategy in [TrimStrategy::First, TrimStrategy::Last] {
            let trimmed = trim_messages(
                &messages,
                &options(strategy, 0),
                &TokenCounter::PerMessage(&one_token_each),
            )
            .unwrap();
            assert!(trimmed.is_empty());
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        let trimmed = trim_messages(
            &[],
            &options(TrimStrategy::Last, 5),
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert!(trimmed.is_empty());
    }

    #[test]
    fn sequence_counter_sees_whole_candidates() {
        let overhead = |messages: &[Message]| -> Result<usize, ExternalError> {
            Ok(messages.len() + 2)
        };
        let messages = humans(&["a", "b", "c", "d"]);
        let trimmed = trim_messages(
            &messages,
            &options(TrimStrategy::First, 3),
            &TokenCounter::Sequence(&overhead),
        )
        .unwrap();
        assert_eq!(trimmed, humans(&["a"]));
    }

    // -- keep_system --

    #[test]
    fn keep_system_pins_leading_system() {
        let messages = vec![
            Message::system("s"),
            Message::human("1"),
            Message::human("2"),
            Message::human("3"),
        ];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 2,
                strategy: TrimStrategy::Last,
                keep_system: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(
            trimmed,
            vec![Message::system("s"), Message::human("2"), Message::human("3")]
        );
    }

    #[test]
    fn keep_system_without_leading_system_is_plain_last() {
        let messages = humans(&["1", "2", "3"]);
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 2,
                strategy: TrimStrategy::Last,
                keep_system: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, humans(&["2", "3"]));
    }

    // Pinned: the reattached system message is not charged against the
    // budget, so the result can exceed `max_tokens`.
    #[test]
    fn keep_system_may_exceed_budget() {
        let messages = vec![Message::system("s"), Message::human("1"), Message::human("2")];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 1,
                strategy: TrimStrategy::Last,
                keep_system: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, vec![Message::system("s"), Message::human("2")]);
        assert_eq!(trimmed.len(), 2); // 2 tokens against a budget of 1
    }

    // -- boundary alignment --

    #[test]
    fn end_on_walks_back_to_variant() {
        let messages = vec![
            Message::human("q1"),
            Message::ai("a1"),
            Message::human("q2"),
            Message::human("q3"),
        ];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 3,
                strategy: TrimStrategy::First,
                end_on: Some(MessageType::Ai),
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(trimmed, vec![Message::human("q1"), Message::ai("a1")]);
    }

    #[test]
    fn end_on_with_no_match_empties() {
        let messages = humans(&["a", "b"]);
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 2,
                strategy: TrimStrategy::First,
                end_on: Some(MessageType::Ai),
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert!(trimmed.is_empty());
    }

    #[test]
    fn start_on_snaps_suffix_start() {
        let messages = vec![
            Message::human("q1"),
            Message::ai("a1"),
            Message::human("q2"),
            Message::ai("a2"),
        ];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 3,
                strategy: TrimStrategy::Last,
                start_on: Some(MessageType::Human),
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap();
        assert_eq!(
            trimmed,
            vec![Message::human("q2"), Message::ai("a2")]
        );
    }

    // -- allow_partial --

    #[test]
    fn partial_drops_trailing_blocks() {
        let boundary = Message::human(MessageContent::Blocks(vec![
            ContentBlock::text("aaaa"),
            ContentBlock::text("bbbb"),
        ]));
        let messages = vec![Message::human("xx"), boundary];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 6,
                strategy: TrimStrategy::First,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
        )
        .unwrap();
        assert_eq!(
            trimmed,
            vec![
                Message::human("xx"),
                Message::human(MessageContent::Blocks(vec![ContentBlock::text("aaaa")])),
            ]
        );
    }

    #[test]
    fn partial_splits_single_text_block() {
        let per_char = |text: &str| -> Result<Vec<String>, ExternalError> {
            Ok(text.chars().map(String::from).collect())
        };
        let messages = vec![Message::human(MessageContent::Blocks(vec![ContentBlock::text(
            "aaaa",
        )]))];
        let trimmed = trim_messages_with_splitter(
            &messages,
            &TrimOptions {
                max_tokens: 2,
                strategy: TrimStrategy::First,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
            &per_char,
        )
        .unwrap();
        assert_eq!(trimmed.len(), 1);
        let blocks = trimmed[0].content.blocks().unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(char_count(&trimmed[0]).unwrap() <= 2);
    }

    #[test]
    fn partial_splits_plain_text_on_newlines() {
        let messages = vec![Message::human("line1\nline2\nline3")];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 10,
                strategy: TrimStrategy::First,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
        )
        .unwrap();
        assert_eq!(
            trimmed,
            vec![Message::human(MessageContent::Blocks(vec![
                ContentBlock::text("line1"),
                ContentBlock::text("line2"),
            ]))]
        );
    }

    #[test]
    fn partial_without_fit_drops_the_message() {
        let messages = vec![Message::human("aaaa\nbbbb")];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 2,
                strategy: TrimStrategy::First,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
        )
        .unwrap();
        assert!(trimmed.is_empty());
    }

    #[test]
    fn partial_applies_in_last_strategy() {
        let messages = vec![
            Message::human("aaaa"),
            Message::human(MessageContent::Blocks(vec![
                ContentBlock::text("bbbb"),
                ContentBlock::text("cccc"),
            ])),
        ];
        let trimmed = trim_messages(
            &messages,
            &TrimOptions {
                max_tokens: 4,
                strategy: TrimStrategy::Last,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
        )
        .unwrap();
        assert_eq!(
            trimmed,
            vec![Message::human(MessageContent::Blocks(vec![ContentBlock::text(
                "bbbb"
            )]))]
        );
    }

    // -- option validation --

    #[test]
    fn end_on_requires_first() {
        let err = trim_messages(
            &[],
            &TrimOptions {
                strategy: TrimStrategy::Last,
                end_on: Some(MessageType::Ai),
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap_err();
        assert_matches!(err, TransformError::IncompatibleOptions { .. });
    }

    #[test]
    fn start_on_requires_last() {
        let err = trim_messages(
            &[],
            &TrimOptions {
                strategy: TrimStrategy::First,
                start_on: Some(MessageType::Human),
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap_err();
        assert_matches!(err, TransformError::IncompatibleOptions { .. });
    }

    #[test]
    fn keep_system_requires_last() {
        let err = trim_messages(
            &[],
            &TrimOptions {
                strategy: TrimStrategy::First,
                keep_system: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&one_token_each),
        )
        .unwrap_err();
        assert_matches!(err, TransformError::IncompatibleOptions { .. });
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("first".parse::<TrimStrategy>().unwrap(), TrimStrategy::First);
        assert_eq!("last".parse::<TrimStrategy>().unwrap(), TrimStrategy::Last);
        assert_matches!(
            "sliding".parse::<TrimStrategy>(),
            Err(TransformError::UnrecognizedStrategy { got }) if got == "sliding"
        );
    }

    // -- external failures --

    #[test]
    fn counter_errors_propagate_unmodified() {
        let failing = |_: &Message| -> Result<usize, ExternalError> { Err("boom".into()) };
        let err = trim_messages(
            &humans(&["a"]),
            &options(TrimStrategy::First, 1),
            &TokenCounter::PerMessage(&failing),
        )
        .unwrap_err();
        assert_matches!(&err, TransformError::External(_));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn splitter_errors_propagate_unmodified() {
        let failing = |_: &str| -> Result<Vec<String>, ExternalError> { Err("split failed".into()) };
        let err = trim_messages_with_splitter(
            &humans(&["aaaa"]),
            &TrimOptions {
                max_tokens: 1,
                strategy: TrimStrategy::First,
                allow_partial: true,
                ..TrimOptions::default()
            },
            &TokenCounter::PerMessage(&char_count),
            &failing,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "split failed");
    }

    // ── properties ──

    proptest! {
        #[test]
        fn first_output_is_a_prefix(
            texts in prop::collection::vec("[a-z]{0,8}", 0..10),
            max_tokens in 0usize..40,
        ) {
            let messages: Vec<Message> = texts.iter().map(|t| Message::human(t.as_str())).collect();
            let trimmed = trim_messages(
                &messages,
                &options(TrimStrategy::First, max_tokens),
                &TokenCounter::PerMessage(&char_count),
            )
            .unwrap();
            prop_assert!(trimmed.len() <= messages.len());
            prop_assert_eq!(&messages[..trimmed.len()], trimmed.as_slice());
        }

        #[test]
        fn last_output_is_a_suffix(
            texts in prop::collection::vec("[a-z]{0,8}", 0..10),
            max_tokens in 0usize..40,
        ) {
            let messages: Vec<Message> = texts.iter().map(|t| Message::human(t.as_str())).collect();
            let trimmed = trim_messages(
                &messages,
                &options(TrimStrategy::Last, max_tokens),
                &TokenCounter::PerMessage(&char_count),
            )
            .unwrap();
            prop_assert_eq!(&messages[messages.len() - trimmed.len()..], trimmed.as_slice());
        }

        #[test]
        fn output_never_exceeds_budget_without_keep_system(
            texts in prop::collection::vec("[a-z]{0,8}", 0..10),
            max_tokens in 0usize..40,
            last in proptest::bool::ANY,
        ) {
            let strategy = if last { TrimStrategy::Last } else { TrimStrategy::First };
            let messages: Vec<Message> = texts.iter().map(|t| Message::human(t.as_str())).collect();
            let counter = TokenCounter::PerMessage(&char_count);
            let trimmed = trim_messages(&messages, &options(strategy, max_tokens), &counter)
                .unwrap();
            let mut total = 0;
            for message in &trimmed {
                total += char_count(message).unwrap();
            }
            prop_assert!(total <= max_tokens);
        }
    }
}
