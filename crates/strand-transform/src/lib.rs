//! # strand-transform
//!
//! Pure sequence operations over canonical messages:
//!
//! - **Normalization**: [`normalize_all`] unifies strings, role/content
//!   pairs, JSON mappings, and canonical values into [`Message`]s
//! - **Filtering**: [`filter_messages`] includes/excludes by name,
//!   variant, and ID
//! - **Run merging**: [`merge_message_runs`] collapses adjacent
//!   same-variant messages via the chunk merge operation
//! - **Trimming**: [`trim_messages`] enforces a token budget with
//!   boundary alignment, system pinning, and partial truncation
//! - **Rendering**: [`get_buffer_string`] flattens a transcript to text
//!
//! Every operation consumes and produces new sequences; caller-owned
//! inputs are never mutated, and no state is shared between calls.
//!
//! [`Message`]: strand_core::Message

#![deny(unsafe_code)]

pub mod buffer;
pub mod errors;
pub mod filter;
pub mod merge;
pub mod normalize;
pub mod trim;

pub use buffer::{AI_PREFIX, HUMAN_PREFIX, buffer_string, get_buffer_string};
pub use errors::{ExternalError, TransformError};
pub use filter::{FilterCriteria, filter_messages};
pub use merge::merge_message_runs;
pub use normalize::{MessageLike, normalize, normalize_all};
pub use trim::{
    TextSplitter, TokenCounter, TrimOptions, TrimStrategy, trim_messages,
    trim_messages_with_splitter,
};
