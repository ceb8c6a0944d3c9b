//! Error types for the core crate.

use thiserror::Error;

/// Errors raised by the stored-form codec.
///
/// All variants are terminal validation errors, raised synchronously at
/// the call that detects them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The serialized `type` label is not one of the 12 recognized labels
    /// (6 plain variants plus their `_chunk` counterparts).
    #[error("unrecognized serialized message type '{got}'")]
    UnrecognizedSerializedType {
        /// The offending label.
        got: String,
    },

    /// The `data` payload under a recognized label failed to parse.
    #[error("malformed data payload for serialized message type '{label}'")]
    MalformedData {
        /// The envelope label the payload was parsed under.
        label: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
