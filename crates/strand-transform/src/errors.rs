//! Error types for the transform crate.

use thiserror::Error;

/// Boxed failure from an externally supplied callable (token counter or
/// text splitter).
pub type ExternalError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the sequence operations.
///
/// All variants are terminal validation errors, raised synchronously at
/// the call that detects them; nothing is retried internally. Failures
/// of caller-supplied callables pass through the [`External`] variant
/// unmodified.
///
/// [`External`]: TransformError::External
#[derive(Debug, Error)]
pub enum TransformError {
    /// The normalizer's dynamic dispatch matched no supported input shape.
    #[error("unsupported message input shape: {shape}")]
    UnsupportedInputShape {
        /// Description of the offending shape.
        shape: String,
    },

    /// A role string outside the accepted table.
    #[error(
        "unknown message type '{got}'. Use one of 'human', 'user', 'ai', \
         'assistant', 'system', 'function', or 'tool'"
    )]
    UnknownMessageType {
        /// The offending role string.
        got: String,
    },

    /// A mapping input without a role/type or content key.
    #[error("message mapping is missing required field '{field}'")]
    MissingRequiredField {
        /// The absent field.
        field: &'static str,
    },

    /// Trim options that contradict the chosen strategy.
    #[error("incompatible trim options: {detail}")]
    IncompatibleOptions {
        /// What clashed.
        detail: String,
    },

    /// A strategy string outside `first`/`last`.
    #[error("unrecognized trim strategy '{got}'. Supported strategies are 'first' and 'last'")]
    UnrecognizedStrategy {
        /// The offending strategy string.
        got: String,
    },

    /// Failure of an externally supplied callable, propagated unmodified.
    #[error(transparent)]
    External(#[from] ExternalError),
}
