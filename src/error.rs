//! Error types and handling for fnstream
//!
//! Only structural misuse is reported through [`StreamError`]. Failures that
//! travel with the data are carried as `Result` items inside a functor and
//! recovered with [`FunctorExt::catch`](crate::functor::FunctorExt::catch).

use thiserror::Error;

/// Main error type for fnstream operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// A curried or cached function was called with the wrong number of arguments
    #[error("function called with {got} arguments, expected {expected}")]
    Arity { expected: usize, got: usize },
    /// `Stream::combine` needs at least two inputs
    #[error("combine requires at least 2 source streams, got {0}")]
    CombineArity(usize),
    /// A structural path could not be parsed, or cannot be assigned through
    #[error("invalid path \"{0}\"")]
    InvalidPath(String),
    /// A configuration value failed validation
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Custom error with message
    #[error("stream error: {0}")]
    Custom(String),
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Config(err.to_string())
    }
}

/// Result type for fnstream operations
pub type StreamResult<T> = Result<T, StreamError>;
