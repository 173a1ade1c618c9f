//! Error types for value encoding

use thiserror::Error;

/// Value or transaction encoding error
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON encoding or decoding failed
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// RLP decoding failed
    #[error("rlp decode error: {0}")]
    Rlp(#[from] rlp::DecoderError),

    /// Argument at the given position could not be decoded
    #[error("invalid argument {index}: {message}")]
    InvalidArgument {
        /// Argument position
        index: usize,
        /// Underlying error
        message: String,
    },
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
