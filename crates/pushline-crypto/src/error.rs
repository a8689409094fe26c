//! Codec error types.

/// Errors from key decoding and validation.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Not a valid P-256 point")]
    InvalidPoint,
}

impl From<CodecError> for pushline_core::Error {
    fn from(e: CodecError) -> Self {
        Self::KeyTransformRejected(e.to_string())
    }
}
