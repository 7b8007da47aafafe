//! Error types for buffer stream operations.
//!
//! In-memory buffer reads never fail: out-of-range reads return the newline
//! sentinel. Only the stream adapters surface errors.

use thiserror::Error;

/// Errors from filling or draining a buffer through a byte stream.
#[derive(Error, Debug)]
pub enum BufferError {
    /// Reading from the byte source failed.
    #[error("Buffer read error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing to the byte sink failed at the given logical offset.
    #[error("Buffer write error at byte {offset}: {source}")]
    Write {
        offset: i64,
        source: std::io::Error,
    },

    /// The progress callback requested cancellation.
    #[error("Load aborted after {loaded} bytes")]
    Aborted { loaded: u64 },
}

/// Result type alias for buffer stream operations.
pub type BufferResult<T> = Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BufferError::Aborted { loaded: 2048 };
        assert_eq!(err.to_string(), "Load aborted after 2048 bytes");

        let err = BufferError::Write {
            offset: 17,
            source: std::io::Error::new(std::io::ErrorKind::WriteZero, "sink full"),
        };
        assert_eq!(err.to_string(), "Buffer write error at byte 17: sink full");
    }
}
