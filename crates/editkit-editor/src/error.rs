//! Error types for the editor core.
//!
//! Read paths inside the core recover and return neutral values; only the
//! load and save paths surface errors. Load errors leave no partial state
//! behind: the editor the caller was constructing is dropped.

use editkit_buffer::BufferError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving a buffer.
#[derive(Error, Debug)]
pub enum EditorError {
    /// The file could not be opened or created.
    #[error("Cannot open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file metadata could not be read.
    #[error("Cannot stat {path}: {source}")]
    StatFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Only regular files can be loaded.
    #[error("{path} is not a regular file")]
    NotRegularFile { path: PathBuf },

    /// The file exceeds the configured threshold and no override was given.
    #[error("File {path} is too large: {size} bytes (threshold {threshold})")]
    OverThreshold {
        path: PathBuf,
        size: u64,
        threshold: u64,
    },

    /// The progress callback cancelled the load.
    #[error("Load aborted after {loaded} bytes")]
    Aborted { loaded: u64 },

    /// The source delivered fewer bytes than its reported size.
    #[error("Short read: expected {expected} bytes, got {loaded}")]
    ShortRead { expected: u64, loaded: u64 },

    /// Saving is refused while the buffer lacks a trailing newline and the
    /// `check_nl_at_eof` option is set.
    #[error("The buffer does not end with a newline")]
    NoTrailingNewline,

    /// Writing stopped before the whole buffer reached the sink.
    #[error("Save failed at byte {offset} of {size}: {source}")]
    SaveFailed {
        offset: i64,
        size: i64,
        source: std::io::Error,
    },

    /// A buffer stream operation failed.
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Any other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EditorError::OverThreshold {
            path: PathBuf::from("big.log"),
            size: 200,
            threshold: 100,
        };
        assert_eq!(
            err.to_string(),
            "File big.log is too large: 200 bytes (threshold 100)"
        );

        let err = EditorError::ShortRead {
            expected: 10,
            loaded: 4,
        };
        assert_eq!(err.to_string(), "Short read: expected 10 bytes, got 4");
    }

    #[test]
    fn test_buffer_error_conversion() {
        let buf_err = BufferError::Aborted { loaded: 3 };
        let ed_err: EditorError = buf_err.into();
        assert!(matches!(ed_err, EditorError::Buffer(_)));
    }
}
