//! Clipboard seam.
//!
//! Block commands pass their payload through this trait; the embedding
//! application wires it to a system clipboard or a block file. Column-mode
//! payloads are tagged with a 5-byte magic prefix so readers can switch to
//! column insertion.

/// Magic prefix marking a rectangular (column) block payload.
pub const COLUMN_BLOCK_MAGIC: [u8; 5] = [0x01, 0x01, 0x01, 0x01, 0x0A];

/// External clipboard collaborator.
pub trait Clipboard {
    /// Store a payload; returns `false` when the clipboard rejected it.
    fn store(&mut self, payload: &[u8]) -> bool;

    /// Retrieve the last stored payload.
    fn retrieve(&mut self) -> Option<Vec<u8>>;
}

/// In-memory clipboard, used by default and in tests.
#[derive(Debug, Default)]
pub struct MemClipboard {
    payload: Option<Vec<u8>>,
}

impl MemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemClipboard {
    fn store(&mut self, payload: &[u8]) -> bool {
        self.payload = Some(payload.to_vec());
        true
    }

    fn retrieve(&mut self) -> Option<Vec<u8>> {
        self.payload.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_clipboard_round_trip() {
        let mut clip = MemClipboard::new();
        assert!(clip.retrieve().is_none());
        assert!(clip.store(b"hello"));
        assert_eq!(clip.retrieve().unwrap(), b"hello");
        // retrieve does not consume
        assert_eq!(clip.retrieve().unwrap(), b"hello");
    }

    #[test]
    fn test_column_magic_shape() {
        assert_eq!(COLUMN_BLOCK_MAGIC.len(), 5);
        assert_eq!(COLUMN_BLOCK_MAGIC[4], b'\n');
    }
}
