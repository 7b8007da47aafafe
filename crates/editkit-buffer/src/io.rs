//! Stream adapters: bulk fill from a byte source and line-break translating
//! output.
//!
//! The loader fills an empty buffer in blocks, invoking a progress callback
//! after every block; the callback may cancel the load, which is honored at
//! block granularity. The saver streams the buffer to a sink, optionally
//! translating line breaks with a two-byte look-ahead.

use crate::buffer::{Offset, TextBuffer, PAGE_SIZE};
use crate::error::{BufferError, BufferResult};
use std::io::{Read, Write};

/// Block size for stream transfers.
pub const TEMP_BUF_LEN: usize = 1024;

/// Line-break handling for load and save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreaks {
    /// Pass bytes through verbatim.
    #[default]
    Asis,
    /// `\n`
    Unix,
    /// `\r\n`
    Win,
    /// `\r`
    Mac,
}

impl std::fmt::Display for LineBreaks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asis => write!(f, "as-is"),
            Self::Unix => write!(f, "unix"),
            Self::Win => write!(f, "windows"),
            Self::Mac => write!(f, "mac"),
        }
    }
}

/// Fill an empty buffer with `expected` bytes from `reader`, block by block.
///
/// The cursor is left at offset 0. `progress` receives the running byte
/// count after each block and returns `false` to cancel. Returns the number
/// of bytes read; a short read leaves the buffer empty so no partial state
/// escapes. Callers compare the returned count against `expected`.
pub fn read_into<R: Read>(
    buf: &mut TextBuffer,
    reader: &mut R,
    expected: u64,
    progress: &mut dyn FnMut(u64) -> bool,
) -> BufferResult<u64> {
    debug_assert!(buf.is_empty(), "bulk fill requires an empty buffer");

    let total = expected as usize;
    if total == 0 {
        return Ok(0);
    }

    // Pre-size the reversed after-cursor pages; page r/PAGE_SIZE holds
    // reversed index r.
    let n_pages = total.div_ceil(PAGE_SIZE);
    let mut pages: Vec<Vec<u8>> = (0..n_pages)
        .map(|p| {
            let len = if p + 1 < n_pages {
                PAGE_SIZE
            } else {
                total - (n_pages - 1) * PAGE_SIZE
            };
            vec![0u8; len]
        })
        .collect();

    let mut block = [0u8; TEMP_BUF_LEN];
    let mut loaded: usize = 0;
    let mut lines: Offset = 0;

    while loaded < total {
        let want = TEMP_BUF_LEN.min(total - loaded);
        let n = reader.read(&mut block[..want])?;
        if n == 0 {
            break;
        }
        for (k, &c) in block[..n].iter().enumerate() {
            if c == b'\n' {
                lines += 1;
            }
            let r = total - 1 - (loaded + k);
            pages[r / PAGE_SIZE][r % PAGE_SIZE] = c;
        }
        loaded += n;
        if !progress(loaded as u64) {
            tracing::debug!(loaded, "buffer load cancelled");
            return Err(BufferError::Aborted {
                loaded: loaded as u64,
            });
        }
    }

    if loaded == total {
        buf.side1.clear();
        buf.side2 = pages;
        buf.curs1 = 0;
        buf.curs2 = total as Offset;
        buf.lines = lines;
        buf.curs_line = 0;
    } else {
        tracing::warn!(expected, loaded, "short read while filling buffer");
    }

    Ok(loaded as u64)
}

fn put<W: Write>(writer: &mut W, c: u8, offset: Offset) -> BufferResult<()> {
    writer
        .write_all(&[c])
        .map_err(|source| BufferError::Write { offset, source })
}

/// Stream the buffer to `writer`, translating line breaks per `lb`.
///
/// Translation looks one byte ahead at every break so that `\r\n` pairs and
/// doubled breaks collapse or expand correctly. Returns the count of buffer
/// bytes processed; errors carry the logical offset reached.
pub fn write_stream<W: Write>(
    buf: &TextBuffer,
    writer: &mut W,
    lb: LineBreaks,
) -> BufferResult<Offset> {
    let size = buf.size();

    if lb == LineBreaks::Asis {
        let mut i: Offset = 0;
        while i < size {
            put(writer, buf.byte_at(i), i)?;
            i += 1;
        }
        return Ok(size);
    }

    let mut i: Offset = 0;
    while i < size {
        let c = buf.byte_at(i);
        if c != b'\n' && c != b'\r' {
            put(writer, c, i)?;
        } else {
            // past the end this reads the sentinel, hence the i < size guards
            let c1 = buf.byte_at(i + 1);

            match lb {
                LineBreaks::Unix => {
                    put(writer, b'\n', i)?;
                    i += 1;
                    if c == b'\r' && c1 == b'\n' {
                        // Windows line break; both bytes consumed
                    } else if c == b'\r' && c1 == b'\r' {
                        // two Macintosh line breaks
                        put(writer, b'\n', i)?;
                    } else if i < size {
                        put(writer, c1, i)?;
                    }
                }
                LineBreaks::Win => {
                    put(writer, b'\r', i)?;
                    put(writer, b'\n', i)?;
                    if c == b'\r' && c1 == b'\n' {
                        i += 1;
                    }
                }
                LineBreaks::Mac => {
                    put(writer, b'\r', i)?;
                    i += 1;
                    if c == b'\r' && c1 == b'\n' {
                        // Windows line break; both bytes consumed
                    } else if c == b'\n' && c1 == b'\n' && i < size {
                        // two Unix line feeds become two carriage returns
                        put(writer, b'\r', i)?;
                    } else if i < size {
                        put(writer, c1, i)?;
                    }
                }
                LineBreaks::Asis => unreachable!(),
            }
        }
        i += 1;
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn filled(text: &str) -> TextBuffer {
        let mut buf = TextBuffer::new();
        for &b in text.as_bytes() {
            buf.insert(b);
        }
        buf
    }

    fn saved(text: &str, lb: LineBreaks) -> Vec<u8> {
        let buf = filled(text);
        let mut out = Vec::new();
        write_stream(&buf, &mut out, lb).unwrap();
        out
    }

    #[test]
    fn test_read_into_fills_and_counts() {
        let data = b"alpha\nbeta\ngamma";
        let mut buf = TextBuffer::new();
        let mut calls = 0;
        let n = read_into(
            &mut buf,
            &mut Cursor::new(&data[..]),
            data.len() as u64,
            &mut |_| {
                calls += 1;
                true
            },
        )
        .unwrap();
        assert_eq!(n, data.len() as u64);
        assert!(calls >= 1);
        assert_eq!(buf.curs1(), 0);
        assert_eq!(buf.size(), data.len() as Offset);
        assert_eq!(buf.lines(), 2);
        assert_eq!(buf.curs_line(), 0);
        assert_eq!(buf.slice(0, buf.size()), data);
    }

    #[test]
    fn test_read_into_multi_page() {
        let data: Vec<u8> = (0..PAGE_SIZE * 3 + 100)
            .map(|i| if i % 53 == 0 { b'\n' } else { b'x' })
            .collect();
        let mut buf = TextBuffer::new();
        let n = read_into(
            &mut buf,
            &mut Cursor::new(&data[..]),
            data.len() as u64,
            &mut |_| true,
        )
        .unwrap();
        assert_eq!(n, data.len() as u64);
        assert_eq!(buf.slice(0, buf.size()), data);
    }

    #[test]
    fn test_read_into_abort() {
        let data = vec![b'a'; PAGE_SIZE * 4];
        let mut buf = TextBuffer::new();
        let result = read_into(
            &mut buf,
            &mut Cursor::new(&data[..]),
            data.len() as u64,
            &mut |loaded| loaded < 2048,
        );
        assert!(matches!(result, Err(BufferError::Aborted { .. })));
    }

    #[test]
    fn test_read_into_short_read_leaves_buffer_empty() {
        let data = b"tiny";
        let mut buf = TextBuffer::new();
        let n = read_into(&mut buf, &mut Cursor::new(&data[..]), 100, &mut |_| true).unwrap();
        assert_eq!(n, 4);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_asis() {
        assert_eq!(saved("a\r\nb\rc\n", LineBreaks::Asis), b"a\r\nb\rc\n");
    }

    #[test]
    fn test_write_unix() {
        assert_eq!(saved("a\r\nb\rc\n", LineBreaks::Unix), b"a\nb\nc\n");
    }

    #[test]
    fn test_write_win() {
        assert_eq!(saved("a\r\nb\rc\n", LineBreaks::Win), b"a\r\nb\r\nc\r\n");
    }

    #[test]
    fn test_write_mac() {
        assert_eq!(saved("a\r\nb\rc\n", LineBreaks::Mac), b"a\rb\rc\r");
    }

    #[test]
    fn test_write_unix_double_mac_breaks() {
        assert_eq!(saved("a\r\rb", LineBreaks::Unix), b"a\n\nb");
    }

    #[test]
    fn test_write_mac_double_unix_breaks() {
        assert_eq!(saved("a\n\nb", LineBreaks::Mac), b"a\r\rb");
    }

    #[test]
    fn test_write_win_idempotent() {
        assert_eq!(saved("a\r\nb\r\n", LineBreaks::Win), b"a\r\nb\r\n");
    }
}
