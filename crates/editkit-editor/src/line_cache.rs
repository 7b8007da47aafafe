//! Line-offset cache.
//!
//! A small fixed array of `(line, offset)` pairs answering `goto line`
//! queries without rescanning the buffer from the top. Slot 0 is always
//! `(0, 0)`; slot 1 seeds with the cursor's line and slot 2 with the last
//! line whenever the cache revalidates. The remaining slots are replaced
//! under a closest-known-point policy; the cache is purely a hint and every
//! modification invalidates it.

use editkit_buffer::Offset;

use crate::editor::Editor;

/// Number of cache slots.
pub const N_LINE_CACHES: usize = 32;

/// Deterministic linear congruential generator used for slot replacement.
/// The replacement policy does not affect correctness, so a fixed seed
/// keeps behavior reproducible.
#[derive(Debug, Clone)]
pub(crate) struct Lcg(u64);

impl Lcg {
    pub(crate) fn new() -> Self {
        Self(0x2545_F491_4F6C_DD1D)
    }

    pub(crate) fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LineCache {
    pub(crate) numbers: [Offset; N_LINE_CACHES],
    pub(crate) offsets: [Offset; N_LINE_CACHES],
    pub(crate) valid: bool,
    rng: Lcg,
}

impl LineCache {
    pub(crate) fn new() -> Self {
        Self {
            numbers: [0; N_LINE_CACHES],
            offsets: [0; N_LINE_CACHES],
            valid: false,
            rng: Lcg::new(),
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Clear all slots and seed the cursor and last-line anchors.
    pub(crate) fn revalidate(&mut self, cursor: (Offset, Offset), last: (Offset, Offset)) {
        self.numbers = [0; N_LINE_CACHES];
        self.offsets = [0; N_LINE_CACHES];
        self.numbers[1] = cursor.0;
        self.offsets[1] = cursor.1;
        self.numbers[2] = last.0;
        self.offsets[2] = last.1;
        self.valid = true;
    }

    pub(crate) fn random_slot(&mut self) -> usize {
        3 + (self.rng.next() as usize) % (N_LINE_CACHES - 3)
    }
}

impl Editor {
    /// Byte offset of the first byte of `line`.
    ///
    /// Clamped: past-the-end lines return the last line's BOL, negative
    /// lines return 0.
    pub fn find_line(&mut self, line: Offset) -> Offset {
        if !self.line_cache.valid {
            self.line_cache.revalidate(
                (self.buffer.curs_line(), self.buffer.current_bol()),
                (self.buffer.lines(), self.buffer.bol(self.buffer.size())),
            );
        }
        if line >= self.buffer.lines() {
            return self.line_cache.offsets[2];
        }
        if line <= 0 {
            return 0;
        }

        // find the closest known point
        let mut m = Offset::MAX;
        let mut j = 0;
        for i in 0..N_LINE_CACHES {
            let n = (self.line_cache.numbers[i] - line).abs();
            if n < m {
                m = n;
                j = i;
            }
        }
        if m == 0 {
            return self.line_cache.offsets[j];
        }

        // one line away from a non-anchor slot usually means the caller is
        // iterating, so stay in that slot
        let i = if m == 1 && j >= 3 {
            j
        } else {
            self.line_cache.random_slot()
        };

        let offset = if line > self.line_cache.numbers[j] {
            self.buffer.forward_offset(
                self.line_cache.offsets[j],
                line - self.line_cache.numbers[j],
                0,
            )
        } else {
            self.buffer.backward_offset(
                self.line_cache.offsets[j],
                self.line_cache.numbers[j] - line,
            )
        };
        self.line_cache.offsets[i] = offset;
        self.line_cache.numbers[i] = line;
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_lines(n: usize) -> Editor {
        let text: String = (0..n).map(|i| format!("line {i}\n")).collect();
        Editor::from_bytes(text.as_bytes())
    }

    #[test]
    fn test_find_line_bounds() {
        let mut editor = editor_with_lines(10);
        assert_eq!(editor.find_line(0), 0);
        assert_eq!(editor.find_line(-5), 0);
        let last_bol = editor.buffer().bol(editor.buffer().size());
        assert_eq!(editor.find_line(1000), last_bol);
        assert_eq!(editor.find_line(editor.buffer().lines()), last_bol);
    }

    #[test]
    fn test_find_line_matches_scan() {
        let mut editor = editor_with_lines(50);
        for line in [1, 7, 23, 48, 12, 13, 14, 2] {
            let expected = editor.buffer().forward_offset(0, line, 0);
            assert_eq!(editor.find_line(line), expected, "line {line}");
        }
    }

    #[test]
    fn test_cache_invalidated_by_edits() {
        let mut editor = editor_with_lines(10);
        let before = editor.find_line(5);
        // insert a line above; the cached offset must not be reused
        editor.insert(b'\n');
        let after = editor.find_line(5);
        let expected = editor.buffer().forward_offset(0, 5, 0);
        assert_eq!(after, expected);
        assert_ne!(after, before);
    }

    #[test]
    fn test_lcg_is_deterministic() {
        let mut a = Lcg::new();
        let mut b = Lcg::new();
        for _ in 0..16 {
            assert_eq!(a.next(), b.next());
        }
    }
}
