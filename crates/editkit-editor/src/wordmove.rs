//! Word-motion classifier, paragraph motion and bracket matching.
//!
//! Word boundaries come from a fixed class table: letters, digits, spaces
//! and punctuation groups are segments of one constant string, and a
//! character's class mask has one bit per segment containing it. Two
//! characters belong together iff their masks intersect.

use editkit_buffer::Offset;
use editkit_settings::EditOptions;

use crate::editor::{Editor, REDRAW_PAGE};

/// Class segments, separated by `'!'`.
const CHARS_MOVE_WHOLE_WORD: &[u8] =
    b"!=&|<>^~ !:;, !'!`!.?!\"!( !) !{ !} !Aa0 !+-*/= |<> ![ !] !\\#! ";

/// Bitmask of class segments containing `c`. Characters outside the table
/// share the all-ones mask and therefore never form a boundary with
/// anything but a table character of a disjoint class.
pub(crate) fn char_class(c: u8) -> u32 {
    if c == 0 {
        return 0;
    }
    if c == b'!' {
        return 2;
    }

    let c = if c.is_ascii_uppercase() {
        b'A'
    } else if c.is_ascii_lowercase() {
        b'a'
    } else if c.is_ascii_digit() {
        b'0'
    } else if c.is_ascii_whitespace() {
        b' '
    } else {
        c
    };

    let mut mask = 0u32;
    let mut segment = 1u32;
    let mut found = false;
    for &p in CHARS_MOVE_WHOLE_WORD {
        if p == b'!' {
            segment <<= 1;
        } else if p == c {
            mask |= segment;
            found = true;
        }
    }
    if !found {
        return 0xFFFF_FFFF;
    }
    mask
}

impl Editor {
    /// Step the cursor left until a word boundary. With `s` set, a
    /// non-space to space transition is also a boundary.
    pub(crate) fn left_word_move(&mut self, s: i32) {
        loop {
            if self.column_highlight
                && self.mark1 != self.mark2
                && self.over_col == 0
                && self.buffer.curs1() == self.buffer.current_bol()
            {
                break;
            }
            self.cursor_move(-1);
            if self.buffer.curs1() == 0 {
                break;
            }
            let c1 = self.buffer.prev_byte();
            if c1 == b'\n' {
                break;
            }
            let c2 = self.buffer.current_byte();
            if c2 == b'\n' {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
            if c1.is_ascii_whitespace() && !c2.is_ascii_whitespace() {
                break;
            }
            if s != 0 && !c1.is_ascii_whitespace() && c2.is_ascii_whitespace() {
                break;
            }
        }
    }

    pub(crate) fn left_word_move_cmd(&mut self) {
        self.left_word_move(0);
        self.force |= REDRAW_PAGE;
    }

    /// Step the cursor right until a word boundary.
    pub(crate) fn right_word_move(&mut self, s: i32) {
        loop {
            if self.column_highlight
                && self.mark1 != self.mark2
                && self.over_col == 0
                && self.buffer.curs1() == self.buffer.current_eol()
            {
                break;
            }
            self.cursor_move(1);
            if self.buffer.curs1() >= self.buffer.size() {
                break;
            }
            let c1 = self.buffer.prev_byte();
            if c1 == b'\n' {
                break;
            }
            let c2 = self.buffer.current_byte();
            if c2 == b'\n' {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
            if c1.is_ascii_whitespace() && !c2.is_ascii_whitespace() {
                break;
            }
            if s != 0 && !c1.is_ascii_whitespace() && c2.is_ascii_whitespace() {
                break;
            }
        }
    }

    pub(crate) fn right_word_move_cmd(&mut self) {
        self.right_word_move(0);
        self.force |= REDRAW_PAGE;
    }

    /// Delete forward through the end of the current word.
    pub(crate) fn right_delete_word(&mut self) {
        while self.buffer.curs1() < self.buffer.size() {
            let c1 = self.delete(true);
            if c1 == b'\n' {
                break;
            }
            let c2 = self.buffer.current_byte();
            if c2 == b'\n' {
                break;
            }
            if c1.is_ascii_whitespace() != c2.is_ascii_whitespace() {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
        }
    }

    /// Delete backward through the beginning of the current word.
    pub(crate) fn left_delete_word(&mut self) {
        while self.buffer.curs1() > 0 {
            let c1 = self.backspace(true);
            if c1 == b'\n' {
                break;
            }
            let c2 = self.buffer.prev_byte();
            if c2 == b'\n' {
                break;
            }
            if c1.is_ascii_whitespace() != c2.is_ascii_whitespace() {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
        }
    }

    /// Move up to the previous blank line, or to just after the start of
    /// the paragraph when the cursor sits inside one.
    pub(crate) fn move_up_paragraph(&mut self, opts: &EditOptions, do_scroll: bool) {
        let curs_line = self.buffer.curs_line();
        let mut i: Offset = 0;

        if curs_line > 1 {
            if !self.line_is_blank(curs_line) {
                i = curs_line - 1;
                while i != 0 {
                    if self.line_is_blank(i) {
                        break;
                    }
                    i -= 1;
                }
            } else if self.line_is_blank(curs_line - 1) {
                i = curs_line - 1;
                while i != 0 {
                    if !self.line_is_blank(i) {
                        i += 1;
                        break;
                    }
                    i -= 1;
                }
            } else {
                i = curs_line - 1;
                while i != 0 {
                    if self.line_is_blank(i) {
                        break;
                    }
                    i -= 1;
                }
            }
        }

        self.move_up(opts, curs_line - i, do_scroll);
    }

    /// Move down to the next blank line, or to just before the end of the
    /// paragraph when the cursor sits inside one.
    pub(crate) fn move_down_paragraph(&mut self, opts: &EditOptions, do_scroll: bool) {
        let curs_line = self.buffer.curs_line();
        let lines = self.buffer.lines();
        let i: Offset;

        if curs_line >= lines - 1 {
            i = lines;
        } else if !self.line_is_blank(curs_line) {
            let mut j = curs_line + 1;
            while !self.line_is_blank(j) && j < lines {
                j += 1;
            }
            i = j;
        } else if self.line_is_blank(curs_line + 1) {
            let mut j = curs_line + 1;
            loop {
                if !self.line_is_blank(j) || j > lines {
                    j -= 1;
                    break;
                }
                j += 1;
            }
            i = j;
        } else {
            let mut j = curs_line + 1;
            while !self.line_is_blank(j) && j < lines {
                j += 1;
            }
            i = j;
        }

        self.move_down(opts, i - curs_line, do_scroll);
    }

    /// Find the bracket matching the one under the cursor.
    ///
    /// `furthest == 0` means no scan bound. With `in_screen`, the scan
    /// stays within the visible part of the buffer. Returns the matching
    /// offset or `-1`.
    pub(crate) fn get_bracket(&mut self, in_screen: bool, furthest: u64) -> Offset {
        const BRACKETS: &[u8] = b"{}{[][()(";

        self.update_curs_row();
        let c = self.buffer.current_byte();
        let Some(pos) = BRACKETS.iter().position(|&b| b == c) else {
            return -1;
        };
        // the matching character is the next table entry
        let d = BRACKETS[pos + 1];
        // going left or right?
        let inc: Offset = if matches!(c, b'{' | b'[' | b'(') { 1 } else { -1 };
        let furthest = if furthest == 0 { u64::MAX } else { furthest };

        let mut depth: i64 = 1;
        let mut rows: Offset = 0;
        let mut scanned: u64 = 0;
        let mut q = self.buffer.curs1() + inc;
        loop {
            // out of buffer?
            if q >= self.buffer.size() || q < 0 {
                break;
            }
            let a = self.buffer.byte_at(q);
            // don't want to eat CPU
            if scanned > furthest {
                break;
            }
            scanned += 1;
            if in_screen {
                if q < self.start_display {
                    break;
                }
                // count rows when searching downward
                if inc > 0 && a == b'\n' {
                    if rows >= self.screen_rows - self.curs_row {
                        break;
                    }
                    rows += 1;
                }
            }
            depth += (a == c) as i64 - (a == d) as i64;
            if depth == 0 {
                return q;
            }
            q += inc;
        }
        -1
    }

    /// Jump the cursor to the matching bracket.
    pub(crate) fn goto_matching_bracket(&mut self) {
        let q = self.get_bracket(false, 0);
        if q >= 0 {
            self.bracket = self.buffer.curs1();
            self.force |= REDRAW_PAGE;
            self.cursor_move(q - self.buffer.curs1());
        }
    }

    /// Passive per-command bracket scan, bounded to the visible screen and
    /// 10,000 bytes.
    pub(crate) fn find_bracket(&mut self) {
        self.bracket = self.get_bracket(true, 10_000);
        if self.last_bracket != self.bracket {
            self.force |= REDRAW_PAGE;
        }
        self.last_bracket = self.bracket;
    }
}
