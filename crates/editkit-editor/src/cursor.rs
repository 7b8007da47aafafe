//! Visual column accounting, scrolling, and high level cursor movement.
//!
//! Columns are visual: tabs advance to the next tab stop, control
//! characters render in caret notation and count two columns, and UTF-8
//! sequences count one column per codepoint.

use editkit_buffer::Offset;
use editkit_settings::EditOptions;

use crate::editor::{Editor, REDRAW_CHAR_ONLY, REDRAW_PAGE};

impl Editor {
    /// Dual-purpose column walker.
    ///
    /// With `upto == 0`: returns the byte offset reached after advancing
    /// `cols` visual columns from `current` (stopping at end-of-line).
    /// With `upto != 0`: returns the visual column of byte offset `upto`
    /// relative to `current`.
    pub(crate) fn move_forward_col(
        &self,
        opts: &EditOptions,
        current: Offset,
        cols: Offset,
        upto: Offset,
    ) -> Offset {
        let (q, cols) = if upto != 0 {
            (upto, -10)
        } else {
            (self.buffer.size() + 2, cols)
        };

        let mut col: Offset = 0;
        let mut p = current;
        while p < q {
            if cols != -10 {
                if col == cols {
                    return p;
                }
                if col > cols {
                    return p - 1;
                }
            }

            let c = self.buffer.byte_at(p);

            if self.utf8 {
                let (_, char_length) = self.buffer.get_utf(p);
                if char_length > 1 {
                    // the sequence contributes one column total; the
                    // continuation bytes below each add one back
                    col -= char_length - 1;
                }
            }

            if c == b'\n' {
                return if upto != 0 { col } else { p };
            }
            if c == b'\t' {
                col += opts.tab_spacing - col % opts.tab_spacing;
            } else if c < 32 || c == 127 {
                // caret notation: ^X occupies two cells
                col += 2;
            } else {
                col += 1;
            }
            p += 1;
        }
        col
    }

    /// Visual column of the cursor, computed fresh.
    pub fn get_col(&self, opts: &EditOptions) -> Offset {
        let b = self.buffer.current_bol();
        self.move_forward_col(opts, b, 0, self.buffer.curs1())
    }

    /// Refresh the cached cursor row from the line counters.
    pub(crate) fn update_curs_row(&mut self) {
        self.curs_row = self.buffer.curs_line() - self.start_line;
    }

    /// Refresh the cached visual column of the cursor.
    pub(crate) fn update_curs_col(&mut self, opts: &EditOptions) {
        let b = self.buffer.current_bol();
        self.curs_col = self.move_forward_col(opts, b, 0, self.buffer.curs1());
    }

    /// Cached visual column of the cursor.
    pub fn curs_col(&self) -> Offset {
        self.curs_col
    }

    /// Scroll the display up by `i` lines.
    pub fn scroll_upward(&mut self, i: Offset) {
        let lines_above = self.start_line;
        let i = i.min(lines_above);
        if i != 0 {
            self.start_line -= i;
            self.start_display = self.buffer.backward_offset(self.start_display, i);
            self.force |= REDRAW_PAGE;
            self.force &= !REDRAW_CHAR_ONLY;
        }
        self.update_curs_row();
    }

    /// Scroll the display down by `i` lines.
    pub fn scroll_downward(&mut self, i: Offset) {
        let lines_below = self.buffer.lines() - self.start_line - (self.screen_rows - 1);
        if lines_below > 0 {
            let i = i.min(lines_below);
            self.start_line += i;
            self.start_display = self.buffer.forward_offset(self.start_display, i, 0);
            self.force |= REDRAW_PAGE;
            self.force &= !REDRAW_CHAR_ONLY;
        }
        self.update_curs_row();
    }

    /// Scroll the display `i` columns to the right.
    pub fn scroll_right(&mut self, i: Offset) {
        self.force |= REDRAW_PAGE;
        self.force &= !REDRAW_CHAR_ONLY;
        self.start_col -= i;
    }

    /// Scroll the display `i` columns back to the left.
    pub fn scroll_left(&mut self, i: Offset) {
        if self.start_col != 0 {
            self.start_col += i;
            if self.start_col > 0 {
                self.start_col = 0;
            }
            self.force |= REDRAW_PAGE;
            self.force &= !REDRAW_CHAR_ONLY;
        }
    }

    /// Place the cursor on the line starting at `p`, at the sticky column
    /// `prev_col + over_col`.
    ///
    /// With `cursor_beyond_eol`, a short line stores the excess in
    /// `over_col`; otherwise the cursor snaps to end-of-line, and with
    /// `fake_half_tabs` inside the indent the column additionally snaps to
    /// a half-tab stop unless that would leave four spaces to the right.
    pub fn move_to_prev_col(&mut self, opts: &EditOptions, p: Offset) {
        let prev = self.prev_col;
        let over = self.over_col;

        let target = self.move_forward_col(opts, p, prev + self.over_col, 0);
        self.cursor_move(target - self.buffer.curs1());

        if opts.cursor_beyond_eol {
            let b = self.buffer.current_bol();
            let e = self.buffer.current_eol();
            let line_len = self.move_forward_col(opts, b, 0, e);
            if line_len < prev + self.over_col {
                self.over_col = prev + over - line_len;
                self.prev_col = line_len;
                self.curs_col = line_len;
            } else {
                self.curs_col = prev + over;
                self.prev_col = self.curs_col;
                self.over_col = 0;
            }
        } else {
            self.over_col = 0;
            if opts.fake_half_tabs && self.is_in_indent() {
                self.update_curs_col(opts);

                let fake_half_tabs = opts.half_tab();
                if fake_half_tabs != 0 && self.curs_col % fake_half_tabs != 0 {
                    let q = self.curs_col;
                    self.curs_col -= self.curs_col % fake_half_tabs;
                    let p = self.buffer.current_bol();
                    let b = self.move_forward_col(opts, p, self.curs_col, 0);
                    self.cursor_move(b - self.buffer.curs1());
                    if !self.left_of_four_spaces(opts) {
                        let b = self.move_forward_col(opts, p, q, 0);
                        self.cursor_move(b - self.buffer.curs1());
                    }
                }
            }
        }
    }

    /// Vertical cursor motion shared by up and down movement.
    pub(crate) fn move_updown(
        &mut self,
        opts: &EditOptions,
        lines: Offset,
        do_scroll: bool,
        up: bool,
    ) {
        let available = if up {
            self.buffer.curs_line()
        } else {
            self.buffer.lines() - self.buffer.curs_line()
        };
        let lines = lines.min(available);
        if lines <= 0 {
            return;
        }

        if lines > 1 {
            self.force |= REDRAW_PAGE;
        }
        if do_scroll {
            if up {
                self.scroll_upward(lines);
            } else {
                self.scroll_downward(lines);
            }
        }

        let mut p = self.buffer.current_bol();
        p = if up {
            self.buffer.backward_offset(p, lines)
        } else {
            self.buffer.forward_offset(p, lines, 0)
        };
        self.cursor_move(p - self.buffer.curs1());
        self.move_to_prev_col(opts, p);

        // land on a character boundary inside multi-byte text
        if self.utf8
            && self.buffer.curs1() > 0
            && self.buffer.curs1() + 1 < self.buffer.size()
            && self.buffer.current_byte() >= 128
        {
            self.right_char_move(opts);
            self.left_char_move(opts);
        }

        self.search_start = self.buffer.curs1();
        self.found_len = 0;
    }

    /// Move the cursor up `i` lines.
    pub fn move_up(&mut self, opts: &EditOptions, i: Offset, do_scroll: bool) {
        self.move_updown(opts, i, do_scroll, true);
    }

    /// Move the cursor down `i` lines.
    pub fn move_down(&mut self, opts: &EditOptions, i: Offset, do_scroll: bool) {
        self.move_updown(opts, i, do_scroll, false);
    }

    /// One character right; at end-of-line with `cursor_beyond_eol` the
    /// cursor enters the virtual column area instead.
    pub(crate) fn right_char_move(&mut self, opts: &EditOptions) {
        let mut char_length: Offset = 1;
        let c;
        if self.utf8 {
            let (ch, len) = self.buffer.get_utf(self.buffer.curs1());
            char_length = if len < 1 { 1 } else { len };
            c = ch;
        } else {
            c = self.buffer.current_byte() as char;
        }

        if opts.cursor_beyond_eol && c == '\n' {
            self.over_col += 1;
        } else {
            self.cursor_move(char_length);
        }
    }

    /// One character left, honoring virtual columns and the column-select
    /// line guard.
    pub(crate) fn left_char_move(&mut self, opts: &EditOptions) {
        let mut char_length: Offset = 1;

        if self.column_highlight
            && opts.cursor_beyond_eol
            && self.mark1 != self.mark2
            && self.over_col == 0
            && self.buffer.curs1() == self.buffer.current_bol()
        {
            return;
        }

        if self.utf8 {
            let (_, len) = self.buffer.get_prev_utf(self.buffer.curs1());
            char_length = if len < 1 { 1 } else { len };
        }

        if opts.cursor_beyond_eol && self.over_col > 0 {
            self.over_col -= 1;
        } else {
            self.cursor_move(-char_length);
        }
    }

    /// Move the cursor to `line`, keeping the screen over the cursor.
    pub fn move_to_line(&mut self, opts: &EditOptions, line: Offset) {
        if line < self.buffer.curs_line() {
            self.move_up(opts, self.buffer.curs_line() - line, false);
        } else {
            self.move_down(opts, line - self.buffer.curs_line(), false);
        }
    }

    /// Scroll so that `line` becomes the first visible line.
    pub fn move_display(&mut self, line: Offset) {
        if line < self.start_line {
            self.scroll_upward(self.start_line - line);
        } else {
            self.scroll_downward(line - self.start_line);
        }
    }

    /// Go to the beginning of the text.
    pub(crate) fn move_to_top(&mut self, opts: &EditOptions) {
        if self.buffer.curs_line() != 0 {
            self.cursor_move(-self.buffer.curs1());
            self.move_to_prev_col(opts, 0);
            self.force |= REDRAW_PAGE;
            self.search_start = 0;
            self.update_curs_row();
        }
    }

    /// Go to the end of the text.
    pub(crate) fn move_to_bottom(&mut self, opts: &EditOptions) {
        if self.buffer.curs_line() < self.buffer.lines() {
            let delta = self.buffer.lines() - self.curs_row;
            self.move_down(opts, delta, false);
            self.start_display = self.buffer.size();
            self.start_line = self.buffer.lines();
            self.scroll_upward(self.screen_rows - 1);
            self.force |= REDRAW_PAGE;
        }
    }

    /// Go to the beginning of the cursor's line.
    pub(crate) fn cursor_to_bol(&mut self, opts: &EditOptions) {
        let b = self.buffer.current_bol();
        self.cursor_move(b - self.buffer.curs1());
        self.search_start = self.buffer.curs1();
        self.prev_col = self.get_col(opts);
        self.over_col = 0;
    }

    /// Go to the end of the cursor's line.
    pub(crate) fn cursor_to_eol(&mut self, opts: &EditOptions) {
        let b = self.buffer.current_eol();
        self.cursor_move(b - self.buffer.curs1());
        self.search_start = self.buffer.curs1();
        self.prev_col = self.get_col(opts);
        self.over_col = 0;
    }

    /// Move to the first line currently on screen.
    pub(crate) fn begin_page(&mut self, opts: &EditOptions) {
        self.update_curs_row();
        let rows = self.curs_row;
        self.move_up(opts, rows, false);
    }

    /// Move to the last line currently on screen.
    pub(crate) fn end_page(&mut self, opts: &EditOptions) {
        self.update_curs_row();
        let rows = self.screen_rows - self.curs_row - 1;
        self.move_down(opts, rows, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use editkit_settings::EditOptions;

    #[test]
    fn test_get_col_plain() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"abcdef");
        editor.cursor_move(4);
        assert_eq!(editor.get_col(&opts), 4);
    }

    #[test]
    fn test_get_col_tabs() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"\tx");
        editor.cursor_move(1);
        assert_eq!(editor.get_col(&opts), 8);
        editor.cursor_move(1);
        assert_eq!(editor.get_col(&opts), 9);
    }

    #[test]
    fn test_get_col_utf8_counts_codepoints() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes("é€x".as_bytes());
        editor.cursor_move(5);
        assert_eq!(editor.get_col(&opts), 2);
    }

    #[test]
    fn test_move_forward_col_inverse() {
        let opts = EditOptions::default();
        let editor = Editor::from_bytes(b"abc\tdef");
        let offset = editor.move_forward_col(&opts, 0, 9, 0);
        let col = editor.move_forward_col(&opts, 0, 0, offset);
        assert_eq!(col, 9);
    }

    #[test]
    fn test_vertical_motion_keeps_sticky_column() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"abcdef\nxy\nlmnopq\n");
        editor.cursor_move(4);
        editor.prev_col = editor.get_col(&opts);
        // down to the short line: snaps to its end
        editor.move_down(&opts, 1, false);
        assert_eq!(editor.get_col(&opts), 2);
        // down again: sticky column is restored
        editor.move_down(&opts, 1, false);
        assert_eq!(editor.get_col(&opts), 4);
    }

    #[test]
    fn test_cursor_beyond_eol_accumulates_over_col() {
        let opts = EditOptions {
            cursor_beyond_eol: true,
            ..Default::default()
        };
        let mut editor = Editor::from_bytes(b"abcdef\nxy\n");
        editor.cursor_move(4);
        editor.prev_col = editor.get_col(&opts);
        editor.move_down(&opts, 1, false);
        assert_eq!(editor.over_col(), 2);
        assert_eq!(editor.curs_col(), 2);
    }

    #[test]
    fn test_move_updown_clamps() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"a\nb\nc\n");
        editor.move_down(&opts, 100, false);
        assert_eq!(editor.curs_line(), 3);
        editor.move_up(&opts, 100, false);
        assert_eq!(editor.curs_line(), 0);
    }

    #[test]
    fn test_move_to_line() {
        let opts = EditOptions::default();
        let text: String = (0..40).map(|i| format!("row {i}\n")).collect();
        let mut editor = Editor::from_bytes(text.as_bytes());
        editor.move_to_line(&opts, 25);
        assert_eq!(editor.curs_line(), 25);
        editor.move_to_line(&opts, 3);
        assert_eq!(editor.curs_line(), 3);
    }

    #[test]
    fn test_scroll_bounds() {
        let text: String = (0..100).map(|i| format!("row {i}\n")).collect();
        let mut editor = Editor::from_bytes(text.as_bytes());
        editor.scroll_upward(5);
        assert_eq!(editor.start_line(), 0);
        editor.scroll_downward(10);
        assert_eq!(editor.start_line(), 10);
        assert_eq!(
            editor.start_display(),
            editor.buffer().forward_offset(0, 10, 0)
        );
        editor.scroll_upward(4);
        assert_eq!(editor.start_line(), 6);
    }

    #[test]
    fn test_fake_half_tab_snap_in_indent() {
        let opts = EditOptions::default(); // fake_half_tabs on
        let mut editor = Editor::from_bytes(b"        x\nabcdefghij\n");
        // column 6 inside an all-space indent snaps down to the half-tab
        // stop at 4, which has four spaces to its right
        editor.cursor_move(16);
        editor.prev_col = 6;
        editor.move_up(&opts, 1, false);
        assert_eq!(editor.get_col(&opts), 4);
    }
}
