//! Markers and selection.
//!
//! Two byte-valued marks define the selection. `mark1 == mark2` means no
//! selection; `mark2 == -1` means the selection end follows the cursor,
//! with `end_mark_curs` snapshotting the cursor for marker restores.
//! `column1`/`column2` carry the visual columns of a rectangular selection
//! while `column_highlight` is set.

use editkit_buffer::Offset;
use editkit_settings::EditOptions;

use crate::editor::{Editor, REDRAW_AFTER_CURSOR, REDRAW_LINE_ABOVE, REDRAW_PAGE};
use crate::undo::{MARK_1, MARK_2, MARK_CURS};
use crate::wordmove::char_class;

impl Editor {
    /// Save the current marker state onto the undo log.
    pub(crate) fn push_markers(&mut self) {
        let mark1 = self.mark1;
        let mark2 = self.mark2;
        let end_mark_curs = self.end_mark_curs;
        self.push_undo_action(MARK_1 + mark1);
        self.push_undo_action(MARK_2 + mark2);
        self.push_undo_action(MARK_CURS + end_mark_curs);
    }

    /// Unconditional marker assignment.
    pub fn set_markers(&mut self, m1: Offset, m2: Offset, c1: Offset, c2: Offset) {
        self.mark1 = m1;
        self.mark2 = m2;
        self.column1 = c1;
        self.column2 = c2;
    }

    /// Current markers `(mark1, mark2)`.
    pub fn markers(&self) -> (Offset, Offset) {
        (self.mark1, self.mark2)
    }

    /// Whether a column (rectangular) selection is active.
    pub fn is_column_highlight(&self) -> bool {
        self.column_highlight
    }

    /// Selection toggle: unmark, start a cursor-following selection, or
    /// finalize the pending one.
    pub fn mark_cmd(&mut self, unmark: bool) {
        self.push_markers();
        if unmark {
            self.set_markers(0, 0, 0, 0);
            self.force |= REDRAW_PAGE;
        } else if self.mark2 >= 0 {
            // switch to a selection that follows the cursor
            self.end_mark_curs = -1;
            let col = self.curs_col + self.over_col;
            let curs = self.buffer.curs1();
            self.set_markers(curs, -1, col, col);
            self.force |= REDRAW_PAGE;
        } else {
            // finalize
            self.end_mark_curs = self.buffer.curs1();
            let col = self.curs_col + self.over_col;
            let curs = self.buffer.curs1();
            let (m1, c1) = (self.mark1, self.column1);
            self.set_markers(m1, curs, c1, col);
        }
    }

    /// Resolve the selection into `[start, end)` in buffer order.
    ///
    /// Returns `None` when nothing is selected. For a column selection
    /// whose column span runs against its row span, the byte range is
    /// widened to the rectangular hull, clamped to the first line's EOL and
    /// the last line's EOL.
    pub fn eval_marks(&mut self, opts: &EditOptions) -> Option<(Offset, Offset)> {
        if self.mark1 == self.mark2 {
            self.column2 = 0;
            self.column1 = 0;
            return None;
        }

        let end_mark_curs = if self.end_mark_curs < 0 {
            self.buffer.curs1()
        } else {
            self.end_mark_curs
        };

        let (mut start, mut end);
        if self.mark2 >= 0 {
            start = self.mark1.min(self.mark2);
            end = self.mark1.max(self.mark2);
        } else {
            start = self.mark1.min(end_mark_curs);
            end = self.mark1.max(end_mark_curs);
            self.column2 = self.curs_col + self.over_col;
        }

        if self.column_highlight
            && ((self.mark1 > end_mark_curs && self.column1 < self.column2)
                || (self.mark1 < end_mark_curs && self.column1 > self.column2))
        {
            let start_bol = self.buffer.bol(start);
            let start_eol = self.buffer.eol(start_bol - 1) + 1;
            let end_bol = self.buffer.bol(end);
            let end_eol = self.buffer.eol(end);
            let col1 = self.column1.min(self.column2);
            let col2 = self.column1.max(self.column2);

            let diff1 = self.move_forward_col(opts, start_bol, col2, 0)
                - self.move_forward_col(opts, start_bol, col1, 0);
            let diff2 = self.move_forward_col(opts, end_bol, col2, 0)
                - self.move_forward_col(opts, end_bol, col1, 0);

            start -= diff1;
            end += diff2;
            start = start.max(start_eol);
            end = end.min(end_eol);
        }

        Some((start, end))
    }

    /// Select the word under the cursor.
    pub(crate) fn mark_current_word_cmd(&mut self) {
        let mut pos = self.buffer.curs1();
        while pos != 0 {
            let c1 = self.buffer.byte_at(pos);
            let c2 = self.buffer.byte_at(pos - 1);
            if !c1.is_ascii_whitespace() && c2.is_ascii_whitespace() {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
            pos -= 1;
        }
        self.mark1 = pos;

        while pos < self.buffer.size() {
            let c1 = self.buffer.byte_at(pos);
            let c2 = self.buffer.byte_at(pos + 1);
            if !c1.is_ascii_whitespace() && c2.is_ascii_whitespace() {
                break;
            }
            if char_class(c1) & char_class(c2) == 0 {
                break;
            }
            pos += 1;
        }
        self.mark2 = (pos + 1).min(self.buffer.size());

        self.force |= REDRAW_LINE_ABOVE | REDRAW_AFTER_CURSOR;
    }

    /// Select the cursor's line.
    pub(crate) fn mark_current_line_cmd(&mut self) {
        self.mark1 = self.buffer.current_bol();
        self.mark2 = self.buffer.current_eol();
        self.force |= REDRAW_LINE_ABOVE | REDRAW_AFTER_CURSOR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_selection() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"hello");
        assert!(editor.eval_marks(&opts).is_none());
    }

    #[test]
    fn test_mark_toggle_cycle() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"hello world");

        // start a cursor-following selection
        editor.cursor_move(2);
        editor.update_curs_col(&opts);
        editor.mark_cmd(false);
        assert_eq!(editor.markers(), (2, -1));
        assert_eq!(editor.end_mark_curs, -1);

        // follows the cursor
        editor.cursor_move(4);
        assert_eq!(editor.eval_marks(&opts), Some((2, 6)));

        // finalize
        editor.update_curs_col(&opts);
        editor.mark_cmd(false);
        assert_eq!(editor.markers(), (2, 6));
        assert_eq!(editor.end_mark_curs, 6);

        // unmark
        editor.mark_cmd(true);
        assert_eq!(editor.markers(), (0, 0));
        assert!(editor.eval_marks(&opts).is_none());
    }

    #[test]
    fn test_eval_marks_buffer_order() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"hello world");
        editor.set_markers(8, 3, 0, 0);
        assert_eq!(editor.eval_marks(&opts), Some((3, 8)));
    }

    #[test]
    fn test_markers_clamped_after_edits() {
        let opts = EditOptions::default();
        let mut editor = Editor::from_bytes(b"hello");
        editor.set_markers(2, 5, 0, 0);
        // delete everything after the cursor; markers follow the shrinking
        // text and stay inside [0, size]
        for _ in 0..5 {
            editor.delete(true);
        }
        let (m1, m2) = editor.markers();
        let size = editor.buffer().size();
        assert!(m1 >= 0 && m1 <= size);
        assert!(m2 >= 0 && m2 <= size);
        let _ = editor.eval_marks(&opts);
    }

    #[test]
    fn test_column_selection_reversed_hull() {
        let opts = EditOptions::default();
        // three equal lines; select from (line 0, col 4) to (line 2, col 1):
        // rows run down while columns run up
        let mut editor = Editor::from_bytes(b"abcdef\nabcdef\nabcdef\n");
        editor.column_highlight = true;
        editor.set_markers(4, 15, 4, 1);
        editor.end_mark_curs = 15;
        let (start, end) = editor.eval_marks(&opts).unwrap();
        // hull covers columns [1, 4] on both terminal rows
        assert_eq!(start, 1);
        assert_eq!(end, 18);
    }

    #[test]
    fn test_mark_word() {
        let mut editor = Editor::from_bytes(b"foo bar baz");
        editor.cursor_move(5);
        editor.mark_current_word_cmd();
        let (m1, m2) = editor.markers();
        assert_eq!(&editor.text()[m1 as usize..m2 as usize], b"bar");
    }

    #[test]
    fn test_mark_line() {
        let mut editor = Editor::from_bytes(b"one\ntwo\nthree\n");
        editor.cursor_move(5);
        editor.mark_current_line_cmd();
        assert_eq!(editor.markers(), (4, 7));
    }
}
