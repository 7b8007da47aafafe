//! Command executor.
//!
//! Maps a [`Command`] to a sequence of edit primitives, enforcing the
//! option policies: auto-indent, fake half-tabs, tab expansion, cursor
//! beyond end-of-line, overwrite, wrapping and selection persistence.
//!
//! The selection gesture is a small state machine: the first shifted
//! motion clears any finalized selection and starts one that follows the
//! cursor; further shifted motions extend it; any unshifted command
//! finalizes it.

use editkit_buffer::Offset;
use editkit_settings::EditOptions;

use crate::clipboard::COLUMN_BLOCK_MAGIC;
use crate::editor::{Editor, REDRAW_CHAR_ONLY, REDRAW_COMPLETELY, REDRAW_LINE, REDRAW_PAGE};
use crate::undo::{COLUMN_OFF, COLUMN_ON, STACK_BOTTOM};

/// Editing and motion commands accepted by the executor.
///
/// `InsertChar` carries the typed character; every other variant is a
/// keyboard command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    InsertChar(char),

    // plain motion
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Top,
    Bottom,
    PageUp,
    PageDown,
    WordLeft,
    WordRight,
    ParagraphUp,
    ParagraphDown,
    ScrollUp,
    ScrollDown,
    TopOnScreen,
    BottomOnScreen,
    Goto(Offset),

    // editing
    Enter,
    Return,
    Tab,
    BackSpace,
    Delete,
    DeleteToWordBegin,
    DeleteToWordEnd,
    DeleteLine,
    DeleteToHome,
    DeleteToEnd,
    InsertOverwrite,
    InsertDate,
    ParagraphFormat,
    MatchBracket,
    Undo,
    Redo,

    // marking
    Mark,
    MarkColumn,
    MarkAll,
    Unmark,
    MarkWord,
    MarkLine,

    // shifted motion
    MarkLeft,
    MarkRight,
    MarkUp,
    MarkDown,
    MarkToHome,
    MarkToEnd,
    MarkToFileBegin,
    MarkToFileEnd,
    MarkToWordBegin,
    MarkToWordEnd,
    MarkPageUp,
    MarkPageDown,
    MarkToPageBegin,
    MarkToPageEnd,
    MarkScrollUp,
    MarkScrollDown,
    MarkParagraphUp,
    MarkParagraphDown,

    // column (rectangular) shifted motion
    MarkColumnLeft,
    MarkColumnRight,
    MarkColumnUp,
    MarkColumnDown,
    MarkColumnPageUp,
    MarkColumnPageDown,
    MarkColumnScrollUp,
    MarkColumnScrollDown,
    MarkColumnParagraphUp,
    MarkColumnParagraphDown,

    // blocks and clipboard
    Copy,
    Remove,
    Move,
    BlockShiftLeft,
    BlockShiftRight,
    Store,
    Cut,
    Paste,

    // bookmarks
    Bookmark,
    BookmarkFlush,
    BookmarkNext,
    BookmarkPrev,
}

impl Command {
    /// Shifted-motion commands that grow a selection.
    fn is_mark_motion(self) -> bool {
        use Command::*;
        matches!(
            self,
            MarkLeft
                | MarkRight
                | MarkToWordBegin
                | MarkToWordEnd
                | MarkToHome
                | MarkToEnd
                | MarkUp
                | MarkDown
                | MarkPageUp
                | MarkPageDown
                | MarkToFileBegin
                | MarkToFileEnd
                | MarkToPageBegin
                | MarkToPageEnd
                | MarkScrollUp
                | MarkScrollDown
                | MarkParagraphUp
                | MarkParagraphDown
                | MarkColumnPageUp
                | MarkColumnPageDown
                | MarkColumnLeft
                | MarkColumnRight
                | MarkColumnUp
                | MarkColumnDown
                | MarkColumnScrollUp
                | MarkColumnScrollDown
                | MarkColumnParagraphUp
                | MarkColumnParagraphDown
        )
    }

    /// Plain motions that drop a non-persistent selection.
    fn is_plain_motion(self) -> bool {
        use Command::*;
        matches!(
            self,
            TopOnScreen
                | BottomOnScreen
                | Top
                | Bottom
                | PageUp
                | PageDown
                | Home
                | End
                | Up
                | Down
                | Left
                | Right
                | WordLeft
                | WordRight
        )
    }
}

impl Editor {
    /// Execute a command as though the user initiated it through a key
    /// press: one key-press boundary is recorded so one `Undo` reverses
    /// the whole command.
    pub fn execute_key(&mut self, opts: &EditOptions, cmd: Command) {
        if cmd != Command::Undo {
            self.push_key_press();
        }
        self.execute(opts, cmd);
        if self.column_highlight {
            self.force |= REDRAW_PAGE;
        }
    }

    /// Execute a command without recording a key-press boundary. Calling
    /// this many times leaves a single undo unit.
    pub fn execute(&mut self, opts: &EditOptions, cmd: Command) {
        use Command::*;

        self.force |= REDRAW_LINE;

        // the next key press unhighlights the found string and any column
        // block, so update the whole page
        if self.found_len != 0 || self.column_highlight {
            self.force |= REDRAW_PAGE;
        }

        if cmd.is_mark_motion() {
            self.column_highlight = false;
            if !self.highlight || (self.mark2 != -1 && self.mark1 != self.mark2) {
                self.mark_cmd(true);
                self.mark_cmd(false);
            }
            self.highlight = true;
        } else {
            if self.highlight {
                self.mark_cmd(false);
            }
            self.highlight = false;
        }

        if cmd == Undo {
            self.redo_reset = false;
            self.group_undo(opts);
            self.found_len = 0;
            self.prev_col = self.get_col(opts);
            self.search_start = self.buffer.curs1();
            return;
        }
        if cmd == Redo {
            self.redo_reset = false;
            self.do_redo(opts);
            self.found_len = 0;
            self.prev_col = self.get_col(opts);
            self.search_start = self.buffer.curs1();
            return;
        }

        // the next undo push discards the redo log
        self.redo_reset = true;

        if let InsertChar(ch) = cmd {
            self.insert_char_cmd(opts, ch);
            return;
        }

        if cmd.is_plain_motion() && !opts.persistent_selections && self.mark2 >= 0 {
            if self.column_highlight {
                self.push_undo_action(COLUMN_ON);
            }
            self.column_highlight = false;
            self.mark_cmd(true);
        }

        match cmd {
            TopOnScreen | BottomOnScreen | MarkToPageBegin | MarkToPageEnd | Up | Down
            | WordLeft | WordRight | MarkToWordBegin | MarkToWordEnd | MarkUp | MarkDown
            | MarkColumnUp | MarkColumnDown => {
                // with a cursor-following selection a whole line may need
                // highlighting, so no char-only hint
                if self.mark2 != -1 {
                    self.force |= REDRAW_CHAR_ONLY;
                }
            }
            Left | Right | MarkLeft | MarkRight => {
                self.force |= REDRAW_CHAR_ONLY;
            }
            _ => {}
        }

        match cmd {
            BackSpace => {
                if !opts.persistent_selections && self.mark1 != self.mark2 {
                    self.block_delete_cmd(opts);
                } else if opts.cursor_beyond_eol && self.over_col > 0 {
                    self.over_col -= 1;
                } else if opts.backspace_through_tabs && self.is_in_indent() {
                    while self.buffer.prev_byte() != b'\n' && self.buffer.curs1() > 0 {
                        self.backspace(true);
                    }
                } else if opts.fake_half_tabs
                    && self.is_in_indent()
                    && self.right_of_four_spaces(opts)
                {
                    for _ in 0..opts.half_tab() {
                        self.backspace(true);
                    }
                } else {
                    self.backspace(false);
                }
            }
            Delete => {
                if !opts.persistent_selections && self.mark1 != self.mark2 {
                    self.block_delete_cmd(opts);
                } else {
                    if opts.cursor_beyond_eol && self.over_col > 0 {
                        self.insert_over();
                    }
                    if opts.fake_half_tabs
                        && self.is_in_indent()
                        && self.left_of_four_spaces(opts)
                    {
                        for _ in 0..opts.half_tab() {
                            self.delete(true);
                        }
                    } else {
                        self.delete(false);
                    }
                }
            }
            DeleteToWordBegin => {
                self.over_col = 0;
                self.left_delete_word();
            }
            DeleteToWordEnd => {
                if opts.cursor_beyond_eol && self.over_col > 0 {
                    self.insert_over();
                }
                self.right_delete_word();
            }
            DeleteLine => self.delete_line(),
            DeleteToHome => self.delete_to_line_begin(),
            DeleteToEnd => self.delete_to_line_end(),

            Enter => {
                self.over_col = 0;
                if opts.auto_para_formatting {
                    self.double_newline();
                    if opts.return_does_auto_indent && !self.bracketed_paste {
                        self.auto_indent();
                    }
                    self.format_paragraph(opts, false);
                } else {
                    self.insert(b'\n');
                    if opts.return_does_auto_indent && !self.bracketed_paste {
                        self.auto_indent();
                    }
                }
            }
            Return => self.insert(b'\n'),

            MarkColumnPageUp | PageUp | MarkPageUp => {
                if cmd == MarkColumnPageUp {
                    self.column_highlight = true;
                }
                let rows = self.screen_rows - 1;
                self.move_up(opts, rows, true);
            }
            MarkColumnPageDown | PageDown | MarkPageDown => {
                if cmd == MarkColumnPageDown {
                    self.column_highlight = true;
                }
                let rows = self.screen_rows - 1;
                self.move_down(opts, rows, true);
            }
            MarkColumnLeft | Left | MarkLeft => {
                if cmd == MarkColumnLeft {
                    self.column_highlight = true;
                }
                if opts.fake_half_tabs && self.is_in_indent() && self.right_of_four_spaces(opts)
                {
                    if opts.cursor_beyond_eol && self.over_col > 0 {
                        self.over_col -= 1;
                    } else {
                        self.cursor_move(-opts.half_tab());
                    }
                    self.force &= !REDRAW_CHAR_ONLY;
                } else {
                    self.left_char_move(opts);
                }
            }
            MarkColumnRight | Right | MarkRight => {
                if cmd == MarkColumnRight {
                    self.column_highlight = true;
                }
                if opts.fake_half_tabs && self.is_in_indent() && self.left_of_four_spaces(opts) {
                    self.cursor_move(opts.half_tab());
                    self.force &= !REDRAW_CHAR_ONLY;
                } else {
                    self.right_char_move(opts);
                }
            }
            TopOnScreen | MarkToPageBegin => self.begin_page(opts),
            BottomOnScreen | MarkToPageEnd => self.end_page(opts),
            WordLeft | MarkToWordBegin => {
                self.over_col = 0;
                self.left_word_move_cmd();
            }
            WordRight | MarkToWordEnd => {
                self.over_col = 0;
                self.right_word_move_cmd();
            }
            MarkColumnUp | Up | MarkUp => {
                if cmd == MarkColumnUp {
                    self.column_highlight = true;
                }
                self.move_up(opts, 1, false);
            }
            MarkColumnDown | Down | MarkDown => {
                if cmd == MarkColumnDown {
                    self.column_highlight = true;
                }
                self.move_down(opts, 1, false);
            }
            MarkColumnParagraphUp | ParagraphUp | MarkParagraphUp => {
                if cmd == MarkColumnParagraphUp {
                    self.column_highlight = true;
                }
                self.move_up_paragraph(opts, false);
            }
            MarkColumnParagraphDown | ParagraphDown | MarkParagraphDown => {
                if cmd == MarkColumnParagraphDown {
                    self.column_highlight = true;
                }
                self.move_down_paragraph(opts, false);
            }
            MarkColumnScrollUp | ScrollUp | MarkScrollUp => {
                if cmd == MarkColumnScrollUp {
                    self.column_highlight = true;
                }
                self.move_up(opts, 1, true);
            }
            MarkColumnScrollDown | ScrollDown | MarkScrollDown => {
                if cmd == MarkColumnScrollDown {
                    self.column_highlight = true;
                }
                self.move_down(opts, 1, true);
            }
            Home | MarkToHome => self.cursor_to_bol(opts),
            End | MarkToEnd => self.cursor_to_eol(opts),

            Tab => {
                // a marked block shifts instead
                if self.mark1 != self.mark2 && !opts.persistent_selections {
                    if self.mark2 < 0 {
                        self.mark_cmd(false);
                    }
                    self.move_block_to_right(opts);
                } else {
                    if opts.cursor_beyond_eol {
                        self.insert_over();
                    }
                    self.tab_cmd(opts);
                    if opts.auto_para_formatting {
                        self.format_paragraph(opts, false);
                        self.force |= REDRAW_PAGE;
                    } else {
                        self.check_and_wrap_line(opts);
                    }
                }
            }

            InsertOverwrite => self.overwrite = !self.overwrite,

            Mark => {
                if self.mark2 >= 0 {
                    if self.column_highlight {
                        self.push_undo_action(COLUMN_ON);
                    }
                    self.column_highlight = false;
                }
                self.mark_cmd(false);
            }
            MarkColumn => {
                if !self.column_highlight {
                    self.push_undo_action(COLUMN_OFF);
                }
                self.column_highlight = true;
                self.mark_cmd(false);
            }
            MarkAll => {
                self.set_markers(0, self.buffer.size(), 0, 0);
                self.force |= REDRAW_PAGE;
            }
            Unmark => {
                if self.column_highlight {
                    self.push_undo_action(COLUMN_ON);
                }
                self.column_highlight = false;
                self.mark_cmd(true);
            }
            MarkWord => {
                if self.column_highlight {
                    self.push_undo_action(COLUMN_ON);
                }
                self.column_highlight = false;
                self.mark_current_word_cmd();
            }
            MarkLine => {
                if self.column_highlight {
                    self.push_undo_action(COLUMN_ON);
                }
                self.column_highlight = false;
                self.mark_current_line_cmd();
            }

            Bookmark => self.toggle_bookmark_cmd(),
            BookmarkFlush => self.flush_bookmarks_cmd(),
            BookmarkNext => self.bookmark_next_cmd(opts),
            BookmarkPrev => self.bookmark_prev_cmd(opts),

            Top | MarkToFileBegin => self.move_to_top(opts),
            Bottom | MarkToFileEnd => self.move_to_bottom(opts),

            Copy => {
                if opts.cursor_beyond_eol && self.over_col > 0 {
                    self.insert_over();
                }
                self.block_copy_cmd(opts);
            }
            Remove => {
                self.block_delete_cmd(opts);
            }
            Move => self.block_move_cmd(opts),
            BlockShiftLeft => {
                if self.mark1 != self.mark2 {
                    self.move_block_to_left(opts);
                }
            }
            BlockShiftRight => {
                if self.mark1 != self.mark2 {
                    self.move_block_to_right(opts);
                }
            }
            Store => self.copy_to_clipboard(opts),
            Cut => self.cut_to_clipboard(opts),
            Paste => {
                if !opts.persistent_selections && self.mark1 != self.mark2 {
                    self.block_delete_cmd(opts);
                }
                if opts.cursor_beyond_eol && self.over_col > 0 {
                    self.insert_over();
                }
                self.paste_from_clipboard(opts);
                if !opts.persistent_selections && self.mark2 >= 0 {
                    if self.column_highlight {
                        self.push_undo_action(COLUMN_ON);
                    }
                    self.column_highlight = false;
                    self.mark_cmd(true);
                }
            }

            Goto(line) => {
                self.move_display(line - self.screen_rows / 2);
                self.move_to_line(opts, line);
                self.force |= REDRAW_PAGE;
            }
            ParagraphFormat => {
                self.format_paragraph(opts, true);
                self.force |= REDRAW_PAGE;
            }
            MatchBracket => self.goto_matching_bracket(),
            InsertDate => {
                let now = chrono::Local::now().format("%c").to_string();
                self.insert_string(opts, &now);
                self.force |= REDRAW_PAGE;
            }

            InsertChar(_) | Undo | Redo => unreachable!("handled above"),
        }

        // commands that keep the sticky column vs. everything else
        match cmd {
            Up | MarkUp | MarkColumnUp | Down | MarkDown | MarkColumnDown | PageUp
            | MarkPageUp | MarkColumnPageUp | PageDown | MarkPageDown | MarkColumnPageDown
            | Top | MarkToFileBegin | Bottom | MarkToFileEnd | ParagraphUp | MarkParagraphUp
            | MarkColumnParagraphUp | ParagraphDown | MarkParagraphDown
            | MarkColumnParagraphDown | ScrollUp | MarkScrollUp | MarkColumnScrollUp
            | ScrollDown | MarkScrollDown | MarkColumnScrollDown => {
                self.search_start = self.buffer.curs1();
                self.found_len = 0;
            }
            _ => {
                self.found_len = 0;
                self.prev_col = self.get_col(opts);
                self.search_start = self.buffer.curs1();
            }
        }
        self.find_bracket();

        if opts.auto_para_formatting {
            match cmd {
                BackSpace | Delete | DeleteToWordBegin | DeleteToWordEnd | DeleteToHome
                | DeleteToEnd => {
                    self.format_paragraph(opts, false);
                    self.force |= REDRAW_PAGE;
                }
                _ => {}
            }
        }
    }

    /// Feed a string through the executor one character at a time.
    pub fn insert_string(&mut self, opts: &EditOptions, s: &str) {
        for ch in s.chars() {
            self.execute(opts, Command::InsertChar(ch));
        }
        self.force |= REDRAW_COMPLETELY;
    }

    fn insert_char_cmd(&mut self, opts: &EditOptions, ch: char) {
        if !opts.persistent_selections && self.mark1 != self.mark2 {
            self.block_delete_cmd(opts);
        }

        if self.overwrite && self.buffer.current_byte() != b'\n' {
            self.delete(false);
        }

        if opts.cursor_beyond_eol && self.over_col > 0 {
            self.insert_over();
        }

        if (ch as u32) > 127 {
            let mut raw = [0u8; 4];
            for &b in ch.encode_utf8(&mut raw).as_bytes() {
                self.insert(b);
            }
        } else {
            self.insert(ch as u8);
        }

        if opts.auto_para_formatting {
            self.format_paragraph(opts, false);
            self.force |= REDRAW_PAGE;
        } else {
            self.check_and_wrap_line(opts);
        }
        self.found_len = 0;
        self.prev_col = self.get_col(opts);
        self.search_start = self.buffer.curs1();
        self.find_bracket();
    }

    // ------------------------------------------------------------------
    // tab and indent policies
    // ------------------------------------------------------------------

    pub(crate) fn is_aligned_on_a_tab(&mut self, opts: &EditOptions) -> bool {
        self.update_curs_col(opts);
        let rem = self.curs_col % opts.tab_spacing;
        rem == 0 || rem == opts.half_tab()
    }

    /// All of the `half_tab` bytes before the cursor are spaces and the
    /// cursor sits on a tab stop.
    pub(crate) fn right_of_four_spaces(&mut self, opts: &EditOptions) -> bool {
        let mut acc = 0u8;
        for i in 1..=opts.half_tab() {
            acc |= self.buffer.byte_at(self.buffer.curs1() - i);
        }
        acc == b' ' && self.is_aligned_on_a_tab(opts)
    }

    /// All of the `half_tab` bytes after the cursor are spaces and the
    /// cursor sits on a tab stop.
    pub(crate) fn left_of_four_spaces(&mut self, opts: &EditOptions) -> bool {
        let mut acc = 0u8;
        for i in 0..opts.half_tab() {
            acc |= self.buffer.byte_at(self.buffer.curs1() + i);
        }
        acc == b' ' && self.is_aligned_on_a_tab(opts)
    }

    fn insert_spaces_tab(&mut self, opts: &EditOptions, half: bool) {
        self.update_curs_col(opts);
        let mut width = opts.tab_spacing;
        if half {
            width /= 2;
        }
        if width != 0 {
            let mut n = ((self.curs_col / width) + 1) * width - self.curs_col;
            while n > 0 {
                self.insert(b' ');
                n -= 1;
            }
        }
    }

    fn tab_cmd(&mut self, opts: &EditOptions) {
        if opts.fake_half_tabs && self.is_in_indent() {
            // insert a half tab (usually four spaces) unless there is a
            // half tab already behind, then delete it and insert a full tab
            if opts.fill_tabs_with_spaces || !self.right_of_four_spaces(opts) {
                self.insert_spaces_tab(opts, true);
            } else {
                for _ in 0..opts.half_tab() {
                    self.backspace(true);
                }
                self.insert(b'\t');
            }
        } else if opts.fill_tabs_with_spaces {
            self.insert_spaces_tab(opts, false);
        } else {
            self.insert(b'\t');
        }
    }

    fn auto_indent(&mut self) {
        let mut p = self.buffer.curs1();
        // use the previous line as a template
        p = self.buffer.backward_offset(p, 1);
        // copy the leading whitespace of the line
        loop {
            let c = self.buffer.byte_at(p);
            p += 1;
            if c != b' ' && c != b'\t' {
                break;
            }
            self.insert(c);
        }
    }

    fn double_newline(&mut self) {
        self.insert(b'\n');
        if self.buffer.current_byte() == b'\n'
            || self.buffer.byte_at(self.buffer.curs1() - 2) == b'\n'
        {
            return;
        }
        self.force |= REDRAW_PAGE;
        self.insert(b'\n');
    }

    fn check_and_wrap_line(&mut self, opts: &EditOptions) {
        if !opts.typewriter_wrap {
            return;
        }
        self.update_curs_col(opts);
        if self.curs_col < opts.word_wrap_line_length {
            return;
        }
        let mut curs = self.buffer.curs1();
        loop {
            curs -= 1;
            let c = self.buffer.byte_at(curs);
            if c == b'\n' || curs <= 0 {
                self.insert(b'\n');
                return;
            }
            if c == b' ' || c == b'\t' {
                let current = self.buffer.curs1();
                self.cursor_move(curs - self.buffer.curs1() + 1);
                self.insert(b'\n');
                self.cursor_move(current - self.buffer.curs1() + 1);
                return;
            }
        }
    }

    /// Re-break the paragraph around the cursor at the wrap column,
    /// keeping the first line's indent for the whole paragraph.
    pub fn format_paragraph(&mut self, opts: &EditOptions, force: bool) {
        if self.line_is_blank(self.buffer.curs_line()) {
            return;
        }

        let mut first = self.buffer.curs_line();
        while first > 0 && !self.line_is_blank(first - 1) {
            first -= 1;
        }
        let mut last = self.buffer.curs_line();
        while last < self.buffer.lines() && !self.line_is_blank(last + 1) {
            last += 1;
        }

        let p_start = self.find_line(first);
        let last_line_start = self.find_line(last);
        let p_end = self.buffer.eol(last_line_start);
        let old = self.buffer.slice(p_start, p_end);

        // unless forced, leave a paragraph alone while every line fits
        if !force {
            let mut fits = true;
            for line in old.split(|&b| b == b'\n') {
                let mut col: Offset = 0;
                for &b in line {
                    if b == b'\t' {
                        col += opts.tab_spacing - col % opts.tab_spacing;
                    } else {
                        col += 1;
                    }
                }
                if col > opts.word_wrap_line_length {
                    fits = false;
                    break;
                }
            }
            if fits {
                return;
            }
        }

        let indent_len = old
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count();
        let indent = &old[..indent_len];
        let mut indent_width: Offset = 0;
        for &b in indent {
            if b == b'\t' {
                indent_width += opts.tab_spacing - indent_width % opts.tab_spacing;
            } else {
                indent_width += 1;
            }
        }

        let words: Vec<&[u8]> = old
            .split(|b| b.is_ascii_whitespace())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return;
        }

        let mut new = Vec::with_capacity(old.len() + 8);
        new.extend_from_slice(indent);
        let mut col = indent_width;
        for (n, word) in words.iter().enumerate() {
            let width = word.len() as Offset;
            if n > 0 {
                if col + 1 + width > opts.word_wrap_line_length {
                    new.push(b'\n');
                    new.extend_from_slice(indent);
                    col = indent_width;
                } else {
                    new.push(b' ');
                    col += 1;
                }
            }
            new.extend_from_slice(word);
            col += width;
        }

        if new == old {
            return;
        }

        let curs = self.buffer.curs1();
        self.cursor_move(p_start - curs);
        for _ in 0..(p_end - p_start) {
            self.delete(true);
        }
        for &b in &new {
            self.insert(b);
        }
        let target = curs.min(p_start + new.len() as Offset);
        self.cursor_move(target - self.buffer.curs1());
        self.force |= REDRAW_PAGE;
    }

    // ------------------------------------------------------------------
    // block operations
    // ------------------------------------------------------------------

    /// The selected bytes; a column selection yields the rectangle's rows
    /// separated by newlines.
    pub(crate) fn get_block(&self, opts: &EditOptions, start: Offset, end: Offset) -> Vec<u8> {
        if !self.column_highlight {
            return self.buffer.slice(start, end);
        }
        let mut out = Vec::new();
        let mut p = start;
        while p < end {
            let x = self.move_forward_col(opts, self.buffer.bol(p), 0, p);
            let c = self.buffer.byte_at(p);
            if (x >= self.column1 && x < self.column2)
                || (x >= self.column2 && x < self.column1)
                || c == b'\n'
            {
                out.push(c);
            }
            p += 1;
        }
        out
    }

    /// Delete the selection (stream or rectangle). Returns whether there
    /// was one.
    pub fn block_delete_cmd(&mut self, opts: &EditOptions) -> bool {
        let Some((start, end)) = self.eval_marks(opts) else {
            return false;
        };

        if self.column_highlight {
            let col1 = self.column1.min(self.column2);
            let col2 = self.column1.max(self.column2);
            let start_bol = self.buffer.bol(start);
            let mut cur_bol = self.buffer.bol(end - 1);
            loop {
                let r1 = self.move_forward_col(opts, cur_bol, col1, 0);
                let r2 = self.move_forward_col(opts, cur_bol, col2, 0);
                self.cursor_move(r1 - self.buffer.curs1());
                for _ in 0..(r2 - r1).max(0) {
                    self.delete(true);
                }
                if cur_bol == 0 {
                    break;
                }
                cur_bol = self.buffer.bol(cur_bol - 1);
                if cur_bol < start_bol {
                    break;
                }
            }
        } else {
            self.cursor_move(start - self.buffer.curs1());
            for _ in 0..(end - start) {
                self.delete(true);
            }
        }

        self.set_markers(0, 0, 0, 0);
        self.force |= REDRAW_PAGE;
        true
    }

    /// Duplicate the selection at the cursor.
    pub(crate) fn block_copy_cmd(&mut self, opts: &EditOptions) {
        let Some((start, end)) = self.eval_marks(opts) else {
            return;
        };
        let block = self.get_block(opts, start, end);

        if self.column_highlight {
            let (m1, m2, c1, c2) = self.insert_column(opts, &block);
            self.set_markers(m1, m2, c1, c2);
        } else {
            for &b in block.iter().rev() {
                self.insert_ahead(b);
            }
        }
        self.force |= REDRAW_PAGE;
    }

    /// Move the selection to the cursor.
    pub(crate) fn block_move_cmd(&mut self, opts: &EditOptions) {
        let Some((start, end)) = self.eval_marks(opts) else {
            return;
        };
        let current = self.buffer.curs1();
        if !self.column_highlight && current > start && current < end {
            // the destination lies inside the block
            return;
        }

        let block = self.get_block(opts, start, end);
        let count = block.len() as Offset;

        if self.column_highlight {
            let col = self.get_col(opts);
            self.block_delete_cmd(opts);
            let target = self.move_forward_col(opts, self.buffer.current_bol(), col, 0);
            self.cursor_move(target - self.buffer.curs1());
            let (m1, m2, c1, c2) = self.insert_column(opts, &block);
            self.set_markers(m1, m2, c1, c2);
        } else {
            self.cursor_move(start - self.buffer.curs1());
            for _ in 0..(end - start) {
                self.delete(true);
            }
            let target = if current >= end {
                current - (end - start)
            } else {
                current
            };
            self.cursor_move(target - self.buffer.curs1());
            for &b in block.iter().rev() {
                self.insert_ahead(b);
            }
            self.set_markers(self.buffer.curs1(), self.buffer.curs1() + count, 0, 0);
        }
        self.force |= REDRAW_PAGE;
    }

    /// Insert `data` as a rectangle at the cursor's column, row by row.
    /// Returns `(start, end, col1, col2)` of the inserted block.
    pub(crate) fn insert_column(
        &mut self,
        opts: &EditOptions,
        data: &[u8],
    ) -> (Offset, Offset, Offset, Offset) {
        let cursor = self.buffer.curs1();
        let col = self.get_col(opts);
        let width = data
            .iter()
            .position(|&b| b == b'\n')
            .unwrap_or(data.len()) as Offset;

        for &b in data {
            if b != b'\n' {
                self.insert(b);
                continue;
            }
            // pad the row out to the rectangle width
            if self.buffer.current_byte() != b'\n' {
                let mut l = width - (self.get_col(opts) - col);
                while l > 0 {
                    self.insert(b' ');
                    l -= 1;
                }
            }
            // move to the next line, appending one at end of buffer
            let mut p = self.buffer.curs1();
            loop {
                if p == self.buffer.size() {
                    self.cursor_move(self.buffer.size() - self.buffer.curs1());
                    self.insert_ahead(b'\n');
                    p += 1;
                    break;
                }
                if self.buffer.byte_at(p) == b'\n' {
                    p += 1;
                    break;
                }
                p += 1;
            }
            let target = self.move_forward_col(opts, p, col, 0);
            self.cursor_move(target - self.buffer.curs1());
            // fill in up to the insertion column
            let mut l = col - self.get_col(opts);
            while l >= 1 {
                self.insert(b' ');
                l -= 1;
            }
        }

        let end = self.buffer.curs1();
        self.cursor_move(cursor - self.buffer.curs1());
        (cursor, end, col, col + width)
    }

    /// Copy the selection to the clipboard, with the column magic prefix
    /// for rectangular blocks.
    pub(crate) fn copy_to_clipboard(&mut self, opts: &EditOptions) {
        let Some((start, end)) = self.eval_marks(opts) else {
            return;
        };
        let mut payload = Vec::new();
        if self.column_highlight {
            payload.extend_from_slice(&COLUMN_BLOCK_MAGIC);
        }
        payload.extend(self.get_block(opts, start, end));
        if !self.clipboard.store(&payload) {
            tracing::warn!("clipboard rejected {} bytes", payload.len());
            return;
        }
        if opts.drop_selection_on_copy {
            self.mark_cmd(true);
        }
    }

    /// Copy the selection to the clipboard, then delete it.
    pub(crate) fn cut_to_clipboard(&mut self, opts: &EditOptions) {
        let Some((start, end)) = self.eval_marks(opts) else {
            return;
        };
        let mut payload = Vec::new();
        if self.column_highlight {
            payload.extend_from_slice(&COLUMN_BLOCK_MAGIC);
        }
        payload.extend(self.get_block(opts, start, end));
        if !self.clipboard.store(&payload) {
            tracing::warn!("clipboard rejected {} bytes", payload.len());
            return;
        }
        self.block_delete_cmd(opts);
        self.mark_cmd(true);
    }

    /// Insert the clipboard payload at the cursor, honoring the column
    /// magic and the cursor placement option.
    pub(crate) fn paste_from_clipboard(&mut self, opts: &EditOptions) {
        let Some(data) = self.clipboard.retrieve() else {
            return;
        };

        if data.starts_with(&COLUMN_BLOCK_MAGIC) {
            let (m1, m2, c1, c2) = self.insert_column(opts, &data[COLUMN_BLOCK_MAGIC.len()..]);
            self.set_markers(m1, m2, c1, c2);
            // highlight inserted text when blocks are not persistent
            if !opts.persistent_selections && self.modified {
                if !self.column_highlight {
                    self.push_undo_action(COLUMN_OFF);
                }
                self.column_highlight = true;
            }
        } else {
            let current = self.buffer.curs1();
            for &b in &data {
                self.insert(b);
            }
            if !opts.persistent_selections && self.modified {
                self.set_markers(self.buffer.curs1(), current, 0, 0);
                if self.column_highlight {
                    self.push_undo_action(COLUMN_ON);
                }
                self.column_highlight = false;
            }
            if !opts.cursor_after_inserted_block {
                let ins_len = self.buffer.curs1() - current;
                self.cursor_move(-ins_len);
            }
        }
        self.force |= REDRAW_PAGE;
    }

    /// Indent every line of the selection by one tab stop.
    pub(crate) fn move_block_to_right(&mut self, opts: &EditOptions) {
        let Some((start_mark, end_mark)) = self.eval_marks(opts) else {
            return;
        };

        let start_bol = self.buffer.bol(start_mark);
        let mut cur_bol = self.buffer.bol(end_mark - 1);

        loop {
            self.cursor_move(cur_bol - self.buffer.curs1());
            if !self.line_is_blank(self.buffer.curs_line()) {
                if opts.fill_tabs_with_spaces {
                    self.insert_spaces_tab(opts, opts.fake_half_tabs);
                } else {
                    self.insert(b'\t');
                }
                let b = self.buffer.bol(cur_bol);
                self.cursor_move(b - self.buffer.curs1());
            }

            if cur_bol == 0 {
                break;
            }
            cur_bol = self.buffer.bol(cur_bol - 1);
            if cur_bol < start_bol {
                break;
            }
        }

        self.force |= REDRAW_PAGE;
    }

    /// Outdent every line of the selection by one tab (or its spaces).
    pub(crate) fn move_block_to_left(&mut self, opts: &EditOptions) {
        let Some((start_mark, end_mark)) = self.eval_marks(opts) else {
            return;
        };

        let start_bol = self.buffer.bol(start_mark);
        let mut cur_bol = self.buffer.bol(end_mark - 1);

        loop {
            self.cursor_move(cur_bol - self.buffer.curs1());

            let del_tab_width = if opts.fake_half_tabs {
                opts.half_tab()
            } else {
                opts.tab_spacing
            };

            let mut next_char = self.buffer.current_byte();
            if next_char == b'\t' {
                self.delete(true);
            } else if next_char == b' ' {
                for _ in 0..del_tab_width {
                    if next_char == b' ' {
                        self.delete(true);
                    }
                    next_char = self.buffer.current_byte();
                }
            }

            if cur_bol == 0 {
                break;
            }
            cur_bol = self.buffer.bol(cur_bol - 1);
            if cur_bol < start_bol {
                break;
            }
        }

        self.force |= REDRAW_PAGE;
    }

    // ------------------------------------------------------------------
    // bookmark commands
    // ------------------------------------------------------------------

    fn toggle_bookmark_cmd(&mut self) {
        use crate::bookmarks::{BOOK_MARK_COLOR, BOOK_MARK_FOUND_COLOR};
        let line = self.buffer.curs_line();
        self.bookmarks.clear(line, BOOK_MARK_FOUND_COLOR);
        if self.bookmarks.query_color(line, BOOK_MARK_COLOR) {
            self.bookmarks.clear(line, BOOK_MARK_COLOR);
        } else {
            self.bookmarks.insert(line, BOOK_MARK_COLOR);
        }
    }

    fn flush_bookmarks_cmd(&mut self) {
        use crate::bookmarks::{BOOK_MARK_COLOR, BOOK_MARK_FOUND_COLOR};
        self.bookmarks.flush(BOOK_MARK_COLOR);
        self.bookmarks.flush(BOOK_MARK_FOUND_COLOR);
        self.force |= REDRAW_PAGE;
    }

    fn bookmark_next_cmd(&mut self, opts: &EditOptions) {
        if let Some(bm) = self.bookmarks.next_after(self.buffer.curs_line()) {
            self.jump_to_bookmark(opts, bm.line);
        }
    }

    fn bookmark_prev_cmd(&mut self, opts: &EditOptions) {
        if let Some(bm) = self.bookmarks.prev_before(self.buffer.curs_line()) {
            self.jump_to_bookmark(opts, bm.line);
        }
    }

    fn jump_to_bookmark(&mut self, opts: &EditOptions, line: Offset) {
        if line >= self.start_line + self.screen_rows || line < self.start_line {
            self.move_display(line - self.screen_rows / 2);
        }
        self.move_to_line(opts, line);
    }

    /// Group-undo state of the log: true when there is anything to undo.
    pub fn can_undo(&self) -> bool {
        self.peek_undo_action() != STACK_BOTTOM
    }
}
