//! Editor state and the edit primitives.
//!
//! Exactly five mutators touch the buffer: [`Editor::insert`],
//! [`Editor::insert_ahead`], [`Editor::delete`], [`Editor::backspace`] and
//! [`Editor::cursor_move`]. Each records its inverse into the undo log,
//! keeps the display anchor and line counts in step across newline
//! crossings, shifts markers and bookmarks, and invalidates the line cache
//! through [`Editor::modification`].

use std::path::{Path, PathBuf};

use editkit_buffer::{LineBreaks, Offset, TextBuffer};

use crate::bookmarks::BookmarkList;
use crate::clipboard::{Clipboard, MemClipboard};
use crate::line_cache::LineCache;
use crate::undo::{
    UndoStack, BACKSPACE, BACKSPACE_BR, CURS_LEFT, CURS_RIGHT, DEFAULT_MAX_UNDO, DELCHAR,
    DELCHAR_BR,
};

/// Redraw the cursor's line.
pub const REDRAW_LINE: u32 = 1 << 0;
/// Redraw everything after the cursor.
pub const REDRAW_AFTER_CURSOR: u32 = 1 << 1;
/// Redraw the line above the cursor.
pub const REDRAW_LINE_ABOVE: u32 = 1 << 2;
/// Redraw the line below the cursor.
pub const REDRAW_LINE_BELOW: u32 = 1 << 3;
/// Redraw the whole page.
pub const REDRAW_PAGE: u32 = 1 << 4;
/// Only the character cell under the cursor changed.
pub const REDRAW_CHAR_ONLY: u32 = 1 << 6;
/// Redraw from scratch.
pub const REDRAW_COMPLETELY: u32 = 1 << 7;

/// File-lock seam. The first modification of a loaded buffer acquires the
/// lock once; a denied lock does not block editing.
pub trait LockService {
    /// Try to lock `path`; returns whether the lock is held afterwards.
    fn lock(&mut self, path: &Path) -> bool;
    /// Release the lock on `path`; returns whether it is still held.
    fn unlock(&mut self, path: &Path) -> bool;
}

/// Default lock seam: holds nothing and never blocks.
#[derive(Debug, Default)]
pub struct NoopLock;

impl LockService for NoopLock {
    fn lock(&mut self, _path: &Path) -> bool {
        false
    }

    fn unlock(&mut self, _path: &Path) -> bool {
        false
    }
}

/// The editor core: buffer, cursor model, selection, undo logs, caches.
pub struct Editor {
    pub(crate) buffer: TextBuffer,

    // cursor-derived display state
    pub(crate) curs_col: Offset,
    pub(crate) prev_col: Offset,
    pub(crate) over_col: Offset,
    pub(crate) curs_row: Offset,
    pub(crate) start_display: Offset,
    pub(crate) start_line: Offset,
    pub(crate) start_col: Offset,
    pub(crate) screen_rows: Offset,

    // markers and selection
    pub(crate) mark1: Offset,
    pub(crate) mark2: Offset,
    pub(crate) end_mark_curs: Offset,
    pub(crate) column1: Offset,
    pub(crate) column2: Offset,
    pub(crate) column_highlight: bool,
    pub(crate) highlight: bool,

    // undo/redo
    pub(crate) undo: UndoStack,
    pub(crate) redo: UndoStack,
    pub(crate) undo_disabled: bool,
    pub(crate) redo_reset: bool,
    pub(crate) max_undo: usize,

    // caches and auxiliary structures
    pub(crate) line_cache: LineCache,
    pub(crate) bookmarks: BookmarkList,
    pub(crate) clipboard: Box<dyn Clipboard>,

    // status
    pub(crate) modified: bool,
    pub(crate) loading_done: bool,
    pub(crate) locked: bool,
    pub(crate) delete_file: bool,
    pub(crate) overwrite: bool,
    pub(crate) utf8: bool,
    pub(crate) bracketed_paste: bool,
    pub(crate) force: u32,

    // search and bracket state published to collaborators
    pub(crate) search_start: Offset,
    pub(crate) found_len: Offset,
    pub(crate) bracket: Offset,
    pub(crate) last_bracket: Offset,

    pub(crate) line_breaks: LineBreaks,
    pub(crate) path: Option<PathBuf>,
    pub(crate) lock: Box<dyn LockService>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("size", &self.buffer.size())
            .field("curs1", &self.buffer.curs1())
            .field("curs_line", &self.buffer.curs_line())
            .field("lines", &self.buffer.lines())
            .field("mark1", &self.mark1)
            .field("mark2", &self.mark2)
            .field("modified", &self.modified)
            .finish()
    }
}

impl Editor {
    /// Create an empty editor.
    pub fn new() -> Self {
        Self {
            buffer: TextBuffer::new(),
            curs_col: 0,
            prev_col: 0,
            over_col: 0,
            curs_row: 0,
            start_display: 0,
            start_line: 0,
            start_col: 0,
            screen_rows: 24,
            mark1: 0,
            mark2: 0,
            end_mark_curs: 0,
            column1: 0,
            column2: 0,
            column_highlight: false,
            highlight: false,
            undo: UndoStack::new(),
            redo: UndoStack::new(),
            undo_disabled: false,
            redo_reset: false,
            max_undo: DEFAULT_MAX_UNDO,
            line_cache: LineCache::new(),
            bookmarks: BookmarkList::new(),
            clipboard: Box::new(MemClipboard::new()),
            modified: false,
            loading_done: true,
            locked: false,
            delete_file: false,
            overwrite: false,
            utf8: true,
            bracketed_paste: false,
            force: REDRAW_PAGE,
            search_start: 0,
            found_len: 0,
            bracket: -1,
            last_bracket: -1,
            line_breaks: LineBreaks::Asis,
            path: None,
            lock: Box::new(NoopLock),
        }
    }

    /// Create an empty editor with a custom undo-log bound.
    pub fn with_max_undo(max_undo: usize) -> Self {
        let mut editor = Self::new();
        editor.max_undo = max_undo.max(256);
        editor
    }

    /// Create an editor pre-filled with `data`, cursor at offset 0.
    ///
    /// The fill bypasses the undo log, exactly like a file load.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut editor = Self::new();
        for &b in data {
            editor.buffer.insert(b);
        }
        editor.buffer.move_cursor(-editor.buffer.size());
        editor
    }

    /// Read-only view of the buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The whole buffer content, copied out.
    pub fn text(&self) -> Vec<u8> {
        self.buffer.slice(0, self.buffer.size())
    }

    /// Absolute byte offset of the cursor.
    pub fn cursor_offset(&self) -> Offset {
        self.buffer.curs1()
    }

    /// 0-based line of the cursor.
    pub fn curs_line(&self) -> Offset {
        self.buffer.curs_line()
    }

    /// Whether the buffer has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark as unmodified (after an external save).
    pub fn mark_unmodified(&mut self) {
        self.modified = false;
    }

    /// Whether the external file lock is held.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Virtual columns past end-of-line currently occupied by the cursor.
    pub fn over_col(&self) -> Offset {
        self.over_col
    }

    /// First visible line.
    pub fn start_line(&self) -> Offset {
        self.start_line
    }

    /// Byte offset of the first visible line.
    pub fn start_display(&self) -> Offset {
        self.start_display
    }

    /// Position of the bracket matching the one under the cursor, `-1` when
    /// there is none.
    pub fn bracket(&self) -> Offset {
        self.bracket
    }

    /// Offset search should resume from.
    pub fn search_start(&self) -> Offset {
        self.search_start
    }

    /// Whether overwrite mode is active.
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Drain the accumulated dirty-region mask.
    pub fn take_force(&mut self) -> u32 {
        std::mem::take(&mut self.force)
    }

    /// Current dirty-region mask.
    pub fn force(&self) -> u32 {
        self.force
    }

    /// Line-break mode applied at save.
    pub fn line_breaks(&self) -> LineBreaks {
        self.line_breaks
    }

    /// Select the line-break mode applied at save.
    pub fn set_line_breaks(&mut self, lb: LineBreaks) {
        self.line_breaks = lb;
    }

    /// Number of text rows the renderer shows; page motion and the bracket
    /// scan bound depend on it.
    pub fn set_screen_rows(&mut self, rows: Offset) {
        self.screen_rows = rows.max(1);
    }

    /// Terminal bracketed-paste state; auto-indent is suppressed while set.
    pub fn set_bracketed_paste(&mut self, active: bool) {
        self.bracketed_paste = active;
    }

    /// Replace the clipboard seam.
    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Replace the file-lock seam.
    pub fn set_lock_service(&mut self, lock: Box<dyn LockService>) {
        self.lock = lock;
    }

    /// Bookmarks on this buffer.
    pub fn bookmarks(&self) -> &BookmarkList {
        &self.bookmarks
    }

    /// Called by every primitive that changes the buffer: invalidates the
    /// line cache and, on the first change of a loaded file, raises the
    /// external lock.
    pub(crate) fn modification(&mut self) {
        self.line_cache.invalidate();

        if !self.modified && !self.delete_file {
            if let Some(path) = self.path.clone() {
                self.locked = self.lock.lock(&path);
                if !self.locked {
                    tracing::debug!(path = %path.display(), "file lock denied");
                }
            }
        }
        self.modified = true;
    }

    /// Insert `c` before the cursor.
    pub fn insert(&mut self, c: u8) {
        // the display window must not drift when text is inserted above it
        if self.buffer.curs1() < self.start_display {
            self.start_display += 1;
            if c == b'\n' {
                self.start_line += 1;
            }
        }

        // a not-yet-loaded buffer is not "modified"
        if self.loading_done {
            self.modification();
        }

        if c == b'\n' {
            self.bookmarks.inc(self.buffer.curs_line());
            self.force |= REDRAW_LINE_ABOVE | REDRAW_AFTER_CURSOR;
        }

        // ordinary char and not space
        if c > 32 {
            self.push_undo_action(BACKSPACE);
        } else {
            self.push_undo_action(BACKSPACE_BR);
        }

        if self.mark1 > self.buffer.curs1() {
            self.mark1 += 1;
        }
        if self.mark2 > self.buffer.curs1() {
            self.mark2 += 1;
        }

        self.buffer.insert(c);
    }

    /// Insert `c` after the cursor; the cursor stays put.
    pub fn insert_ahead(&mut self, c: u8) {
        if self.buffer.curs1() < self.start_display {
            self.start_display += 1;
            if c == b'\n' {
                self.start_line += 1;
            }
        }

        self.modification();

        if c == b'\n' {
            self.bookmarks.inc(self.buffer.curs_line());
            self.force |= REDRAW_AFTER_CURSOR;
        }

        if c > 32 {
            self.push_undo_action(DELCHAR);
        } else {
            self.push_undo_action(DELCHAR_BR);
        }

        if self.mark1 >= self.buffer.curs1() {
            self.mark1 += 1;
        }
        if self.mark2 >= self.buffer.curs1() {
            self.mark2 += 1;
        }

        self.buffer.insert_ahead(c);
    }

    /// Materialize the virtual columns past end-of-line as spaces.
    pub fn insert_over(&mut self) {
        for _ in 0..self.over_col {
            self.insert(b' ');
        }
        self.over_col = 0;
    }

    /// Delete the byte (or, in UTF-8 mode with `byte_delete` unset, the
    /// codepoint) after the cursor. Returns the last removed byte, 0 when
    /// nothing was removed.
    pub fn delete(&mut self, byte_delete: bool) -> u8 {
        if self.buffer.curs2() == 0 {
            return 0;
        }

        let mut char_length: Offset = 1;
        if self.utf8 && !byte_delete {
            let (_, len) = self.buffer.get_utf(self.buffer.curs1());
            char_length = if len < 1 { 1 } else { len };
        }

        if self.mark2 != self.mark1 {
            self.push_markers();
        }

        let mut p = 0u8;
        for _ in 0..char_length {
            if self.mark1 > self.buffer.curs1() {
                self.mark1 -= 1;
                self.end_mark_curs -= 1;
            }
            if self.mark2 > self.buffer.curs1() {
                self.mark2 -= 1;
            }

            p = self.buffer.delete().unwrap_or(0);
            self.push_undo_action(p as i64 + 256);
        }

        self.modification();
        if p == b'\n' {
            self.bookmarks.dec(self.buffer.curs_line());
            self.force |= REDRAW_AFTER_CURSOR;
        }
        if self.buffer.curs1() < self.start_display {
            self.start_display -= 1;
            if p == b'\n' {
                self.start_line -= 1;
            }
        }

        p
    }

    /// Delete the byte (or codepoint) before the cursor. Returns the last
    /// removed byte, 0 when nothing was removed.
    pub fn backspace(&mut self, byte_delete: bool) -> u8 {
        if self.buffer.curs1() == 0 {
            return 0;
        }

        if self.mark2 != self.mark1 {
            self.push_markers();
        }

        let mut char_length: Offset = 1;
        if self.utf8 && !byte_delete {
            let (_, len) = self.buffer.get_prev_utf(self.buffer.curs1());
            char_length = if len < 1 { 1 } else { len };
        }

        let mut p = 0u8;
        for _ in 0..char_length {
            if self.mark1 >= self.buffer.curs1() {
                self.mark1 -= 1;
                self.end_mark_curs -= 1;
            }
            if self.mark2 >= self.buffer.curs1() {
                self.mark2 -= 1;
            }

            p = self.buffer.backspace().unwrap_or(0);
            self.push_undo_action(p as i64);
        }

        self.modification();
        if p == b'\n' {
            self.bookmarks.dec(self.buffer.curs_line() + 1);
            self.force |= REDRAW_AFTER_CURSOR;
        }
        if self.buffer.curs1() < self.start_display {
            self.start_display -= 1;
            if p == b'\n' {
                self.start_line -= 1;
            }
        }

        p
    }

    /// Move the cursor `increment` bytes right (positive) or left
    /// (negative), one undo entry per unit shift.
    pub fn cursor_move(&mut self, increment: Offset) {
        if increment < 0 {
            let mut n = increment;
            while n < 0 && self.buffer.curs1() != 0 {
                n += 1;
                self.push_undo_action(CURS_RIGHT);
                let c = self.buffer.prev_byte();
                self.buffer.move_cursor(-1);
                if c == b'\n' {
                    self.force |= REDRAW_LINE_BELOW;
                }
            }
        } else {
            let mut n = increment;
            while n > 0 && self.buffer.curs2() != 0 {
                n -= 1;
                self.push_undo_action(CURS_LEFT);
                let c = self.buffer.current_byte();
                self.buffer.move_cursor(1);
                if c == b'\n' {
                    self.force |= REDRAW_LINE_ABOVE;
                }
            }
        }
    }

    /// Whether everything between BOL and the cursor is whitespace.
    pub(crate) fn is_in_indent(&self) -> bool {
        let mut p = self.buffer.current_bol();
        while p < self.buffer.curs1() {
            if !matches!(self.buffer.byte_at(p), b' ' | b'\t') {
                return false;
            }
            p += 1;
        }
        true
    }

    /// Whether the line containing `offset` is blank.
    pub(crate) fn is_blank(&self, offset: Offset) -> bool {
        let mut s = self.buffer.bol(offset);
        let f = self.buffer.eol(offset);
        while s < f {
            if !self.buffer.byte_at(s).is_ascii_whitespace() {
                return false;
            }
            s += 1;
        }
        true
    }

    /// Whether line `line` is blank.
    pub fn line_is_blank(&mut self, line: Offset) -> bool {
        let offset = self.find_line(line);
        self.is_blank(offset)
    }

    /// Delete the cursor's whole line.
    pub fn delete_line(&mut self) {
        // the sentinel read past EOF terminates both scans
        while self.buffer.current_byte() != b'\n' {
            self.delete(true);
        }
        self.delete(true);
        while self.buffer.prev_byte() != b'\n' {
            self.backspace(true);
        }
    }

    /// Delete from the cursor to end-of-line.
    pub fn delete_to_line_end(&mut self) {
        while self.buffer.current_byte() != b'\n' && self.buffer.curs2() != 0 {
            self.delete(true);
        }
    }

    /// Delete from the cursor back to beginning-of-line.
    pub fn delete_to_line_begin(&mut self) {
        while self.buffer.prev_byte() != b'\n' && self.buffer.curs1() != 0 {
            self.backspace(true);
        }
    }

    /// Append a final newline if the buffer does not end with one.
    pub fn ensure_trailing_newline(&mut self) {
        if self.buffer.size() > 0 && self.buffer.byte_at(self.buffer.size() - 1) != b'\n' {
            let curs = self.buffer.curs1();
            self.cursor_move(self.buffer.size() - curs);
            self.insert(b'\n');
            self.cursor_move(curs - self.buffer.curs1());
        }
    }

    /// Release the file lock and flush per-buffer state. Call before
    /// dropping an editor that locked its file.
    pub fn close(&mut self) {
        if self.locked {
            if let Some(path) = self.path.clone() {
                self.locked = self.lock.unlock(&path);
            }
        }
        self.bookmarks.flush_all();
    }
}
