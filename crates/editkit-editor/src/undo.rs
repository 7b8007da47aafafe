//! Compressed undo/redo log.
//!
//! Both logs share one cell encoding. A cell is a signed integer drawn from
//! disjoint ranges: byte re-inserts (inverses of backspace and delete),
//! cursor opcodes, marker restores, and key-press boundaries that carry the
//! saved display start. Identical consecutive pushes are run-length
//! compressed: the head cell is followed by a negative counter starting at
//! `-2` that is decremented for every further repeat.
//!
//! ```text
//! pushed:       stored:
//!
//! a
//! b             a
//! b            -3
//! b             b
//! c             -4
//! c             c
//! c             d
//! c
//! d
//! ```
//!
//! The ring is a power of two; when the write pointer catches up with the
//! bottom, the bottom advances past one whole key-press group to reclaim
//! space. A single key press wrapping the entire ring resets both ends to
//! zero.

use editkit_buffer::Offset;
use editkit_settings::EditOptions;

use crate::editor::{Editor, REDRAW_PAGE};

/// Initial ring capacity in cells.
pub const START_STACK_SIZE: usize = 32;

/// Default upper bound on the ring capacity.
pub const DEFAULT_MAX_UNDO: usize = 32768;

/// Undo replays a cursor step right.
pub const CURS_LEFT: i64 = 601;
/// Undo replays a cursor step left.
pub const CURS_RIGHT: i64 = 602;
/// Undo replays a forward delete.
pub const DELCHAR: i64 = 603;
/// Undo replays a backspace.
pub const BACKSPACE: i64 = 604;
/// Sentinel returned when the log is empty; never stored.
pub const STACK_BOTTOM: i64 = 605;
/// Undo re-enables column highlighting.
pub const COLUMN_ON: i64 = 608;
/// Undo disables column highlighting.
pub const COLUMN_OFF: i64 = 609;
/// Word-break variant of [`DELCHAR`]; group undo splits runs here.
pub const DELCHAR_BR: i64 = 610;
/// Word-break variant of [`BACKSPACE`].
pub const BACKSPACE_BR: i64 = 611;

/// Base of the `mark1` restore range.
pub const MARK_1: i64 = 1_000;
/// Base of the `mark2` restore range.
pub const MARK_2: i64 = 700_000_000;
/// Base of the `end_mark_curs` restore range.
pub const MARK_CURS: i64 = 1_400_000_000;
/// Key-press boundary; the low part carries the saved display start.
pub const KEY_PRESS: i64 = 2_100_000_000;

/// Run counters never decrement past this floor.
const RUN_FLOOR: i64 = -1_000_000_000;

/// Typed view of an undo cell.
///
/// The ring stores the dense integer encoding; this enum is the API-side
/// tagging of the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Re-insert a byte before the cursor (inverse of backspace).
    InsertByte(u8),
    /// Re-insert a byte after the cursor (inverse of delete).
    InsertByteAhead(u8),
    /// A cursor or highlight opcode.
    Op(i64),
    /// Restore `mark1`.
    SetMark1(Offset),
    /// Restore `mark2`.
    SetMark2(Offset),
    /// Restore `end_mark_curs`.
    SetEndMarkCurs(Offset),
    /// Key-press boundary carrying the saved display start.
    KeyPress(Offset),
    /// The log is empty.
    StackBottom,
}

impl Action {
    /// Dense integer encoding of this action.
    pub fn code(self) -> i64 {
        match self {
            Action::InsertByte(c) => c as i64,
            Action::InsertByteAhead(c) => c as i64 + 256,
            Action::Op(op) => op,
            Action::SetMark1(m) => MARK_1 + m,
            Action::SetMark2(m) => MARK_2 + m,
            Action::SetEndMarkCurs(m) => MARK_CURS + m,
            Action::KeyPress(d) => KEY_PRESS + d,
            Action::StackBottom => STACK_BOTTOM,
        }
    }

    /// Decode a cell using the canonical (undo-side) ranges.
    ///
    /// Marker restores accept values two below their base so that a stored
    /// `-1` ("follows cursor" / "unset") round-trips.
    pub fn decode(code: i64) -> Action {
        match code {
            0..=255 => Action::InsertByte(code as u8),
            256..=511 => Action::InsertByteAhead((code - 256) as u8),
            STACK_BOTTOM => Action::StackBottom,
            CURS_LEFT | CURS_RIGHT | DELCHAR | BACKSPACE | COLUMN_ON | COLUMN_OFF | DELCHAR_BR
            | BACKSPACE_BR => Action::Op(code),
            c if c >= KEY_PRESS => Action::KeyPress(c - KEY_PRESS),
            c if c >= MARK_CURS - 2 => Action::SetEndMarkCurs(c - MARK_CURS),
            c if c >= MARK_2 - 2 => Action::SetMark2(c - MARK_2),
            c if c >= MARK_1 - 2 => Action::SetMark1(c - MARK_1),
            other => Action::Op(other),
        }
    }
}

/// A bounded power-of-two ring of compressed action cells.
///
/// The backing store allocates `size + 10` cells so the grow check may
/// trigger within ten cells of the end without the write running past the
/// allocation.
#[derive(Debug, Clone)]
pub struct UndoStack {
    stack: Vec<i64>,
    size: usize,
    mask: usize,
    pointer: usize,
    bottom: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            stack: vec![0; START_STACK_SIZE + 10],
            size: START_STACK_SIZE,
            mask: START_STACK_SIZE - 1,
            pointer: 0,
            bottom: 0,
        }
    }

    /// Whether the log holds no actions.
    pub fn is_empty(&self) -> bool {
        self.pointer == self.bottom
    }

    /// Discard everything.
    pub fn reset(&mut self) {
        self.pointer = 0;
        self.bottom = 0;
    }

    /// Current ring capacity in cells.
    pub fn capacity(&self) -> usize {
        self.size
    }

    fn grow(&mut self, max_undo: usize) {
        let max_undo = max_undo.max(256);
        if self.size >= max_undo {
            return;
        }
        let mut grown = vec![0i64; self.size * 2 + 10];
        grown[..self.stack.len()].copy_from_slice(&self.stack);
        self.stack = grown;
        self.size <<= 1;
        self.mask = self.size - 1;
        tracing::debug!(capacity = self.size, "undo ring doubled");
    }

    /// Push one action code, run-compressing identical repeats.
    pub fn push(&mut self, c: i64, max_undo: usize) {
        let sp = self.pointer;

        if sp > self.size - 10 {
            self.grow(max_undo);
        }

        let spm1 = sp.wrapping_sub(1) & self.mask;
        let spm2 = sp.wrapping_sub(2) & self.mask;

        if self.bottom != sp && spm1 != self.bottom && spm2 != self.bottom {
            if self.stack[spm1] < 0 {
                // a run is open: extend it if the head matches
                let d = self.stack[spm2];
                if d == c && self.stack[spm1] > RUN_FLOOR {
                    if c < KEY_PRESS {
                        self.stack[spm1] -= 1;
                    }
                    return;
                }
            } else {
                let d = self.stack[spm1];
                if d == c {
                    if c >= KEY_PRESS {
                        // no need to record identical boundaries
                        return;
                    }
                    self.stack[sp] = -2;
                    self.advance();
                    return;
                }
            }
        }
        self.stack[sp] = c;
        self.advance();
    }

    /// Advance the write pointer and reclaim space from the bottom when the
    /// ring is about to overrun itself.
    fn advance(&mut self) {
        self.pointer = (self.pointer + 1) & self.mask;

        let probe = (self.pointer + 2) & self.mask;
        if probe == self.bottom || ((probe + 1) & self.mask) == self.bottom {
            // drop the oldest key-press group
            loop {
                self.bottom = (self.bottom + 1) & self.mask;
                if self.stack[self.bottom] >= KEY_PRESS || self.bottom == self.pointer {
                    break;
                }
            }
        }

        // a single key press wrapped the whole ring
        if self.pointer != self.bottom && self.stack[self.bottom] < KEY_PRESS {
            self.bottom = 0;
            self.pointer = 0;
        }
    }

    /// Pop the next action code, consuming run counters one repeat at a
    /// time. Returns [`STACK_BOTTOM`] when empty.
    pub fn pop(&mut self) -> i64 {
        let mut sp = self.pointer;
        if sp == self.bottom {
            return STACK_BOTTOM;
        }
        sp = sp.wrapping_sub(1) & self.mask;
        let c = self.stack[sp];
        if c >= 0 {
            self.pointer = self.pointer.wrapping_sub(1) & self.mask;
            return c;
        }
        if sp == self.bottom {
            return STACK_BOTTOM;
        }
        let c = self.stack[sp.wrapping_sub(1) & self.mask];
        if self.stack[sp] == -2 {
            self.pointer = sp;
        } else {
            self.stack[sp] += 1;
        }
        c
    }

    /// Read the next action code without consuming it.
    pub fn peek(&self) -> i64 {
        let mut sp = self.pointer;
        if sp == self.bottom {
            return STACK_BOTTOM;
        }
        sp = sp.wrapping_sub(1) & self.mask;
        let c = self.stack[sp];
        if c >= 0 {
            return c;
        }
        if sp == self.bottom {
            return STACK_BOTTOM;
        }
        self.stack[sp.wrapping_sub(1) & self.mask]
    }
}

impl Editor {
    /// Record the inverse of a primitive. While undoing, entries are
    /// redirected to the redo log so that redo is the symmetric operation;
    /// any forward modification first discards the redo log.
    pub(crate) fn push_undo_action(&mut self, c: i64) {
        if self.undo_disabled {
            self.push_redo_action(KEY_PRESS);
            self.push_redo_action(c);
            return;
        }
        if self.redo_reset {
            self.redo.reset();
        }
        let max_undo = self.max_undo;
        self.undo.push(c, max_undo);
    }

    pub(crate) fn push_redo_action(&mut self, c: i64) {
        let max_undo = self.max_undo;
        self.redo.push(c, max_undo);
    }

    /// Record an [`Action`] into the undo log.
    pub fn push_action(&mut self, action: Action) {
        self.push_undo_action(action.code());
    }

    /// Mark the start of a user command: save the display start and, while
    /// a selection is following the cursor, the marker state.
    pub fn push_key_press(&mut self) {
        let start_display = self.start_display;
        self.push_undo_action(KEY_PRESS + start_display);
        if self.mark2 == -1 {
            let mark1 = self.mark1;
            let end_mark_curs = self.end_mark_curs;
            self.push_undo_action(MARK_1 + mark1);
            self.push_undo_action(MARK_CURS + end_mark_curs);
        }
    }

    fn pop_undo_action(&mut self) -> i64 {
        self.undo.pop()
    }

    fn pop_redo_action(&mut self) -> i64 {
        self.redo.pop()
    }

    /// The outermost code of the next undo step, without consuming it.
    pub(crate) fn peek_undo_action(&self) -> i64 {
        self.undo.peek()
    }

    /// Replay inverse actions until the key-press boundary, then restore
    /// the saved display start.
    ///
    /// The start column is not recorded, so it does not undo exactly as it
    /// happened.
    pub(crate) fn do_undo(&mut self, opts: &EditOptions) {
        self.undo_disabled = true;
        self.over_col = 0;

        let mut count = 0u32;
        let ac = loop {
            let ac = self.pop_undo_action();
            if ac >= KEY_PRESS {
                break ac;
            }
            match ac {
                STACK_BOTTOM => {
                    self.undo_disabled = false;
                    return;
                }
                CURS_RIGHT => self.cursor_move(1),
                CURS_LEFT => self.cursor_move(-1),
                BACKSPACE | BACKSPACE_BR => {
                    self.backspace(true);
                }
                DELCHAR | DELCHAR_BR => {
                    self.delete(true);
                }
                COLUMN_ON => self.column_highlight = true,
                COLUMN_OFF => self.column_highlight = false,
                _ => {}
            }
            if (256..512).contains(&ac) {
                self.insert_ahead((ac - 256) as u8);
            }
            if (0..256).contains(&ac) {
                self.insert(ac as u8);
            }

            if ac >= MARK_1 - 2 && ac < MARK_2 - 2 {
                self.mark1 = ac - MARK_1;
                let b = self.buffer.bol(self.mark1);
                self.column1 = self.move_forward_col(opts, b, 0, self.mark1);
            }
            if ac >= MARK_2 - 2 && ac < MARK_CURS - 2 {
                self.mark2 = ac - MARK_2;
                let b = self.buffer.bol(self.mark2);
                self.column2 = self.move_forward_col(opts, b, 0, self.mark2);
            } else if ac >= MARK_CURS - 2 && ac < KEY_PRESS {
                self.end_mark_curs = ac - MARK_CURS;
            }

            count += 1;
            if count > 1 {
                // more than one pop usually means something big
                self.force |= REDRAW_PAGE;
            }
        };

        self.restore_start_display(ac - KEY_PRESS);
        self.update_curs_row();
        self.undo_disabled = false;
    }

    /// Replay redo actions until the key-press boundary.
    pub(crate) fn do_redo(&mut self, opts: &EditOptions) {
        if self.redo_reset {
            return;
        }
        self.over_col = 0;

        let mut count = 0u32;
        let ac = loop {
            let ac = self.pop_redo_action();
            if ac >= KEY_PRESS {
                break ac;
            }
            match ac {
                STACK_BOTTOM => return,
                CURS_RIGHT => self.cursor_move(1),
                CURS_LEFT => self.cursor_move(-1),
                BACKSPACE => {
                    self.backspace(true);
                }
                DELCHAR => {
                    self.delete(true);
                }
                COLUMN_ON => self.column_highlight = true,
                COLUMN_OFF => self.column_highlight = false,
                _ => {}
            }
            if (256..512).contains(&ac) {
                self.insert_ahead((ac - 256) as u8);
            }
            if (0..256).contains(&ac) {
                self.insert(ac as u8);
            }

            if ac >= MARK_1 - 2 && ac < MARK_2 - 2 {
                self.mark1 = ac - MARK_1;
                let b = self.buffer.bol(self.mark1);
                self.column1 = self.move_forward_col(opts, b, 0, self.mark1);
            } else if ac >= MARK_2 - 2 && ac < KEY_PRESS {
                self.mark2 = ac - MARK_2;
                let b = self.buffer.bol(self.mark2);
                self.column2 = self.move_forward_col(opts, b, 0, self.mark2);
            }

            count += 1;
            if count > 1 {
                self.force |= REDRAW_PAGE;
            }
        };

        self.restore_start_display(ac - KEY_PRESS);
        self.update_curs_row();
    }

    fn restore_start_display(&mut self, target: Offset) {
        if self.start_display > target {
            self.start_line -= self.buffer.count_lines(target, self.start_display);
            self.force |= REDRAW_PAGE;
        } else if self.start_display < target {
            self.start_line += self.buffer.count_lines(self.start_display, target);
            self.force |= REDRAW_PAGE;
        }
        self.start_display = target;
    }

    /// Undo one key-press group; with `group_undo` set, keep undoing while
    /// the outermost action codes match.
    pub(crate) fn group_undo(&mut self, opts: &EditOptions) {
        let mut ac = KEY_PRESS;
        let mut cur_ac = KEY_PRESS;
        while ac != STACK_BOTTOM && ac == cur_ac {
            cur_ac = self.peek_undo_action();
            self.do_undo(opts);
            ac = self.peek_undo_action();
            if !opts.group_undo {
                ac = STACK_BOTTOM;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack_returns_bottom() {
        let mut stack = UndoStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), STACK_BOTTOM);
        assert_eq!(stack.peek(), STACK_BOTTOM);
    }

    #[test]
    fn test_push_pop_order() {
        let mut stack = UndoStack::new();
        stack.push(KEY_PRESS, DEFAULT_MAX_UNDO);
        stack.push(100, DEFAULT_MAX_UNDO);
        stack.push(200, DEFAULT_MAX_UNDO);
        assert_eq!(stack.pop(), 200);
        assert_eq!(stack.pop(), 100);
        assert_eq!(stack.pop(), KEY_PRESS);
        assert_eq!(stack.pop(), STACK_BOTTOM);
    }

    #[test]
    fn test_run_length_compression() {
        let mut stack = UndoStack::new();
        stack.push(KEY_PRESS, DEFAULT_MAX_UNDO);
        for _ in 0..5 {
            stack.push(CURS_LEFT, DEFAULT_MAX_UNDO);
        }
        // five identical pushes occupy head + run counter
        for _ in 0..5 {
            assert_eq!(stack.pop(), CURS_LEFT);
        }
        assert_eq!(stack.pop(), KEY_PRESS);
        assert_eq!(stack.pop(), STACK_BOTTOM);
    }

    #[test]
    fn test_peek_sees_run_head() {
        let mut stack = UndoStack::new();
        stack.push(KEY_PRESS, DEFAULT_MAX_UNDO);
        stack.push(BACKSPACE, DEFAULT_MAX_UNDO);
        stack.push(BACKSPACE, DEFAULT_MAX_UNDO);
        assert_eq!(stack.peek(), BACKSPACE);
        assert_eq!(stack.pop(), BACKSPACE);
        assert_eq!(stack.peek(), BACKSPACE);
    }

    #[test]
    fn test_identical_key_press_collapses() {
        let mut stack = UndoStack::new();
        stack.push(KEY_PRESS + 7, DEFAULT_MAX_UNDO);
        stack.push(KEY_PRESS + 7, DEFAULT_MAX_UNDO);
        assert_eq!(stack.pop(), KEY_PRESS + 7);
        assert_eq!(stack.pop(), STACK_BOTTOM);
    }

    #[test]
    fn test_growth_is_bounded() {
        let mut stack = UndoStack::new();
        // alternating codes defeat run compression
        for i in 0..10_000i64 {
            if i % 7 == 0 {
                stack.push(KEY_PRESS + i, 512);
            } else {
                stack.push(i % 2, 512);
            }
        }
        assert!(stack.capacity() <= 512);
    }

    #[test]
    fn test_bottom_reclaims_whole_key_press_groups() {
        let mut stack = UndoStack::new();
        for group in 0..100i64 {
            stack.push(KEY_PRESS + group, 32);
            stack.push(100, 32);
            stack.push(200, 32);
        }
        // the ring stayed within its fixed capacity and still pops whole
        // groups, newest first
        assert_eq!(stack.pop(), 200);
        assert_eq!(stack.pop(), 100);
        assert_eq!(stack.pop(), KEY_PRESS + 99);
    }

    #[test]
    fn test_single_wrapping_key_press_resets() {
        let mut stack = UndoStack::new();
        stack.push(KEY_PRESS, 32);
        // one "key press" of alternating codes larger than the whole ring
        for i in 0..100i64 {
            stack.push(i % 2, 32);
        }
        // the log stays bounded and consistent: it drains in finitely many
        // pops
        let mut pops = 0;
        while stack.pop() != STACK_BOTTOM {
            pops += 1;
            assert!(pops < 200, "ring did not drain");
        }
    }

    #[test]
    fn test_action_codes_round_trip() {
        let actions = [
            Action::InsertByte(7),
            Action::InsertByteAhead(200),
            Action::Op(CURS_LEFT),
            Action::Op(COLUMN_OFF),
            Action::SetMark1(42),
            Action::SetMark2(-1),
            Action::SetEndMarkCurs(17),
            Action::KeyPress(99),
        ];
        for action in actions {
            assert_eq!(Action::decode(action.code()), action, "{action:?}");
        }
    }

    #[test]
    fn test_stack_bottom_is_never_a_byte() {
        assert_eq!(Action::decode(STACK_BOTTOM), Action::StackBottom);
        assert!(STACK_BOTTOM > 511);
    }
}
