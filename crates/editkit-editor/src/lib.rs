//! # editkit Editor Core
//!
//! The in-memory editing engine of editkit: cursor and selection model,
//! compressed undo/redo log, command executor, and the caches that keep
//! multi-megabyte files responsive.
//!
//! ## Core Components
//!
//! ### Editor State
//! - **Editor**: buffer, cursor, display anchor, markers, undo logs
//! - Exactly five primitives mutate the buffer; each records its inverse
//!   into the undo log and keeps derived state consistent
//!
//! ### Undo/Redo
//! - **UndoStack**: bounded power-of-two ring of run-length compressed
//!   action codes with key-press boundaries and group undo
//!
//! ### Command Execution
//! - **Command**: the full keyboard command set (motion, editing, marking,
//!   blocks, bookmarks) dispatched through [`Editor::execute_key`]
//! - Option policies applied per command: auto-indent, fake half-tabs,
//!   overwrite, typewriter wrap, selection persistence
//!
//! ### Auxiliary Structures
//! - Line-offset cache for fast `goto line`
//! - Word-class table driving word and paragraph motion
//! - Bounded bracket matcher
//! - Bookmark list shifted on line insert/delete
//!
//! ## Architecture
//!
//! ```text
//! Editor (public API)
//!   ├── TextBuffer (editkit-buffer: split byte storage)
//!   ├── UndoStack ×2 (undo and redo rings)
//!   ├── LineCache (goto-line hints)
//!   ├── BookmarkList
//!   └── seams: Clipboard, LockService, progress callbacks
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use editkit_editor::{Command, Editor};
//! use editkit_settings::EditOptions;
//!
//! let opts = EditOptions::default();
//! let mut editor = Editor::from_bytes(b"hello\n");
//! editor.execute_key(&opts, Command::Bottom);
//! editor.execute_key(&opts, Command::InsertChar('!'));
//! editor.execute_key(&opts, Command::Undo);
//! assert_eq!(editor.text(), b"hello\n");
//! ```

mod bookmarks;
mod clipboard;
mod commands;
mod cursor;
mod editor;
pub mod error;
mod io;
mod line_cache;
mod marks;
mod undo;
mod wordmove;

pub use bookmarks::{Bookmark, BookmarkList, BOOK_MARK_COLOR, BOOK_MARK_FOUND_COLOR};
pub use clipboard::{Clipboard, MemClipboard, COLUMN_BLOCK_MAGIC};
pub use commands::Command;
pub use editor::{
    Editor, LockService, NoopLock, REDRAW_AFTER_CURSOR, REDRAW_CHAR_ONLY, REDRAW_COMPLETELY,
    REDRAW_LINE, REDRAW_LINE_ABOVE, REDRAW_LINE_BELOW, REDRAW_PAGE,
};
pub use error::{EditorError, EditorResult};
pub use io::ProgressFn;
pub use line_cache::N_LINE_CACHES;
pub use undo::{Action, UndoStack, DEFAULT_MAX_UNDO, START_STACK_SIZE};
