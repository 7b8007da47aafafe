//! # editkit
//!
//! A text editor core built around a split-buffer byte store, a compressed
//! undo/redo log and a policy-driven command executor.
//!
//! ## Architecture
//!
//! editkit is organized as a workspace with multiple crates:
//!
//! 1. **editkit-buffer** - split-buffer byte storage and stream adapters
//! 2. **editkit-settings** - the editor option block and its persistence
//! 3. **editkit-editor** - cursor model, undo log, selections, command
//!    executor, bookmarks
//! 4. **editkit** - umbrella library and the `editkit` binary
//!
//! ## Features
//!
//! - **O(1) local edits**: the buffer splits at the cursor; typing never
//!   copies the document
//! - **Bounded lossless undo**: run-length compressed action log with
//!   key-press boundaries and group undo
//! - **Column selections**: rectangular copy, cut and paste with the
//!   column-block magic prefix
//! - **Line-break handling**: load as-is, save as Unix, Windows or Mac
//! - **Narrow seams**: clipboard, file locking and progress reporting are
//!   traits the embedding application provides

pub use editkit_buffer::{LineBreaks, Offset, TextBuffer};
pub use editkit_editor::{
    Bookmark, BookmarkList, Clipboard, Command, Editor, EditorError, EditorResult, LockService,
    MemClipboard, NoopLock, COLUMN_BLOCK_MAGIC,
};
pub use editkit_settings::{EditOptions, SaveMode, SettingsError, SettingsResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
