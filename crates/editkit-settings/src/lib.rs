//! # editkit Settings
//!
//! Option block and settings persistence for the editkit editor core.
//!
//! The [`EditOptions`] struct bundles every editing policy toggle (wrap,
//! tabs, selections, undo grouping, save policy). The editor core reads it
//! by reference during command execution and never mutates it; the embedding
//! application owns the block and may persist it as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{EditOptions, SaveMode, DEFAULT_FILESIZE_THRESHOLD, DEFAULT_WRAP_LINE_LENGTH};
pub use error::{SettingsError, SettingsResult};
