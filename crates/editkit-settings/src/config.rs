//! Editor option block.
//!
//! All options are read-only while a command executes; the executor receives
//! the block by reference. Persistence supports JSON and TOML files, chosen
//! by extension.

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default wrap column for typewriter wrap and paragraph formatting.
pub const DEFAULT_WRAP_LINE_LENGTH: i64 = 72;

/// Default prompt threshold for large files (64 MiB).
pub const DEFAULT_FILESIZE_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Saver policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// Overwrite the file in place.
    Quick,
    /// Write to a temporary file, then rename over the target.
    Safe,
    /// Keep a copy of the previous contents under `backup_ext`.
    DoBackups,
}

impl Default for SaveMode {
    fn default() -> Self {
        Self::Quick
    }
}

impl std::fmt::Display for SaveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Safe => write!(f, "safe"),
            Self::DoBackups => write!(f, "backups"),
        }
    }
}

/// The editor option block.
///
/// Field meanings follow the behavior contract of the command executor: see
/// the `editkit-editor` crate documentation for how each option changes the
/// edit policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditOptions {
    /// Column at which typewriter wrap breaks the line at the previous
    /// whitespace.
    pub word_wrap_line_length: i64,
    /// Enable typewriter-style wrapping while typing.
    pub typewriter_wrap: bool,
    /// Enter and deletions re-format the surrounding paragraph.
    pub auto_para_formatting: bool,
    /// Tab inserts spaces instead of `\t`.
    pub fill_tabs_with_spaces: bool,
    /// Enter copies the previous line's leading whitespace.
    pub return_does_auto_indent: bool,
    /// Backspace in the indent region deletes back to the previous
    /// indent stop.
    pub backspace_through_tabs: bool,
    /// Motion and tab treat four-space groups in the indent as half tabs.
    pub fake_half_tabs: bool,
    /// Motion and insertion do not clear the selection.
    pub persistent_selections: bool,
    /// Copying to the clipboard drops the selection afterwards.
    pub drop_selection_on_copy: bool,
    /// The cursor may occupy virtual columns past end-of-line.
    pub cursor_beyond_eol: bool,
    /// Paste leaves the cursor at the end of the inserted block.
    pub cursor_after_inserted_block: bool,
    /// Undo merges adjacent commands of the same kind.
    pub group_undo: bool,
    /// Warn about / insert a trailing newline at save.
    pub check_nl_at_eof: bool,
    /// Rendering hint: visualize tab characters.
    pub visible_tabs: bool,
    /// Rendering hint: visualize trailing whitespace.
    pub visible_tws: bool,
    /// Rendering hint: draw the right margin.
    pub show_right_margin: bool,
    /// Rendering hint: reserve a line-state column.
    pub line_state: bool,
    /// Saver policy.
    pub save_mode: SaveMode,
    /// Maximum file size loaded without an explicit override.
    pub filesize_threshold: u64,
    /// Suffix appended to backup files.
    pub backup_ext: String,
    /// Width of a tab stop in columns; half tabs are half of this.
    pub tab_spacing: i64,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            word_wrap_line_length: DEFAULT_WRAP_LINE_LENGTH,
            typewriter_wrap: false,
            auto_para_formatting: false,
            fill_tabs_with_spaces: false,
            return_does_auto_indent: true,
            backspace_through_tabs: false,
            fake_half_tabs: true,
            persistent_selections: true,
            drop_selection_on_copy: true,
            cursor_beyond_eol: false,
            cursor_after_inserted_block: false,
            group_undo: false,
            check_nl_at_eof: false,
            visible_tabs: true,
            visible_tws: true,
            show_right_margin: false,
            line_state: false,
            save_mode: SaveMode::default(),
            filesize_threshold: DEFAULT_FILESIZE_THRESHOLD,
            backup_ext: "~".to_string(),
            tab_spacing: 8,
        }
    }
}

impl EditOptions {
    /// Half-tab width used by the fake half-tab policies.
    pub fn half_tab(&self) -> i64 {
        self.tab_spacing / 2
    }

    /// Load options from a `.json` or `.toml` file.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let options: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else {
            return Err(SettingsError::UnsupportedFormat {
                path: path.display().to_string(),
            });
        };

        options.validate()?;
        Ok(options)
    }

    /// Save options to a `.json` or `.toml` file.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else {
            return Err(SettingsError::UnsupportedFormat {
                path: path.display().to_string(),
            });
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate option values.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.word_wrap_line_length < 1 {
            return Err(SettingsError::InvalidValue {
                name: "word_wrap_line_length",
                reason: format!("must be positive, got {}", self.word_wrap_line_length),
            });
        }
        if self.tab_spacing < 2 || self.tab_spacing > 32 {
            return Err(SettingsError::InvalidValue {
                name: "tab_spacing",
                reason: format!("must be in 2..=32, got {}", self.tab_spacing),
            });
        }
        if self.tab_spacing % 2 != 0 {
            return Err(SettingsError::InvalidValue {
                name: "tab_spacing",
                reason: format!("must be even, got {}", self.tab_spacing),
            });
        }
        if self.backup_ext.is_empty() {
            return Err(SettingsError::InvalidValue {
                name: "backup_ext",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor_conventions() {
        let options = EditOptions::default();
        assert_eq!(options.word_wrap_line_length, 72);
        assert!(options.return_does_auto_indent);
        assert!(options.fake_half_tabs);
        assert!(options.persistent_selections);
        assert!(!options.cursor_beyond_eol);
        assert!(!options.group_undo);
        assert_eq!(options.save_mode, SaveMode::Quick);
        assert_eq!(options.tab_spacing, 8);
        assert_eq!(options.half_tab(), 4);
        options.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_odd_tab_spacing() {
        let options = EditOptions {
            tab_spacing: 7,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(SettingsError::InvalidValue {
                name: "tab_spacing",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_wrap_length() {
        let options = EditOptions {
            word_wrap_line_length: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");

        let mut options = EditOptions::default();
        options.cursor_beyond_eol = true;
        options.save_mode = SaveMode::Safe;
        options.save_to_file(&path).unwrap();

        let loaded = EditOptions::load_from_file(&path).unwrap();
        assert!(loaded.cursor_beyond_eol);
        assert_eq!(loaded.save_mode, SaveMode::Safe);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.toml");

        let mut options = EditOptions::default();
        options.group_undo = true;
        options.backup_ext = ".bak".to_string();
        options.save_to_file(&path).unwrap();

        let loaded = EditOptions::load_from_file(&path).unwrap();
        assert!(loaded.group_undo);
        assert_eq!(loaded.backup_ext, ".bak");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let path = Path::new("options.ini");
        assert!(matches!(
            EditOptions::load_from_file(path),
            Err(SettingsError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "group_undo": true }"#).unwrap();

        let loaded = EditOptions::load_from_file(&path).unwrap();
        assert!(loaded.group_undo);
        assert_eq!(loaded.word_wrap_line_length, DEFAULT_WRAP_LINE_LENGTH);
    }
}
