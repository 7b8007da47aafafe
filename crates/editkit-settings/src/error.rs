//! Error types for settings loading, saving and validation.

use thiserror::Error;

/// Errors that can occur while handling the option block.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file could not be parsed.
    #[error("Cannot parse settings: {0}")]
    Parse(String),

    /// The settings file extension is not recognized.
    #[error("Settings file must be .json or .toml: {path}")]
    UnsupportedFormat { path: String },

    /// A setting holds a value outside its permitted range.
    #[error("Invalid setting {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SettingsError::UnsupportedFormat {
            path: "options.ini".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Settings file must be .json or .toml: options.ini"
        );

        let err = SettingsError::InvalidValue {
            name: "tab_spacing",
            reason: "must be even".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid setting tab_spacing: must be even");
    }
}
