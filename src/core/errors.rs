//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for grammarops operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed config file, unknown rule category or style
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        path: Option<PathBuf>,
    },

    /// A regex in an exception list or pattern table failed to compile
    #[error("Configuration error: invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Source file could not be parsed into declarations
    #[error("Parse error in {}:{line}: {message}", file.display())]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// File system related errors
    #[error("File system error: {message} ({})", path.display())]
    FileSystem {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rename could not be applied safely
    #[error("Migration error: {0}")]
    Migration(String),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: None,
        }
    }

    pub fn configuration_in(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Configuration {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn file_system(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Configuration problems abort the run before any analysis starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::InvalidPattern { .. }
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_configuration() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = Error::invalid_pattern("(unclosed", source);
        assert!(err.is_configuration());
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::parse("app.py", 12, "syntax error");
        assert_eq!(err.to_string(), "Parse error in app.py:12: syntax error");
        assert!(!err.is_configuration());
    }
}
