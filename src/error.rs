//! Error types and handling infrastructure for fichas.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types. The binary wraps these in `anyhow` for top-level context.
//!
//! Every variant maps onto something the user sees in the status line or the
//! results pane. None of them is fatal to the interactive loop.

use thiserror::Error;

/// The main error type for fichas operations.
#[derive(Error, Debug)]
pub enum FichasError {
    /// The gateway could not be reached, answered with a failure status, or sent
    /// a body that is not JSON
    #[error("Failed to load data: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The gateway answered, but not with the structure we expected
    #[error("Unexpected gateway response: {message}")]
    Shape { message: String },

    /// A print URL request came back without a usable URL
    #[error(
        "Could not generate the document for entry {entry}: the entry may not exist or the \
         gateway print mapping is misconfigured"
    )]
    NotFound { entry: String },

    /// The document viewer refused to open a new view
    #[error("The viewer blocked the new window for {url}; allow pop-ups and try again")]
    PopupBlocked { url: String },

    /// Batch print requested with an empty selection
    #[error("Select at least one record")]
    NothingSelected,

    /// Caller handed us something unusable (empty identifier, bad order name, ...)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// UI and terminal related errors
    #[error("UI operation failed: {message}")]
    UIError { message: String },

    /// Local I/O failures (config files, terminal, spawning the viewer)
    #[error("I/O operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for fichas operations.
pub type Result<T> = std::result::Result<T, FichasError>;

impl FichasError {
    /// Create a Transport error without an underlying HTTP error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Shape error with a descriptive message
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    pub fn not_found(entry: impl Into<String>) -> Self {
        Self::NotFound {
            entry: entry.into(),
        }
    }

    pub fn popup_blocked(url: impl Into<String>) -> Self {
        Self::PopupBlocked { url: url.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a UIError with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Message without the variant's lead-in, for panes that print their own
    /// heading.
    pub fn detail(&self) -> String {
        match self {
            Self::Transport { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Transport and shape failures are shown to the user the same way: the data
    /// could not be loaded, check the gateway and retry.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Shape { .. })
    }
}

impl From<reqwest::Error> for FichasError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "gateway request timed out".to_string()
        } else if err.is_connect() {
            "gateway unreachable".to_string()
        } else if let Some(status) = err.status() {
            format!("gateway answered with status {}", status)
        } else {
            "gateway request failed".to_string()
        };
        Self::Transport {
            message,
            source: Some(err),
        }
    }
}

impl From<std::io::Error> for FichasError {
    fn from(err: std::io::Error) -> Self {
        let message = match err.kind() {
            std::io::ErrorKind::NotFound => "File not found",
            std::io::ErrorKind::PermissionDenied => "Permission denied",
            _ => "IO operation failed",
        };
        Self::Io {
            message: message.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let not_found = FichasError::not_found("42");
        assert_eq!(
            not_found.to_string(),
            "Could not generate the document for entry 42: the entry may not exist or the \
             gateway print mapping is misconfigured"
        );

        let blocked = FichasError::popup_blocked("https://example.test/doc");
        assert!(blocked.to_string().contains("allow pop-ups"));

        assert_eq!(
            FichasError::NothingSelected.to_string(),
            "Select at least one record"
        );
    }

    #[test]
    fn test_load_failure_grouping() {
        assert!(FichasError::transport("down").is_load_failure());
        assert!(FichasError::shape("not an array").is_load_failure());
        assert!(!FichasError::not_found("1").is_load_failure());
        assert!(!FichasError::NothingSelected.is_load_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FichasError = io_err.into();

        match err {
            FichasError::Io { message, .. } => assert_eq!(message, "File not found"),
            _ => panic!("Expected Io variant"),
        }
    }
}
