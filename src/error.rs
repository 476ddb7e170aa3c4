//! # Error Handling
//!
//! Error types for the edges of the link: configuration loading, the serial
//! transport, and the playback sink.
//!
//! ## What is NOT an error here:
//! Protocol handling never fails. A missing field, a malformed number, an
//! unknown message type, or a full buffer all degrade to "nothing happens"
//! plus a log line. Only the surrounding plumbing can produce an [`AppError`].
//!
//! ## Error Categories:
//! - **Config**: `config.toml` or environment variables could not be read
//! - **Validation**: configuration values were read but make no sense
//! - **Transport**: the byte stream to the host failed
//! - **Playback**: the playback sink could not be opened or written

use std::fmt;

/// Custom error types for the application.
///
/// ## Usage Example:
/// ```rust
/// use usb_voice_link::error::AppError;
/// let err = AppError::Validation("stream_capacity must be greater than 0".to_string());
/// assert!(err.to_string().starts_with("Validation error"));
/// ```
#[derive(Debug)]
pub enum AppError {
    /// Configuration file or environment variable problems
    Config(String),

    /// Configuration values failed validation rules
    Validation(String),

    /// Reading from or writing to the host transport failed
    Transport(std::io::Error),

    /// The playback sink could not be opened or written
    Playback(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Transport(err) => write!(f, "Transport error: {}", err),
            AppError::Playback(msg) => write!(f, "Playback error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Automatic conversion from configuration errors to AppError.
///
/// ## When this happens:
/// - config.toml file has invalid syntax
/// - An environment variable cannot be converted to the field's type
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// I/O failures almost always come from the serial transport.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Transport(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Type alias for Results that use our custom error type.
pub type AppResult<T> = Result<T, AppError>;
