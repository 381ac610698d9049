//! Error types for configuration handling.

use thiserror::Error;

/// Errors raised while building or validating router configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Adapter alias is empty or whitespace.
    #[error("Adapter alias must not be empty")]
    EmptyAlias,

    /// Audio target device name is empty.
    #[error("Audio target device must not be empty (use \"default\" for the system default)")]
    EmptyAudioTarget,

    /// Command timeout of zero would fail every command.
    #[error("Command timeout must be greater than zero")]
    ZeroCommandTimeout,
}

/// Convenience Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert!(CoreError::EmptyAlias.to_string().contains("alias"));
        assert!(CoreError::EmptyAudioTarget.to_string().contains("default"));
        assert!(CoreError::ZeroCommandTimeout.to_string().contains("timeout"));
    }
}
