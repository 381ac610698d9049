//! Error types for Bluetooth operations.

use thiserror::Error;

/// Bluetooth-specific error types.
#[derive(Error, Debug)]
pub enum BluetoothError {
    /// D-Bus / BlueZ transport error.
    #[error("BlueZ error: {0}")]
    Bus(String),

    /// No object implements the adapter interface.
    #[error("No Bluetooth adapter found")]
    AdapterNotFound,

    /// The daemon rejected a property write.
    #[error("Failed to set adapter property {property}: {reason}")]
    PropertyRejected {
        property: &'static str,
        reason: String,
    },
}

/// Convenience Result type for Bluetooth operations.
pub type Result<T> = std::result::Result<T, BluetoothError>;
