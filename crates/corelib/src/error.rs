//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration snapshot is structurally invalid
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// Snapshot could not be parsed or serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
