//! Error types for scene construction and output.

use thiserror::Error;

/// Main error type for the scene library.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration values out of range
    #[error("Config error: {0}")]
    Config(String),

    /// Geometry parameters that cannot produce a mesh
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Surface creation or presentation errors
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Result type alias using the scene's Error type.
pub type Result<T> = std::result::Result<T, Error>;
