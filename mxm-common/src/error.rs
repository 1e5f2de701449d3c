//! Common error types for MXM

use thiserror::Error;

/// Common result type for MXM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the MXM crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replacement table rejected before a merge starts
    #[error("Invalid replacement table: {0}")]
    InvalidReplacementTable(String),

    /// Playlist-to-crate mapping file could not be parsed
    #[error("Crate map error: {0}")]
    CrateMap(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or command-line value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
