//! Error types for the studio generator.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use serde::Serialize;

/// Validation errors for inputs and settings.
#[derive(Error, Debug, Serialize)]
pub enum ValidationError {
    /// Path-related validation error
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    /// Invalid settings error
    #[error("Settings error: {0}")]
    Settings(String),
}

/// File path errors.
#[derive(Error, Debug, Serialize)]
pub enum PathError {
    /// File does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Path exists but is not a file
    #[error("Not a file: {0}")]
    NotFile(PathBuf),
    /// IO error accessing the path
    #[error("IO error: {0}")]
    IO(String),
}

/// Main error type for the studio generator.
///
/// Per-item generation failures are stored on the item as a message; everything
/// else is returned to the caller as one of these.
#[derive(Error, Debug, Serialize)]
pub enum StudioError {
    /// Task or input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An uploaded file could not be read
    #[error("Upload error: {0}")]
    Upload(String),

    /// The generation service failed for one item
    #[error("Generation error: {0}")]
    Generation(String),

    /// A base or overlay image could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The composited image could not be encoded
    #[error("Encode error: {0}")]
    Encode(String),

    /// Packaging the batch archive failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// No item with the given id
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Configuration file could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),
}

/// Convenience result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

// Helper methods for error creation
impl StudioError {
    pub fn upload<T: Into<String>>(msg: T) -> Self {
        Self::Upload(msg.into())
    }

    pub fn generation<T: Into<String>>(msg: T) -> Self {
        Self::Generation(msg.into())
    }

    pub fn decode<T: Into<String>>(msg: T) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn archive<T: Into<String>>(msg: T) -> Self {
        Self::Archive(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(ValidationError::Settings(msg.into()))
    }

    /// Human-readable reason stored on an item when an attempt fails.
    ///
    /// Generation errors keep their bare message; anything else keeps its prefix
    /// so the kind of failure is still visible.
    pub fn item_message(&self) -> String {
        let msg = match self {
            Self::Generation(msg) => msg.clone(),
            other => other.to_string(),
        };
        if msg.trim().is_empty() {
            "Failed to process".to_string()
        } else {
            msg
        }
    }
}

// Helper methods for validation error creation
impl ValidationError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFound(path.into()))
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFile(path.into()))
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

// Convert std::io::Error to StudioError
impl From<io::Error> for StudioError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert io::Error to PathError
impl From<io::Error> for PathError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert PathError to StudioError
impl From<PathError> for StudioError {
    fn from(err: PathError) -> Self {
        Self::Validation(ValidationError::Path(err))
    }
}
