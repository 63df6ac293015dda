//! Error types for unrtf library.
//!
//! Only failures that concern a whole document surface here. Malformed
//! markup, undecodable bytes and bad escapes are absorbed by the pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for unrtf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during RTF processing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The data does not start with an RTF header.
    #[error("Unknown file format: not a valid RTF document")]
    UnknownFormat,

    /// An encoding label could not be resolved.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Two documents of one batch would write the same output file.
    #[error("Output path already claimed by another document: {}", .0.display())]
    OutputCollision(PathBuf),

    /// Error while serializing a report.
    #[error("Rendering error: {0}")]
    Render(String),

    /// A pipeline stage panicked while processing a document.
    #[error("Internal error: {0}")]
    Internal(String),

    /// The batch was cancelled before this document started.
    #[error("Cancelled before processing")]
    Cancelled,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}
