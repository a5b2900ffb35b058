//! Error types shared by every stage of the report pipeline.

use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "bookmarks")]
use crate::bookmarks::BookmarkError;

/// Errors that can abort a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    // === Input ===
    /// The input CSV file does not exist.
    #[error("input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header row.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A numeric column holds a value that cannot be coerced under the `fail` policy.
    #[error("invalid numeric value '{value}' in column '{column}' (row {row})")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    // === Configuration ===
    /// The configuration file could not be parsed.
    #[error("invalid configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // === Rendering ===
    /// No usable font family could be loaded.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),

    /// genpdf failed while laying out or writing the document.
    #[error("failed to render report: {0}")]
    Render(#[source] genpdf::error::Error),

    /// Outline entries could not be embedded into the rendered document.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed bookmarks: {0}")]
    Bookmarks(#[from] BookmarkError),

    /// The finished report could not be written.
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ReportError>;
