//! Custom error types for the listing pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Two levels
//! exist:
//!
//! - [`LoadError`]: the source file could not be turned into a table. The
//!   pipeline recovers from it locally and reports it alongside an empty
//!   table, so callers can tell "no data available" apart from a failed run.
//! - [`PreprocessingError`]: dataset-structural problems (missing columns,
//!   exhausted columns, misaligned feature blocks) that abort the run.
//!
//! Errors are serializable so a dashboard front end can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a listings file into a table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("Failed to read '{}': {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// The file was read but is not a delimited table (including a 0-byte file).
    #[error("Failed to parse '{}': {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
}

impl LoadError {
    /// Path of the source that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) => path,
            Self::Unreadable { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

/// The main error type for the listing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// The source could not be loaded.
    #[error("Failed to load data: {0}")]
    Load(#[from] LoadError),

    /// Required columns are absent from the input.
    #[error("Input is missing required columns: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// A column has no parseable value left to compute a fill from.
    #[error("Column '{0}' has no parseable values")]
    EmptyColumn(String),

    /// A feature block does not line up with the table it is appended to.
    #[error("Feature block '{block}' has {actual} rows, expected {expected}")]
    RowMisalignment {
        block: String,
        expected: usize,
        actual: usize,
    },

    /// The embedding model failed or returned malformed vectors.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Load(_) => "LOAD_ERROR",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::EmptyColumn(_) => "EMPTY_COLUMN",
            Self::RowMisalignment { .. } => "ROW_MISALIGNMENT",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error means "no data available" rather than
    /// "data available but not processable".
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::Load(_) => true,
            Self::WithContext { source, .. } => source.is_no_data(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for PreprocessingError {
    fn from(e: crate::config::ConfigValidationError) -> Self {
        PreprocessingError::InvalidConfig(e.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
