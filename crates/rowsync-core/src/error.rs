//! Error types for the rowsync view.

use thiserror::Error;

/// View errors - surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    /// A row or selection index past the end of the list.
    #[error("Index {index} is out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Selection or picking while the view is closed.
    #[error("Cannot select a row while the view is closed")]
    NotOpen,

    /// Picking the selection when nothing is selected.
    #[error("No row is selected")]
    NothingSelected,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value outside its allowed range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}
