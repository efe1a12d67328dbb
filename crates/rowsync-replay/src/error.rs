//! Replay errors.

use std::path::PathBuf;

use rowsync_core::{ConfigError, ViewError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    /// The script file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The script is not valid JSON or has unknown steps.
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A step was rejected by the view.
    #[error("Step {index}: {source}")]
    View { index: usize, source: ViewError },

    /// A step needs a query but none was started.
    #[error("Step {index}: no query has been started")]
    NoQuery { index: usize },
}
