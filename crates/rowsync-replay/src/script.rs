//! Replay scripts.
//!
//! A script is a JSON document with an optional view config and a list of
//! steps:
//!
//! ```json
//! {
//!   "config": { "max_results": 5 },
//!   "steps": [
//!     { "op": "start", "search": "moz" },
//!     { "op": "results", "results": [{ "id": "h", "heuristic": true }] },
//!     { "op": "wait", "ms": 500 },
//!     { "op": "select", "by": 1 },
//!     { "op": "finish" }
//!   ]
//! }
//! ```

use std::path::Path;

use rowsync_core::{RankedResult, ViewConfig};
use serde::Deserialize;

use crate::error::ReplayError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub config: Option<ViewConfig>,
    pub steps: Vec<Step>,
}

/// One scripted event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Start a new query.
    Start { search: String },

    /// Deliver a batch to the current query.
    Results {
        results: Vec<RankedResult>,
        #[serde(default, rename = "final")]
        is_final: bool,
        #[serde(default)]
        default: bool,
    },

    /// Let time pass, so pending sweeps can fire.
    Wait { ms: u64 },

    /// Move the selection.
    Select {
        #[serde(default = "default_amount")]
        by: usize,
        #[serde(default)]
        reverse: bool,
    },

    SelectIndex { index: usize },

    Remove { index: usize },

    /// Replay a cached batch into the current query.
    Restore { search: String },

    Finish,
    Cancel,
    Close,
}

fn default_amount() -> usize {
    1
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
