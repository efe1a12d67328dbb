//! Core types for the rowsync result view.
//!
//! This crate contains the plain data shared by the view engine and its
//! drivers:
//! - Ranked results and query batches
//! - Selection direction
//! - Configuration types
//! - Error types

mod batch;
mod config;
mod error;
mod result;
mod selection;

pub use batch::{QueryBatch, QueryId};
pub use config::{config_dir, config_path, ViewConfig};
pub use error::{ConfigError, ViewError};
pub use result::{GroupKey, RankedResult, ResultId, ResultKind, SuggestedIndex};
pub use selection::Direction;
