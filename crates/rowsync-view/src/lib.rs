//! Incremental result-row reconciliation.
//!
//! This crate keeps a bounded list of display rows in sync with a stream of
//! ranked result batches:
//! - `RowReconciler` rewrites rows in place and appends what is new
//! - `SelectionTracker` keeps the selection on the same result
//! - `sweep` / `SweepTimer` remove stale rows once the layout settles
//! - `ResultCache` replays recent batches for re-issued queries
//! - `ResultView` ties them together; `ViewController` adds the timer
//!
//! Rendering is left to a [`Presenter`].

mod cache;
mod compat;
mod controller;
mod labels;
mod placement;
mod presenter;
mod reconcile;
mod rows;
mod selection;
mod snapshot;
mod sweeper;
mod view;

pub use cache::ResultCache;
pub use compat::{can_replace, classify, CompatibilityClass, ContinuationPolicy, SearchSuggestions};
pub use controller::ViewController;
pub use labels::update_indices_and_labels;
pub use placement::{final_index, place_suggested, prepare, PreparedBatch};
pub use presenter::{NullPresenter, PickHandler, Presenter, PresenterOp, RecordingPresenter};
pub use reconcile::{ReconcileReport, RowReconciler};
pub use rows::{Row, RowFlags, RowId, RowList};
pub use selection::SelectionTracker;
pub use snapshot::{RowSnapshot, ViewSnapshot};
pub use sweeper::{sweep, SweepReport, SweepTicket, SweepTimer};
pub use view::{BatchOutcome, QueryPhase, ResultView};
