//! The presentation seam.
//!
//! The view never renders anything. It drives a [`Presenter`] with row
//! operations and keeps all render-specific state out of the row model.

use rowsync_core::{GroupKey, RankedResult};
use serde::Serialize;

use crate::rows::RowId;

/// Receives row operations from the view.
pub trait Presenter: Send {
    /// A new row showing `result`, appended at the end.
    fn create_row(&mut self, row: RowId, result: &RankedResult);

    /// An existing row now shows `result`.
    fn update_row(&mut self, row: RowId, result: &RankedResult);

    /// The row is no longer backed by a current result.
    fn mark_stale(&mut self, row: RowId);

    fn remove_row(&mut self, row: RowId);

    fn set_row_visibility(&mut self, row: RowId, visible: bool);

    fn set_row_label(&mut self, row: RowId, label: Option<&GroupKey>);

    fn set_row_index(&mut self, row: RowId, index: usize);

    fn set_selected(&mut self, row: Option<RowId>);
}

/// Receives the user's pick of a row.
#[cfg_attr(test, mockall::automock)]
pub trait PickHandler: Send {
    fn picked(&mut self, row: RowId, result: &RankedResult);
}

/// A presenter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn create_row(&mut self, _row: RowId, _result: &RankedResult) {}
    fn update_row(&mut self, _row: RowId, _result: &RankedResult) {}
    fn mark_stale(&mut self, _row: RowId) {}
    fn remove_row(&mut self, _row: RowId) {}
    fn set_row_visibility(&mut self, _row: RowId, _visible: bool) {}
    fn set_row_label(&mut self, _row: RowId, _label: Option<&GroupKey>) {}
    fn set_row_index(&mut self, _row: RowId, _index: usize) {}
    fn set_selected(&mut self, _row: Option<RowId>) {}
}

/// A recorded presenter call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PresenterOp {
    CreateRow { row: RowId, result: String },
    UpdateRow { row: RowId, result: String },
    MarkStale { row: RowId },
    RemoveRow { row: RowId },
    SetVisibility { row: RowId, visible: bool },
    SetLabel { row: RowId, label: Option<String> },
    SetIndex { row: RowId, index: usize },
    SetSelected { row: Option<RowId> },
}

/// A presenter that records every call, for tests and replays.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresenter {
    ops: Vec<PresenterOp>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PresenterOp] {
        &self.ops
    }

    /// Take the recorded operations, leaving the log empty.
    pub fn take(&mut self) -> Vec<PresenterOp> {
        std::mem::take(&mut self.ops)
    }
}

impl Presenter for RecordingPresenter {
    fn create_row(&mut self, row: RowId, result: &RankedResult) {
        self.ops.push(PresenterOp::CreateRow {
            row,
            result: result.id.to_string(),
        });
    }

    fn update_row(&mut self, row: RowId, result: &RankedResult) {
        self.ops.push(PresenterOp::UpdateRow {
            row,
            result: result.id.to_string(),
        });
    }

    fn mark_stale(&mut self, row: RowId) {
        self.ops.push(PresenterOp::MarkStale { row });
    }

    fn remove_row(&mut self, row: RowId) {
        self.ops.push(PresenterOp::RemoveRow { row });
    }

    fn set_row_visibility(&mut self, row: RowId, visible: bool) {
        self.ops.push(PresenterOp::SetVisibility { row, visible });
    }

    fn set_row_label(&mut self, row: RowId, label: Option<&GroupKey>) {
        self.ops.push(PresenterOp::SetLabel {
            row,
            label: label.map(|l| l.0.clone()),
        });
    }

    fn set_row_index(&mut self, row: RowId, index: usize) {
        self.ops.push(PresenterOp::SetIndex { row, index });
    }

    fn set_selected(&mut self, row: Option<RowId>) {
        self.ops.push(PresenterOp::SetSelected { row });
    }
}
