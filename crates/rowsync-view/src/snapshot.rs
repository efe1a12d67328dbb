//! Serializable view state broadcast to subscribers.

use rowsync_core::{QueryId, ResultId};
use serde::Serialize;

use crate::rows::{Row, RowId};
use crate::view::QueryPhase;

/// A row as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSnapshot {
    pub id: RowId,
    pub result: ResultId,
    pub index: usize,
    pub span: usize,
    pub visible: bool,
    pub stale: bool,
    pub heuristic: bool,
    pub selectable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl From<&Row> for RowSnapshot {
    fn from(row: &Row) -> Self {
        Self {
            id: row.id(),
            result: row.result().id.clone(),
            index: row.index(),
            span: row.span(),
            visible: row.is_visible(),
            stale: row.is_stale(),
            heuristic: row.result().heuristic,
            selectable: row.result().selectable,
            label: row.label().map(|l| l.0.clone()),
        }
    }
}

/// Whole-view state after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ViewSnapshot {
    pub query: Option<QueryId>,
    pub search_string: String,
    pub phase: QueryPhase,
    pub open: bool,
    pub rows: Vec<RowSnapshot>,
    /// Index into `rows` of the selected row.
    pub selected: Option<usize>,
}

impl ViewSnapshot {
    pub fn visible_rows(&self) -> impl Iterator<Item = &RowSnapshot> {
        self.rows.iter().filter(|r| r.visible)
    }

    pub fn selected_row(&self) -> Option<&RowSnapshot> {
        self.selected.and_then(|i| self.rows.get(i))
    }
}
