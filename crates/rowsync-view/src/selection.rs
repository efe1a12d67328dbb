//! Selection tracking.
//!
//! Movement works over the rows that are visible and selectable, never over
//! the raw row list. The tracker only holds a [`RowId`]; callers tell the
//! presenter when it changes.

use rowsync_core::{Direction, ResultId, ViewError};

use crate::rows::{RowId, RowList};

/// The selected row, if any.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: Option<RowId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<RowId> {
        self.selected
    }

    /// Index of the selected row in the full row list.
    pub fn selected_index(&self, rows: &RowList) -> Option<usize> {
        self.selected.and_then(|id| rows.position(id))
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Select `row` directly. Hidden or unknown rows clear the selection.
    pub fn set(&mut self, rows: &RowList, row: Option<RowId>) {
        self.selected = row.filter(|&id| rows.find(id).is_some_and(|r| r.is_visible()));
    }

    /// Select the first selectable row.
    pub fn first(&mut self, rows: &RowList) -> Option<RowId> {
        self.selected = selectable(rows).first().copied();
        self.selected
    }

    /// Select the last selectable row.
    pub fn last(&mut self, rows: &RowList) -> Option<RowId> {
        self.selected = selectable(rows).last().copied();
        self.selected
    }

    pub fn next(&mut self, rows: &RowList, allow_empty: bool) -> Option<RowId> {
        self.by_offset(rows, 1, Direction::Forward, allow_empty)
    }

    pub fn previous(&mut self, rows: &RowList, allow_empty: bool) -> Option<RowId> {
        self.by_offset(rows, 1, Direction::Reverse, allow_empty)
    }

    /// Move the selection by `amount` selectable rows.
    ///
    /// With nothing selected, selects the first (forward) or last (reverse)
    /// row. Moving past an end clears the selection when `allow_empty` is
    /// set, and otherwise stays on the boundary row.
    pub fn by_offset(
        &mut self,
        rows: &RowList,
        amount: usize,
        direction: Direction,
        allow_empty: bool,
    ) -> Option<RowId> {
        let selectable = selectable(rows);
        if selectable.is_empty() {
            self.selected = None;
            return None;
        }
        let last = selectable.len() - 1;

        let current = self
            .selected
            .and_then(|id| selectable.iter().position(|&s| s == id));
        let Some(current) = current else {
            self.selected = if direction.is_reverse() {
                selectable.last().copied()
            } else {
                selectable.first().copied()
            };
            return self.selected;
        };

        let at_end = if direction.is_reverse() {
            current == 0
        } else {
            current == last
        };
        if at_end {
            if allow_empty {
                self.selected = None;
            }
            return self.selected;
        }

        let target = if direction.is_reverse() {
            current.saturating_sub(amount)
        } else {
            current.saturating_add(amount).min(last)
        };
        self.selected = Some(selectable[target]);
        self.selected
    }

    /// Select the `index`-th visible row.
    ///
    /// Out-of-range indexes are an error rather than being clamped.
    pub fn select_visible_index(
        &mut self,
        rows: &RowList,
        index: usize,
    ) -> Result<Option<RowId>, ViewError> {
        let visible: Vec<RowId> = rows.visible().map(|r| r.id()).collect();
        let id = visible.get(index).copied().ok_or(ViewError::IndexOutOfBounds {
            index,
            len: visible.len(),
        })?;
        self.selected = Some(id);
        Ok(self.selected)
    }

    /// Follow the previously selected result after a pass.
    ///
    /// If the selected row no longer shows `previous`, but another visible
    /// row does, the selection moves there. Otherwise it stays put.
    pub fn rebind_by_identity(&mut self, rows: &RowList, previous: &ResultId) -> Option<RowId> {
        let id = self.selected?;
        let Some(row) = rows.find(id) else {
            return self.selected;
        };
        if &row.result().id == previous {
            return self.selected;
        }
        if let Some(moved) = rows
            .visible()
            .find(|r| &r.result().id == previous && !r.is_stale())
        {
            tracing::debug!("Selection follows '{}' to row {:?}", previous, moved.id());
            self.selected = Some(moved.id());
        }
        self.selected
    }

    /// Rebind after the selected row at `removed_index` was removed.
    ///
    /// The selection moves to the row now at the same index. Past the end it
    /// clamps to the last selectable row, unless empty selection is allowed,
    /// in which case it clears. An empty list always clears.
    pub fn rebind_after_removal(
        &mut self,
        rows: &RowList,
        removed_index: usize,
        allow_empty: bool,
    ) -> Option<RowId> {
        if rows.is_empty() {
            self.selected = None;
            return None;
        }

        if removed_index < rows.len() {
            let after = rows.iter().skip(removed_index).find(|r| r.is_selectable());
            let before = || {
                rows.iter()
                    .take(removed_index)
                    .filter(|r| r.is_selectable())
                    .last()
            };
            self.selected = after.or_else(before).map(|r| r.id());
        } else if allow_empty {
            self.selected = None;
        } else {
            self.selected = selectable(rows).last().copied();
        }
        self.selected
    }
}

/// IDs of the visible, selectable rows in order.
fn selectable(rows: &RowList) -> Vec<RowId> {
    rows.iter()
        .filter(|r| r.is_selectable())
        .map(|r| r.id())
        .collect()
}
