//! Display rows.
//!
//! A row is a plain value: an identity, the result it currently shows and a
//! couple of flags. Anything render-specific belongs to the presenter, keyed
//! by [`RowId`].

use bitflags::bitflags;
use rowsync_core::{GroupKey, RankedResult, ViewError};
use serde::Serialize;

/// Unique identifier for a display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RowId(pub u64);

impl RowId {
    /// Generate a new unique row ID.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

bitflags! {
    /// Per-row state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RowFlags: u8 {
        /// Not refreshed by the latest pass; pending removal.
        const STALE = 0b0000_0001;
        /// Kept out of the visible layout until the next sweep.
        const HIDDEN = 0b0000_0010;
    }
}

/// A display slot bound to one result.
#[derive(Debug, Clone)]
pub struct Row {
    id: RowId,
    result: RankedResult,
    flags: RowFlags,
    index: usize,
    label: Option<GroupKey>,
}

impl Row {
    /// Create a visible, fresh row for `result`.
    pub fn new(result: RankedResult) -> Self {
        Self {
            id: RowId::new(),
            result,
            flags: RowFlags::empty(),
            index: 0,
            label: None,
        }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn result(&self) -> &RankedResult {
        &self.result
    }

    pub fn flags(&self) -> RowFlags {
        self.flags
    }

    /// Ordinal index as of the last index pass.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> Option<&GroupKey> {
        self.label.as_ref()
    }

    /// Display units, counted whether or not the row is visible.
    pub fn span(&self) -> usize {
        self.result.span()
    }

    pub fn is_visible(&self) -> bool {
        !self.flags.contains(RowFlags::HIDDEN)
    }

    pub fn is_stale(&self) -> bool {
        self.flags.contains(RowFlags::STALE)
    }

    /// Visible and willing to take the selection.
    pub fn is_selectable(&self) -> bool {
        self.is_visible() && self.result.selectable
    }

    /// Show a new result in this row. Clears the stale bit.
    pub(crate) fn rebind(&mut self, result: RankedResult) {
        self.result = result;
        self.flags.remove(RowFlags::STALE);
    }

    /// Returns `true` if the row was not stale before.
    pub(crate) fn mark_stale(&mut self) -> bool {
        let was_stale = self.is_stale();
        self.flags.insert(RowFlags::STALE);
        !was_stale
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.flags.set(RowFlags::HIDDEN, !visible);
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn set_label(&mut self, label: Option<GroupKey>) {
        self.label = label;
    }
}

/// Ordered list of rows.
#[derive(Debug, Default)]
pub struct RowList {
    rows: Vec<Row>,
}

impl RowList {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at `index`; past the end is a bounds error.
    pub fn get(&self, index: usize) -> Result<&Row, ViewError> {
        self.rows.get(index).ok_or(ViewError::IndexOutOfBounds {
            index,
            len: self.rows.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub(crate) fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Row {
        self.rows.remove(index)
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&Row) -> bool) {
        self.rows.retain(f);
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Row> {
        self.rows.drain(..)
    }

    /// Position of the row with `id`.
    pub fn position(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    pub fn find(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Rows not hidden.
    pub fn visible(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.is_visible())
    }

    pub fn visible_count(&self) -> usize {
        self.visible().count()
    }

    /// Total span of the visible rows.
    pub fn visible_span(&self) -> usize {
        self.visible()
            .map(Row::span)
            .fold(0, usize::saturating_add)
    }
}
