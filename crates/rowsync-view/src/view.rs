//! The result view.
//!
//! `ResultView` owns the rows and drives every component: it accepts query
//! lifecycle events, runs reconciliation passes and sweeps, tracks the
//! selection and broadcasts a [`ViewSnapshot`] after every mutation.
//!
//! ## Query lifecycle
//!
//! ```text
//! Idle --start--> Streaming --final batch / finish--> Settled
//!                     |
//!                     +--cancel / close--> Cancelled
//! ```
//!
//! Only a `Streaming` query accepts batches and sweep timer callbacks.

use std::sync::Arc;

use rowsync_core::{
    Direction, QueryBatch, QueryId, RankedResult, ResultId, ViewConfig, ViewError,
};
use serde::Serialize;
use tokio::sync::watch;

use crate::cache::ResultCache;
use crate::compat::{ContinuationPolicy, SearchSuggestions};
use crate::labels::update_indices_and_labels;
use crate::placement::prepare;
use crate::presenter::{PickHandler, Presenter};
use crate::reconcile::{ReconcileReport, RowReconciler};
use crate::rows::{Row, RowId, RowList};
use crate::selection::SelectionTracker;
use crate::snapshot::{RowSnapshot, ViewSnapshot};
use crate::sweeper::{sweep, SweepReport};

/// Lifecycle phase of the current query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    #[default]
    Idle,
    Streaming,
    Settled,
    Cancelled,
}

impl QueryPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryPhase::Settled | QueryPhase::Cancelled)
    }
}

/// Result of delivering a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A reconciliation pass ran.
    Applied(ReconcileReport),
    /// Same results as the last applied batch; nothing was written.
    Unchanged,
    /// Not for the current streaming query.
    Ignored,
}

/// The row model of one result view.
pub struct ResultView<P: Presenter> {
    config: ViewConfig,
    rows: RowList,
    reconciler: RowReconciler,
    selection: SelectionTracker,
    cache: ResultCache,
    presenter: P,

    query: Option<QueryId>,
    search_string: String,
    phase: QueryPhase,
    open: bool,
    batches_seen: usize,
    delivered: usize,
    heuristic_shown: bool,
    last_applied: Option<Vec<RankedResult>>,

    tx: watch::Sender<ViewSnapshot>,
    rx: watch::Receiver<ViewSnapshot>,
}

impl<P: Presenter> ResultView<P> {
    pub fn new(config: ViewConfig, presenter: P) -> Self {
        Self::with_policy(config, presenter, Arc::new(SearchSuggestions))
    }

    /// Create a view that treats `policy`'s results as continuations.
    ///
    /// The reconciler always takes `max_results` from `config`, so passes and
    /// sweeps agree on how much fits.
    pub fn with_policy(
        config: ViewConfig,
        presenter: P,
        policy: Arc<dyn ContinuationPolicy>,
    ) -> Self {
        let (tx, rx) = watch::channel(ViewSnapshot::default());
        Self {
            cache: ResultCache::new(config.cache_size),
            reconciler: RowReconciler::with_policy(config.max_results, policy),
            config,
            rows: RowList::new(),
            selection: SelectionTracker::new(),
            presenter,
            query: None,
            search_string: String::new(),
            phase: QueryPhase::Idle,
            open: false,
            batches_seen: 0,
            delivered: 0,
            heuristic_shown: false,
            last_applied: None,
            tx,
            rx,
        }
    }

    // =========================================================================
    // Query lifecycle
    // =========================================================================

    /// Begin streaming a new query, superseding any previous one.
    ///
    /// Existing rows stay in place so the first batch can reuse them.
    pub fn on_query_started(&mut self, id: QueryId, search: impl Into<String>) {
        self.query = Some(id);
        self.search_string = search.into();
        self.phase = QueryPhase::Streaming;
        self.open = true;
        self.batches_seen = 0;
        self.delivered = 0;
        self.last_applied = None;
        tracing::debug!("Query {:?} started for '{}'", id, self.search_string);
        self.broadcast();
    }

    /// Apply a batch of results to the rows.
    ///
    /// A final batch settles the query and sweeps immediately. The caller is
    /// responsible for scheduling [`on_sweep_timer`](Self::on_sweep_timer)
    /// while the query is still streaming.
    pub fn on_query_results(&mut self, batch: QueryBatch) -> BatchOutcome {
        if !self.accepts(batch.query_id) {
            tracing::debug!(
                "Ignoring batch of {} results for query {:?}",
                batch.len(),
                batch.query_id
            );
            return BatchOutcome::Ignored;
        }

        if self.last_applied.as_ref() == Some(&batch.results) {
            tracing::debug!("Batch for query {:?} is unchanged", batch.query_id);
            if batch.is_final {
                self.settle();
                self.broadcast();
            }
            return BatchOutcome::Unchanged;
        }

        let is_final = batch.is_final;
        let report = self.apply(batch);
        if is_final {
            self.settle();
        }
        self.broadcast();
        BatchOutcome::Applied(report)
    }

    /// The result source has nothing more for query `id`.
    pub fn on_query_finished(&mut self, id: QueryId) -> bool {
        if !self.accepts(id) {
            return false;
        }
        self.settle();
        self.broadcast();
        true
    }

    /// Abandon query `id`. Partially reconciled rows stay visible.
    pub fn on_query_cancelled(&mut self, id: QueryId) -> bool {
        if !self.accepts(id) {
            return false;
        }
        self.phase = QueryPhase::Cancelled;
        tracing::debug!("Query {:?} cancelled with {} rows", id, self.rows.len());
        self.broadcast();
        true
    }

    /// Deferred sweep for query `id`. A no-op unless `id` is still streaming.
    pub fn on_sweep_timer(&mut self, id: QueryId) -> bool {
        if !self.accepts(id) {
            tracing::debug!("Sweep timer for query {:?} fired late; ignoring", id);
            return false;
        }
        self.run_sweep();
        self.broadcast();
        true
    }

    /// Remove stale rows right away, regardless of phase.
    pub fn remove_stale_rows(&mut self) -> SweepReport {
        let report = self.run_sweep();
        self.broadcast();
        report
    }

    fn accepts(&self, id: QueryId) -> bool {
        self.open && self.phase == QueryPhase::Streaming && self.query == Some(id)
    }

    fn apply(&mut self, batch: QueryBatch) -> ReconcileReport {
        let before = self.selection.selected();
        let previous = self.selected_result().map(|r| r.id.clone());
        let first = self.batches_seen == 0;
        self.batches_seen += 1;
        self.delivered = batch.len();

        self.cache.put(batch.clone());
        let prepared = prepare(batch.results.clone(), self.config.hide_heuristic);
        self.heuristic_shown = prepared.heuristic_shown;

        if first {
            self.selection.clear();
        }

        let report = self
            .reconciler
            .reconcile(&mut self.rows, &prepared.results, &mut self.presenter);

        if let Some(previous) = previous.filter(|_| !first) {
            self.selection.rebind_by_identity(&self.rows, &previous);
        }
        if self.selection.selected().is_none() && self.heuristic_shown {
            self.selection.first(&self.rows);
        }

        self.last_applied = Some(batch.results);
        self.refresh_indices();
        self.sync_selection(before);
        report
    }

    fn refresh_indices(&mut self) {
        update_indices_and_labels(
            &mut self.rows,
            &self.search_string,
            self.config.group_labels,
            &mut self.presenter,
        );
    }

    fn settle(&mut self) {
        if self.delivered == 0 {
            tracing::debug!("Query {:?} finished without results; closing", self.query);
            self.clear_rows();
            self.open = false;
        } else {
            self.run_sweep();
        }
        self.phase = QueryPhase::Settled;
    }

    fn run_sweep(&mut self) -> SweepReport {
        let before = self.selection.selected();
        let before_index = self.selection.selected_index(&self.rows);

        let report = sweep(&mut self.rows, self.config.max_results, &mut self.presenter);

        match (before, before_index) {
            (Some(id), Some(index)) if report.removed_row(id).is_some() => {
                let allow_empty = self.allow_empty_selection();
                self.selection
                    .rebind_after_removal(&self.rows, index, allow_empty);
            }
            _ => self.selection.set(&self.rows, before),
        }

        self.refresh_indices();
        self.sync_selection(before);
        report
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Remove the row at `index` right away and return its result.
    pub fn remove_result(&mut self, index: usize) -> Result<RankedResult, ViewError> {
        let id = self.rows.get(index)?.id();
        let before = self.selection.selected();

        let row = self.rows.remove(index);
        self.presenter.remove_row(id);
        tracing::debug!("Removed result '{}' at row {}", row.result().id, index);

        if before == Some(id) {
            let allow_empty = self.allow_empty_selection();
            self.selection
                .rebind_after_removal(&self.rows, index, allow_empty);
        }
        self.last_applied = None;

        self.refresh_indices();
        self.sync_selection(before);
        self.broadcast();
        Ok(row.result().clone())
    }

    /// Replay the cached batch for `search` into the streaming query.
    ///
    /// An empty `search` replays the default batch.
    pub fn restore_cached(&mut self, search: &str) -> BatchOutcome {
        let Some(query) = self.query else {
            return BatchOutcome::Ignored;
        };
        let Some(cached) = self.cache.get(search) else {
            tracing::debug!("No cached batch for '{}'", search);
            return BatchOutcome::Ignored;
        };

        let mut batch = cached.clone();
        batch.query_id = query;
        batch.is_final = false;
        self.on_query_results(batch)
    }

    /// Stop writes for the current query and drop the selection.
    pub fn close(&mut self) {
        let before = self.selection.selected();
        self.open = false;
        if self.phase == QueryPhase::Streaming {
            self.phase = QueryPhase::Cancelled;
        }
        self.selection.clear();
        self.sync_selection(before);
        tracing::debug!("View closed with {} rows", self.rows.len());
        self.broadcast();
    }

    /// Remove every row.
    pub fn clear(&mut self) {
        self.clear_rows();
        self.broadcast();
    }

    fn clear_rows(&mut self) {
        let before = self.selection.selected();
        for row in self.rows.drain() {
            self.presenter.remove_row(row.id());
        }
        self.selection.clear();
        self.last_applied = None;
        self.heuristic_shown = false;
        self.sync_selection(before);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select_next(&mut self) -> Result<Option<RowId>, ViewError> {
        self.select_by(1, Direction::Forward)
    }

    pub fn select_previous(&mut self) -> Result<Option<RowId>, ViewError> {
        self.select_by(1, Direction::Reverse)
    }

    pub fn select_first(&mut self) -> Result<Option<RowId>, ViewError> {
        self.move_selection(|selection, rows, _| selection.first(rows))
    }

    pub fn select_last(&mut self) -> Result<Option<RowId>, ViewError> {
        self.move_selection(|selection, rows, _| selection.last(rows))
    }

    /// Move the selection by `amount` selectable rows.
    pub fn select_by(
        &mut self,
        amount: usize,
        direction: Direction,
    ) -> Result<Option<RowId>, ViewError> {
        self.move_selection(|selection, rows, allow_empty| {
            selection.by_offset(rows, amount, direction, allow_empty)
        })
    }

    /// Select the `index`-th visible row.
    pub fn select_visible_index(&mut self, index: usize) -> Result<Option<RowId>, ViewError> {
        self.ensure_open()?;
        let before = self.selection.selected();
        let selected = self.selection.select_visible_index(&self.rows, index)?;
        self.sync_selection(before);
        self.broadcast();
        Ok(selected)
    }

    pub fn clear_selection(&mut self) {
        let before = self.selection.selected();
        self.selection.clear();
        if self.sync_selection(before) {
            self.broadcast();
        }
    }

    fn move_selection<F>(&mut self, f: F) -> Result<Option<RowId>, ViewError>
    where
        F: FnOnce(&mut SelectionTracker, &RowList, bool) -> Option<RowId>,
    {
        self.ensure_open()?;
        let before = self.selection.selected();
        let allow_empty = self.allow_empty_selection();
        let selected = f(&mut self.selection, &self.rows, allow_empty);
        if self.sync_selection(before) {
            tracing::debug!(
                "Selection moved to {:?}",
                self.selection.selected_index(&self.rows)
            );
            self.broadcast();
        }
        Ok(selected)
    }

    /// Tell the presenter about a selection change. Returns whether it changed.
    fn sync_selection(&mut self, before: Option<RowId>) -> bool {
        let after = self.selection.selected();
        if after == before {
            return false;
        }
        self.presenter.set_selected(after);
        true
    }

    fn ensure_open(&self) -> Result<(), ViewError> {
        if self.open {
            Ok(())
        } else {
            Err(ViewError::NotOpen)
        }
    }

    // =========================================================================
    // Picking
    // =========================================================================

    /// Pick the `index`-th visible row and close the view.
    pub fn pick<H>(&mut self, index: usize, handler: &mut H) -> Result<RankedResult, ViewError>
    where
        H: PickHandler + ?Sized,
    {
        self.ensure_open()?;
        let visible = self.rows.visible_count();
        let row = self
            .rows
            .visible()
            .nth(index)
            .ok_or(ViewError::IndexOutOfBounds {
                index,
                len: visible,
            })?;
        let (id, result) = (row.id(), row.result().clone());
        handler.picked(id, &result);
        tracing::debug!("Picked '{}'", result.id);
        self.close();
        Ok(result)
    }

    /// Pick the selected row and close the view.
    pub fn pick_selected<H>(&mut self, handler: &mut H) -> Result<RankedResult, ViewError>
    where
        H: PickHandler + ?Sized,
    {
        self.ensure_open()?;
        let id = self.selection.selected().ok_or(ViewError::NothingSelected)?;
        let result = self
            .rows
            .find(id)
            .map(|row| row.result().clone())
            .ok_or(ViewError::NothingSelected)?;
        handler.picked(id, &result);
        tracing::debug!("Picked selected '{}'", result.id);
        self.close();
        Ok(result)
    }

    // =========================================================================
    // Read methods
    // =========================================================================

    pub fn rows(&self) -> &RowList {
        &self.rows
    }

    pub fn row_at(&self, index: usize) -> Result<&Row, ViewError> {
        self.rows.get(index)
    }

    pub fn visible_row_count(&self) -> usize {
        self.rows.visible_count()
    }

    /// Results of the visible rows, in order.
    pub fn visible_results(&self) -> Vec<&RankedResult> {
        self.rows.visible().map(Row::result).collect()
    }

    pub fn selected_row_index(&self) -> Option<usize> {
        self.selection.selected_index(&self.rows)
    }

    pub fn selected_row(&self) -> Option<RowId> {
        self.selection.selected()
    }

    pub fn selected_result(&self) -> Option<&RankedResult> {
        self.selection
            .selected()
            .and_then(|id| self.rows.find(id))
            .map(Row::result)
    }

    pub fn result_is_selected(&self, id: &ResultId) -> bool {
        self.selected_result().is_some_and(|r| &r.id == id)
    }

    /// Empty selection is allowed unless a shown heuristic leads the rows.
    pub fn allow_empty_selection(&self) -> bool {
        !self.heuristic_shown
    }

    pub fn phase(&self) -> QueryPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query_id(&self) -> Option<QueryId> {
        self.query
    }

    pub fn search_string(&self) -> &str {
        &self.search_string
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResultCache {
        &mut self.cache
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            query: self.query,
            search_string: self.search_string.clone(),
            phase: self.phase,
            open: self.open,
            rows: self.rows.iter().map(RowSnapshot::from).collect(),
            selected: self.selected_row_index(),
        }
    }

    /// Receive a snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.rx.clone()
    }

    fn broadcast(&self) {
        let _ = self.tx.send(self.snapshot());
    }
}

impl<P: Presenter> std::fmt::Debug for ResultView<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultView")
            .field("query", &self.query)
            .field("phase", &self.phase)
            .field("open", &self.open)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{MockPickHandler, NullPresenter, PresenterOp, RecordingPresenter};
    use rowsync_core::SuggestedIndex;

    fn ordinary(range: std::ops::RangeInclusive<usize>) -> Vec<RankedResult> {
        range.map(|i| RankedResult::new(format!("o{i}"))).collect()
    }

    fn view() -> ResultView<RecordingPresenter> {
        ResultView::new(ViewConfig::default(), RecordingPresenter::new())
    }

    fn start(view: &mut ResultView<impl Presenter>, search: &str) -> QueryId {
        let id = QueryId::next();
        view.on_query_started(id, search);
        id
    }

    fn visible_ids<P: Presenter>(view: &ResultView<P>) -> Vec<String> {
        view.visible_results()
            .iter()
            .map(|r| r.id.to_string())
            .collect()
    }

    /// Rows whose cumulative span fits in `max` must be exactly the visible ones.
    fn assert_visible_span_invariant<P: Presenter>(view: &ResultView<P>) {
        let max = view.config().max_results;
        let mut span = 0;
        let fitting = view
            .rows()
            .iter()
            .take_while(|r| {
                span = r.span().saturating_add(span);
                span <= max
            })
            .count();
        assert_eq!(fitting, view.visible_row_count());
    }

    #[test]
    fn test_heuristic_and_one_result() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let batch = QueryBatch::new(
            id,
            "moz",
            vec![RankedResult::heuristic("H"), RankedResult::new("R1")],
        );
        view.on_query_results(batch);

        assert_eq!(view.visible_row_count(), 2);
        assert_eq!(view.row_at(0).unwrap().result().id.as_ref(), "H");
        assert_eq!(view.row_at(1).unwrap().result().id.as_ref(), "R1");
        // The heuristic takes the selection.
        assert_eq!(view.selected_row_index(), Some(0));
        assert!(!view.allow_empty_selection());
    }

    #[test]
    fn test_suggested_last_appended_hidden_until_sweep() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let mut first = vec![RankedResult::heuristic("H")];
        first.extend(ordinary(1..=9));
        view.on_query_results(QueryBatch::new(id, "moz", first));
        assert_eq!(view.visible_row_count(), 10);

        // R1 drops out and R2 asks for the last slot.
        let mut second = vec![
            RankedResult::heuristic("H"),
            RankedResult::new("R2").with_suggested_index(SuggestedIndex::Absolute(-1)),
        ];
        second.extend(ordinary(2..=9));
        let outcome = view.on_query_results(QueryBatch::new(id, "moz", second));
        let BatchOutcome::Applied(report) = outcome else {
            panic!("expected a pass, got {outcome:?}");
        };
        assert_eq!(report.hidden, 1);
        let last = view.rows().iter().last().unwrap();
        assert_eq!(last.result().id.as_ref(), "R2");
        assert!(!last.is_visible());
        assert!(view.visible_row_count() <= 10);

        assert!(view.on_sweep_timer(id));
        assert_eq!(view.visible_row_count(), 10);
        let ids = visible_ids(&view);
        assert_eq!(ids.first().map(String::as_str), Some("H"));
        assert_eq!(ids.last().map(String::as_str), Some("R2"));
        assert_visible_span_invariant(&view);
    }

    #[test]
    fn test_suggested_zero_lands_after_heuristic() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let batch = QueryBatch::new(
            id,
            "moz",
            vec![
                RankedResult::heuristic("H"),
                RankedResult::new("a"),
                RankedResult::new("b"),
                RankedResult::new("S").with_suggested_index(SuggestedIndex::Absolute(0)),
            ],
        )
        .finished();
        view.on_query_results(batch);
        assert_eq!(visible_ids(&view), ["H", "S", "a", "b"]);
    }

    #[test]
    fn test_suggested_zero_lands_first_without_heuristic() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let batch = QueryBatch::new(
            id,
            "moz",
            vec![
                RankedResult::new("a"),
                RankedResult::new("S").with_suggested_index(SuggestedIndex::Absolute(0)),
            ],
        )
        .finished();
        view.on_query_results(batch);
        assert_eq!(visible_ids(&view), ["S", "a"]);
    }

    #[test]
    fn test_same_batch_twice_is_unchanged() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let results = vec![RankedResult::heuristic("H"), RankedResult::new("a")];
        view.on_query_results(QueryBatch::new(id, "moz", results.clone()));
        let rows: Vec<RowId> = view.rows().iter().map(|r| r.id()).collect();
        let selected = view.selected_row();
        view.presenter_mut().take();

        let outcome = view.on_query_results(QueryBatch::new(id, "moz", results));
        assert_eq!(outcome, BatchOutcome::Unchanged);
        assert!(view.presenter().ops().is_empty());
        assert_eq!(view.rows().iter().map(|r| r.id()).collect::<Vec<_>>(), rows);
        assert_eq!(view.selected_row(), selected);
    }

    #[test]
    fn test_selection_follows_result() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(
            id,
            "moz",
            vec![
                RankedResult::heuristic("H"),
                RankedResult::new("a"),
                RankedResult::new("b"),
            ],
        ));
        view.select_visible_index(2).unwrap();
        assert!(view.result_is_selected(&ResultId::from("b")));

        view.on_query_results(QueryBatch::new(
            id,
            "moz",
            vec![
                RankedResult::heuristic("H"),
                RankedResult::new("b"),
                RankedResult::new("c"),
            ],
        ));
        assert!(view.result_is_selected(&ResultId::from("b")));
        assert_eq!(view.selected_row_index(), Some(1));
    }

    #[test]
    fn test_selected_row_removed_clears_when_too_few_rows() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=4)));
        view.select_visible_index(2).unwrap();

        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)));
        // Still on the stale row until the sweep removes it.
        assert_eq!(view.selected_row_index(), Some(2));

        view.on_sweep_timer(id);
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.selected_row(), None);
    }

    #[test]
    fn test_selected_row_removed_moves_to_same_index() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=4)));
        view.select_visible_index(2).unwrap();

        view.remove_result(2).unwrap();
        assert_eq!(view.selected_row_index(), Some(2));
        assert!(view.result_is_selected(&ResultId::from("o4")));

        // Removing the last row with empty selection forbidden clamps.
        let mut view = self::view();
        let id = start(&mut view, "moz");
        let mut results = vec![RankedResult::heuristic("H")];
        results.extend(ordinary(1..=2));
        view.on_query_results(QueryBatch::new(id, "moz", results));
        view.select_last().unwrap();
        view.remove_result(2).unwrap();
        assert!(view.result_is_selected(&ResultId::from("o1")));
    }

    #[test]
    fn test_remove_result_out_of_bounds() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)));
        assert_eq!(
            view.remove_result(5),
            Err(ViewError::IndexOutOfBounds { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_stale_query_batches_ignored() {
        let mut view = view();
        let old = start(&mut view, "mo");
        let current = start(&mut view, "moz");

        let outcome = view.on_query_results(QueryBatch::new(old, "mo", ordinary(1..=2)));
        assert_eq!(outcome, BatchOutcome::Ignored);
        assert!(view.rows().is_empty());
        assert!(!view.on_sweep_timer(old));

        view.on_query_results(QueryBatch::new(current, "moz", ordinary(1..=2)));
        assert!(view.on_query_cancelled(current));
        let outcome = view.on_query_results(QueryBatch::new(current, "moz", ordinary(1..=3)));
        assert_eq!(outcome, BatchOutcome::Ignored);
        // Partial rows stay after cancel.
        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.phase(), QueryPhase::Cancelled);
    }

    #[test]
    fn test_final_batch_settles_and_sweeps() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=4)));
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)).finished());

        assert_eq!(view.phase(), QueryPhase::Settled);
        assert_eq!(view.rows().len(), 2);
        assert!(!view.on_sweep_timer(id));
    }

    #[test]
    fn test_finished_without_results_closes() {
        let mut view = view();
        let first = start(&mut view, "mo");
        view.on_query_results(QueryBatch::new(first, "mo", ordinary(1..=3)).finished());

        let id = start(&mut view, "mozzz");
        view.on_query_results(QueryBatch::new(id, "mozzz", Vec::new()));
        assert!(view.on_query_finished(id));
        assert!(view.rows().is_empty());
        assert!(!view.is_open());
        assert_eq!(view.select_next(), Err(ViewError::NotOpen));
    }

    #[test]
    fn test_hide_heuristic_allows_empty_selection() {
        let config = ViewConfig {
            hide_heuristic: true,
            ..Default::default()
        };
        let mut view = ResultView::new(config, NullPresenter);
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(
            id,
            "moz",
            vec![RankedResult::heuristic("H"), RankedResult::new("a")],
        ));
        assert_eq!(visible_ids(&view), ["a"]);
        assert!(view.allow_empty_selection());
        assert_eq!(view.selected_row(), None);
    }

    #[test]
    fn test_selection_movement_and_bounds() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=3)));

        view.select_next().unwrap();
        assert_eq!(view.selected_row_index(), Some(0));
        view.select_by(2, Direction::Forward).unwrap();
        assert_eq!(view.selected_row_index(), Some(2));
        // Past the end with no heuristic: cleared.
        assert_eq!(view.select_next().unwrap(), None);

        assert_eq!(
            view.select_visible_index(3),
            Err(ViewError::IndexOutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_presenter_sees_selection_changes() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)));
        view.presenter_mut().take();

        let row = view.select_first().unwrap();
        assert_eq!(view.presenter().ops(), [PresenterOp::SetSelected { row }]);

        // Re-selecting the same row is not an update.
        view.select_first().unwrap();
        assert_eq!(view.presenter().ops().len(), 1);
    }

    #[test]
    fn test_restore_cached_batch() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=3)).finished());
        view.clear();

        let id = start(&mut view, "moz");
        let outcome = view.restore_cached("moz");
        assert!(matches!(outcome, BatchOutcome::Applied(_)));
        assert_eq!(view.rows().len(), 3);
        assert_eq!(view.phase(), QueryPhase::Streaming);
        assert_eq!(view.query_id(), Some(id));

        assert_eq!(view.restore_cached("unknown"), BatchOutcome::Ignored);
    }

    #[test]
    fn test_restore_default_batch() {
        let mut view = view();
        let id = start(&mut view, "");
        view.on_query_results(
            QueryBatch::new(id, "", ordinary(1..=2))
                .as_default()
                .finished(),
        );
        assert!(view.cache().default_batch().is_some());

        view.clear();
        start(&mut view, "");
        view.restore_cached("");
        assert_eq!(view.rows().len(), 2);
    }

    #[test]
    fn test_labels_after_sweep() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(
            QueryBatch::new(
                id,
                "moz",
                vec![
                    RankedResult::heuristic("H").with_group("Search"),
                    RankedResult::new("a").with_group("Suggest"),
                    RankedResult::new("b").with_group("Suggest"),
                ],
            )
            .finished(),
        );
        let labels: Vec<Option<&str>> = view
            .rows()
            .iter()
            .map(|r| r.label().map(|l| l.as_ref()))
            .collect();
        assert_eq!(labels, [None, Some("Suggest"), None]);
    }

    #[test]
    fn test_overflow_respects_span_invariant() {
        let config = ViewConfig {
            max_results: 4,
            ..Default::default()
        };
        let mut view = ResultView::new(config, NullPresenter);
        let id = start(&mut view, "moz");
        let mut results = ordinary(1..=2);
        results.push(RankedResult::new("wide").with_span(3));
        results.push(RankedResult::new("o3"));
        view.on_query_results(QueryBatch::new(id, "moz", results).finished());

        assert_eq!(visible_ids(&view), ["o1", "o2"]);
        assert_visible_span_invariant(&view);
    }

    #[test]
    fn test_wider_result_in_place_keeps_span_invariant() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=10)));
        assert_eq!(view.visible_row_count(), 10);

        let mut wider = ordinary(1..=10);
        wider[1] = RankedResult::new("o2").with_span(2);
        view.on_query_results(QueryBatch::new(id, "moz", wider));

        assert_eq!(view.visible_row_count(), 9);
        assert!(view.rows().visible_span() <= 10);
        assert_visible_span_invariant(&view);

        view.on_sweep_timer(id);
        assert_visible_span_invariant(&view);
    }

    #[test]
    fn test_huge_span_result_stays_hidden() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let results = vec![
            RankedResult::new("a"),
            RankedResult::new("w").with_span(usize::MAX),
        ];
        view.on_query_results(QueryBatch::new(id, "moz", results).finished());

        assert_eq!(visible_ids(&view), ["a"]);
        assert_visible_span_invariant(&view);
    }

    #[test]
    fn test_indices_current_while_streaming() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(
            id,
            "moz",
            vec![
                RankedResult::new("a").with_group("Suggest"),
                RankedResult::new("b").with_group("Suggest"),
                RankedResult::new("c"),
            ],
        ));
        assert_eq!(view.phase(), QueryPhase::Streaming);

        let snapshot = view.snapshot();
        let indices: Vec<usize> = snapshot.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(snapshot.rows[0].label.as_deref(), Some("Suggest"));

        let second = view.rows().get(1).unwrap().id();
        assert!(view.presenter().ops().contains(&PresenterOp::SetIndex {
            row: second,
            index: 1
        }));
    }

    #[test]
    fn test_policy_view_uses_config_max_results() {
        let config = ViewConfig {
            max_results: 3,
            ..Default::default()
        };
        let policy: Arc<dyn ContinuationPolicy> =
            Arc::new(|result: &RankedResult| result.id.as_ref().starts_with('s'));
        let mut view = ResultView::with_policy(config, NullPresenter, policy);
        let id = start(&mut view, "moz");

        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=5)));
        assert_eq!(view.visible_row_count(), 3);
        view.on_sweep_timer(id);
        assert_eq!(view.visible_row_count(), 3);
        assert_visible_span_invariant(&view);
    }

    #[test]
    fn test_pick_calls_handler_and_closes() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=3)));

        let mut handler = MockPickHandler::new();
        handler
            .expect_picked()
            .withf(|_, result| result.id.as_ref() == "o2")
            .times(1)
            .return_const(());

        let picked = view.pick(1, &mut handler).unwrap();
        assert_eq!(picked.id.as_ref(), "o2");
        assert!(!view.is_open());
        assert_eq!(view.selected_row(), None);

        let mut never = MockPickHandler::new();
        never.expect_picked().never();
        assert_eq!(view.pick(0, &mut never), Err(ViewError::NotOpen));
    }

    #[test]
    fn test_pick_selected_requires_selection() {
        let mut view = view();
        let id = start(&mut view, "moz");
        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)));

        let mut handler = MockPickHandler::new();
        handler.expect_picked().never();
        assert_eq!(
            view.pick_selected(&mut handler),
            Err(ViewError::NothingSelected)
        );

        view.select_last().unwrap();
        let mut handler = MockPickHandler::new();
        handler.expect_picked().times(1).return_const(());
        let picked = view.pick_selected(&mut handler).unwrap();
        assert_eq!(picked.id.as_ref(), "o2");
    }

    #[test]
    fn test_subscribers_see_snapshots() {
        let mut view = view();
        let rx = view.subscribe();
        let id = start(&mut view, "moz");
        assert_eq!(rx.borrow().phase, QueryPhase::Streaming);

        view.on_query_results(QueryBatch::new(id, "moz", ordinary(1..=2)).finished());
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.phase, QueryPhase::Settled);
        assert_eq!(snapshot.visible_rows().count(), 2);
        assert_eq!(snapshot.query, Some(id));
    }

    #[test]
    fn test_empty_batch_on_empty_view_is_noop() {
        let mut view = view();
        let id = start(&mut view, "moz");
        let outcome = view.on_query_results(QueryBatch::new(id, "moz", Vec::new()));
        assert_eq!(outcome, BatchOutcome::Applied(ReconcileReport::default()));
        assert!(view.presenter().ops().is_empty());
    }
}
