//! Incremental row reconciliation.
//!
//! ## Pass
//!
//! ```text
//! rows:     [r0][r1][r2][r3]
//! results:  [h ][a ][b ]
//!
//! 1. scan rows left to right while the next result is compatible:
//!    rewrite in place (identity kept)
//! 2. first incompatibility involving a suggested index:
//!    stop rewriting, every remaining row goes stale
//! 3. leftover results are appended; rows that would overflow
//!    max_results, or whose final slot is not yet provable, start hidden
//! ```
//!
//! Stale rows stay on screen until the sweeper removes them, so a burst of
//! incremental batches never makes rows blink.

use std::sync::Arc;

use rowsync_core::{RankedResult, SuggestedIndex};

use crate::compat::{can_replace, classify, ContinuationPolicy, SearchSuggestions};
use crate::placement::final_index;
use crate::presenter::Presenter;
use crate::rows::{Row, RowList};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows rewritten in place.
    pub updated: usize,
    /// Rows newly marked stale.
    pub staled: usize,
    /// Rows appended.
    pub appended: usize,
    /// Appended rows that start hidden.
    pub hidden: usize,
    /// Existing rows hidden because they no longer fit in `max_results`.
    pub overflowed: usize,
    /// Visible span after the pass, stale rows included.
    pub visible_span: usize,
}

/// Running span of the visible rows. Once one row does not fit, no later
/// row does either.
#[derive(Debug, Clone, Copy)]
struct SpanBudget {
    max: usize,
    used: usize,
    overflowed: bool,
}

impl SpanBudget {
    fn new(max: usize) -> Self {
        Self {
            max,
            used: 0,
            overflowed: false,
        }
    }

    /// Count `span` if it still fits. Returns whether it did.
    fn admit(&mut self, span: usize) -> bool {
        let used = self.used.saturating_add(span);
        self.overflowed = self.overflowed || used > self.max;
        if !self.overflowed {
            self.used = used;
        }
        !self.overflowed
    }
}

/// Hide a visible row that the budget has no room for.
fn fit_existing<P>(row: &mut Row, budget: &mut SpanBudget, presenter: &mut P) -> bool
where
    P: Presenter + ?Sized,
{
    if !row.is_visible() || budget.admit(row.span()) {
        return false;
    }
    row.set_visible(false);
    presenter.set_row_visibility(row.id(), false);
    true
}

/// Maps incoming results onto existing rows.
#[derive(Clone)]
pub struct RowReconciler {
    max_results: usize,
    policy: Arc<dyn ContinuationPolicy>,
}

impl RowReconciler {
    /// Create a reconciler using search suggestions as continuations.
    pub fn new(max_results: usize) -> Self {
        Self::with_policy(max_results, Arc::new(SearchSuggestions))
    }

    pub fn with_policy(max_results: usize, policy: Arc<dyn ContinuationPolicy>) -> Self {
        Self {
            max_results,
            policy,
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn policy(&self) -> &dyn ContinuationPolicy {
        self.policy.as_ref()
    }

    /// Reconcile `rows` against `results`.
    ///
    /// `results` must already have heuristic exclusion and placement applied;
    /// a leading heuristic in `results` is treated as shown.
    pub fn reconcile<P>(
        &self,
        rows: &mut RowList,
        results: &[RankedResult],
        presenter: &mut P,
    ) -> ReconcileReport
    where
        P: Presenter + ?Sized,
    {
        let mut report = ReconcileReport::default();
        let mut row_index = 0;
        let mut result_index = 0;
        let mut budget = SpanBudget::new(self.max_results);
        let mut seen_misplaced = false;
        let mut seen_continuation = false;

        // There may be more rows than visible ones.
        while row_index < rows.len() && result_index < results.len() {
            let Some(row) = rows.get_mut(row_index) else {
                break;
            };
            row_index += 1;

            if !seen_misplaced {
                seen_continuation = seen_continuation
                    || (!row.result().heuristic && self.policy.is_continuation(row.result()));
                let result = &results[result_index];
                if can_replace(self.policy(), row.result(), result, seen_continuation) {
                    row.rebind(result.clone());
                    presenter.update_row(row.id(), row.result());
                    // A wider result may no longer fit.
                    if fit_existing(row, &mut budget, presenter) {
                        report.overflowed += 1;
                    }
                    report.updated += 1;
                    result_index += 1;
                    continue;
                }
                if result.has_suggested_index() || row.result().has_suggested_index() {
                    tracing::debug!(
                        "Misplaced result at row {}: {:?} cannot replace {:?}",
                        row_index - 1,
                        classify(self.policy(), result),
                        classify(self.policy(), row.result())
                    );
                    seen_misplaced = true;
                }
            }

            if fit_existing(row, &mut budget, presenter) {
                report.overflowed += 1;
            }
            if row.mark_stale() {
                presenter.mark_stale(row.id());
                report.staled += 1;
            }
        }

        // Remaining rows go stale but still count towards the visible span:
        // never more than max_results spans on screen at once.
        for row in rows.iter_mut().skip(row_index) {
            if fit_existing(row, &mut budget, presenter) {
                report.overflowed += 1;
            }
            if row.mark_stale() {
                presenter.mark_stale(row.id());
                report.staled += 1;
            }
        }

        let final_len = results.len();
        let offset = usize::from(results.first().is_some_and(|r| r.heuristic));
        for result in &results[result_index..] {
            if !seen_misplaced {
                match result.suggested_index {
                    // The group's final position is unknown until the sweep.
                    Some(SuggestedIndex::GroupRelative(_)) => seen_misplaced = true,
                    // Once stale rows are gone the list has `final_len` rows,
                    // so the result is only in place if it lands there now.
                    Some(SuggestedIndex::Absolute(requested)) => {
                        if rows.len() != final_index(requested, final_len, offset) {
                            seen_misplaced = true;
                        }
                    }
                    None => {}
                }
            }

            let mut row = Row::new(result.clone());
            presenter.create_row(row.id(), row.result());
            if seen_misplaced || !budget.admit(row.span()) {
                row.set_visible(false);
                presenter.set_row_visibility(row.id(), false);
                report.hidden += 1;
            }
            rows.push(row);
            report.appended += 1;
        }

        report.visible_span = budget.used;
        tracing::debug!(
            "Reconciled {} results: {} updated, {} staled, {} appended ({} hidden), {} overflowed",
            results.len(),
            report.updated,
            report.staled,
            report.appended,
            report.hidden,
            report.overflowed
        );
        report
    }
}

impl std::fmt::Debug for RowReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReconciler")
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
