//! Stale row sweeping.
//!
//! [`sweep`] is the synchronous pass. [`SweepTimer`] defers it: every arm
//! bumps a generation counter, so a callback from an earlier arm that wakes
//! up late sees a newer generation and does nothing.
//!
//! On a multi-threaded runtime a callback can pass that check and then block
//! on a lock while the owner re-arms. The callback therefore receives a
//! [`SweepTicket`] to check again once it holds whatever lock the owner
//! re-arms under.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::presenter::Presenter;
use crate::rows::{RowId, RowList};

/// What a sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Removed rows with their index before the sweep.
    pub removed: Vec<(usize, RowId)>,
    /// Rows that became visible.
    pub revealed: usize,
    /// Rows that stay (or became) hidden because they would overflow.
    pub hidden: usize,
    /// Visible span after the sweep.
    pub visible_span: usize,
}

impl SweepReport {
    pub fn removed_row(&self, id: RowId) -> Option<usize> {
        self.removed
            .iter()
            .find(|(_, removed)| *removed == id)
            .map(|(index, _)| *index)
    }
}

/// Remove stale rows and settle visibility.
///
/// Rows are shown in order while their cumulative span fits in
/// `max_results`; the first row that does not fit and every row after it
/// are hidden.
pub fn sweep<P>(rows: &mut RowList, max_results: usize, presenter: &mut P) -> SweepReport
where
    P: Presenter + ?Sized,
{
    let mut report = SweepReport {
        removed: rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_stale())
            .map(|(i, r)| (i, r.id()))
            .collect(),
        ..Default::default()
    };

    if !report.removed.is_empty() {
        rows.retain(|r| !r.is_stale());
        for (_, id) in &report.removed {
            presenter.remove_row(*id);
        }
    }

    let mut span: usize = 0;
    let mut overflowed = false;
    for row in rows.iter_mut() {
        let next = span.saturating_add(row.span());
        overflowed = overflowed || next > max_results;
        let visible = !overflowed;
        if visible {
            span = next;
        } else {
            report.hidden += 1;
        }
        if row.is_visible() != visible {
            row.set_visible(visible);
            presenter.set_row_visibility(row.id(), visible);
            if visible {
                report.revealed += 1;
            }
        }
    }
    report.visible_span = span;

    tracing::debug!(
        "Swept {} stale rows, revealed {}, {} left hidden",
        report.removed.len(),
        report.revealed,
        report.hidden
    );
    report
}

/// Identifies one arm of a [`SweepTimer`].
#[derive(Debug, Clone)]
pub struct SweepTicket {
    generation: Arc<AtomicU64>,
    armed: u64,
}

impl SweepTicket {
    /// Whether the timer has not been re-armed or cancelled since this arm.
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.armed
    }
}

/// One-shot deferred callback, re-armable and idempotently cancellable.
#[derive(Debug)]
pub struct SweepTimer {
    timeout: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl SweepTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            generation: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `callback` once the timeout elapses, replacing any pending arm.
    ///
    /// Returns `false` (and drops the callback) when called outside a tokio
    /// runtime.
    pub fn arm<F>(&mut self, callback: F) -> bool
    where
        F: FnOnce(SweepTicket) + Send + 'static,
    {
        self.cancel();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Sweep timer armed outside a runtime; ignoring");
            return false;
        };

        let ticket = SweepTicket {
            generation: Arc::clone(&self.generation),
            armed: self.generation.load(Ordering::SeqCst),
        };
        let timeout = self.timeout;
        self.pending = Some(handle.spawn(async move {
            tokio::time::sleep(timeout).await;
            if ticket.is_current() {
                callback(ticket);
            }
        }));
        true
    }

    /// Disarm the timer. Returns whether an arm was still pending.
    ///
    /// Safe to call any number of times, and after the timer fired.
    pub fn cancel(&mut self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        match self.pending.take() {
            Some(task) => {
                let was_pending = !task.is_finished();
                task.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SweepTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
