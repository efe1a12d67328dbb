//! Async driver for a [`ResultView`].
//!
//! The controller owns the view behind a mutex and schedules the deferred
//! sweep. The timer callback only holds a weak reference to the view, so a
//! callback that outlives the controller does nothing.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rowsync_core::{QueryBatch, QueryId, ViewConfig};
use tokio::sync::watch;

use crate::presenter::Presenter;
use crate::snapshot::ViewSnapshot;
use crate::sweeper::SweepTimer;
use crate::view::{BatchOutcome, QueryPhase, ResultView};

/// Shared handle to a view plus its sweep timer.
pub struct ViewController<P: Presenter + 'static> {
    view: Arc<Mutex<ResultView<P>>>,
    timer: Mutex<SweepTimer>,
}

impl<P: Presenter + 'static> ViewController<P> {
    pub fn new(config: ViewConfig, presenter: P) -> Self {
        Self::from_view(ResultView::new(config, presenter))
    }

    pub fn from_view(view: ResultView<P>) -> Self {
        let timeout = view.config().stale_sweep_timeout();
        Self {
            view: Arc::new(Mutex::new(view)),
            timer: Mutex::new(SweepTimer::new(timeout)),
        }
    }

    /// Start a new query. The sweep timer is armed right away.
    pub fn start_query(&self, search: impl Into<String>) -> QueryId {
        let id = QueryId::next();
        let mut view = self.view.lock();
        view.on_query_started(id, search);
        self.arm(id);
        id
    }

    /// Deliver a batch, re-arming the sweep while the query keeps streaming.
    pub fn deliver(&self, batch: QueryBatch) -> BatchOutcome {
        let id = batch.query_id;
        let mut view = self.view.lock();
        let outcome = view.on_query_results(batch);
        self.after_batch(id, &outcome, view.phase());
        outcome
    }

    /// Replay the cached batch for `search` into the current query.
    pub fn restore_cached(&self, search: &str) -> BatchOutcome {
        let mut view = self.view.lock();
        let outcome = view.restore_cached(search);
        if let Some(id) = view.query_id() {
            self.after_batch(id, &outcome, view.phase());
        }
        outcome
    }

    // Called with the view locked, so a timer callback blocked on that lock
    // sees the new generation once it gets in.
    fn after_batch(&self, id: QueryId, outcome: &BatchOutcome, phase: QueryPhase) {
        match (outcome, phase) {
            (BatchOutcome::Ignored, _) => {}
            (_, QueryPhase::Streaming) => self.arm(id),
            _ => {
                self.timer.lock().cancel();
            }
        }
    }

    /// No more batches for `id`; sweeps immediately.
    pub fn finish(&self, id: QueryId) -> bool {
        self.timer.lock().cancel();
        self.view.lock().on_query_finished(id)
    }

    /// Abandon query `id`.
    pub fn cancel(&self, id: QueryId) -> bool {
        self.timer.lock().cancel();
        self.view.lock().on_query_cancelled(id)
    }

    pub fn close(&self) {
        self.timer.lock().cancel();
        self.view.lock().close();
    }

    /// Disarm the timer and close the view. Safe to call repeatedly.
    pub fn teardown(&self) {
        let was_armed = self.timer.lock().cancel();
        let mut view = self.view.lock();
        if view.is_open() {
            view.close();
        }
        tracing::debug!("View torn down (sweep pending: {})", was_armed);
    }

    pub fn sweep_pending(&self) -> bool {
        self.timer.lock().is_armed()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.view.lock().subscribe()
    }

    /// Lock the view for reads or direct operations like selection.
    pub fn view(&self) -> MutexGuard<'_, ResultView<P>> {
        self.view.lock()
    }

    fn arm(&self, id: QueryId) {
        let view = Arc::downgrade(&self.view);
        self.timer.lock().arm(move |ticket| {
            let Some(view) = view.upgrade() else {
                return;
            };
            let mut view = view.lock();
            if ticket.is_current() {
                view.on_sweep_timer(id);
            } else {
                tracing::debug!("Sweep for query {:?} superseded while waiting", id);
            }
        });
    }
}

impl<P: Presenter + 'static> std::fmt::Debug for ViewController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("view", &*self.view.lock())
            .finish_non_exhaustive()
    }
}
