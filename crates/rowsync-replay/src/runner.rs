//! Drives a view controller through a script.

use std::time::Duration;

use rowsync_core::{Direction, QueryBatch, QueryId, ViewConfig};
use rowsync_view::{BatchOutcome, RecordingPresenter, ViewController, ViewSnapshot};

use crate::error::ReplayError;
use crate::script::{Script, Step};

/// Final state of a replay.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub snapshot: ViewSnapshot,
    /// Number of presenter operations issued over the whole run.
    pub presenter_ops: usize,
}

/// Run every step of `script` against a fresh view.
pub async fn run(script: &Script, config: ViewConfig) -> Result<ReplayOutcome, ReplayError> {
    let controller = ViewController::new(config, RecordingPresenter::new());
    let mut query: Option<QueryId> = None;

    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!("Step {}: {:?}", index, step);
        let view_err = |source| ReplayError::View { index, source };

        match step {
            Step::Start { search } => {
                let id = controller.start_query(search.as_str());
                tracing::info!("Started query {:?} for '{}'", id, search);
                query = Some(id);
            }
            Step::Results {
                results,
                is_final,
                default,
            } => {
                let id = query.ok_or(ReplayError::NoQuery { index })?;
                let search = controller.view().search_string().to_string();
                let mut batch = QueryBatch::new(id, search, results.clone());
                if *is_final {
                    batch = batch.finished();
                }
                if *default {
                    batch = batch.as_default();
                }
                log_outcome(index, &controller.deliver(batch));
            }
            Step::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            Step::Select { by, reverse } => {
                controller
                    .view()
                    .select_by(*by, Direction::from_reverse(*reverse))
                    .map_err(view_err)?;
            }
            Step::SelectIndex { index: visible } => {
                controller
                    .view()
                    .select_visible_index(*visible)
                    .map_err(view_err)?;
            }
            Step::Remove { index: row } => {
                let removed = controller.view().remove_result(*row).map_err(view_err)?;
                tracing::info!("Removed '{}'", removed.id);
            }
            Step::Restore { search } => {
                log_outcome(index, &controller.restore_cached(search));
            }
            Step::Finish => {
                let id = query.ok_or(ReplayError::NoQuery { index })?;
                controller.finish(id);
            }
            Step::Cancel => {
                let id = query.ok_or(ReplayError::NoQuery { index })?;
                controller.cancel(id);
            }
            Step::Close => controller.close(),
        }
    }

    let outcome = {
        let view = controller.view();
        ReplayOutcome {
            snapshot: view.snapshot(),
            presenter_ops: view.presenter().ops().len(),
        }
    };
    controller.teardown();
    tracing::info!(
        "Replayed {} steps: {} rows, {} presenter ops",
        script.steps.len(),
        outcome.snapshot.rows.len(),
        outcome.presenter_ops
    );
    Ok(outcome)
}

fn log_outcome(index: usize, outcome: &BatchOutcome) {
    match outcome {
        BatchOutcome::Applied(report) => tracing::debug!("Step {}: {:?}", index, report),
        BatchOutcome::Unchanged => tracing::debug!("Step {}: batch unchanged", index),
        BatchOutcome::Ignored => tracing::warn!("Step {}: batch ignored", index),
    }
}
