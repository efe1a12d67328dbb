//! Query identifiers and result batches.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::result::RankedResult;

/// Identifier of one query issued against the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryId(pub u64);

impl QueryId {
    /// Generate a new unique query ID.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An ordered set of results for one search string.
///
/// Sources deliver a growing sequence of batches per query; each batch
/// carries the complete ordered result list known so far, not a delta.
#[derive(Debug, Clone)]
pub struct QueryBatch {
    /// Query that produced this batch.
    pub query_id: QueryId,

    /// Search string the results answer.
    pub search_string: String,

    /// Results in rank order.
    pub results: Vec<RankedResult>,

    /// When the batch was produced.
    pub produced_at: Instant,

    /// No further batches follow for this query.
    pub is_final: bool,

    /// This is the distinguished default/top batch for an empty search string.
    pub default_results: bool,
}

impl QueryBatch {
    /// Create a non-final batch.
    pub fn new(
        query_id: QueryId,
        search_string: impl Into<String>,
        results: Vec<RankedResult>,
    ) -> Self {
        Self {
            query_id,
            search_string: search_string.into(),
            results,
            produced_at: Instant::now(),
            is_final: false,
            default_results: false,
        }
    }

    /// Mark the batch as the last one of its query.
    pub fn finished(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Mark the batch as the default/top batch.
    pub fn as_default(mut self) -> Self {
        self.default_results = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// The heuristic result, if the batch leads with one.
    pub fn heuristic(&self) -> Option<&RankedResult> {
        self.results.first().filter(|r| r.heuristic)
    }
}
