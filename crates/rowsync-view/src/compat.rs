//! Row/result compatibility.
//!
//! Decides whether a row that currently shows one result can be rewritten in
//! place with another without visible jank.

use rowsync_core::{RankedResult, SuggestedIndex};

/// Decides which results continue a run of rows.
///
/// Continuations may replace ordinary rows once a continuation has been seen
/// earlier in the same scan, never the other way around.
pub trait ContinuationPolicy: Send + Sync {
    fn is_continuation(&self, result: &RankedResult) -> bool;
}

/// Search suggestions continue each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchSuggestions;

impl ContinuationPolicy for SearchSuggestions {
    fn is_continuation(&self, result: &RankedResult) -> bool {
        result.kind.is_search_suggestion()
    }
}

impl<F> ContinuationPolicy for F
where
    F: Fn(&RankedResult) -> bool + Send + Sync,
{
    fn is_continuation(&self, result: &RankedResult) -> bool {
        self(result)
    }
}

/// Placement class of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityClass {
    Heuristic,
    Suggested(SuggestedIndex),
    Ordinary,
    Continuation,
}

/// Classify a result under `policy`.
pub fn classify(policy: &dyn ContinuationPolicy, result: &RankedResult) -> CompatibilityClass {
    if result.heuristic {
        CompatibilityClass::Heuristic
    } else if let Some(index) = result.suggested_index {
        CompatibilityClass::Suggested(index)
    } else if policy.is_continuation(result) {
        CompatibilityClass::Continuation
    } else {
        CompatibilityClass::Ordinary
    }
}

/// Whether a row showing `current` can be rewritten to show `incoming`.
///
/// `seen_continuation` is true once the scan has passed a non-heuristic row
/// holding a continuation.
pub fn can_replace(
    policy: &dyn ContinuationPolicy,
    current: &RankedResult,
    incoming: &RankedResult,
    seen_continuation: bool,
) -> bool {
    // The heuristic must always be current.
    if incoming.heuristic {
        return true;
    }
    // Covers both a presence mismatch and differing requests.
    if current.suggested_index != incoming.suggested_index {
        return false;
    }
    let incoming_continues = policy.is_continuation(incoming);
    if incoming_continues == policy.is_continuation(current) {
        return true;
    }
    incoming_continues && seen_continuation
}
