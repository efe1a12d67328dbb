//! Placement of suggested-index results.
//!
//! Absolute suggested indexes are resolved against the final length of the
//! batch. Requests that point outside the batch are clamped rather than
//! rejected, because counts are only exact once the layout settles.

use rowsync_core::{RankedResult, SuggestedIndex};

/// Final index of an absolute request in a list of `len` results.
///
/// `offset` is the number of leading slots reserved for a shown heuristic;
/// non-negative requests count from after them.
pub fn final_index(requested: i32, len: usize, offset: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let last = len - 1;
    let offset = offset.min(last);
    if requested >= 0 {
        (offset + requested as usize).min(last)
    } else {
        let from_end = requested.unsigned_abs() as usize;
        len.saturating_sub(from_end).max(offset)
    }
}

/// Batch prepared for reconciliation.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    /// Results to reconcile, in display order.
    pub results: Vec<RankedResult>,

    /// The batch's heuristic, whether shown or not.
    pub heuristic: Option<RankedResult>,

    /// Whether the heuristic leads `results`.
    pub heuristic_shown: bool,
}

/// Apply heuristic exclusion and suggested-index placement.
///
/// Only a heuristic in first position is honored; a heuristic flag anywhere
/// else is dropped. When `hide_heuristic` is set, a leading heuristic that is
/// not a tip is removed from the results.
pub fn prepare(mut results: Vec<RankedResult>, hide_heuristic: bool) -> PreparedBatch {
    for (i, result) in results.iter_mut().enumerate().skip(1) {
        if result.heuristic {
            tracing::warn!(
                "Demoting heuristic result '{}' found at position {}",
                result.id,
                i
            );
            result.heuristic = false;
        }
    }

    let heuristic = results.first().filter(|r| r.heuristic).cloned();
    let heuristic_shown = match &heuristic {
        Some(h) => !hide_heuristic || matches!(h.kind, rowsync_core::ResultKind::Tip),
        None => false,
    };
    if heuristic.is_some() && !heuristic_shown {
        results.remove(0);
    }

    let offset = usize::from(heuristic_shown);
    PreparedBatch {
        results: place_suggested(results, offset),
        heuristic,
        heuristic_shown,
    }
}

/// Move absolute suggested-index results to their final slots.
///
/// Everything else keeps its relative order. When two requests resolve to the
/// same slot, the later one takes the nearest free slot after it, or before it
/// if none is free.
pub fn place_suggested(results: Vec<RankedResult>, offset: usize) -> Vec<RankedResult> {
    let len = results.len();
    if !results
        .iter()
        .any(|r| matches!(r.suggested_index, Some(SuggestedIndex::Absolute(_))))
    {
        return results;
    }

    let mut slots: Vec<Option<RankedResult>> = vec![None; len];
    let mut rest = Vec::with_capacity(len);
    let reserved = offset.min(len);

    for (i, result) in results.into_iter().enumerate() {
        if i < reserved {
            slots[i] = Some(result);
            continue;
        }
        match result.suggested_index {
            Some(SuggestedIndex::Absolute(requested)) => {
                let target = final_index(requested, len, reserved);
                let slot = (target..len)
                    .chain((reserved..target).rev())
                    .find(|&s| slots[s].is_none());
                match slot {
                    Some(s) => slots[s] = Some(result),
                    None => rest.push(result),
                }
            }
            _ => rest.push(result),
        }
    }

    let mut rest = rest.into_iter();
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect()
}
