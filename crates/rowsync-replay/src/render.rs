//! Output formats for a finished replay.

use std::fmt::Write;

use rowsync_view::{QueryPhase, ViewSnapshot};
use serde::Serialize;

use crate::error::ReplayError;
use crate::runner::ReplayOutcome;

fn phase_name(phase: QueryPhase) -> &'static str {
    match phase {
        QueryPhase::Idle => "idle",
        QueryPhase::Streaming => "streaming",
        QueryPhase::Settled => "settled",
        QueryPhase::Cancelled => "cancelled",
    }
}

/// One line per row: selection marker, index, result and flags.
pub fn render_text(outcome: &ReplayOutcome) -> String {
    let snapshot = &outcome.snapshot;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "search {:?} ({}, {})",
        snapshot.search_string,
        phase_name(snapshot.phase),
        if snapshot.open { "open" } else { "closed" }
    );

    for (i, row) in snapshot.rows.iter().enumerate() {
        let marker = if snapshot.selected == Some(i) { '>' } else { ' ' };
        let _ = write!(out, "{} {} {}", marker, i, row.result);
        if row.heuristic {
            out.push_str(" [heuristic]");
        }
        if !row.visible {
            out.push_str(" [hidden]");
        }
        if row.stale {
            out.push_str(" [stale]");
        }
        if let Some(label) = &row.label {
            let _ = write!(out, " <{}>", label);
        }
        out.push('\n');
    }

    let _ = write!(
        out,
        "{} rows, {} visible, {} presenter ops",
        snapshot.rows.len(),
        snapshot.visible_rows().count(),
        outcome.presenter_ops
    );
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    view: &'a ViewSnapshot,
    presenter_ops: usize,
}

pub fn render_json(outcome: &ReplayOutcome) -> Result<String, ReplayError> {
    let report = JsonReport {
        view: &outcome.snapshot,
        presenter_ops: outcome.presenter_ops,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
