//! Structured tracing events for the publish run lifecycle.
//!
//! All events carry an `event = "publish.*"` field so log pipelines can
//! filter on them regardless of the human-readable message.

use tracing::{info, warn};

/// Span covering one publish run, tagged with the run id and repository.
///
/// Attach it with `tracing::Instrument` so it stays correct across awaits.
pub fn publish_span(run_id: &str, repo: &str) -> tracing::Span {
    tracing::info_span!("autopublish.run", run_id = %run_id, repo = %repo)
}

pub fn emit_run_started(run_id: &str, remote: &str, branch: &str) {
    info!(
        event = "publish.started",
        run_id = %run_id,
        remote = %remote,
        branch = %branch,
        "Starting publish"
    );
}

pub fn emit_stage_started(stage: &str) {
    info!(event = "publish.stage_started", stage = %stage, "Running {stage}");
}

/// Emit event: a stage's command returned (successfully or not).
pub fn emit_stage_finished(stage: &str, exit_code: i32, duration_ms: u64) {
    if exit_code == 0 {
        info!(
            event = "publish.stage_finished",
            stage = %stage,
            exit_code = exit_code,
            duration_ms = duration_ms,
            "Finished {stage}"
        );
    } else {
        warn!(
            event = "publish.stage_failed",
            stage = %stage,
            exit_code = exit_code,
            duration_ms = duration_ms,
            "{stage} exited with code {exit_code}"
        );
    }
}

/// Emit event: status reported changes, with the approximate count.
pub fn emit_changes_detected(approximate_count: usize) {
    info!(
        event = "publish.changes_detected",
        approximate_count = approximate_count,
        "Found changes to publish (~{approximate_count})"
    );
}

pub fn emit_nothing_to_do() {
    info!(event = "publish.nothing_to_do", "Working tree clean, nothing to publish");
}

pub fn emit_run_finished(run_id: &str, outcome: &str, duration_ms: u64) {
    info!(
        event = "publish.finished",
        run_id = %run_id,
        outcome = %outcome,
        duration_ms = duration_ms,
    );
}
