//! Publish pipeline orchestration.
//!
//! Runs status → stage → commit → push, one blocking step at a time. The
//! first failing step ends the run; nothing is retried or rolled back.

use std::sync::Arc;
use std::time::Instant;

use autopublish_core::git::{approximate_change_count, is_clean, parse_porcelain};
use autopublish_core::{obs, PublishConfig, PublishError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::runner::{CommandResult, CommandRunner};
use crate::stage::{PublishStage, StageConfig};

/// Where a pipeline run currently stands.
///
/// Transitions only move forward. `NothingToDo`, `Pushed` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    CheckedStatus,
    Staged,
    Committed,
    Pushed,
    NothingToDo,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Pushed | PipelineState::NothingToDo | PipelineState::Failed
        )
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::{CheckedStatus, Committed, Failed, Idle, NothingToDo, Pushed, Staged};
        match (self, next) {
            (s, Failed) => !s.is_terminal(),
            (Idle, CheckedStatus) => true,
            (CheckedStatus, NothingToDo | Staged) => true,
            (Staged, Committed) => true,
            (Committed, Pushed) => true,
            _ => false,
        }
    }
}

/// Terminal result of a run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All four stages succeeded.
    Published,

    /// Status was clean; no later stage ran.
    NothingToDo,

    /// The first failing stage's error, verbatim.
    Failed(PublishError),
}

impl PipelineOutcome {
    /// Process exit code: 0 for success or no-op, 1 for any failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineOutcome::Published | PipelineOutcome::NothingToDo => 0,
            PipelineOutcome::Failed(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }

    pub fn error(&self) -> Option<&PublishError> {
        match self {
            PipelineOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::Published => "published",
            PipelineOutcome::NothingToDo => "nothing_to_do",
            PipelineOutcome::Failed(_) => "failed",
        }
    }
}

/// One external invocation made during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageInvocation {
    pub stage: PublishStage,

    /// Argument vector as passed to the runner.
    pub command: Vec<String>,

    /// Present when the command ran to completion.
    pub result: Option<CommandResult>,

    /// Present when the command could not be launched.
    pub launch_error: Option<String>,
}

/// Everything observed during a single run.
#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: PipelineOutcome,
    pub final_state: PipelineState,

    /// Display-only size of the status listing, see
    /// [`approximate_change_count`]. Zero when status was clean or failed.
    pub approximate_change_count: usize,

    pub invocations: Vec<StageInvocation>,

    /// SHA-256 hex of the commit message configured for this run.
    pub message_digest: String,
}

impl PipelineReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    /// Stages that were invoked, in order.
    pub fn invoked_stages(&self) -> Vec<PublishStage> {
        self.invocations.iter().map(|i| i.stage).collect()
    }

    /// Machine-readable form of the report.
    pub fn to_json(&self) -> Value {
        json!({
            "run_id": self.run_id,
            "started_at": self.started_at,
            "duration_ms": self.duration_ms,
            "outcome": self.outcome.label(),
            "exit_code": self.exit_code(),
            "final_state": self.final_state,
            "failed_stage": self.outcome.error().and_then(|e| e.stage()),
            "error": self.outcome.error().map(|e| e.to_string()),
            "approximate_change_count": self.approximate_change_count,
            "invocations": &self.invocations,
            "message_digest": &self.message_digest,
        })
    }
}

/// Mutable bookkeeping for one run.
struct RunProgress {
    state: PipelineState,
    invocations: Vec<StageInvocation>,
    change_count: usize,
}

impl RunProgress {
    fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            invocations: Vec::new(),
            change_count: 0,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Pipeline state transition");
        self.state = next;
    }
}

/// Status/stage/commit/push pipeline over a single repository.
pub struct PublishPipeline {
    config: PublishConfig,
    runner: Arc<dyn CommandRunner>,
}

impl PublishPipeline {
    pub fn new(config: PublishConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Run the pipeline once.
    ///
    /// Never returns an error: every failure is folded into
    /// [`PipelineOutcome::Failed`] on the report.
    pub async fn run(&self) -> PipelineReport {
        let start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();

        let span = obs::publish_span(&run_id_str, &self.config.repo_path.to_string_lossy());
        span.in_scope(|| {
            obs::emit_run_started(&run_id_str, &self.config.remote, &self.config.branch)
        });

        let mut progress = RunProgress::new();
        let result = self.execute(&mut progress).instrument(span.clone()).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let _entered = span.enter();
                progress.advance(PipelineState::Failed);
                tracing::error!(stage = ?e.stage(), error = %e, "Publish failed");
                PipelineOutcome::Failed(e)
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        span.in_scope(|| obs::emit_run_finished(&run_id_str, outcome.label(), duration_ms));

        PipelineReport {
            run_id,
            started_at,
            duration_ms,
            outcome,
            final_state: progress.state,
            approximate_change_count: progress.change_count,
            invocations: progress.invocations,
            message_digest: self.config.message_digest(),
        }
    }

    async fn execute(&self, progress: &mut RunProgress) -> Result<PipelineOutcome> {
        self.config.validate()?;

        let status = self.invoke(PublishStage::Status, progress).await?;
        if !status.succeeded() {
            return Err(PublishError::StatusQuery {
                exit_code: status.exit_code,
                stderr: status.stderr,
            });
        }
        progress.advance(PipelineState::CheckedStatus);

        if is_clean(&status.stdout) {
            obs::emit_nothing_to_do();
            progress.advance(PipelineState::NothingToDo);
            return Ok(PipelineOutcome::NothingToDo);
        }

        progress.change_count = approximate_change_count(&status.stdout);
        obs::emit_changes_detected(progress.change_count);
        for entry in parse_porcelain(&status.stdout) {
            debug!(code = %entry.code, path = %entry.path, "Pending change");
        }

        let staged = self.invoke(PublishStage::Stage, progress).await?;
        if !staged.succeeded() {
            return Err(PublishError::Stage {
                exit_code: staged.exit_code,
                stderr: staged.stderr,
            });
        }
        progress.advance(PipelineState::Staged);

        let committed = self.invoke(PublishStage::Commit, progress).await?;
        if !committed.succeeded() {
            return Err(PublishError::Commit {
                exit_code: committed.exit_code,
                stderr: committed.stderr,
                stdout: committed.stdout,
            });
        }
        progress.advance(PipelineState::Committed);

        let pushed = self.invoke(PublishStage::Push, progress).await?;
        if !pushed.succeeded() {
            return Err(PublishError::Push {
                exit_code: pushed.exit_code,
                stderr: pushed.stderr,
                stdout: pushed.stdout,
            });
        }
        progress.advance(PipelineState::Pushed);

        Ok(PipelineOutcome::Published)
    }

    /// Run one stage and record the invocation, whatever its result.
    async fn invoke(
        &self,
        stage: PublishStage,
        progress: &mut RunProgress,
    ) -> Result<CommandResult> {
        let config = StageConfig::for_stage(stage, &self.config);
        obs::emit_stage_started(stage.name());

        match self.runner.run(&config).await {
            Ok(result) => {
                obs::emit_stage_finished(stage.name(), result.exit_code, result.duration_ms);
                progress.invocations.push(StageInvocation {
                    stage,
                    command: config.command,
                    result: Some(result.clone()),
                    launch_error: None,
                });
                Ok(result)
            }
            Err(e) => {
                progress.invocations.push(StageInvocation {
                    stage,
                    command: config.command,
                    result: None,
                    launch_error: Some(e.to_string()),
                });
                Err(e)
            }
        }
    }
}
