//! Scripted command runner for tests.
//!
//! `ScriptedRunner` replays canned results per stage and records every
//! invocation it receives, so tests can assert on ordering and arguments
//! without touching a real repository.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use autopublish_core::{PublishError, Result};

use crate::runner::{CommandResult, CommandRunner};
use crate::stage::{PublishStage, StageConfig};

#[derive(Debug, Clone)]
enum Scripted {
    Completed(CommandResult),
    LaunchFailure(String),
}

/// In-memory runner that never spawns a process.
///
/// A stage with nothing queued returns a zero-exit result with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<PublishStage, VecDeque<Scripted>>>,
    calls: Mutex<Vec<StageConfig>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a completed result for the next invocation of `stage`.
    pub fn respond(self, stage: PublishStage, result: CommandResult) -> Self {
        self.push(stage, Scripted::Completed(result));
        self
    }

    /// Make the next invocation of `stage` fail to launch.
    pub fn fail_to_launch(self, stage: PublishStage, reason: impl Into<String>) -> Self {
        self.push(stage, Scripted::LaunchFailure(reason.into()));
        self
    }

    fn push(&self, stage: PublishStage, response: Scripted) {
        let mut responses = self.responses.lock().unwrap();
        responses.entry(stage).or_default().push_back(response);
    }

    /// Every invocation received, in order.
    pub fn calls(&self) -> Vec<StageConfig> {
        self.calls.lock().unwrap().clone()
    }

    /// Stages invoked, in order.
    pub fn invoked_stages(&self) -> Vec<PublishStage> {
        self.calls.lock().unwrap().iter().map(|c| c.stage).collect()
    }

    /// Whether `stage` was invoked at least once.
    pub fn was_invoked(&self, stage: PublishStage) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c.stage == stage)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, config: &StageConfig) -> Result<CommandResult> {
        self.calls.lock().unwrap().push(config.clone());

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&config.stage)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Scripted::Completed(result)) => Ok(result),
            Some(Scripted::LaunchFailure(reason)) => Err(PublishError::Invocation {
                stage: config.name().to_string(),
                reason,
            }),
            None => Ok(CommandResult::success("")),
        }
    }
}
