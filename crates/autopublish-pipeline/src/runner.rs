//! Command invocation for publish stages.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use autopublish_core::{PublishError, Result};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::stage::StageConfig;

/// Outcome of one external invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code (0 = success, -1 = terminated without a code).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandResult {
    /// A zero-exit result with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
        }
    }

    /// A failing result with the given exit code and stderr.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 0,
        }
    }

    /// Whether the command exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes stage invocations.
///
/// `Ok` means the process ran to completion, whatever its exit code. `Err`
/// is reserved for commands that could not be launched at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, config: &StageConfig) -> Result<CommandResult>;
}

/// Runs stage commands as real child processes.
///
/// There is no timeout: a hung git process hangs the publish.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, config: &StageConfig) -> Result<CommandResult> {
        let start = Instant::now();

        let (exe, args) = config
            .command
            .split_first()
            .ok_or_else(|| PublishError::Invocation {
                stage: config.name().to_string(),
                reason: "empty command".to_string(),
            })?;

        let output = Command::new(exe)
            .args(args)
            .current_dir(&config.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PublishError::Invocation {
                stage: config.name().to_string(),
                reason: format!("{exe}: {e}"),
            })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
