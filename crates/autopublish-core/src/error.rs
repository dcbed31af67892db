//! Error taxonomy for the publish workflow.

/// Errors produced while publishing a working tree.
///
/// Every variant is fatal to the pipeline run; none of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("status query failed (exit code {exit_code}): {}", detail(.stderr, ""))]
    StatusQuery { exit_code: i32, stderr: String },

    #[error("staging changes failed (exit code {exit_code}): {}", detail(.stderr, ""))]
    Stage { exit_code: i32, stderr: String },

    #[error("commit failed (exit code {exit_code}): {}", detail(.stderr, .stdout))]
    Commit {
        exit_code: i32,
        stderr: String,
        stdout: String,
    },

    #[error("push failed (exit code {exit_code}): {}", detail(.stderr, .stdout))]
    Push {
        exit_code: i32,
        stderr: String,
        stdout: String,
    },

    #[error("could not launch {stage} command: {reason}")]
    Invocation { stage: String, reason: String },

    #[error("invalid publish configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Name of the pipeline stage this error aborted, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PublishError::StatusQuery { .. } => Some("status"),
            PublishError::Stage { .. } => Some("stage"),
            PublishError::Commit { .. } => Some("commit"),
            PublishError::Push { .. } => Some("push"),
            PublishError::Invocation { stage, .. } => Some(stage.as_str()),
            PublishError::InvalidConfig(_) | PublishError::Io(_) => None,
        }
    }
}

/// Join the captured streams, skipping empty ones. git writes some
/// rejections ("nothing to commit", push hints) to stdout.
fn detail(stderr: &str, stdout: &str) -> String {
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    match (stderr.is_empty(), stdout.is_empty()) {
        (false, false) => format!("{stderr}\n{stdout}"),
        (false, true) => stderr.to_string(),
        (true, false) => stdout.to_string(),
        (true, true) => "<no output>".to_string(),
    }
}

/// Result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;
