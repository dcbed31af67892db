//! autopublish core library
//!
//! Shared building blocks for the publish pipeline: the error taxonomy,
//! configuration with its compiled-in defaults, tracing setup and git
//! status helpers.

pub mod config;
pub mod error;
pub mod git;
pub mod obs;
pub mod telemetry;

pub use config::{
    PublishConfig, DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_GIT_PROGRAM, DEFAULT_REMOTE,
    DEFAULT_REPO_PATH,
};
pub use error::{PublishError, Result};
pub use git::{
    approximate_change_count, capture_head_sha, is_clean, is_git_repo, parse_porcelain,
    StatusEntry,
};
pub use telemetry::init_tracing;
