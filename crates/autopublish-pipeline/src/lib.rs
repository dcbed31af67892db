//! autopublish pipeline
//!
//! Publishes a working tree in four fail-fast steps:
//! - `git status --porcelain` (a clean tree ends the run successfully)
//! - `git add -A`
//! - `git commit -m <fixed message>`
//! - `git push <remote> <branch>`

pub mod fakes;
pub mod pipeline;
pub mod runner;
pub mod stage;

// Re-export key types
pub use fakes::ScriptedRunner;
pub use pipeline::{PipelineOutcome, PipelineReport, PipelineState, PublishPipeline, StageInvocation};
pub use runner::{CommandResult, CommandRunner, SystemRunner};
pub use stage::{PublishStage, StageConfig};
