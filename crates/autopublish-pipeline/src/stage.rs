//! Publish stage definitions and configuration.

use std::path::PathBuf;

use autopublish_core::PublishConfig;
use serde::{Deserialize, Serialize};

/// The four stages of a publish, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PublishStage {
    /// git status --porcelain
    Status,

    /// git add -A
    Stage,

    /// git commit -m <message>
    Commit,

    /// git push <remote> <branch>
    Push,
}

impl PublishStage {
    /// Every stage in the order the pipeline runs them.
    pub const SEQUENCE: [PublishStage; 4] = [
        PublishStage::Status,
        PublishStage::Stage,
        PublishStage::Commit,
        PublishStage::Push,
    ];

    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            PublishStage::Status => "status",
            PublishStage::Stage => "stage",
            PublishStage::Commit => "commit",
            PublishStage::Push => "push",
        }
    }

    /// Build the stage's argument vector (first element is the executable).
    pub fn command(&self, config: &PublishConfig) -> Vec<String> {
        let git = config.git_program.clone();
        match self {
            PublishStage::Status => {
                vec![git, "status".to_string(), "--porcelain".to_string()]
            }
            PublishStage::Stage => vec![git, "add".to_string(), "-A".to_string()],
            PublishStage::Commit => vec![
                git,
                "commit".to_string(),
                "-m".to_string(),
                config.commit_message.clone(),
            ],
            PublishStage::Push => vec![
                git,
                "push".to_string(),
                config.remote.clone(),
                config.branch.clone(),
            ],
        }
    }
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage bound to a concrete invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageConfig {
    /// Which stage this invocation belongs to.
    pub stage: PublishStage,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Directory the command runs in.
    pub working_dir: PathBuf,
}

impl StageConfig {
    /// Build the invocation for `stage` against the configured repository.
    pub fn for_stage(stage: PublishStage, config: &PublishConfig) -> Self {
        Self {
            stage,
            command: stage.command(config),
            working_dir: config.repo_path.clone(),
        }
    }

    /// Create a stage invocation with an arbitrary command.
    pub fn custom(stage: PublishStage, command: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            stage,
            command,
            working_dir,
        }
    }

    pub fn name(&self) -> &'static str {
        self.stage.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(PublishStage::Status.name(), "status");
        assert_eq!(PublishStage::Stage.name(), "stage");
        assert_eq!(PublishStage::Commit.name(), "commit");
        assert_eq!(PublishStage::Push.name(), "push");
        assert_eq!(PublishStage::Push.to_string(), "push");
    }

    #[test]
    fn test_sequence_order() {
        let names: Vec<_> = PublishStage::SEQUENCE.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["status", "stage", "commit", "push"]);
    }

    #[test]
    fn test_stage_commands() {
        let config = PublishConfig::default();

        assert_eq!(
            PublishStage::Status.command(&config),
            ["git", "status", "--porcelain"]
        );
        assert_eq!(PublishStage::Stage.command(&config), ["git", "add", "-A"]);
        assert_eq!(
            PublishStage::Push.command(&config),
            ["git", "push", "origin", "main"]
        );
    }

    #[test]
    fn test_commit_message_is_single_argument() {
        let config = PublishConfig::default().with_commit_message("line one\n\nline; rm -rf /");
        let cmd = PublishStage::Commit.command(&config);
        assert_eq!(cmd.len(), 4);
        assert_eq!(cmd[3], "line one\n\nline; rm -rf /");
    }

    #[test]
    fn test_stage_config_uses_repo_path() {
        let config = PublishConfig::default()
            .with_repo_path("/srv/site")
            .with_git_program("/opt/git/bin/git");
        let stage = StageConfig::for_stage(PublishStage::Stage, &config);
        assert_eq!(stage.working_dir, PathBuf::from("/srv/site"));
        assert_eq!(stage.command[0], "/opt/git/bin/git");
        assert_eq!(stage.name(), "stage");
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let json = serde_json::to_string(&PublishStage::Commit).unwrap();
        assert_eq!(json, "\"commit\"");
    }
}
