//! Publish configuration.
//!
//! The defaults are compiled-in constants; alternatives are injected through
//! the `with_*` builders when the pipeline is constructed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PublishError, Result};

/// Repository the pipeline publishes when no override is given.
pub const DEFAULT_REPO_PATH: &str = ".";

/// Remote that receives the push.
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch that receives the push.
pub const DEFAULT_BRANCH: &str = "main";

/// Executable used for every stage.
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Commit message bound to every published batch.
///
/// Independent of the diff content: two runs always commit the same bytes.
pub const DEFAULT_COMMIT_MESSAGE: &str = "\
chore: publish generated content batch

Automated publish of a batch of generated changes.

- Regenerated content files produced by the content pipeline
- Updated scheduling metadata for generated jobs
- Refreshed data consumed by the reporting dashboard

Published by autopublish.";

/// Configuration consumed once at pipeline construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishConfig {
    /// Working directory of every git invocation.
    pub repo_path: PathBuf,

    /// Remote name passed to `git push`.
    pub remote: String,

    /// Branch name passed to `git push`.
    pub branch: String,

    /// Message passed verbatim to `git commit -m`.
    pub commit_message: String,

    /// Executable invoked for every stage.
    pub git_program: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from(DEFAULT_REPO_PATH),
            remote: DEFAULT_REMOTE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
        }
    }
}

impl PublishConfig {
    pub fn with_repo_path(mut self, repo_path: impl Into<PathBuf>) -> Self {
        self.repo_path = repo_path.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_git_program(mut self, program: impl Into<String>) -> Self {
        self.git_program = program.into();
        self
    }

    /// Reject configurations that could never produce a valid invocation.
    ///
    /// The commit message is passed through untouched; git itself decides
    /// whether it is acceptable.
    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            return Err(PublishError::InvalidConfig(
                "remote must not be empty".to_string(),
            ));
        }
        if self.branch.trim().is_empty() {
            return Err(PublishError::InvalidConfig(
                "branch must not be empty".to_string(),
            ));
        }
        if self.git_program.trim().is_empty() {
            return Err(PublishError::InvalidConfig(
                "git program must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// SHA-256 hex of the commit message bytes.
    pub fn message_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.commit_message.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_compiled_constants() {
        let config = PublishConfig::default();
        assert_eq!(config.repo_path, PathBuf::from("."));
        assert_eq!(config.remote, "origin");
        assert_eq!(config.branch, "main");
        assert_eq!(config.git_program, "git");
        assert_eq!(config.commit_message, DEFAULT_COMMIT_MESSAGE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_message_is_multiline() {
        assert!(DEFAULT_COMMIT_MESSAGE.lines().count() > 2);
        assert!(!DEFAULT_COMMIT_MESSAGE.starts_with('\n'));
    }

    #[test]
    fn test_builders_override_fields() {
        let config = PublishConfig::default()
            .with_repo_path("/tmp/repo")
            .with_remote("upstream")
            .with_branch("release")
            .with_commit_message("custom")
            .with_git_program("/usr/bin/git");

        assert_eq!(config.repo_path, PathBuf::from("/tmp/repo"));
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.branch, "release");
        assert_eq!(config.commit_message, "custom");
        assert_eq!(config.git_program, "/usr/bin/git");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let cases = [
            PublishConfig::default().with_remote(""),
            PublishConfig::default().with_branch(" "),
            PublishConfig::default().with_git_program(""),
        ];
        for config in cases {
            let err = config.validate().unwrap_err();
            assert!(matches!(err, PublishError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_validate_accepts_any_commit_message() {
        for message in ["", "  \n", "x"] {
            let config = PublishConfig::default().with_commit_message(message);
            assert!(config.validate().is_ok(), "{message:?} should pass through");
        }
    }

    #[test]
    fn test_message_digest_is_stable() {
        let a = PublishConfig::default();
        let b = PublishConfig::default();
        assert_eq!(a.message_digest(), b.message_digest());
        assert_eq!(a.message_digest().len(), 64);

        let c = PublishConfig::default().with_commit_message("other");
        assert_ne!(a.message_digest(), c.message_digest());
    }
}
