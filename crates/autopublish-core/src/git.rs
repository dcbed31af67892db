//! Git helpers: status parsing and repository probes.
//!
//! Nothing here drives pipeline control flow; the stage commands live in
//! `autopublish-pipeline`. These helpers feed logs and the final report.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Rough size of a status listing: the number of whitespace-separated
/// tokens in the output.
///
/// Approximate by construction. Status markers are counted alongside paths
/// and paths containing spaces count more than once, so this is only fit
/// for display.
pub fn approximate_change_count(status: &str) -> usize {
    status.split_whitespace().count()
}

/// Whether status output describes a clean working tree.
pub fn is_clean(status: &str) -> bool {
    status.trim().is_empty()
}

/// One line of `git status --porcelain` output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEntry {
    /// Two-character XY status code, e.g. `" M"`, `"??"`, `"A "`.
    pub code: String,
    /// Path as printed by git (rename targets keep the `old -> new` form).
    pub path: String,
}

/// Best-effort parse of porcelain v1 output. Lines too short to carry a
/// code and path are skipped.
pub fn parse_porcelain(status: &str) -> Vec<StatusEntry> {
    status
        .lines()
        .filter_map(|line| {
            if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
                return None;
            }
            let (code, rest) = line.split_at(2);
            let path = rest[1..].trim();
            if path.is_empty() {
                return None;
            }
            Some(StatusEntry {
                code: code.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}

/// HEAD commit SHA of a repository, if it can be read.
///
/// `None` covers a missing program, a path outside a work tree and an
/// unborn HEAD alike; callers only use this for display.
pub fn capture_head_sha(git_program: &str, repo_dir: &Path) -> Option<String> {
    let output = Command::new(git_program)
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(git_program: &str, dir: &Path) -> bool {
    Command::new(git_program)
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
