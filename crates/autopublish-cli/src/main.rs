//! autopublish - publish a batch of working-tree changes in one step
//!
//! Runs `git status`, `git add -A`, `git commit` with a fixed message and
//! `git push` against the configured repository, stopping at the first
//! failure. Exits 0 when the changes were pushed or there was nothing to
//! publish, 1 otherwise.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use autopublish_core::{capture_head_sha, is_git_repo, PublishConfig};
use autopublish_pipeline::{PipelineOutcome, PipelineReport, PublishPipeline, SystemRunner};
use clap::Parser;
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "autopublish")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stage, commit and push all working-tree changes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    report: bool,

    /// Repository to publish (default: current directory)
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Remote to push to (default: origin)
    #[arg(long)]
    remote: Option<String>,

    /// Branch to push (default: main)
    #[arg(long)]
    branch: Option<String>,

    /// Read the commit message from a file instead of the built-in one
    #[arg(long)]
    message_file: Option<PathBuf>,
}

impl Cli {
    fn publish_config(&self) -> Result<PublishConfig> {
        let mut config = PublishConfig::default();
        if let Some(repo) = &self.repo {
            config = config.with_repo_path(repo);
        }
        if let Some(remote) = &self.remote {
            config = config.with_remote(remote);
        }
        if let Some(branch) = &self.branch {
            config = config.with_branch(branch);
        }
        if let Some(path) = &self.message_file {
            config = config.with_commit_message(read_message(path)?);
        }
        Ok(config)
    }
}

fn read_message(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read commit message from {}", path.display()))
}

/// Destination of the human-readable progress lines.
///
/// With `--report` stdout carries only the JSON report, so everything
/// else moves to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Console {
    Stdout,
    Stderr,
}

impl Console {
    fn for_cli(cli: &Cli) -> Self {
        if cli.report {
            Console::Stderr
        } else {
            Console::Stdout
        }
    }

    fn line(self, text: &str) {
        match self {
            Console::Stdout => println!("{text}"),
            Console::Stderr => eprintln!("{text}"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    autopublish_core::init_tracing(cli.json, level);

    let console = Console::for_cli(&cli);
    let config = cli.publish_config()?;
    console.line(&format!(
        "Publishing {} to {}/{}",
        config.repo_path.display(),
        config.remote,
        config.branch
    ));

    let pipeline = PublishPipeline::new(config, Arc::new(SystemRunner::new()));
    let git = &pipeline.config().git_program;
    let repo_path = &pipeline.config().repo_path;
    if is_git_repo(git, repo_path) {
        debug!(repo = %repo_path.display(), "Target is a git work tree");
    } else {
        debug!(repo = %repo_path.display(), "Target is not a git work tree; status will fail");
    }

    let report = pipeline.run().await;

    let head = match report.outcome {
        PipelineOutcome::Published => capture_head_sha(git, repo_path),
        _ => None,
    };
    for line in summary_lines(&report, head.as_deref()) {
        console.line(&line);
    }
    if let Some(e) = report.outcome.error() {
        eprintln!("\n✗ {} failed: {}", e.stage().unwrap_or("setup"), e);
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    }

    Ok(ExitCode::from(exit_status(&report)))
}

/// Per-stage lines plus the closing success line. Failures are printed
/// separately, always on stderr.
fn summary_lines(report: &PipelineReport, head: Option<&str>) -> Vec<String> {
    let mut lines: Vec<String> = report
        .invocations
        .iter()
        .map(|invocation| match &invocation.result {
            Some(result) => format!(
                "  {} {} ({}ms, exit code: {})",
                if result.succeeded() { "✓" } else { "✗" },
                invocation.stage,
                result.duration_ms,
                result.exit_code
            ),
            None => format!("  ✗ {} (not launched)", invocation.stage),
        })
        .collect();

    match (&report.outcome, head) {
        (PipelineOutcome::Published, Some(sha)) => lines.push(format!("\n✓ Pushed {sha}")),
        (PipelineOutcome::Published, None) => lines.push("\n✓ Pushed".to_string()),
        (PipelineOutcome::NothingToDo, _) => lines.push("\n✓ No changes to publish".to_string()),
        (PipelineOutcome::Failed(_), _) => {}
    }
    lines
}

fn exit_status(report: &PipelineReport) -> u8 {
    if report.exit_code() == 0 {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopublish_core::{DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE};

    #[test]
    fn test_defaults_use_compiled_constants() {
        let cli = Cli::parse_from(["autopublish"]);
        let config = cli.publish_config().unwrap();
        assert_eq!(config, PublishConfig::default());
        assert_eq!(config.commit_message, DEFAULT_COMMIT_MESSAGE);
        assert_eq!(config.remote, DEFAULT_REMOTE);
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "autopublish",
            "--repo",
            "/srv/site",
            "--remote",
            "upstream",
            "--branch",
            "gh-pages",
        ]);
        let config = cli.publish_config().unwrap();
        assert_eq!(config.repo_path, PathBuf::from("/srv/site"));
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.branch, "gh-pages");
    }

    #[test]
    fn test_message_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MESSAGE");
        std::fs::write(&path, "subject\n\nbody\n").unwrap();

        let cli = Cli::parse_from(["autopublish", "--message-file", path.to_str().unwrap()]);
        let config = cli.publish_config().unwrap();
        assert_eq!(config.commit_message, "subject\n\nbody\n");
    }

    #[test]
    fn test_missing_message_file_is_error() {
        let cli = Cli::parse_from(["autopublish", "--message-file", "/nonexistent/MESSAGE"]);
        let err = cli.publish_config().unwrap_err();
        assert!(err.to_string().contains("Failed to read commit message"));
    }

    #[test]
    fn test_report_moves_progress_to_stderr() {
        let plain = Cli::parse_from(["autopublish"]);
        assert_eq!(Console::for_cli(&plain), Console::Stdout);

        let report = Cli::parse_from(["autopublish", "--report"]);
        assert_eq!(Console::for_cli(&report), Console::Stderr);
    }

    #[tokio::test]
    async fn test_summary_lines_for_publish() {
        use autopublish_pipeline::{CommandResult, PublishStage, ScriptedRunner};

        let runner = Arc::new(
            ScriptedRunner::new().respond(PublishStage::Status, CommandResult::success("M a.txt")),
        );
        let report = PublishPipeline::new(PublishConfig::default(), runner).run().await;

        let lines = summary_lines(&report, Some("abc123"));
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("✓ status"));
        assert!(lines[3].contains("✓ push"));
        assert_eq!(lines[4], "\n✓ Pushed abc123");
    }

    #[tokio::test]
    async fn test_summary_lines_for_launch_failure() {
        use autopublish_pipeline::{PublishStage, ScriptedRunner};

        let runner =
            Arc::new(ScriptedRunner::new().fail_to_launch(PublishStage::Status, "not found"));
        let report = PublishPipeline::new(PublishConfig::default(), runner).run().await;

        let lines = summary_lines(&report, None);
        assert_eq!(lines, vec!["  ✗ status (not launched)".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_repo_exits_success() {
        use autopublish_pipeline::{CommandResult, PublishStage, ScriptedRunner};

        let runner = Arc::new(
            ScriptedRunner::new().respond(PublishStage::Status, CommandResult::success("")),
        );
        let report = PublishPipeline::new(PublishConfig::default(), runner).run().await;
        assert_eq!(exit_status(&report), 0);
    }

    #[tokio::test]
    async fn test_failed_status_exits_failure() {
        use autopublish_pipeline::{CommandResult, PublishStage, ScriptedRunner};

        let runner = Arc::new(ScriptedRunner::new().respond(
            PublishStage::Status,
            CommandResult::failure(128, "fatal: not a git repository"),
        ));
        let report = PublishPipeline::new(PublishConfig::default(), runner).run().await;
        assert_eq!(exit_status(&report), 1);
    }
}
