//! Change-set resolution: which files changed and the diff to analyze.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::VcsError;

use super::command::run_git;

/// Base reference for branch comparisons when none is given.
pub const DEFAULT_BASE_REF: &str = "origin/main";

/// Head reference for branch comparisons when none is given.
pub const DEFAULT_HEAD_REF: &str = "HEAD";

/// One line of context around each hunk keeps prompts small.
const DIFF_CONTEXT_ARG: &str = "--unified=1";

/// Which comparison of the working tree or history to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetMode {
    /// Index against HEAD.
    Staged,
    /// Working tree (staged and unstaged) against HEAD.
    AllUncommitted,
    /// Commits reachable from `head` but not from `base` (merge-base comparison).
    BranchDiff {
        base: Option<String>,
        head: Option<String>,
    },
}

impl ChangeSetMode {
    pub fn base_ref(&self) -> Option<&str> {
        match self {
            ChangeSetMode::BranchDiff { base, .. } => {
                Some(base.as_deref().unwrap_or(DEFAULT_BASE_REF))
            }
            _ => None,
        }
    }

    pub fn head_ref(&self) -> Option<&str> {
        match self {
            ChangeSetMode::BranchDiff { head, .. } => {
                Some(head.as_deref().unwrap_or(DEFAULT_HEAD_REF))
            }
            _ => None,
        }
    }

    /// Revision arguments passed to `git diff` for this mode.
    fn revision_args(&self) -> Vec<String> {
        match self {
            ChangeSetMode::Staged => vec!["--cached".to_string()],
            ChangeSetMode::AllUncommitted => vec![DEFAULT_HEAD_REF.to_string()],
            ChangeSetMode::BranchDiff { .. } => vec![format!(
                "{}...{}",
                self.base_ref().unwrap_or(DEFAULT_BASE_REF),
                self.head_ref().unwrap_or(DEFAULT_HEAD_REF)
            )],
        }
    }
}

impl fmt::Display for ChangeSetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSetMode::Staged => f.write_str("staged"),
            ChangeSetMode::AllUncommitted => f.write_str("uncommitted"),
            ChangeSetMode::BranchDiff { .. } => write!(
                f,
                "between {} and {}",
                self.base_ref().unwrap_or(DEFAULT_BASE_REF),
                self.head_ref().unwrap_or(DEFAULT_HEAD_REF)
            ),
        }
    }
}

/// Changed files plus the unified diff covering them.
///
/// The file list and the diff text come from separate git calls, so callers
/// check each for emptiness on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub file_paths: Vec<String>,
    pub diff_text: String,
}

impl ChangeSet {
    pub fn has_files(&self) -> bool {
        !self.file_paths.is_empty()
    }

    pub fn has_diff(&self) -> bool {
        !self.diff_text.trim().is_empty()
    }
}

/// Source of change sets.
///
/// This abstraction allows the pipeline to run against a fake in tests.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    async fn resolve(&self, mode: &ChangeSetMode) -> Result<ChangeSet, VcsError>;
}

/// Change source backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitChangeSource {
    workdir: PathBuf,
    ignore_patterns: Vec<String>,
}

impl GitChangeSource {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ignore_patterns: Vec::new(),
        }
    }

    /// Exclude paths matching these git pathspec patterns from both the file
    /// list and the diff.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        self.ignore_patterns = patterns.to_vec();
        self
    }

    fn diff_args(&self, mode: &ChangeSetMode, output_arg: &str) -> Vec<String> {
        // Non-ASCII paths come back verbatim instead of C-quoted.
        let mut args = vec![
            "-c".to_string(),
            "core.quotePath=false".to_string(),
            "diff".to_string(),
            "--no-color".to_string(),
            "--no-ext-diff".to_string(),
            output_arg.to_string(),
        ];
        args.extend(mode.revision_args());

        if !self.ignore_patterns.is_empty() {
            args.push("--".to_string());
            args.push(".".to_string());
            args.extend(
                self.ignore_patterns
                    .iter()
                    .map(|p| format!(":(exclude){}", p)),
            );
        }

        args
    }

    async fn git_diff(&self, mode: &ChangeSetMode, output_arg: &str) -> Result<String, VcsError> {
        let args = self.diff_args(mode, output_arg);
        debug!(args = ?args, "Running git diff");
        run_git(&self.workdir, &args)
            .await
            .map_err(|e| explain_failure(mode, e))
    }
}

#[async_trait]
impl ChangeSource for GitChangeSource {
    async fn resolve(&self, mode: &ChangeSetMode) -> Result<ChangeSet, VcsError> {
        // `git diff` outside a repository falls back to --no-index usage
        // errors, so probe for the repository first.
        run_git(&self.workdir, &["rev-parse", "--show-toplevel"]).await?;

        let names = self.git_diff(mode, "--name-only").await?;
        let file_paths = parse_file_list(&names);
        let diff_text = self.git_diff(mode, DIFF_CONTEXT_ARG).await?;

        info!(
            mode = %mode,
            file_count = file_paths.len(),
            diff_bytes = diff_text.len(),
            "Resolved change set"
        );

        Ok(ChangeSet {
            file_paths,
            diff_text,
        })
    }
}

/// Split `--name-only` output into paths, keeping first-seen order.
pub fn parse_file_list(output: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

/// Turn git's revision errors into messages that name the user's references.
fn explain_failure(mode: &ChangeSetMode, err: VcsError) -> VcsError {
    let VcsError::OperationFailed(detail) = &err else {
        return err;
    };
    let bad_revision = detail.contains("unknown revision")
        || detail.contains("bad revision")
        || detail.contains("ambiguous argument");
    if !bad_revision {
        return err;
    }

    match mode {
        ChangeSetMode::BranchDiff { .. } => VcsError::OperationFailed(format!(
            "Invalid git references: {}...{}. Please ensure both references exist.",
            mode.base_ref().unwrap_or(DEFAULT_BASE_REF),
            mode.head_ref().unwrap_or(DEFAULT_HEAD_REF)
        )),
        ChangeSetMode::AllUncommitted => VcsError::OperationFailed(
            "Repository has no commits yet. Stage your files and run `cadr analyze --staged` instead."
                .to_string(),
        ),
        ChangeSetMode::Staged => err,
    }
}
