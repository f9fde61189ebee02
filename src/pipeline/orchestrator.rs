//! The analyze pipeline: resolve changes, judge significance, confirm, draft,
//! save.
//!
//! Every stage either continues with a value or halts with an [`Outcome`].
//! Each outcome is printed and logged once, and none of them is an error
//! for the caller: the surrounding workflow (a commit hook, a CI job) always
//! carries on.

use std::future::Future;
use std::path::PathBuf;

use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn};

use crate::adr;
use crate::analysis::{self, AnalysisRequest, AnalysisResult, GenerationResult};
use crate::config::{self, Config};
use crate::error::{ConfigError, EngineError, FileSystemError, GatewayError, VcsError};
use crate::git::{ChangeSet, ChangeSetMode, ChangeSource, GitChangeSource};
use crate::llm::{LlmBackend, ProviderGateway};
use crate::logging::panic_message;

use super::confirm::{Confirmer, select_confirmer};

/// Result of one pipeline stage.
#[derive(Debug)]
pub enum Step<T> {
    Continue(T),
    Halt(Outcome),
}

/// Unwrap a [`Step`], returning its outcome from the enclosing function on halt.
macro_rules! proceed {
    ($step:expr) => {
        match $step {
            Step::Continue(value) => value,
            Step::Halt(outcome) => return outcome,
        }
    };
}

/// How a run ended.
#[derive(Debug)]
pub enum Outcome {
    ConfigUnavailable(ConfigError),
    BackendUnavailable(GatewayError),
    VcsFailed(VcsError),
    NoChanges { mode: ChangeSetMode },
    EmptyDiff,
    AnalysisFailed(EngineError),
    NotSignificant { reason: String },
    Declined,
    GenerationFailed(EngineError),
    SaveFailed(FileSystemError),
    Saved { path: PathBuf, title: String },
    Unexpected(String),
}

impl Outcome {
    /// Short identifier used as the `outcome` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::ConfigUnavailable(_) => "config_unavailable",
            Outcome::BackendUnavailable(_) => "backend_unavailable",
            Outcome::VcsFailed(_) => "vcs_failed",
            Outcome::NoChanges { .. } => "no_changes",
            Outcome::EmptyDiff => "empty_diff",
            Outcome::AnalysisFailed(_) => "analysis_failed",
            Outcome::NotSignificant { .. } => "not_significant",
            Outcome::Declined => "declined",
            Outcome::GenerationFailed(_) => "generation_failed",
            Outcome::SaveFailed(_) => "save_failed",
            Outcome::Saved { .. } => "saved",
            Outcome::Unexpected(_) => "unexpected",
        }
    }

    /// True for outcomes caused by a failure rather than by the change set or
    /// the user's answer.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Outcome::ConfigUnavailable(_)
                | Outcome::BackendUnavailable(_)
                | Outcome::VcsFailed(_)
                | Outcome::AnalysisFailed(_)
                | Outcome::GenerationFailed(_)
                | Outcome::SaveFailed(_)
                | Outcome::Unexpected(_)
        )
    }

    /// User-facing message for this outcome.
    pub fn message(&self) -> String {
        match self {
            Outcome::ConfigUnavailable(ConfigError::NotFound(path)) => format!(
                "No configuration found at {}. Run `cadr init` to create one.",
                path.display()
            ),
            Outcome::ConfigUnavailable(e) => format!("{}\nFix cadr.yaml or run `cadr init`.", e),
            Outcome::BackendUnavailable(e) => format!("Could not set up the LLM client: {}", e),
            Outcome::VcsFailed(e) => e.to_string(),
            Outcome::NoChanges { mode } => match mode {
                ChangeSetMode::Staged => {
                    "No staged changes found. Stage files with `git add` and try again.".to_string()
                }
                ChangeSetMode::AllUncommitted => "No uncommitted changes found.".to_string(),
                ChangeSetMode::BranchDiff { .. } => format!("No changes found {}.", mode),
            },
            Outcome::EmptyDiff => {
                "Changed files have no textual diff (binary or mode-only changes). Nothing to analyze."
                    .to_string()
            }
            Outcome::AnalysisFailed(e) => format!("Analysis failed: {}", e),
            Outcome::NotSignificant { reason } if reason.is_empty() => {
                "No architecturally significant changes detected.".to_string()
            }
            Outcome::NotSignificant { reason } => {
                format!("No architecturally significant changes detected: {}", reason)
            }
            Outcome::Declined => "Skipping ADR generation.".to_string(),
            Outcome::GenerationFailed(e) => format!("ADR generation failed: {}", e),
            Outcome::SaveFailed(e) => format!("Could not save the ADR: {}", e),
            Outcome::Saved { path, .. } => format!(
                "✓ ADR saved to {}\nReview it, then commit it with your change.",
                path.display()
            ),
            Outcome::Unexpected(_) => {
                "cADR stopped after an unexpected error. Your workflow was not interrupted.".to_string()
            }
        }
    }

    /// Print the message and emit the matching log event.
    pub fn report(&self) {
        let outcome = self.kind();
        match self {
            Outcome::Saved { path, title } => {
                info!(outcome, path = %path.display(), title = %title, "Pipeline finished");
            }
            Outcome::Unexpected(detail) => {
                error!(outcome, detail = %detail, "Pipeline aborted unexpectedly");
            }
            _ if self.is_failure() => {
                warn!(outcome, error = %self.message(), "Pipeline halted on failure");
            }
            _ => info!(outcome, "Pipeline halted"),
        }

        if self.is_failure() {
            eprintln!("Warning: {}", self.message());
        } else {
            println!("{}", self.message());
        }
    }
}

/// Runs the analyze pipeline against injected collaborators.
pub struct Orchestrator {
    config: Config,
    changes: Box<dyn ChangeSource>,
    backend: Box<dyn LlmBackend>,
    confirmer: Box<dyn Confirmer>,
    adr_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        changes: Box<dyn ChangeSource>,
        backend: Box<dyn LlmBackend>,
        confirmer: Box<dyn Confirmer>,
    ) -> Self {
        let adr_dir = config.adr_dir();
        Self {
            config,
            changes,
            backend,
            confirmer,
            adr_dir,
        }
    }

    /// Write ADRs somewhere other than the configured directory.
    pub fn with_adr_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.adr_dir = dir.into();
        self
    }

    /// Run every stage, then report the outcome.
    ///
    /// A panic anywhere in the pipeline becomes [`Outcome::Unexpected`].
    pub async fn run(self, mode: ChangeSetMode) -> Outcome {
        let outcome = guard(async move { self.execute(&mode).await }).await;
        outcome.report();
        outcome
    }

    async fn execute(&self, mode: &ChangeSetMode) -> Outcome {
        let changes = proceed!(self.resolve_changes(mode).await);
        let verdict = proceed!(self.judge(&changes).await);
        proceed!(self.confirm(&verdict).await);
        let generated = proceed!(self.draft(&changes).await);
        self.persist(&generated)
    }

    async fn resolve_changes(&self, mode: &ChangeSetMode) -> Step<ChangeSet> {
        let changes = match self.changes.resolve(mode).await {
            Ok(changes) => changes,
            Err(e) => return Step::Halt(Outcome::VcsFailed(e)),
        };

        // The file list and diff are checked separately.
        if !changes.has_files() {
            return Step::Halt(Outcome::NoChanges { mode: mode.clone() });
        }
        if !changes.has_diff() {
            return Step::Halt(Outcome::EmptyDiff);
        }

        println!(
            "Analyzing {} {} file(s):",
            changes.file_paths.len(),
            mode
        );
        for path in &changes.file_paths {
            println!("  {}", path);
        }
        Step::Continue(changes)
    }

    async fn judge(&self, changes: &ChangeSet) -> Step<AnalysisResult> {
        println!(
            "Asking {} ({}) about architectural significance...",
            self.config.provider, self.config.analysis_model
        );
        match analysis::analyze(&self.config, AnalysisRequest::from(changes), self.backend.as_ref())
            .await
        {
            Err(e) => Step::Halt(Outcome::AnalysisFailed(e)),
            Ok(result) if !result.is_significant => Step::Halt(Outcome::NotSignificant {
                reason: result.reason,
            }),
            Ok(result) => Step::Continue(result),
        }
    }

    async fn confirm(&self, verdict: &AnalysisResult) -> Step<()> {
        println!("\nArchitecturally significant change detected.");
        println!("💭 {}\n", verdict.reason);

        if self.confirmer.confirm(&verdict.reason).await {
            Step::Continue(())
        } else {
            Step::Halt(Outcome::Declined)
        }
    }

    async fn draft(&self, changes: &ChangeSet) -> Step<GenerationResult> {
        println!("Drafting ADR...");
        match analysis::generate(&self.config, AnalysisRequest::from(changes), self.backend.as_ref())
            .await
        {
            Ok(generated) => Step::Continue(generated),
            Err(e) => Step::Halt(Outcome::GenerationFailed(e)),
        }
    }

    fn persist(&self, generated: &GenerationResult) -> Outcome {
        match adr::save(&generated.content, &generated.title, &self.adr_dir) {
            Ok(path) => Outcome::Saved {
                path,
                title: generated.title.clone(),
            },
            Err(e) => Outcome::SaveFailed(e),
        }
    }
}

/// Inputs for a full `cadr analyze` run.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub config_path: PathBuf,
    pub workdir: PathBuf,
    pub mode: ChangeSetMode,
    pub assume_yes: bool,
}

/// Load configuration, wire the real collaborators and run the pipeline.
pub async fn run_analysis(options: AnalyzeOptions) -> Outcome {
    let config = match config::load(&options.config_path) {
        Ok(config) => config,
        Err(e) => return finish(Outcome::ConfigUnavailable(e)),
    };

    let gateway = match ProviderGateway::from_config(&config) {
        Ok(gateway) => gateway,
        Err(e) => return finish(Outcome::BackendUnavailable(e)),
    };

    let changes =
        GitChangeSource::new(&options.workdir).with_ignore_patterns(&config.ignore_patterns);
    let adr_dir = options.workdir.join(config.adr_dir());

    Orchestrator::new(
        config,
        Box::new(changes),
        Box::new(gateway),
        select_confirmer(options.assume_yes),
    )
    .with_adr_dir(adr_dir)
    .run(options.mode)
    .await
}

fn finish(outcome: Outcome) -> Outcome {
    outcome.report();
    outcome
}

/// Run `task` on its own tokio task so a panic is contained.
async fn guard<F>(task: F) -> Outcome
where
    F: Future<Output = Outcome> + Send + 'static,
{
    match tokio::spawn(task.with_current_subscriber()).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Outcome::Unexpected(panic_message(&*e.into_panic())),
        Err(e) => Outcome::Unexpected(e.to_string()),
    }
}
