//! cadr - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::error;
use tracing::instrument::WithSubscriber;

use cadr::config::{DEFAULT_CONFIG_PATH, InitOutcome, run_init};
use cadr::git::ChangeSetMode;
use cadr::logging::{build_dispatch, install_panic_hook};
use cadr::pipeline::{AnalyzeOptions, run_analysis};

/// Detect architecturally significant changes and draft ADRs for them.
#[derive(Parser, Debug)]
#[command(name = "cadr")]
#[command(about = "Detect architecturally significant changes and draft ADRs with an LLM")]
#[command(version)]
struct Cli {
    /// Log to stderr (-v info, -vv debug, -vvv trace). CADR_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze changes and offer to draft an ADR if they are significant
    Analyze(AnalyzeArgs),

    /// Create cadr.yaml interactively
    Init {
        /// Where to write the configuration
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Analyze only staged changes
    #[arg(long, conflicts_with_all = ["all", "base", "head"])]
    staged: bool,

    /// Analyze all uncommitted changes, staged and unstaged (default)
    #[arg(long, conflicts_with_all = ["base", "head"])]
    all: bool,

    /// Compare the branch against this base reference (default: origin/main)
    #[arg(long)]
    base: Option<String>,

    /// Head reference for branch comparison (default: HEAD)
    #[arg(long)]
    head: Option<String>,

    /// Generate the ADR without asking for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

impl AnalyzeArgs {
    fn mode(&self) -> ChangeSetMode {
        if self.base.is_some() || self.head.is_some() {
            ChangeSetMode::BranchDiff {
                base: self.base.clone(),
                head: self.head.clone(),
            }
        } else if self.staged {
            ChangeSetMode::Staged
        } else {
            ChangeSetMode::AllUncommitted
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dispatch = build_dispatch(cli.verbose);
    install_panic_hook();

    match cli.command {
        Command::Analyze(args) => {
            let workdir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let options = AnalyzeOptions {
                mode: args.mode(),
                config_path: args.config,
                workdir,
                assume_yes: args.yes,
            };
            // Every outcome has already been reported; the exit status stays 0.
            run_analysis(options).with_subscriber(dispatch).await;
        }
        Command::Init { config } => {
            tracing::dispatcher::with_default(&dispatch, || {
                if let Err(e) = init_command(&config) {
                    error!(error = %e, "Setup failed");
                    eprintln!("Warning: {:#}", e);
                }
            });
        }
    }

    Ok(())
}

fn init_command(path: &Path) -> Result<()> {
    let outcome = run_init(path).context("Could not create the configuration")?;

    match outcome {
        InitOutcome::AlreadyExists => {
            println!(
                "Configuration already exists at {}. Edit it directly or delete it to start over.",
                path.display()
            );
        }
        InitOutcome::Created(config) => {
            println!("\n✓ Created {}", path.display());
            println!("   Provider: {}", config.provider);
            println!("   Model: {}", config.analysis_model);
            println!("\nSet your API key before running `cadr analyze`:");
            println!("   export {}=\"your-api-key\"", config.api_key_env);
            println!("Get a key at {}", config.provider.key_url());
        }
    }

    Ok(())
}
