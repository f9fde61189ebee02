//! Asking the user whether to draft an ADR.

use std::env;
use std::io::IsTerminal;

use async_trait::async_trait;
use dialoguer::Confirm;
use tracing::{info, warn};

/// Decides whether generation should go ahead for a significant change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, reason: &str) -> bool;
}

/// Interactive yes/no prompt on the terminal. Enter accepts.
pub struct TerminalConfirmer;

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, _reason: &str) -> bool {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new()
                .with_prompt("Would you like to generate an ADR for this change?")
                .default(true)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(e)) => {
                warn!(error = %e, "Confirmation prompt failed; skipping generation");
                false
            }
            Err(e) => {
                warn!(error = %e, "Confirmation prompt task failed; skipping generation");
                false
            }
        }
    }
}

/// Always confirms (`--yes`).
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _reason: &str) -> bool {
        info!("Generation confirmed by --yes");
        true
    }
}

/// Always declines. Used when nobody is there to answer.
pub struct NonInteractive;

#[async_trait]
impl Confirmer for NonInteractive {
    async fn confirm(&self, _reason: &str) -> bool {
        info!("Non-interactive session; declining generation");
        println!("Non-interactive session detected. Re-run with --yes to generate an ADR.");
        false
    }
}

/// True when `CI` holds a value CI systems use to announce themselves.
pub fn is_ci_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
}

/// Whether a human can answer a prompt in this process.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal()
        && std::io::stdout().is_terminal()
        && !is_ci_value(env::var("CI").ok().as_deref())
}

/// Pick the confirmer for this run.
pub fn select_confirmer(assume_yes: bool) -> Box<dyn Confirmer> {
    if assume_yes {
        Box::new(AutoConfirm)
    } else if is_interactive() {
        Box::new(TerminalConfirmer)
    } else {
        Box::new(NonInteractive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ci_value() {
        assert!(is_ci_value(Some("true")));
        assert!(is_ci_value(Some("TRUE")));
        assert!(is_ci_value(Some("1")));
        assert!(!is_ci_value(Some("false")));
        assert!(!is_ci_value(Some("")));
        assert!(!is_ci_value(None));
    }

    #[test]
    fn test_ci_env_is_never_interactive() {
        temp_env::with_var("CI", Some("true"), || {
            assert!(!is_interactive());
        });
    }

    #[tokio::test]
    async fn test_auto_and_non_interactive() {
        assert!(AutoConfirm.confirm("reason").await);
        assert!(!NonInteractive.confirm("reason").await);
    }

    #[tokio::test]
    async fn test_select_confirmer_with_yes() {
        assert!(select_confirmer(true).confirm("reason").await);
    }
}
