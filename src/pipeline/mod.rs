//! Orchestration of the analyze workflow and user confirmation.

pub mod confirm;
pub mod orchestrator;

pub use confirm::{
    AutoConfirm, Confirmer, NonInteractive, TerminalConfirmer, is_ci_value, is_interactive,
    select_confirmer,
};
pub use orchestrator::{AnalyzeOptions, Orchestrator, Outcome, Step, run_analysis};
