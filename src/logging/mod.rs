//! Diagnostic logging context.
//!
//! The binary builds one [`Dispatch`] and attaches it to the futures it runs.
//! The only process-wide piece is the panic hook, which keeps panic reports
//! off the terminal.

use std::any::Any;
use std::env;
use std::panic;

use tracing::{Dispatch, error};
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides `-v`.
pub const LOG_ENV_VAR: &str = "CADR_LOG";

/// Filter directive for a `-v` count. Silent unless asked.
pub fn level_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "off",
        1 => "cadr=info",
        2 => "cadr=debug",
        _ => "trace",
    }
}

fn build_filter(verbosity: u8, env_override: Option<&str>) -> EnvFilter {
    env_override
        .filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(level_directive(verbosity)))
}

/// Build the stderr logging dispatcher for a run.
pub fn build_dispatch(verbosity: u8) -> Dispatch {
    let filter = build_filter(verbosity, env::var(LOG_ENV_VAR).ok().as_deref());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    Dispatch::new(subscriber)
}

/// Text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Replace the default panic hook with one that only emits a log event.
///
/// Panics are still caught and reported by the pipeline; this keeps the
/// raw panic line and any backtrace out of the user's terminal.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(
            panic = %panic_message(info.payload()),
            location = %location,
            "Panic captured"
        );
    }));
}
