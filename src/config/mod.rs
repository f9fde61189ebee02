//! `cadr.yaml` loading, validation, and first-run setup.

pub mod file;
pub mod init;

pub use file::{
    Config, DEFAULT_ADR_DIR, DEFAULT_CONFIG_PATH, Provider, RawConfig, load, validate,
};
pub use init::{InitOutcome, run_init};
