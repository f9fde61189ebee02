//! ADR persistence.

pub mod store;

pub use store::{
    SaveResult, adr_filename, ensure_directory, next_number, parse_number, save, save_from,
    slugify,
};
