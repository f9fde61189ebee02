//! Git change-set resolution using the system `git` binary.

pub mod changes;
pub mod command;

pub use changes::{
    ChangeSet, ChangeSetMode, ChangeSource, DEFAULT_BASE_REF, DEFAULT_HEAD_REF, GitChangeSource,
    parse_file_list,
};
pub use command::run_git;
