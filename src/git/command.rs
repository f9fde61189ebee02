//! Async `git` subprocess runner.
//!
//! Shells out to the system `git` binary so diffs honour the user's own
//! repository layout (worktrees, submodules, sparse checkouts).

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::VcsError;

/// Exit status git uses for fatal errors (bad repository, unknown revision).
const GIT_FATAL_EXIT: i32 = 128;

/// Run `git <args>` in `workdir` and return its stdout.
pub async fn run_git<S: AsRef<OsStr>>(workdir: &Path, args: &[S]) -> Result<String, VcsError> {
    if which::which("git").is_err() {
        return Err(VcsError::ToolNotFound);
    }

    let output = git_command(workdir, args)
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VcsError::ToolNotFound,
            _ => VcsError::OperationFailed(format!("Failed to run git: {}", e)),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let code = output.status.code().unwrap_or(-1);
        debug!(code, stderr = %stderr, "git exited with failure");
        return Err(classify_failure(code, &stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Build the `git` invocation.
///
/// Messages are forced to the C locale: failures are classified by their
/// stderr text.
fn git_command<S: AsRef<OsStr>>(workdir: &Path, args: &[S]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(workdir)
        .env("LC_ALL", "C")
        .env("LANGUAGE", "")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn classify_failure(code: i32, stderr: &str) -> VcsError {
    if code == GIT_FATAL_EXIT && stderr.to_lowercase().contains("not a git repository") {
        return VcsError::NotARepository;
    }
    if stderr.is_empty() {
        VcsError::OperationFailed(format!("git exited with code {}", code))
    } else {
        VcsError::OperationFailed(format!("git exited with code {}: {}", code, stderr))
    }
}
