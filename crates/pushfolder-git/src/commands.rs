//! Git command execution wrappers.
//!
//! Provides a thin wrapper around `git` subprocess invocation so that the
//! rest of the workspace does not need to deal with `std::process::Command`
//! directly.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when running git commands.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be found or spawned.
    #[error("failed to execute git: {0}")]
    SpawnError(#[from] std::io::Error),

    /// The git command exited with a non-zero status.
    #[error("git command failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// The exit code, or `None` if the process was killed by a signal.
        code: Option<i32>,
        /// The content of stderr.
        stderr: String,
    },

    /// The path is not the root of a git working tree.
    #[error("not a git repository: {}", .0.display())]
    NotARepo(PathBuf),
}

impl GitError {
    /// Returns `true` if git ran and exited with exactly `code`.
    pub fn is_exit_code(&self, code: i32) -> bool {
        matches!(self, Self::CommandFailed { code: Some(c), .. } if *c == code)
    }
}

/// A specialized `Result` type for git operations.
pub type Result<T> = std::result::Result<T, GitError>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Execute a `git` command with the given arguments and working directory.
///
/// Returns the trimmed contents of stdout on success. Terminal credential
/// prompts are disabled, so a remote that needs interactive authentication
/// fails instead of blocking.
///
/// # Errors
///
/// Returns [`GitError::SpawnError`] if `git` cannot be found, or
/// [`GitError::CommandFailed`] if the command exits with a non-zero status.
///
/// # Examples
///
/// ```no_run
/// use pushfolder_git::commands::git_command;
/// use std::path::Path;
///
/// let branch = git_command(["rev-parse", "--abbrev-ref", "HEAD"], Path::new(".")).unwrap();
/// println!("Current branch: {branch}");
/// ```
pub fn git_command<I, S>(args: I, cwd: &Path) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
    debug!(?args, ?cwd, "running git");

    let output = Command::new("git")
        .args(&args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GitError::CommandFailed {
            code: output.status.code(),
            stderr,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(stdout)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
