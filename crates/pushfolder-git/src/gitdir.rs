//! Working tree discovery.
//!
//! Answers "is this directory the root of a git checkout?" by asking git
//! itself, so worktrees and submodules (where `.git` is a file) are handled
//! the same way as ordinary clones.

use crate::commands::{GitError, Result, git_command};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Get the repository root using `git rev-parse --show-toplevel`.
///
/// # Errors
///
/// Returns [`GitError::NotARepo`] if `cwd` is not inside a working tree, or
/// [`GitError::SpawnError`] if git cannot be started (including when `cwd`
/// does not exist).
pub fn show_toplevel(cwd: &Path) -> Result<PathBuf> {
    match git_command(["rev-parse", "--show-toplevel"], cwd) {
        Ok(output) if !output.is_empty() => Ok(PathBuf::from(normalize_git_path(&output))),
        Ok(_) | Err(GitError::CommandFailed { .. }) => Err(GitError::NotARepo(cwd.to_path_buf())),
        Err(e) => Err(e),
    }
}

/// Resolve `path` to the absolute root of the working tree it names.
///
/// Unlike [`show_toplevel`], a subdirectory of a checkout is rejected: the
/// path must be the top level itself.
///
/// # Errors
///
/// Returns [`GitError::NotARepo`] if `path` is missing, is not a directory,
/// or is not the top level of a working tree.
pub fn resolve_worktree_root(path: &Path) -> Result<PathBuf> {
    let not_a_repo = || GitError::NotARepo(path.to_path_buf());

    if !path.is_dir() {
        return Err(not_a_repo());
    }
    let canonical = path.canonicalize().map_err(|_| not_a_repo())?;

    let toplevel = show_toplevel(&canonical)?;
    let toplevel = toplevel.canonicalize().unwrap_or(toplevel);

    if toplevel == canonical {
        Ok(canonical)
    } else {
        Err(not_a_repo())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Normalize git paths for Windows compatibility.
///
/// Git on Windows may return MSYS-style paths like `/c/Users/...` or forward-
/// slash paths like `C:/Users/...`. This function converts them to native
/// format.
fn normalize_git_path(path: &str) -> String {
    if std::path::MAIN_SEPARATOR != '\\' {
        return path.to_string();
    }

    let path = path.trim();

    // Convert /c/Users/... to C:\Users\...
    if path.len() >= 3
        && path.as_bytes()[0] == b'/'
        && path.as_bytes()[2] == b'/'
        && path.as_bytes()[1].is_ascii_alphabetic()
    {
        let drive = path.as_bytes()[1].to_ascii_uppercase() as char;
        let rest = &path[2..];
        return format!("{drive}:{}", rest.replace('/', "\\"));
    }

    path.replace('/', "\\")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
