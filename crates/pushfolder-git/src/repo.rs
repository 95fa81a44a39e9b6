//! A handle on a git working tree.
//!
//! [`Repository`] does not cache any git state: every query runs a fresh
//! `git` subprocess in the working tree root, so the handle stays valid while
//! files underneath it change.

use crate::commands::{GitError, Result, git_command};
use crate::gitdir::resolve_worktree_root;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-commit settings layered on top of the user's git configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOptions {
    /// Author override in `Name <email>` form.
    pub author: Option<String>,
    /// Committer name, passed as `-c user.name=...`.
    pub user_name: Option<String>,
    /// Committer email, passed as `-c user.email=...`.
    pub user_email: Option<String>,
    /// Disable GPG signing even when `commit.gpgsign` is set.
    pub no_gpg_sign: bool,
}

impl CommitOptions {
    /// Build the full argument list for `git commit`, including the leading
    /// `-c key=value` overrides.
    fn to_args(&self, message: &str) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = &self.user_name {
            args.push("-c".to_string());
            args.push(format!("user.name={name}"));
        }
        if let Some(email) = &self.user_email {
            args.push("-c".to_string());
            args.push(format!("user.email={email}"));
        }

        args.extend(["commit", "--quiet", "-m", message].map(String::from));

        if let Some(author) = &self.author {
            args.push(format!("--author={author}"));
        }
        if self.no_gpg_sign {
            args.push("--no-gpg-sign".to_string());
        }
        args
    }
}

/// An open git working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    /// Clone `url` into `dest` and open the result.
    ///
    /// A relative `url` or `dest` is resolved against the process working
    /// directory. `dest` must not exist or must be an empty directory; its
    /// parent is created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CommandFailed`] when git cannot complete the clone
    /// (unreachable remote, authentication, invalid URL, non-empty target).
    pub fn clone_from(url: &str, dest: &Path) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::clone_in(&cwd, url, dest)
    }

    /// Clone with relative paths resolved against `base`.
    fn clone_in(base: &Path, url: &str, dest: &Path) -> Result<Self> {
        let dest = base.join(dest);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let args: [&OsStr; 5] = [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new("--"),
            OsStr::new(url),
            dest.as_os_str(),
        ];
        git_command(args, base)?;
        Self::open(&dest)
    }

    /// Open an existing working tree without modifying it.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NotARepo`] if `path` is not the top level of a
    /// git working tree.
    pub fn open(path: &Path) -> Result<Self> {
        let root = resolve_worktree_root(path)?;
        debug!(?root, "opened repository");
        Ok(Self { root })
    }

    /// The absolute, canonical path of the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run an arbitrary git command in the working tree root.
    pub fn git<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        git_command(args, &self.root)
    }

    // -- Branches -----------------------------------------------------------

    /// Whether `refs/heads/<name>` exists.
    pub fn has_local_branch(&self, name: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/heads/{name}"))
    }

    /// Whether the remote-tracking branch `refs/remotes/<remote>/<name>` exists.
    pub fn has_remote_branch(&self, remote: &str, name: &str) -> Result<bool> {
        self.ref_exists(&format!("refs/remotes/{remote}/{name}"))
    }

    /// The branch `HEAD` points at, or `"HEAD"` when detached.
    ///
    /// Works on an unborn branch (a fresh clone of an empty repository).
    pub fn current_branch(&self) -> Result<String> {
        match self.git(["symbolic-ref", "--short", "-q", "HEAD"]) {
            Ok(name) => Ok(name),
            Err(e) if e.is_exit_code(1) => Ok("HEAD".to_string()),
            Err(e) => Err(e),
        }
    }

    /// Switch to an existing local branch.
    pub fn checkout(&self, name: &str) -> Result<()> {
        self.git(["checkout", "--quiet", name])?;
        Ok(())
    }

    /// Create local branch `name` tracking `upstream` and switch to it.
    pub fn checkout_tracking(&self, name: &str, upstream: &str) -> Result<()> {
        self.git(["checkout", "--quiet", "-b", name, "--track", upstream])?;
        Ok(())
    }

    // -- Index and commits --------------------------------------------------

    /// Stage every change in the working tree, including untracked files and
    /// deletions.
    pub fn add_all(&self) -> Result<()> {
        self.git(["add", "--all"])?;
        Ok(())
    }

    /// Porcelain status lines, untracked files listed individually.
    pub fn status(&self) -> Result<Vec<String>> {
        let out = self.git(["status", "--porcelain", "--untracked-files=all"])?;
        Ok(out.lines().map(str::to_string).collect())
    }

    /// Whether the tree has staged or unstaged modifications or untracked files.
    pub fn is_dirty(&self) -> Result<bool> {
        Ok(!self.status()?.is_empty())
    }

    /// Commit the index with `message` and return the new `HEAD` id.
    pub fn commit(&self, message: &str, options: &CommitOptions) -> Result<String> {
        self.git(options.to_args(message))?;
        self.head_commit()
    }

    /// The full object id of `HEAD`.
    pub fn head_commit(&self) -> Result<String> {
        self.git(["rev-parse", "HEAD"])
    }

    /// Number of commits reachable from `rev`.
    pub fn commit_count(&self, rev: &str) -> Result<usize> {
        let out = self.git(["rev-list", "--count", rev])?;
        out.parse().map_err(|_| GitError::CommandFailed {
            code: None,
            stderr: format!("unexpected rev-list output: {out}"),
        })
    }

    // -- Remotes ------------------------------------------------------------

    /// Push the current branch to the branch of the same name on `remote`.
    pub fn push(&self, remote: &str) -> Result<()> {
        self.git(["push", "--quiet", remote, "HEAD"])?;
        Ok(())
    }

    /// Point `remote` at `url`, adding the remote when it does not exist yet.
    pub fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
        let existing = self.git(["remote"])?;
        let verb = if existing.lines().any(|r| r == remote) {
            "set-url"
        } else {
            "add"
        };
        self.git(["remote", verb, remote, url])?;
        Ok(())
    }

    fn ref_exists(&self, full_ref: &str) -> Result<bool> {
        match self.git(["show-ref", "--verify", "--quiet", full_ref]) {
            Ok(_) => Ok(true),
            Err(e) if e.is_exit_code(1) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
