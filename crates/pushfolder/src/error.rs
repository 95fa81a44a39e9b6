//! Publish error types.

use crate::merge::MergeError;
use pushfolder_config::ConfigError;
use pushfolder_git::GitError;
use std::path::PathBuf;

/// Coarse classification of a [`PublishError`], for callers that branch on
/// the failure category rather than on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The configuration was rejected before any work started.
    Config,
    /// The remote could not be cloned.
    Clone,
    /// The caller-supplied path is not a repository.
    Open,
    /// Copying the source folder into the checkout failed.
    Copy,
    /// Staging or committing failed.
    Commit,
    /// The push was rejected; the local commit is kept.
    Push,
}

/// Errors that end a publish run.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Cloning the remote failed.
    #[error("failed to clone {url}: {source}")]
    Clone {
        /// The remote URL.
        url: String,
        /// Underlying git failure.
        source: GitError,
    },

    /// The existing repository could not be opened.
    #[error("failed to open repository at {}: {source}", path.display())]
    Open {
        /// The path that was supplied.
        path: PathBuf,
        /// Underlying git failure.
        source: GitError,
    },

    /// The folder contents could not be merged into the checkout.
    #[error("failed to copy folder contents: {0}")]
    Copy(#[from] MergeError),

    /// `git add` or `git status` failed.
    #[error("failed to stage changes: {0}")]
    Stage(#[source] GitError),

    /// `git commit` failed.
    #[error("failed to commit changes: {0}")]
    Commit(#[source] GitError),

    /// The commit was created but could not be pushed.
    #[error("commit {commit} was not pushed to {remote}: {source}")]
    Push {
        /// The remote that rejected the push.
        remote: String,
        /// Id of the local commit, left in place.
        commit: String,
        /// Underlying git failure.
        source: GitError,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PublishError>;

impl PublishError {
    /// The failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Clone { .. } => ErrorKind::Clone,
            Self::Open { .. } => ErrorKind::Open,
            Self::Copy(_) => ErrorKind::Copy,
            Self::Stage(_) | Self::Commit(_) => ErrorKind::Commit,
            Self::Push { .. } => ErrorKind::Push,
        }
    }

    /// Returns `true` if a commit exists locally but did not reach the remote.
    pub fn is_push_failure(&self) -> bool {
        matches!(self, Self::Push { .. })
    }

    /// The id of the commit that was created before the run failed, if any.
    pub fn unpushed_commit(&self) -> Option<&str> {
        match self {
            Self::Push { commit, .. } => Some(commit),
            _ => None,
        }
    }
}
