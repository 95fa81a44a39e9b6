//! The temporary clone used by the clone-and-push path.
//!
//! [`TempCheckout`] owns its directory. The directory is removed exactly once,
//! either by an explicit [`TempCheckout::cleanup`] or when the guard is
//! dropped, which also covers early returns and panics.

use crate::error::{PublishError, Result};
use crate::remove::remove_dir_best_effort;
use pushfolder_git::{GitError, Repository};
use std::path::{Path, PathBuf};
use tracing::info;

/// A freshly cloned checkout that is deleted when released.
#[derive(Debug)]
pub struct TempCheckout {
    repo: Repository,
    path: PathBuf,
    released: bool,
}

impl TempCheckout {
    /// Clone `url` into `dir`, replacing whatever is already there.
    ///
    /// A relative `dir` is resolved against the current directory. If the
    /// clone fails, anything it left behind is removed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Clone`] if the clone does not complete.
    pub fn clone_into(url: &str, dir: &Path) -> Result<Self> {
        let clone_error = |source: GitError| PublishError::Clone {
            url: url.to_string(),
            source,
        };

        let path = std::path::absolute(dir).map_err(|e| clone_error(e.into()))?;
        info!(clone_dir = ?path, "clone directory");

        if path.exists() {
            info!("removing existing clone directory");
            remove_dir_best_effort(&path);
        }

        info!(%url, "cloning repository");
        match Repository::clone_from(url, &path) {
            Ok(repo) => {
                info!("repository cloned successfully");
                Ok(Self {
                    repo,
                    path,
                    released: false,
                })
            }
            Err(source) => {
                remove_dir_best_effort(&path);
                Err(clone_error(source))
            }
        }
    }

    /// The cloned repository.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Delete the checkout now.
    ///
    /// Returns `true` when the directory is gone; a failure is logged as a
    /// warning and never raised.
    pub fn cleanup(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if self.released {
            return true;
        }
        self.released = true;

        info!(path = ?self.path, "performing cleanup");
        let removed = remove_dir_best_effort(&self.path);
        if removed {
            info!("cleanup completed");
        }
        removed
    }
}

impl Drop for TempCheckout {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
