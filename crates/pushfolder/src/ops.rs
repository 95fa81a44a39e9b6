//! The two public publishing operations.

use crate::branch::{BranchSelection, select_branch};
use crate::checkout::TempCheckout;
use crate::error::{PublishError, Result};
use crate::merge::{MergedEntry, merge_into};
use crate::publish::{PublishStatus, publish};
use pushfolder_config::PublishConfig;
use pushfolder_git::Repository;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Summary of a completed publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// The working tree that was published from. For the clone path this
    /// directory has already been removed when the report is returned.
    pub checkout: PathBuf,
    /// The branch that was committed to.
    pub branch: BranchSelection,
    /// Top-level entries copied from the source folder.
    pub merged: Vec<MergedEntry>,
    /// Whether anything was committed and pushed.
    pub status: PublishStatus,
}

/// Clone `repo_url`, merge the contents of `source` into the clone's root,
/// commit, push, and delete the clone.
///
/// The clone goes to `config.clone_dir`; anything already at that path is
/// removed first. The clone directory is removed on every exit path; failure
/// to remove it is only logged.
///
/// # Errors
///
/// Any [`PublishError`]; it is also logged before being returned.
pub fn clone_and_push_folder(
    repo_url: &str,
    source: &Path,
    config: &PublishConfig,
) -> Result<PublishReport> {
    info!(%repo_url, ?source, "starting clone and push");
    logged(run_clone_and_push(repo_url, source, config))
}

/// Merge the contents of `source` into the existing checkout at `repo_path`,
/// commit, and push. The checkout is never deleted.
///
/// # Errors
///
/// Any [`PublishError`]; it is also logged before being returned.
pub fn push_to_existing_repo(
    source: &Path,
    repo_path: &Path,
    config: &PublishConfig,
) -> Result<PublishReport> {
    info!(?source, target = ?repo_path, "starting push to existing repository");
    logged(run_push_to_existing(source, repo_path, config))
}

fn run_clone_and_push(
    repo_url: &str,
    source: &Path,
    config: &PublishConfig,
) -> Result<PublishReport> {
    config.validate()?;

    let checkout = TempCheckout::clone_into(repo_url, &config.clone_dir)?;
    let result = publish_folder(checkout.repo(), source, config);
    checkout.cleanup();
    result
}

fn run_push_to_existing(
    source: &Path,
    repo_path: &Path,
    config: &PublishConfig,
) -> Result<PublishReport> {
    config.validate()?;

    let repo = Repository::open(repo_path).map_err(|source| PublishError::Open {
        path: repo_path.to_path_buf(),
        source,
    })?;
    publish_folder(&repo, source, config)
}

/// Branch, merge, and publish inside an already acquired checkout.
fn publish_folder(
    repo: &Repository,
    source: &Path,
    config: &PublishConfig,
) -> Result<PublishReport> {
    let branch = select_branch(repo, &config.branch, &config.remote);

    info!(from = ?source, to = ?repo.root(), "copying folder contents");
    let merged = merge_into(source, repo.root())?;
    info!(entries = merged.len(), "files copied successfully");

    let status = publish(repo, config)?;

    Ok(PublishReport {
        checkout: repo.root().to_path_buf(),
        branch,
        merged,
        status,
    })
}

fn logged(result: Result<PublishReport>) -> Result<PublishReport> {
    if let Err(e) = &result {
        error!(kind = ?e.kind(), "{e}");
        if e.is_push_failure() {
            error!("you may need to configure authentication or check repository permissions");
        }
    }
    result
}
