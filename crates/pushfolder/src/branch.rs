//! Choosing the branch to publish to.

use pushfolder_git::Repository;
use tracing::{info, warn};

/// Which branch the checkout ended up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelection {
    /// An existing local branch was checked out.
    Local(String),
    /// A local branch was created from a remote-tracking branch.
    Tracking {
        /// The local branch name.
        name: String,
        /// The upstream it tracks, e.g. `origin/main`.
        upstream: String,
    },
    /// The requested branch was not available; the current branch is used.
    Fallback {
        /// The branch that was asked for.
        requested: String,
        /// The branch that is checked out instead (`HEAD` when detached).
        current: String,
    },
}

impl BranchSelection {
    /// The branch the checkout is on.
    pub fn branch(&self) -> &str {
        match self {
            Self::Local(name) | Self::Tracking { name, .. } => name,
            Self::Fallback { current, .. } => current,
        }
    }

    /// Returns `true` if the requested branch could not be selected.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Put `repo` on branch `name`.
///
/// Tries an existing local branch, then `<remote>/<name>`, and otherwise
/// stays where it is. Never fails: git errors while switching are logged and
/// reported as [`BranchSelection::Fallback`].
pub fn select_branch(repo: &Repository, name: &str, remote: &str) -> BranchSelection {
    match try_select(repo, name, remote) {
        Ok(Some(selection)) => selection,
        Ok(None) => {
            let current = current_or_head(repo);
            warn!(requested = name, %current, "branch not found; using current branch");
            BranchSelection::Fallback {
                requested: name.to_string(),
                current,
            }
        }
        Err(e) => {
            let current = current_or_head(repo);
            warn!(requested = name, %current, error = %e, "branch switching failed; using current branch");
            BranchSelection::Fallback {
                requested: name.to_string(),
                current,
            }
        }
    }
}

fn try_select(
    repo: &Repository,
    name: &str,
    remote: &str,
) -> pushfolder_git::Result<Option<BranchSelection>> {
    if repo.has_local_branch(name)? {
        repo.checkout(name)?;
        info!(branch = name, "switched to existing branch");
        return Ok(Some(BranchSelection::Local(name.to_string())));
    }

    if repo.has_remote_branch(remote, name)? {
        let upstream = format!("{remote}/{name}");
        repo.checkout_tracking(name, &upstream)?;
        info!(branch = name, %upstream, "created and switched to branch");
        return Ok(Some(BranchSelection::Tracking {
            name: name.to_string(),
            upstream,
        }));
    }

    Ok(None)
}

fn current_or_head(repo: &Repository) -> String {
    repo.current_branch().unwrap_or_else(|_| "HEAD".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pushfolder_git::CommitOptions;
    use pushfolder_git::commands::git_command;
    use std::fs;
    use tempfile::TempDir;

    fn identity() -> CommitOptions {
        CommitOptions {
            user_name: Some("Test".to_string()),
            user_email: Some("test@example.com".to_string()),
            no_gpg_sign: true,
            ..CommitOptions::default()
        }
    }

    /// `upstream` has branches `main` and `pages`; the returned clone has only
    /// `main` checked out locally.
    fn clone_with_remote_branches() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let upstream_dir = dir.path().join("upstream");
        fs::create_dir(&upstream_dir).unwrap();
        git_command(["init", "--quiet"], &upstream_dir).unwrap();
        git_command(["checkout", "--quiet", "-b", "main"], &upstream_dir).unwrap();
        let upstream = Repository::open(&upstream_dir).unwrap();
        fs::write(upstream_dir.join("README.md"), "x").unwrap();
        upstream.add_all().unwrap();
        upstream.commit("initial", &identity()).unwrap();
        upstream.git(["branch", "pages"]).unwrap();

        let clone =
            Repository::clone_from(upstream_dir.to_str().unwrap(), &dir.path().join("clone"))
                .unwrap();
        (dir, clone)
    }

    #[test]
    fn selects_local_branch() {
        let (_dir, repo) = clone_with_remote_branches();
        repo.git(["branch", "feature"]).unwrap();

        let selection = select_branch(&repo, "feature", "origin");
        assert_eq!(selection, BranchSelection::Local("feature".to_string()));
        assert_eq!(repo.current_branch().unwrap(), "feature");
    }

    #[test]
    fn creates_tracking_branch() {
        let (_dir, repo) = clone_with_remote_branches();

        let selection = select_branch(&repo, "pages", "origin");
        assert_eq!(
            selection,
            BranchSelection::Tracking {
                name: "pages".to_string(),
                upstream: "origin/pages".to_string(),
            }
        );
        assert_eq!(repo.current_branch().unwrap(), "pages");
        assert_eq!(
            repo.git(["rev-parse", "--abbrev-ref", "pages@{upstream}"]).unwrap(),
            "origin/pages"
        );
    }

    #[test]
    fn falls_back_to_current_branch() {
        let (_dir, repo) = clone_with_remote_branches();

        let selection = select_branch(&repo, "does-not-exist", "origin");
        assert_eq!(
            selection,
            BranchSelection::Fallback {
                requested: "does-not-exist".to_string(),
                current: "main".to_string(),
            }
        );
        assert!(selection.is_fallback());
        assert_eq!(selection.branch(), "main");
    }

    #[test]
    fn unknown_remote_falls_back() {
        let (_dir, repo) = clone_with_remote_branches();
        let selection = select_branch(&repo, "pages", "upstream");
        assert!(selection.is_fallback());
        assert_eq!(repo.current_branch().unwrap(), "main");
    }

    #[test]
    fn failed_switch_is_not_fatal() {
        let (_dir, repo) = clone_with_remote_branches();
        repo.git(["branch", "feature"]).unwrap();
        // An uncommitted edit to a file that differs on `feature` blocks checkout.
        repo.checkout("feature").unwrap();
        fs::write(repo.root().join("README.md"), "feature version").unwrap();
        repo.add_all().unwrap();
        repo.commit("feature edit", &identity()).unwrap();
        repo.checkout("main").unwrap();
        fs::write(repo.root().join("README.md"), "dirty main").unwrap();

        let selection = select_branch(&repo, "feature", "origin");
        assert_eq!(
            selection,
            BranchSelection::Fallback {
                requested: "feature".to_string(),
                current: "main".to_string(),
            }
        );
    }
}
