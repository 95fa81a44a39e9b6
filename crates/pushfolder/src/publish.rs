//! Stage, commit and push.

use crate::error::{PublishError, Result};
use pushfolder_config::{GitConfig, PublishConfig};
use pushfolder_git::{CommitOptions, Repository};
use tracing::info;

/// How a publish step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStatus {
    /// The tree was clean after staging; nothing was committed.
    NoChanges,
    /// A commit was created and pushed.
    Pushed {
        /// Id of the pushed commit.
        commit: String,
    },
}

/// Map the git section of the configuration onto commit options; empty
/// strings leave the corresponding git setting alone.
pub fn commit_options(git: &GitConfig) -> CommitOptions {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    CommitOptions {
        author: non_empty(&git.author),
        user_name: non_empty(&git.user_name),
        user_email: non_empty(&git.user_email),
        no_gpg_sign: git.no_gpg_sign,
    }
}

/// Stage everything in `repo`, commit if anything changed, and push the
/// current branch to `config.remote`.
///
/// # Errors
///
/// [`PublishError::Stage`] or [`PublishError::Commit`] before a commit
/// exists; [`PublishError::Push`] afterwards, in which case the commit stays
/// in the local repository.
pub fn publish(repo: &Repository, config: &PublishConfig) -> Result<PublishStatus> {
    repo.add_all().map_err(PublishError::Stage)?;
    info!("files added to staging area");

    if !repo.is_dirty().map_err(PublishError::Stage)? {
        info!("no changes to commit");
        return Ok(PublishStatus::NoChanges);
    }

    let commit = repo
        .commit(&config.commit_message, &commit_options(&config.git))
        .map_err(PublishError::Commit)?;
    info!(%commit, message = %config.commit_message, "changes committed");

    repo.push(&config.remote)
        .map_err(|source| PublishError::Push {
            remote: config.remote.clone(),
            commit: commit.clone(),
            source,
        })?;
    info!(remote = %config.remote, "pushed to remote repository");

    Ok(PublishStatus::Pushed { commit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use pushfolder_git::commands::git_command;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config() -> PublishConfig {
        PublishConfig::default().with_git(GitConfig {
            user_name: "Publisher".to_string(),
            user_email: "publisher@example.com".to_string(),
            no_gpg_sign: true,
            ..GitConfig::default()
        })
    }

    /// A checkout on `main` whose `origin` is a bare repository in the same
    /// temp dir.
    fn checkout_with_remote() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let remote = dir.path().join("remote.git");
        git_command(["init", "--quiet", "--bare", remote.to_str().unwrap()], dir.path()).unwrap();
        git_command(["symbolic-ref", "HEAD", "refs/heads/main"], &remote).unwrap();

        let work = dir.path().join("work");
        fs::create_dir(&work).unwrap();
        git_command(["init", "--quiet"], &work).unwrap();
        git_command(["checkout", "--quiet", "-b", "main"], &work).unwrap();
        let repo = Repository::open(&work).unwrap();
        repo.set_remote_url("origin", remote.to_str().unwrap()).unwrap();
        (dir, repo)
    }

    fn remote_head(dir: &Path) -> String {
        git_command(["rev-parse", "main"], &dir.join("remote.git")).unwrap()
    }

    #[test]
    fn commit_options_skip_empty_values() {
        let opts = commit_options(&GitConfig {
            author: String::new(),
            user_name: "Name".to_string(),
            user_email: String::new(),
            no_gpg_sign: true,
        });
        assert_eq!(
            opts,
            CommitOptions {
                author: None,
                user_name: Some("Name".to_string()),
                user_email: None,
                no_gpg_sign: true,
            }
        );
    }

    #[test]
    fn clean_tree_is_no_op() {
        let (_dir, repo) = checkout_with_remote();
        assert_eq!(publish(&repo, &config()).unwrap(), PublishStatus::NoChanges);
        assert!(repo.head_commit().is_err(), "no commit should exist");
    }

    #[test]
    fn untracked_files_are_committed_and_pushed() {
        let (dir, repo) = checkout_with_remote();
        fs::write(repo.root().join("new.txt"), "new").unwrap();

        let status = publish(&repo, &config()).unwrap();
        let PublishStatus::Pushed { commit } = status else {
            panic!("expected a push, got {status:?}");
        };
        assert_eq!(commit, repo.head_commit().unwrap());
        assert_eq!(remote_head(dir.path()), commit);
        assert_eq!(
            repo.git(["log", "-1", "--format=%s"]).unwrap(),
            "Add new files"
        );
        assert_eq!(
            repo.git(["log", "-1", "--format=%ce"]).unwrap(),
            "publisher@example.com"
        );
    }

    #[test]
    fn author_override_is_applied() {
        let (_dir, repo) = checkout_with_remote();
        fs::write(repo.root().join("new.txt"), "new").unwrap();
        let mut cfg = config().with_commit_message("Publish notes");
        cfg.git.author = "Ghost Writer <ghost@example.com>".to_string();

        publish(&repo, &cfg).unwrap();
        assert_eq!(
            repo.git(["log", "-1", "--format=%an <%ae>|%s"]).unwrap(),
            "Ghost Writer <ghost@example.com>|Publish notes"
        );
    }

    #[test]
    fn push_failure_keeps_commit() {
        let (dir, repo) = checkout_with_remote();
        let missing = dir.path().join("gone.git");
        repo.set_remote_url("origin", missing.to_str().unwrap()).unwrap();
        fs::write(repo.root().join("new.txt"), "new").unwrap();

        let err = publish(&repo, &config()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Push);
        assert_eq!(err.unpushed_commit(), Some(repo.head_commit().unwrap().as_str()));
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn missing_remote_name_is_push_failure() {
        let (_dir, repo) = checkout_with_remote();
        fs::write(repo.root().join("new.txt"), "new").unwrap();

        let err = publish(&repo, &config().with_remote("upstream")).unwrap_err();
        assert!(err.is_push_failure());
        assert_eq!(repo.commit_count("HEAD").unwrap(), 1);
    }
}
