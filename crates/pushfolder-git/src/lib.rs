//! Git integration for pushfolder.
//!
//! This crate wraps the `git` binary: raw command execution, working tree
//! discovery, and a [`Repository`](repo::Repository) handle exposing the
//! handful of porcelain operations needed to clone, switch branches, stage,
//! commit and push.

pub mod commands;
pub mod gitdir;
pub mod repo;

pub use commands::{GitError, Result};
pub use repo::{CommitOptions, Repository};
