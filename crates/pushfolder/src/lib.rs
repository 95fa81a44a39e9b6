//! Merge the contents of a local folder into a git checkout and publish the
//! result upstream.
//!
//! Two entry points share one pipeline (select branch, merge, stage, commit,
//! push):
//!
//! - [`clone_and_push_folder`] clones the remote into a temporary directory
//!   that is always removed afterwards.
//! - [`push_to_existing_repo`] works in a checkout owned by the caller and
//!   never deletes it.
//!
//! Progress is reported through `tracing`; install a subscriber to see it,
//! for example with [`logging::init`].

pub mod branch;
pub mod checkout;
pub mod error;
pub mod logging;
pub mod merge;
pub mod ops;
pub mod publish;
pub mod remove;

pub use branch::BranchSelection;
pub use error::{ErrorKind, PublishError, Result};
pub use merge::{MergeAction, MergeError, MergedEntry};
pub use ops::{PublishReport, clone_and_push_folder, push_to_existing_repo};
pub use publish::PublishStatus;
pub use pushfolder_config::{GitConfig, PublishConfig};
