//! Forced recursive removal of checkout directories.
//!
//! Git writes its object files read-only. On Windows that makes a plain
//! `remove_dir_all` fail, and on Unix a read-only directory blocks removal of
//! its children. [`remove_dir_forced`] retries each failed entry once after
//! making it writable, along with its parent when that parent is inside the
//! tree being removed.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Recursively delete `path`, clearing read-only flags where needed.
///
/// A missing `path` is not an error. Symlinks are removed, never followed.
///
/// # Errors
///
/// Returns the first error that persists after the writable retry.
pub fn remove_dir_forced(path: &Path) -> io::Result<()> {
    remove_entry(path, path)
}

fn remove_entry(path: &Path, root: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        let entries = retry_writable(path, root, |p| fs::read_dir(p))?;
        for entry in entries {
            remove_entry(&entry?.path(), root)?;
        }
        retry_writable(path, root, |p| fs::remove_dir(p))
    } else {
        retry_writable(path, root, |p| fs::remove_file(p))
    }
}

/// Remove `path`, logging a warning instead of failing.
///
/// Returns `true` when nothing is left at `path`.
pub fn remove_dir_best_effort(path: &Path) -> bool {
    match remove_dir_forced(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = ?path, error = %e, "could not completely remove directory");
            false
        }
    }
}

/// Run `op`; on permission denied make `path` writable and run it once more.
///
/// The parent of `path` is made writable too, unless `path` is the removal
/// `root`: directories outside the tree are never touched.
fn retry_writable<T>(
    path: &Path,
    root: &Path,
    op: impl Fn(&Path) -> io::Result<T>,
) -> io::Result<T> {
    match op(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            make_writable(path)?;
            if path != root {
                if let Some(parent) = path.parent() {
                    if let Err(e) = make_writable(parent) {
                        debug!(path = ?parent, error = %e, "could not make parent writable");
                    }
                }
            }
            op(path)
        }
        other => other,
    }
}

fn make_writable(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        return Ok(());
    }

    let mut perms = meta.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let owner = if meta.is_dir() { 0o700 } else { 0o600 };
        perms.set_mode(perms.mode() | owner);
    }
    #[cfg(not(unix))]
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);

    fs::set_permissions(path, perms)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn set_readonly(path: &Path) {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn removes_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("checkout");
        fs::create_dir_all(root.join("a").join("b")).unwrap();
        fs::write(root.join("a").join("b").join("f.txt"), "x").unwrap();
        fs::write(root.join("top.txt"), "y").unwrap();

        remove_dir_forced(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn removes_read_only_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("checkout");
        let objects = root.join(".git").join("objects").join("ab");
        fs::create_dir_all(&objects).unwrap();
        let object = objects.join("cdef");
        fs::write(&object, "blob").unwrap();
        set_readonly(&object);
        set_readonly(&objects);

        remove_dir_forced(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn missing_path_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        remove_dir_forced(&missing).unwrap();
        assert!(remove_dir_best_effort(&missing));
    }

    #[cfg(unix)]
    #[test]
    fn does_not_follow_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("precious.txt"), "keep").unwrap();

        let root = dir.path().join("checkout");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        remove_dir_forced(&root).unwrap();
        assert!(!root.exists());
        assert!(outside.join("precious.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn parent_outside_the_tree_is_left_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("locked");
        let root = parent.join("checkout");
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a").join("f.txt"), "x").unwrap();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o555)).unwrap();

        // Fails for an ordinary user and succeeds for root; either way the
        // parent keeps its mode.
        let _ = remove_dir_forced(&root);
        let mode = fs::metadata(&parent).unwrap().permissions().mode() & 0o777;
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(mode, 0o555);
    }

    #[test]
    fn best_effort_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("checkout");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("f"), "x").unwrap();
        assert!(remove_dir_best_effort(&root));
        assert!(!root.exists());
    }
}
