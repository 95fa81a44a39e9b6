//! Merging a source folder into a checkout root.
//!
//! Only the *contents* of the source folder are copied: `source/a.txt` lands
//! at `dest/a.txt`, never at `dest/source/a.txt`. Directories that already
//! exist at the destination are merged entry by entry, so files that only
//! exist at the destination survive. Files present on both sides are
//! overwritten by the source without a backup.

use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors raised while merging.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The source folder is missing or is not a directory.
    #[error("source folder {} does not exist or is not a directory", .0.display())]
    SourceNotDirectory(PathBuf),

    /// The destination lies inside the source folder, so copying would recurse
    /// into its own output.
    #[error("destination {} is inside source folder {}", dest.display(), folder.display())]
    DestinationInsideSource {
        /// The source folder.
        folder: PathBuf,
        /// The destination root.
        dest: PathBuf,
    },

    /// A file and a directory share the same name on the two sides.
    #[error("cannot merge {}: a file and a directory share this name", path.display())]
    TypeConflict {
        /// The destination path where the conflict was found.
        path: PathBuf,
    },

    /// An I/O operation on `path` failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// A specialized `Result` type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// What happened to one top-level entry of the source folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// A file was copied, replacing any file of the same name.
    CopiedFile,
    /// A directory was copied to a destination where nothing existed.
    CopiedDirectory,
    /// A directory was merged into an existing destination directory.
    MergedDirectory,
}

/// One top-level entry of the source folder and how it was merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    /// File name of the entry.
    pub name: String,
    /// The action taken.
    pub action: MergeAction,
}

/// Copy every top-level entry of `source` into `dest`.
///
/// Entries are processed in file name order. Symlinks are followed and their
/// targets copied.
///
/// # Errors
///
/// See [`MergeError`]. Entries merged before the failure stay in place.
pub fn merge_into(source: &Path, dest: &Path) -> Result<Vec<MergedEntry>> {
    let folder = source
        .canonicalize()
        .map_err(|_| MergeError::SourceNotDirectory(source.to_path_buf()))?;
    if !folder.is_dir() {
        return Err(MergeError::SourceNotDirectory(source.to_path_buf()));
    }

    let dest_root = dest.canonicalize().map_err(|e| io_error(dest, e))?;
    if dest_root.starts_with(&folder) {
        return Err(MergeError::DestinationInsideSource {
            folder,
            dest: dest_root,
        });
    }

    let children = sorted_children(&folder)?;
    let mut merged = Vec::with_capacity(children.len());

    for child in children {
        let Some(name) = child.file_name() else {
            continue;
        };
        let target = dest_root.join(name);
        let name = name.to_string_lossy().into_owned();

        let action = if metadata(&child)?.is_dir() {
            if target.is_dir() {
                info!(%name, "merging directory");
                copy_tree(&child, &target)?;
                MergeAction::MergedDirectory
            } else {
                info!(%name, "copying directory");
                copy_tree(&child, &target)?;
                MergeAction::CopiedDirectory
            }
        } else {
            info!(%name, "copying file");
            copy_file(&child, &target)?;
            MergeAction::CopiedFile
        };

        merged.push(MergedEntry { name, action });
    }

    Ok(merged)
}

/// Recursively copy `src` into `dst`, creating `dst` if it does not exist.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) if dst.is_dir() => {}
        Ok(_) => {
            return Err(MergeError::TypeConflict {
                path: dst.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir(dst).map_err(|e| io_error(dst, e))?;
        }
        Err(e) => return Err(io_error(dst, e)),
    }

    for child in sorted_children(src)? {
        let Some(name) = child.file_name() else {
            continue;
        };
        let target = dst.join(name);
        if metadata(&child)?.is_dir() {
            copy_tree(&child, &target)?;
        } else {
            copy_file(&child, &target)?;
        }
    }
    Ok(())
}

/// Copy one file, overwriting `dst`, then carry over its timestamps.
///
/// When `dst` is a directory the file is copied into it under its own name.
/// Permission bits are copied by [`fs::copy`]. Timestamps are best effort.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let dst = match src.file_name() {
        Some(name) if dst.is_dir() => dst.join(name),
        _ => dst.to_path_buf(),
    };
    if dst.is_dir() {
        return Err(MergeError::TypeConflict { path: dst });
    }

    fs::copy(src, &dst).map_err(|e| io_error(&dst, e))?;

    let meta = metadata(src)?;
    if let Err(e) = copy_times(&meta, &dst) {
        debug!(path = ?dst, error = %e, "could not preserve timestamps");
    }
    Ok(())
}

fn copy_times(meta: &Metadata, dst: &Path) -> io::Result<()> {
    let times = FileTimes::new()
        .set_accessed(meta.accessed()?)
        .set_modified(meta.modified()?);
    // A read-only copy cannot be opened for writing; on Unix a read handle is
    // enough to set times.
    let file = File::options()
        .write(true)
        .open(dst)
        .or_else(|_| File::open(dst))?;
    file.set_times(times)
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)
        .map_err(|e| io_error(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| io_error(dir, e))?;
    children.sort();
    Ok(children)
}

fn metadata(path: &Path) -> Result<Metadata> {
    fs::metadata(path).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: io::Error) -> MergeError {
    MergeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
