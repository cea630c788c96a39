//! Filesystem primitives used by the assembler.

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use super::manifest::CopyKind;

/// Copy a directory tree. Symlinks inside the tree are recreated, not followed.
pub fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
  fs::create_dir_all(dst)?;

  for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
    let entry = entry.map_err(io::Error::other)?;
    let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let target = dst.join(relative);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else {
      fs::copy(entry.path(), &target)?;
    }
  }

  Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
  let target = fs::read_link(src)?;
  std::os::unix::fs::symlink(target, dst)
}

/// Windows symlinks need privileges; copy what the link points at instead.
#[cfg(windows)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
  if src.is_dir() {
    copy_dir_all(src, dst)
  } else {
    fs::copy(src, dst).map(|_| ())
  }
}

/// Copy a single artifact of the given kind.
pub fn copy_entry(src: &Path, dst: &Path, kind: CopyKind) -> io::Result<()> {
  match kind {
    CopyKind::Directory => copy_dir_all(src, dst),
    CopyKind::File => fs::copy(src, dst).map(|_| ()),
  }
}

/// Create a link at `dst` pointing to `src`.
#[cfg(unix)]
pub fn link_entry(src: &Path, dst: &Path, _kind: CopyKind) -> io::Result<()> {
  std::os::unix::fs::symlink(src, dst)
}

/// Create a link at `dst` pointing to `src`.
///
/// Directories fall back to a junction when symlinks are not permitted, and
/// files fall back to a copy.
#[cfg(windows)]
pub fn link_entry(src: &Path, dst: &Path, kind: CopyKind) -> io::Result<()> {
  match kind {
    CopyKind::Directory => std::os::windows::fs::symlink_dir(src, dst).or_else(|_| junction::create(src, dst)),
    CopyKind::File => std::os::windows::fs::symlink_file(src, dst).or_else(|e| {
      warn!(path = %dst.display(), error = %e, "file symlink unavailable, copying instead");
      fs::copy(src, dst).map(|_| ())
    }),
  }
}

/// Whether anything (including a dangling symlink) occupies `path`.
pub fn path_occupied(path: &Path) -> bool {
  path.symlink_metadata().is_ok()
}

/// Remove a path (file, directory, or symlink) without following links.
pub fn remove_path(path: &Path) -> io::Result<()> {
  let metadata = path.symlink_metadata()?;
  if metadata.is_dir() {
    fs::remove_dir_all(path)
  } else {
    // Directory symlinks on Windows are removed as directories.
    fs::remove_file(path).or_else(|e| if cfg!(windows) { fs::remove_dir(path) } else { Err(e) })
  }
}

/// Remove `relative` under `root` if present. Missing paths are not an error.
pub fn prune(root: &Path, relative: &Path) -> io::Result<bool> {
  let path = root.join(relative);
  if !path_occupied(&path) {
    return Ok(false);
  }
  remove_path(&path).inspect_err(|e| {
    warn!(path = %path.display(), error = %e, "failed to prune");
  })?;
  Ok(true)
}
