//! Filesystem primitives the rest of the crate treats as an opaque
//! collaborator (§6): symlink/junction creation and recursive removal. Unix
//! symlinking and the Windows junction-with-symlink-fallback dance mirror
//! `local.rs`'s `symlink_package_dir`/`junction_or_symlink_dir`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The `node_modules` folder directly under `base`, the one join repeated
/// throughout the crate wherever a module or candidate folder's own private
/// dependency folder is meant (discovery, cleanup, the planner's conflict
/// check, symlink repair).
pub fn node_modules_dir(base: &Path) -> PathBuf {
  base.join("node_modules")
}

/// Creates a directory symlink at `new_path` pointing at `old_path`,
/// replacing anything already there. On Windows this prefers a junction
/// (no elevated privileges required on NTFS) and falls back to a symlink.
pub fn symlink_dir(old_path: &Path, new_path: &Path) -> io::Result<()> {
  if let Some(parent) = new_path.parent() {
    fs::create_dir_all(parent)?;
  }
  // remove whatever link or directory might already be at the destination
  let _ = remove_dir_all_lax(new_path);

  #[cfg(windows)]
  return junction_or_symlink_dir(old_path, new_path);
  #[cfg(not(windows))]
  {
    std::os::unix::fs::symlink(old_path, new_path)
  }
}

#[cfg(windows)]
fn junction_or_symlink_dir(old_path: &Path, new_path: &Path) -> io::Result<()> {
  match junction::create(old_path, new_path) {
    Ok(()) => Ok(()),
    Err(junction_err) => match std::os::windows::fs::symlink_dir(old_path, new_path) {
      Ok(()) => Ok(()),
      Err(symlink_err) => {
        log::warn!(
          "failed creating junction and fallback symlink for '{}': {} / {}",
          new_path.display(),
          junction_err,
          symlink_err
        );
        Err(symlink_err)
      }
    },
  }
}

/// Creates a symlink to a single file (used for `.bin` shims), replacing
/// anything already at the destination.
pub fn symlink_file(old_path: &Path, new_path: &Path) -> io::Result<()> {
  if let Some(parent) = new_path.parent() {
    fs::create_dir_all(parent)?;
  }
  let _ = fs::remove_file(new_path);

  #[cfg(windows)]
  return std::os::windows::fs::symlink_file(old_path, new_path);
  #[cfg(not(windows))]
  {
    std::os::unix::fs::symlink(old_path, new_path)
  }
}

/// Removes a path recursively. Missing paths are treated as success, per
/// the filesystem collaborator's contract in §6.
pub fn remove_dir_all_lax(path: &Path) -> io::Result<()> {
  match fs::symlink_metadata(path) {
    Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
    Ok(_) => fs::remove_file(path),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e),
  }
}
