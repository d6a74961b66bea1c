//! `--cleanup` (SPEC_FULL §C.5): removes every local module's *private*
//! `node_modules` before the pipeline runs, leaving the root project's own
//! `node_modules` (and its `.bin`) untouched.

use walkdir::WalkDir;

use crate::context::Context;
use crate::util::fs::{node_modules_dir, remove_dir_all_lax};

pub fn cleanup(ctx: &Context) -> std::io::Result<()> {
  let modules_root = ctx.root.join(&ctx.modules_folder);
  if !modules_root.is_dir() {
    return Ok(());
  }

  for entry in WalkDir::new(&modules_root)
    .into_iter()
    .filter_entry(|e| !is_dotted(e.file_name()) && e.file_name() != "node_modules")
    .filter_map(Result::ok)
  {
    if entry.file_type().is_dir() && entry.path().join("package.json").is_file() {
      remove_dir_all_lax(&node_modules_dir(entry.path()))?;
    }
  }
  Ok(())
}

fn is_dotted(name: &std::ffi::OsStr) -> bool {
  name.to_string_lossy().starts_with('.')
}
