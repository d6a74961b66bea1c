//! Discovery crawler (§4.2): recursively enumerates local modules and
//! already-installed artifacts rooted at the project.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::context::Context;
use crate::error::AppError;
use crate::manifest::{self, ModuleInfo};
use crate::util::fs as util_fs;

/// The discovery output: local modules (including the root project) and
/// every already-installed artifact found beneath a `node_modules`.
#[derive(Debug, Default)]
pub struct ModuleSet {
  pub modules: Vec<ModuleInfo>,
  pub installed_dependencies: Vec<ModuleInfo>,
}

/// Bounds the number of manifest reads in flight at once, keeping the
/// open-file-descriptor count down while levels still fan out in parallel.
const MAX_CONCURRENT_MANIFEST_READS: usize = 16;

pub async fn discover(ctx: &Context) -> Result<ModuleSet, AppError> {
  let fd_gate = Arc::new(Semaphore::new(MAX_CONCURRENT_MANIFEST_READS));
  crawl(ctx.root.clone(), ctx.modules_folder.clone(), ctx.production, fd_gate).await
}

fn crawl(
  location: PathBuf,
  modules_folder: String,
  production: bool,
  fd_gate: Arc<Semaphore>,
) -> Pin<Box<dyn Future<Output = Result<ModuleSet, AppError>> + Send>> {
  Box::pin(async move {
    let root_info = read_guarded(&location, production, &fd_gate).await?;

    let mut set = ModuleSet { modules: vec![root_info], installed_dependencies: Vec::new() };

    set.installed_dependencies.extend(
      scan_manifest_children(&util_fs::node_modules_dir(&location), production, &fd_gate).await?,
    );

    let local_module_dirs = list_manifest_children(&location.join(&modules_folder));
    let mut handles = Vec::with_capacity(local_module_dirs.len());
    for dir in local_module_dirs {
      let modules_folder = modules_folder.clone();
      let fd_gate = fd_gate.clone();
      handles.push(tokio::spawn(crawl(dir, modules_folder, production, fd_gate)));
    }
    for handle in handles {
      let sub = handle.await.map_err(|e| AppError::Other(anyhow::anyhow!(e)))??;
      set.modules.extend(sub.modules);
      set.installed_dependencies.extend(sub.installed_dependencies);
    }

    Ok(set)
  })
}

async fn read_guarded(
  folder: &Path,
  production: bool,
  fd_gate: &Arc<Semaphore>,
) -> Result<ModuleInfo, AppError> {
  let _permit = fd_gate.acquire().await.expect("semaphore never closed");
  let folder = folder.to_path_buf();
  tokio::task::spawn_blocking(move || manifest::read_module(&folder, production))
    .await
    .map_err(|e| AppError::Other(anyhow::anyhow!(e)))?
    .map_err(AppError::from)
}

/// Immediate children of `parent` that contain a manifest, recursing one
/// extra level into scoped (`@scope`) subfolders. Missing `parent` is
/// treated as empty, per the filesystem collaborator's contract.
fn list_manifest_children(parent: &Path) -> Vec<PathBuf> {
  let mut result = Vec::new();
  let Ok(entries) = std::fs::read_dir(parent) else { return result };
  for entry in entries.flatten() {
    let path = entry.path();
    let Ok(file_type) = entry.file_type() else { continue };
    if !file_type.is_dir() && !file_type.is_symlink() {
      continue;
    }
    let name = entry.file_name();
    let name = name.to_string_lossy();
    if name.starts_with('.') {
      continue;
    }
    if name.starts_with('@') {
      let Ok(scoped_entries) = std::fs::read_dir(&path) else { continue };
      for scoped in scoped_entries.flatten() {
        let scoped_path = scoped.path();
        let scoped_name = scoped.file_name();
        if scoped_name.to_string_lossy().starts_with('.') {
          continue;
        }
        if scoped_path.join("package.json").is_file() {
          result.push(scoped_path);
        }
      }
    } else if path.join("package.json").is_file() {
      result.push(path);
    }
  }
  result
}

async fn scan_manifest_children(
  parent: &Path,
  production: bool,
  fd_gate: &Arc<Semaphore>,
) -> Result<Vec<ModuleInfo>, AppError> {
  let mut result = Vec::new();
  for dir in list_manifest_children(parent) {
    result.push(read_guarded(&dir, production, fd_gate).await?);
  }
  Ok(result)
}
