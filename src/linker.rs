//! Symlink repair (§4.6): for every local module and every declared
//! dependency, links into the module's own `node_modules` so its resolver
//! sees a consistent view of the hoisted plan. Closest 1:1 lift from the
//! teacher's `local.rs::symlink_package_dir` / `junction_or_symlink_dir`,
//! generalized from a fixed pnpm-style `.deno` layout to "link into the
//! requester's own node_modules".

use std::path::{Path, PathBuf};

use log::error;

use crate::context::Context;
use crate::manifest::ModuleInfo;
use crate::semver_range;
use crate::util::fs as util_fs;

/// Where a module's dependency was ultimately resolved from, for
/// diagnostics and tests -- the tagged-variant replacement for the
/// original's duck-typed lookup result (§9).
#[derive(Debug, PartialEq, Eq)]
pub enum LinkOutcome {
  /// Already directly installed at the expected path; nothing to link.
  AlreadyInstalled,
  /// Linked to a sibling local module.
  LocalModule,
  /// Linked to a hoisted installed artifact.
  InstalledElsewhere,
  /// No source could be found; logged as an error but non-fatal.
  NotFound,
}

/// Repairs every local module's `node_modules` view, per §4.6. Skips the
/// root project entry (§9's open question), which never gets symlinked
/// into its own `node_modules`.
pub fn repair(
  local_modules: &[ModuleInfo],
  installed: &[ModuleInfo],
  ctx: &Context,
) -> Vec<(PathBuf, String, LinkOutcome)> {
  let mut results = Vec::new();
  for module in local_modules {
    if module.full_module_path() == ctx.root {
      continue;
    }
    for (dep, range) in &module.dependencies {
      let outcome = link_one(module, dep, range, local_modules, installed, ctx);
      results.push((module.full_module_path(), dep.clone(), outcome));
    }
  }
  results
}

fn link_one(
  module: &ModuleInfo,
  dep: &str,
  range: &str,
  local_modules: &[ModuleInfo],
  installed: &[ModuleInfo],
  ctx: &Context,
) -> LinkOutcome {
  let module_node_modules = util_fs::node_modules_dir(&module.full_module_path());

  let already_installed = installed
    .iter()
    .any(|pkg| pkg.name == dep && pkg.full_module_path() == pkg.path_under(&module_node_modules));
  if already_installed {
    return LinkOutcome::AlreadyInstalled;
  }

  if ctx.link_local_modules {
    if let Some(source) = local_modules.iter().find(|m| m.name == dep && satisfies(m, range, ctx)) {
      create_link(module, source);
      return LinkOutcome::LocalModule;
    }
  }

  if let Some(source) = installed.iter().find(|pkg| pkg.name == dep && semver_range::satisfies(&pkg.version, range)) {
    create_link(module, source);
    return LinkOutcome::InstalledElsewhere;
  }

  error!(
    "could not resolve dependency '{}@{}' for module at '{}'; a later installer invocation may provide it",
    dep,
    range,
    module.full_module_path().display()
  );
  LinkOutcome::NotFound
}

fn satisfies(local_module: &ModuleInfo, range: &str, ctx: &Context) -> bool {
  if semver_range::is_valid_range(range) {
    semver_range::satisfies(&local_module.version, range)
  } else {
    ctx.trust_local_non_semver
  }
}

fn create_link(module: &ModuleInfo, source: &ModuleInfo) {
  let module_node_modules = util_fs::node_modules_dir(&module.full_module_path());
  let link_path = source.path_under(&module_node_modules);
  // Link-creation failures are tolerated per §4.6: the resolver still
  // functions as long as an acceptable link is present from a prior run.
  if let Err(e) = util_fs::symlink_dir(&source.full_module_path(), &link_path) {
    error!("could not create symlink at '{}': {}", link_path.display(), e);
  }

  for (command_name, relative_executable) in &source.bin_entries {
    let bin_path = module_node_modules.join(".bin").join(command_name);
    let target = source.full_module_path().join(relative_executable);
    if let Err(e) = util_fs::symlink_file(&target, &bin_path) {
      error!("could not create bin shim at '{}': {}", bin_path.display(), e);
    }
  }
}
