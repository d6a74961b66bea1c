//! Post-install hook runner (SPEC_FULL §C.6): after symlink repair, runs
//! each local module's `postinstallCommand` from within its own directory.
//! Skips the root project, matching the symlink-repair exclusion in §9.
//! A non-zero exit is logged but does not abort the run -- postinstall
//! scripts are module-authored, unlike the installer's own fatal exit (§7).

use log::error;
use tokio::process::Command;

use crate::context::Context;
use crate::manifest::ModuleInfo;

pub async fn run_all(local_modules: &[ModuleInfo], ctx: &Context) {
  let mut handles = Vec::new();
  for module in local_modules {
    if module.full_module_path() == ctx.root {
      continue;
    }
    let Some(script) = module.postinstall_command.clone() else { continue };
    let cwd = module.full_module_path();
    let name = module.name.clone();
    handles.push(tokio::spawn(async move { run_one(&name, &cwd, &script).await }));
  }
  futures::future::join_all(handles).await;
}

async fn run_one(module_name: &str, cwd: &std::path::Path, script: &str) {
  let result = Command::new(shell_program())
    .arg(shell_flag())
    .arg(script)
    .current_dir(cwd)
    .status()
    .await;

  match result {
    Ok(status) if status.success() => {}
    Ok(status) => error!(
      "postinstall for '{}' exited with {:?}; continuing",
      module_name,
      status.code()
    ),
    Err(e) => error!("could not run postinstall for '{}': {}", module_name, e),
  }
}

#[cfg(windows)]
fn shell_program() -> &'static str {
  "cmd"
}

#[cfg(windows)]
fn shell_flag() -> &'static str {
  "/C"
}

#[cfg(not(windows))]
fn shell_program() -> &'static str {
  "sh"
}

#[cfg(not(windows))]
fn shell_flag() -> &'static str {
  "-c"
}
