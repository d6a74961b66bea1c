//! The external installer collaborator (§6): a configurable package-manager
//! binary invoked once per target folder, in parallel, materializing each
//! identifier into `join(target, "node_modules", canonical folder)`.
//!
//! This mirrors the subprocess-spawn-then-inspect-exit-status shape the
//! teacher uses for its own external-process collaborators (`tools/run.rs`,
//! `tools/repl/session.rs`), adapted from `deno_core::task::spawn` to plain
//! `tokio::process`.

use std::path::Path;

use log::info;
use tokio::process::Command;

use crate::context::Context;
use crate::error::{AppError, InstallerError};
use crate::planner::PlacementPlan;

/// Runs the configured installer once per target folder in the plan,
/// concurrently. All invocations must complete before symlink repair
/// begins, per the ordering guarantee in §5.
pub async fn install(plan: &PlacementPlan, ctx: &Context) -> Result<(), AppError> {
  let targets: Vec<_> = plan.targets().collect();
  let mut handles = Vec::with_capacity(targets.len());

  for target in targets {
    let target = target.to_path_buf();
    let identifiers: Vec<String> =
      plan.requests_at(&target).iter().map(|r| r.identifier()).collect();
    if identifiers.is_empty() {
      continue;
    }
    let command = ctx.installer_command.clone();
    handles.push(tokio::spawn(async move { run_one(&target, &command, &identifiers).await }));
  }

  let results = futures::future::join_all(handles).await;
  for result in results {
    result.map_err(|e| AppError::Other(anyhow::anyhow!(e)))??;
  }
  Ok(())
}

async fn run_one(target: &Path, command: &[String], identifiers: &[String]) -> Result<(), AppError> {
  std::fs::create_dir_all(target)
    .map_err(|e| AppError::Other(anyhow::anyhow!("creating '{}': {e}", target.display())))?;

  let (program, base_args) = command.split_first().ok_or_else(|| {
    AppError::Other(anyhow::anyhow!("installer_command must name at least a program"))
  })?;

  info!("installing {:?} into '{}'", identifiers, target.display());

  let output = Command::new(program)
    .args(base_args)
    .args(identifiers)
    .current_dir(target)
    .output()
    .await
    .map_err(|e| AppError::Other(anyhow::anyhow!("spawning installer for '{}': {e}", target.display())))?;

  // A non-zero exit is fatal; warnings on the error channel without a
  // non-zero exit are advisory and rerouted to normal output (§7).
  if !output.status.success() {
    return Err(AppError::Installer(InstallerError {
      target: target.to_path_buf(),
      code: output.status.code().unwrap_or(-1),
    }));
  }
  if !output.stderr.is_empty() {
    info!("installer ({}): {}", target.display(), String::from_utf8_lossy(&output.stderr));
  }
  Ok(())
}
