//! Wires the pipeline's phases together in the order of §5, so `main.rs`
//! stays a thin shim (mirrors the teacher's own `main.rs`/`lib.rs` split).

pub mod args;
pub mod cleanup;
pub mod coalescer;
pub mod context;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod installer;
pub mod linker;
pub mod manifest;
pub mod planner;
pub mod postinstall;
pub mod reporter;
pub mod semver_range;
pub mod util;

use log::info;

use crate::args::RunMode;
use crate::context::Context;
use crate::error::AppError;
use crate::manifest::ModuleInfo;

/// Runs the pipeline for the given context and mode, returning the process
/// exit code per §6/§7. Recognized early-exit conditions surface as
/// `AppError::Uncritical` (logged at info, exit 0 per §7) rather than
/// `Ok`, so `main.rs`'s single error-handling path covers both.
pub async fn run(ctx: Context, mode: RunMode) -> Result<i32, AppError> {
  if !ctx.root.join("package.json").is_file() {
    return Err(AppError::Uncritical(format!(
      "not run from within a project root (no package.json at '{}')",
      ctx.root.display()
    )));
  }

  if ctx.cleanup {
    cleanup::cleanup(&ctx).map_err(|e| AppError::Other(anyhow::anyhow!(e)))?;
  }

  if !ctx.root.join(&ctx.modules_folder).is_dir() {
    return Err(AppError::Uncritical(format!(
      "no '{}' folder under '{}'; nothing to hoist",
      ctx.modules_folder,
      ctx.root.display()
    )));
  }

  let module_set = discovery::discover(&ctx).await?;
  let (local_modules, installed) = (module_set.modules, module_set.installed_dependencies);

  match mode {
    RunMode::DependencyCheckOnly => {
      let requests = coalescer::coalesce(&local_modules);
      reporter::report(&requests, &local_modules, &ctx);
      Ok(0)
    }
    RunMode::LinkOnly => {
      linker::repair(&local_modules, &installed, &ctx);
      Ok(0)
    }
    RunMode::Full => run_full(&ctx, local_modules, installed).await,
  }
}

async fn run_full(
  ctx: &Context,
  local_modules: Vec<ModuleInfo>,
  installed: Vec<ModuleInfo>,
) -> Result<i32, AppError> {
  let requests = coalescer::coalesce(&local_modules);
  // Diagnostic reports observe the coalesced set before filtering (§5).
  reporter::report(&requests, &local_modules, ctx);

  let requests = filter::filter(requests, &local_modules, &installed, ctx);
  let mut installed = installed;
  if requests.is_empty() {
    info!("all dependencies already satisfied; nothing to install");
  } else {
    let plan = planner::plan(requests, &installed, &ctx.no_hoist_rules, &ctx.root)?;
    installer::install(&plan, ctx).await?;
    // The installer materialized new artifacts on disk; re-discover so
    // symlink repair can see them as link sources.
    installed = discovery::discover(ctx).await?.installed_dependencies;
  }

  linker::repair(&local_modules, &installed, ctx);
  postinstall::run_all(&local_modules, ctx).await;

  Ok(0)
}
