//! CLI surface (§6), built with `clap`'s builder API in the teacher's style
//! (`Command`/`Arg`/`ArgAction` chains rather than the derive API).

mod flags;

use std::path::PathBuf;

use crate::context::Context;
use crate::planner::NoHoistRule;

pub use flags::command;

/// What the parsed command line asked the pipeline to do, beyond the
/// `Context` every phase reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
  /// Full pipeline: discovery through symlink repair and postinstall.
  Full,
  /// `--link-only`: repair symlinks against the existing filesystem state
  /// and skip planning/installation entirely.
  LinkOnly,
  /// `--dependency-check-only`: run the coalescer and diagnostic reporter,
  /// then exit, per §6.
  DependencyCheckOnly,
}

#[derive(Debug, Clone)]
pub struct ParsedArgs {
  pub context: Context,
  pub mode: RunMode,
  pub log_level: log::LevelFilter,
}

/// Parses the process arguments into a `Context` plus the run mode, per the
/// flag table in §6. `root` is the project root the CLI was invoked from.
pub fn parse(root: PathBuf, args: impl IntoIterator<Item = String>) -> ParsedArgs {
  let matches = command().get_matches_from(args);

  let modules_folder =
    matches.get_one::<String>("modules-folder").cloned().unwrap_or_else(|| "modules".to_string());
  let link_local_modules = !matches.get_flag("no-link");
  let link_only = matches.get_flag("link-only");
  let dependency_check_only = matches.get_flag("dependency-check-only");
  let cleanup = matches.get_flag("cleanup");
  let trust_local_non_semver = matches.get_flag("trust-local-modules");

  let no_hoist_rules: Vec<NoHoistRule> = matches
    .get_many::<String>("no-hoist")
    .map(|values| values.map(|v| NoHoistRule::parse(v)).collect())
    .unwrap_or_default();

  let production =
    std::env::var("NODE_ENV").map(|v| v == "production").unwrap_or(false);

  let log_level = matches
    .get_one::<String>("loglevel")
    .map(|s| parse_log_level(s))
    .unwrap_or(log::LevelFilter::Info);

  let mode = if link_only {
    RunMode::LinkOnly
  } else if dependency_check_only {
    RunMode::DependencyCheckOnly
  } else {
    RunMode::Full
  };

  ParsedArgs {
    context: Context {
      root,
      modules_folder,
      production,
      link_local_modules,
      trust_local_non_semver,
      no_hoist_rules,
      cleanup,
      link_only,
      dependency_check_only,
      installer_command: vec![
        "npm".to_string(),
        "install".to_string(),
        "--no-save".to_string(),
        "--no-package-lock".to_string(),
      ],
    },
    mode,
    log_level,
  }
}

/// Maps the CLI's seven-level scale onto `log`'s five levels: `critical`
/// and `error` both map to `Error` (the crate has no separate critical
/// kind), and `verbose`/`silly` both deepen past `debug` into `Trace`.
fn parse_log_level(level: &str) -> log::LevelFilter {
  match level {
    "critical" | "error" => log::LevelFilter::Error,
    "warn" => log::LevelFilter::Warn,
    "info" => log::LevelFilter::Info,
    "verbose" | "debug" => log::LevelFilter::Debug,
    "silly" => log::LevelFilter::Trace,
    _ => log::LevelFilter::Info,
  }
}
