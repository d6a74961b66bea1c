//! The explicit run context passed into each phase, replacing the
//! module-level mutable globals (logger, config setters) the original
//! tool relies on.

use std::path::PathBuf;

use crate::planner::NoHoistRule;

#[derive(Debug, Clone)]
pub struct Context {
  pub root: PathBuf,
  pub modules_folder: String,
  pub production: bool,
  pub link_local_modules: bool,
  pub trust_local_non_semver: bool,
  pub no_hoist_rules: Vec<NoHoistRule>,
  pub cleanup: bool,
  pub link_only: bool,
  pub dependency_check_only: bool,
  pub installer_command: Vec<String>,
}
