//! Diagnostic reporter (§4.7): advisory reports emitted before the
//! satisfaction filter runs. Purely observational -- nothing here changes
//! the coalesced set or any downstream phase.

use log::{info, warn};

use crate::coalescer::DependencyRequests;
use crate::context::Context;
use crate::manifest::ModuleInfo;
use crate::semver_range;

/// Logs both reports at `log::warn!`/`log::info!` per SPEC_FULL §C.8,
/// before the satisfaction filter is applied to `requests`.
pub fn report(requests: &DependencyRequests, local_modules: &[ModuleInfo], ctx: &Context) {
  report_non_optimal_dependency_setup(requests);
  report_non_optimal_local_module_usage(requests, local_modules, ctx);
}

/// Any dependency name with more than one coalesced range: the
/// most-requested range is primary, the rest are listed with their
/// requesters.
fn report_non_optimal_dependency_setup(requests: &DependencyRequests) {
  for (name, reqs) in requests.entries() {
    if reqs.len() <= 1 {
      continue;
    }
    let mut sorted = reqs.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.requested_by.len().cmp(&a.requested_by.len()));
    let (primary, rest) = sorted.split_first().expect("len > 1");
    warn!(
      "non-optimal dependency setup for '{}': primary range '{}' ({} requesters); also requested: {}",
      name,
      primary.range,
      primary.requested_by.len(),
      rest
        .iter()
        .map(|r| format!("'{}' by {:?}", r.range, r.requested_by))
        .collect::<Vec<_>>()
        .join(", "),
    );
  }
}

/// Any dependency name that has at least one local module and at least one
/// requested range the local module's version does not satisfy (applying
/// `trust_local_non_semver` the same way §4.4 does).
fn report_non_optimal_local_module_usage(
  requests: &DependencyRequests,
  local_modules: &[ModuleInfo],
  ctx: &Context,
) {
  for (name, reqs) in requests.entries() {
    let Some(local) = local_modules.iter().find(|m| &m.name == name) else { continue };
    let unmet: Vec<&str> = reqs
      .iter()
      .filter(|r| {
        if semver_range::is_valid_range(&r.range) {
          !semver_range::satisfies(&local.version, &r.range)
        } else {
          !ctx.trust_local_non_semver
        }
      })
      .map(|r| r.range.as_str())
      .collect();
    if !unmet.is_empty() {
      info!(
        "non-optimal local-module usage for '{}': local version '{}' does not satisfy range(s) {:?}",
        name, local.version, unmet
      );
    }
  }
}
