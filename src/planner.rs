//! Hoist planner (§4.5): assigns each surviving request to the shallowest
//! path without prior conflict.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{info, warn};

use crate::coalescer::{DependencyRequest, DependencyRequests};
use crate::error::PlacementInvariantViolation;
use crate::manifest::ModuleInfo;
use crate::semver_range;
use crate::util::fs as util_fs;

/// `{nameGlob, versionRange?}`. Matches a request when its name matches the
/// glob and either no range is specified or the ranges intersect.
#[derive(Debug, Clone)]
pub struct NoHoistRule {
  pub name_glob: String,
  pub version_range: Option<String>,
}

impl NoHoistRule {
  /// Parses a `--no-hoist name[@range]` argument. A scoped name's own
  /// leading `@` (e.g. `@scope/pkg@^1.0.0`) must not be mistaken for the
  /// name/range separator, so the search starts past it.
  pub fn parse(arg: &str) -> Self {
    let search_from = if arg.starts_with('@') { 1 } else { 0 };
    match arg[search_from..].find('@') {
      Some(rel_idx) => {
        let idx = search_from + rel_idx;
        let range = &arg[idx + 1..];
        if range.is_empty() {
          NoHoistRule { name_glob: arg.to_string(), version_range: None }
        } else {
          NoHoistRule { name_glob: arg[..idx].to_string(), version_range: Some(range.to_string()) }
        }
      }
      None => NoHoistRule { name_glob: arg.to_string(), version_range: None },
    }
  }

  fn matches(&self, name: &str, range: &str) -> bool {
    let Ok(pattern) = Pattern::new(&self.name_glob) else { return false };
    if !pattern.matches(name) {
      return false;
    }
    match &self.version_range {
      None => true,
      Some(rule_range) => semver_range::intersect(rule_range, range).is_some(),
    }
  }
}

/// `{targetFolder → [DependencyRequest]}`.
#[derive(Debug, Default)]
pub struct PlacementPlan {
  entries: Vec<(PathBuf, Vec<DependencyRequest>)>,
}

impl PlacementPlan {
  pub fn targets(&self) -> impl Iterator<Item = &Path> {
    self.entries.iter().map(|(p, _)| p.as_path())
  }

  pub fn requests_at(&self, target: &Path) -> &[DependencyRequest] {
    self
      .entries
      .iter()
      .find(|(p, _)| p == target)
      .map(|(_, r)| r.as_slice())
      .unwrap_or(&[])
  }

  pub fn entries(&self) -> &[(PathBuf, Vec<DependencyRequest>)] {
    &self.entries
  }

  fn has_identifier(&self, identifier: &str) -> bool {
    self.entries.iter().any(|(_, reqs)| reqs.iter().any(|r| r.identifier() == identifier))
  }

  fn has_conflicting_name_at(&self, target: &Path, name: &str, range: &str) -> bool {
    self
      .entries
      .iter()
      .find(|(p, _)| p == target)
      .map(|(_, reqs)| reqs.iter().any(|r| r.name == name && r.range != range))
      .unwrap_or(false)
  }

  fn push(&mut self, target: PathBuf, request: DependencyRequest) {
    if let Some(pos) = self.entries.iter().position(|(p, _)| p == &target) {
      self.entries[pos].1.push(request);
    } else {
      self.entries.push((target, vec![request]));
    }
  }
}

/// Assigns each surviving request to a target folder, per §4.5.
pub fn plan(
  requests: DependencyRequests,
  installed: &[ModuleInfo],
  no_hoist_rules: &[NoHoistRule],
  project_root: &Path,
) -> Result<PlacementPlan, PlacementInvariantViolation> {
  let mut flat: Vec<DependencyRequest> =
    requests.into_entries().into_iter().flat_map(|(_, reqs)| reqs).collect();
  // Most-requested first: places the highest-value entries closest to the
  // root, which minimizes total installs under the plan invariants.
  flat.sort_by(|a, b| b.requested_by.len().cmp(&a.requested_by.len()));

  let mut plan = PlacementPlan::default();

  for request in flat {
    if !semver_range::is_valid_range(&request.range) {
      place_non_hoistable(&mut plan, &request, "non-semver range");
      continue;
    }
    if let Some(rule) = no_hoist_rules.iter().find(|r| r.matches(&request.name, &request.range)) {
      let _ = rule;
      place_non_hoistable(&mut plan, &request, "no-hoist rule match");
      continue;
    }

    let mut placed = false;
    for candidate in candidate_paths(project_root, &request.requested_by[0]) {
      if plan.has_identifier(&request.identifier()) {
        // Some other requester already triggered a plan-wide placement of
        // this exact identifier; nothing left to do for this one.
        placed = true;
        break;
      }
      if installed_conflict(installed, &candidate, &request.name, &request.range) {
        continue;
      }
      if plan.has_conflicting_name_at(&candidate, &request.name, &request.range) {
        continue;
      }
      plan.push(candidate, request.clone());
      placed = true;
      break;
    }

    if !placed {
      return Err(PlacementInvariantViolation(format!(
        "no candidate placement found for '{}' (requested by {:?})",
        request.identifier(),
        request.requested_by
      )));
    }
  }

  Ok(plan)
}

fn place_non_hoistable(plan: &mut PlacementPlan, request: &DependencyRequest, reason: &str) {
  if reason == "non-semver range" {
    warn!(
      "'{}' is not a valid semver range; installing separately for each requester: {:?}",
      request.identifier(),
      request.requested_by
    );
  } else {
    info!(
      "'{}' matches a --no-hoist rule; installing separately for each requester: {:?}",
      request.identifier(),
      request.requested_by
    );
  }
  for requester in &request.requested_by {
    plan.push(
      requester.clone(),
      DependencyRequest {
        name: request.name.clone(),
        range: request.range.clone(),
        requested_by: vec![requester.clone()],
      },
    );
  }
}

/// Candidate target folders from the project root down to (and including)
/// the first requester's own path: one candidate per prefix depth, so the
/// deepest candidate is always the requester itself.
fn candidate_paths(project_root: &Path, first_requester: &Path) -> Vec<PathBuf> {
  let relative = first_requester.strip_prefix(project_root).unwrap_or(first_requester);
  let segments: Vec<&std::ffi::OsStr> = relative.components().map(|c| c.as_os_str()).collect();

  let mut candidates = Vec::with_capacity(segments.len() + 1);
  let mut current = project_root.to_path_buf();
  candidates.push(current.clone());
  for segment in &segments {
    current = current.join(segment);
    candidates.push(current.clone());
  }
  candidates
}

fn installed_conflict(installed: &[ModuleInfo], candidate: &Path, name: &str, range: &str) -> bool {
  let node_modules = util_fs::node_modules_dir(candidate);
  installed.iter().any(|pkg| {
    pkg.name == name
      && pkg.full_module_path() == pkg.path_under(&node_modules)
      && !semver_range::satisfies(&pkg.version, range)
  })
}

/// Groups a `PlacementPlan` by target folder, for diagnostics and tests.
pub fn placements_by_target(plan: &PlacementPlan) -> BTreeMap<PathBuf, Vec<String>> {
  plan
    .entries()
    .iter()
    .map(|(target, reqs)| (target.clone(), reqs.iter().map(|r| r.identifier()).collect()))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coalescer::coalesce;
  use std::collections::BTreeMap;

  fn module(name: &str, path: &str, deps: &[(&str, &str)]) -> ModuleInfo {
    ModuleInfo {
      location: PathBuf::from(path).parent().unwrap().to_path_buf(),
      real_folder_name: PathBuf::from(path).file_name().unwrap().to_string_lossy().into_owned(),
      canonical_folder_name: name.to_string(),
      name: name.to_string(),
      version: "1.0.0".to_string(),
      dependencies: deps.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
      postinstall_command: None,
      bin_entries: BTreeMap::new(),
      is_scoped: false,
    }
  }

  #[test]
  fn single_shared_range_hoists_to_root() {
    let root = PathBuf::from("/proj");
    let modules = vec![
      module("a", "/proj/modules/a", &[("lodash", "^4.17.0")]),
      module("b", "/proj/modules/b", &[("lodash", "^4.17.0")]),
    ];
    let requests = coalesce(&modules);
    let placement = plan(requests, &[], &[], &root).unwrap();
    let by_target = placements_by_target(&placement);
    assert_eq!(by_target.get(&root).unwrap(), &vec!["lodash@\"^4.17.0\"".to_string()]);
  }

  #[test]
  fn disjoint_ranges_the_more_requested_wins_root() {
    let root = PathBuf::from("/proj");
    let modules = vec![
      module("a", "/proj/modules/a", &[("lodash", "^3.0.0")]),
      module("b", "/proj/modules/b", &[("lodash", "^4.0.0")]),
      module("c", "/proj/modules/c", &[("lodash", "^4.0.0")]),
    ];
    let requests = coalesce(&modules);
    let placement = plan(requests, &[], &[], &root).unwrap();
    let by_target = placements_by_target(&placement);
    assert!(by_target.get(&root).unwrap().contains(&"lodash@\"^4.0.0\"".to_string()));
    assert!(by_target
      .get(&PathBuf::from("/proj/modules/a"))
      .unwrap()
      .contains(&"lodash@\"^3.0.0\"".to_string()));
  }

  #[test]
  fn no_hoist_rule_places_per_requester() {
    let root = PathBuf::from("/proj");
    let modules = vec![
      module("a", "/proj/modules/a", &[("aurelia-cli", "^1.0.0")]),
      module("b", "/proj/modules/b", &[("aurelia-cli", "^1.0.0")]),
    ];
    let requests = coalesce(&modules);
    let rules = vec![NoHoistRule::parse("aurelia-*")];
    let placement = plan(requests, &[], &rules, &root).unwrap();
    assert!(placement.requests_at(&root).is_empty());
    assert_eq!(placement.requests_at(&PathBuf::from("/proj/modules/a")).len(), 1);
    assert_eq!(placement.requests_at(&PathBuf::from("/proj/modules/b")).len(), 1);
  }

  #[test]
  fn non_semver_range_is_never_hoisted() {
    let root = PathBuf::from("/proj");
    let modules = vec![module("a", "/proj/modules/a", &[("mytool", "github:org/repo#tag")])];
    let requests = coalesce(&modules);
    let placement = plan(requests, &[], &[], &root).unwrap();
    assert!(placement.requests_at(&root).is_empty());
    assert_eq!(placement.requests_at(&PathBuf::from("/proj/modules/a")).len(), 1);
  }

  #[test]
  fn no_hoist_parse_handles_scoped_name_with_range() {
    let rule = NoHoistRule::parse("@scope/pkg@^1.0.0");
    assert_eq!(rule.name_glob, "@scope/pkg");
    assert_eq!(rule.version_range.as_deref(), Some("^1.0.0"));
  }

  #[test]
  fn no_hoist_parse_handles_scoped_name_without_range() {
    let rule = NoHoistRule::parse("@scope/pkg");
    assert_eq!(rule.name_glob, "@scope/pkg");
    assert!(rule.version_range.is_none());
  }

  #[test]
  fn installed_conflict_for_scoped_package_pushes_placement_deeper() {
    // `@scope/pkg` installed at root sits at
    // `/proj/node_modules/@scope/pkg` -- one segment deeper than
    // `join(candidate, "node_modules")` itself. The conflict check must
    // still catch it rather than silently placing a clashing version
    // on top of it (§8 "Installed-conflict avoidance").
    let root = PathBuf::from("/proj");
    let modules = vec![module("a", "/proj/modules/a", &[("@scope/pkg", "^2.0.0")])];
    let installed = vec![module("@scope/pkg", "/proj/node_modules/@scope/pkg", &[])];
    let mut conflicting = installed;
    conflicting[0].version = "1.0.0".to_string();

    let requests = coalesce(&modules);
    let placement = plan(requests, &conflicting, &[], &root).unwrap();

    assert!(placement.requests_at(&root).is_empty());
    assert_eq!(placement.requests_at(&PathBuf::from("/proj/modules/a")).len(), 1);
  }

  #[test]
  fn installed_conflict_at_root_pushes_placement_deeper() {
    let root = PathBuf::from("/proj");
    let modules = vec![module("a", "/proj/modules/a", &[("lodash", "^4.0.0")])];
    let installed = vec![module("lodash", "/proj/node_modules/lodash", &[])];
    let mut conflicting = installed;
    conflicting[0].version = "3.0.0".to_string();
    let requests = coalesce(&modules);
    let placement = plan(requests, &conflicting, &[], &root).unwrap();
    assert!(placement.requests_at(&root).is_empty());
    assert_eq!(placement.requests_at(&PathBuf::from("/proj/modules/a")).len(), 1);
  }
}
