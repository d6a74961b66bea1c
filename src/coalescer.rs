//! Request coalescer (§4.3): collapses per-module requests into
//! `{name → {range → requesters[]}}`, intersecting overlapping ranges.

use std::path::PathBuf;

use crate::manifest::ModuleInfo;
use crate::semver_range;

/// One coalesced `(name, range)` entry and the modules that requested it
/// (possibly under a different, since-intersected range).
#[derive(Debug, Clone)]
pub struct DependencyRequest {
  pub name: String,
  pub range: String,
  pub requested_by: Vec<PathBuf>,
}

impl DependencyRequest {
  /// `name@"range"`, matching the spec's identifier format.
  pub fn identifier(&self) -> String {
    format!("{}@\"{}\"", self.name, self.range)
  }
}

/// `{name → [DependencyRequest]}`, one entry per surviving distinct range.
#[derive(Debug, Default, Clone)]
pub struct DependencyRequests {
  entries: Vec<(String, Vec<DependencyRequest>)>,
}

impl DependencyRequests {
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(name, _)| name.as_str())
  }

  pub fn requests_for(&self, name: &str) -> &[DependencyRequest] {
    self
      .entries
      .iter()
      .find(|(n, _)| n == name)
      .map(|(_, r)| r.as_slice())
      .unwrap_or(&[])
  }

  pub fn requests_for_mut(&mut self, name: &str) -> Option<&mut Vec<DependencyRequest>> {
    self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, r)| r)
  }

  /// Flattens into a list of `(name, requests)` in first-seen order.
  pub fn into_entries(self) -> Vec<(String, Vec<DependencyRequest>)> {
    self.entries
  }

  pub fn entries(&self) -> &[(String, Vec<DependencyRequest>)] {
    &self.entries
  }

  fn entry_mut(&mut self, name: &str) -> &mut Vec<DependencyRequest> {
    if let Some(pos) = self.entries.iter().position(|(n, _)| n == name) {
      &mut self.entries[pos].1
    } else {
      self.entries.push((name.to_string(), Vec::new()));
      &mut self.entries.last_mut().unwrap().1
    }
  }

  /// Inserts one module's `(name, range)` declaration, per §4.3:
  /// 1. Try to intersect with each existing range under `name`; if one
  ///    intersects, tighten it in place and append the requester.
  /// 2. Otherwise, if the exact textual range already exists, append to it
  ///    (handles non-semver ranges, which never intersect).
  /// 3. Otherwise, add a new entry.
  pub fn insert(&mut self, name: &str, range: &str, requester: PathBuf) {
    let requests = self.entry_mut(name);

    for existing in requests.iter_mut() {
      if let Some(intersection) = semver_range::intersect(range, &existing.range) {
        if intersection != existing.range {
          existing.range = intersection;
        }
        existing.requested_by.push(requester);
        return;
      }
    }

    if let Some(existing) = requests.iter_mut().find(|r| r.range == range) {
      existing.requested_by.push(requester);
      return;
    }

    requests.push(DependencyRequest {
      name: name.to_string(),
      range: range.to_string(),
      requested_by: vec![requester],
    });
  }
}

/// Coalesces the dependency declarations of every local module (the root
/// project plus modules under the modules folder) into `DependencyRequests`.
/// Modules are processed in the order given, which must be the discovery
/// crawler's deterministic traversal order for the result to be stable.
pub fn coalesce(modules: &[ModuleInfo]) -> DependencyRequests {
  let mut requests = DependencyRequests::default();
  for module in modules {
    let path = module.full_module_path();
    for (name, range) in &module.dependencies {
      requests.insert(name, range, path.clone());
    }
  }
  requests
}

#[cfg(test)]
mod tests {
  use super::*;

  fn module(name: &str, path: &str, deps: &[(&str, &str)]) -> ModuleInfo {
    use std::collections::BTreeMap;
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
  fn single_shared_range_coalesces_to_one_entry() {
    let modules = vec![
      module("a", "/proj/modules/a", &[("lodash", "^4.17.0")]),
      module("b", "/proj/modules/b", &[("lodash", "^4.17.0")]),
    ];
    let requests = coalesce(&modules);
    let lodash = requests.requests_for("lodash");
    assert_eq!(lodash.len(), 1);
    assert_eq!(lodash[0].requested_by.len(), 2);
  }

  #[test]
  fn disjoint_ranges_stay_separate() {
    let modules = vec![
      module("a", "/proj/modules/a", &[("lodash", "^3.0.0")]),
      module("b", "/proj/modules/b", &[("lodash", "^4.0.0")]),
    ];
    let requests = coalesce(&modules);
    assert_eq!(requests.requests_for("lodash").len(), 2);
  }

  #[test]
  fn intersecting_ranges_tighten_in_place() {
    let modules = vec![
      module("a", "/proj/modules/a", &[("lodash", "^1.2.0")]),
      module("b", "/proj/modules/b", &[("lodash", "~1.4.1")]),
    ];
    let requests = coalesce(&modules);
    let lodash = requests.requests_for("lodash");
    assert_eq!(lodash.len(), 1);
    assert_eq!(lodash[0].requested_by.len(), 2);
  }

  #[test]
  fn non_semver_ranges_group_by_exact_text() {
    let modules = vec![
      module("a", "/proj/modules/a", &[("mytool", "github:org/repo#tag")]),
      module("b", "/proj/modules/b", &[("mytool", "github:org/repo#tag")]),
      module("c", "/proj/modules/c", &[("mytool", "github:org/other#tag")]),
    ];
    let requests = coalesce(&modules);
    assert_eq!(requests.requests_for("mytool").len(), 2);
  }
}
