//! Satisfaction filter (§4.4): drops requests already met by an installed
//! artifact or a soon-to-be-linked local module.

use crate::coalescer::DependencyRequests;
use crate::context::Context;
use crate::manifest::ModuleInfo;
use crate::semver_range;

/// Removes requests already satisfied, per entry, per requester. An entry
/// whose requester list empties out is dropped entirely; a dependency name
/// left with no entries is dropped entirely.
pub fn filter(
  mut requests: DependencyRequests,
  local_modules: &[ModuleInfo],
  installed: &[ModuleInfo],
  ctx: &Context,
) -> DependencyRequests {
  let names: Vec<String> = requests.names().map(str::to_string).collect();
  for name in names {
    let entries = requests.requests_for_mut(&name).expect("name came from requests itself");
    entries.retain(|request| !is_satisfied(request, installed, local_modules, ctx));
  }

  let remaining: Vec<_> = requests
    .into_entries()
    .into_iter()
    .filter(|(_, reqs)| !reqs.is_empty())
    .collect();

  let mut out = DependencyRequests::default();
  for (name, reqs) in remaining {
    for req in reqs {
      for requester in req.requested_by {
        out.insert(&name, &req.range, requester);
      }
    }
  }
  out
}

fn is_satisfied(
  request: &crate::coalescer::DependencyRequest,
  installed: &[ModuleInfo],
  local_modules: &[ModuleInfo],
  ctx: &Context,
) -> bool {
  let installed_satisfies = installed
    .iter()
    .any(|pkg| pkg.name == request.name && semver_range::satisfies(&pkg.version, &request.range));
  if installed_satisfies {
    return true;
  }

  if ctx.link_local_modules {
    let local_satisfies = local_modules.iter().any(|module| {
      if module.name != request.name {
        return false;
      }
      if semver_range::is_valid_range(&request.range) {
        semver_range::satisfies(&module.version, &request.range)
      } else {
        ctx.trust_local_non_semver
      }
    });
    if local_satisfies {
      return true;
    }
  }

  false
}
