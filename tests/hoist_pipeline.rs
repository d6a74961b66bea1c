//! End-to-end fixture-tree tests over the resolution and placement engine
//! (§8's concrete scenarios). The external installer is a collaborator the
//! core only invokes opaquely (§1's scope note), so these tests simulate
//! its effect by writing the artifacts it would have produced, and drive
//! discovery, coalescing, filtering, planning, and symlink repair directly.

use std::fs;
use std::path::Path;

use modhoist::context::Context;
use modhoist::{coalescer, discovery, filter, linker, planner};
use pretty_assertions::assert_eq;

fn write_pkg(dir: &Path, name: &str, version: &str, deps_json: &str) {
  fs::create_dir_all(dir).unwrap();
  fs::write(
    dir.join("package.json"),
    format!(r#"{{ "name": "{name}", "version": "{version}", "dependencies": {deps_json} }}"#),
  )
  .unwrap();
}

fn ctx(root: &Path) -> Context {
  Context {
    root: root.to_path_buf(),
    modules_folder: "modules".to_string(),
    production: false,
    link_local_modules: true,
    trust_local_non_semver: false,
    no_hoist_rules: Vec::new(),
    cleanup: false,
    link_only: false,
    dependency_check_only: false,
    installer_command: vec!["npm".to_string(), "install".to_string()],
  }
}

#[tokio::test]
async fn single_shared_range_hoists_to_root_and_links_back() {
  let tmp = tempfile::tempdir().unwrap();
  let root = tmp.path();
  write_pkg(root, "root", "1.0.0", "{}");
  write_pkg(&root.join("modules/a"), "a", "1.0.0", r#"{ "lodash": "^4.17.0" }"#);
  write_pkg(&root.join("modules/b"), "b", "1.0.0", r#"{ "lodash": "^4.17.0" }"#);

  let c = ctx(root);
  let set = discovery::discover(&c).await.unwrap();
  let requests = coalescer::coalesce(&set.modules);
  let requests = filter::filter(requests, &set.modules, &set.installed_dependencies, &c);
  let plan = planner::plan(requests, &set.installed_dependencies, &c.no_hoist_rules, &c.root).unwrap();

  let by_target = planner::placements_by_target(&plan);
  assert_eq!(by_target.get(root).unwrap(), &vec!["lodash@\"^4.17.0\"".to_string()]);

  // Simulate what the installer collaborator would have materialized.
  write_pkg(&root.join("node_modules/lodash"), "lodash", "4.17.21", "{}");
  let set = discovery::discover(&c).await.unwrap();

  let results = linker::repair(&set.modules, &set.installed_dependencies, &c);
  assert_eq!(results.len(), 2);
  assert!(results.iter().all(|(_, dep, outcome)| dep == "lodash"
    && *outcome == linker::LinkOutcome::InstalledElsewhere));

  let a_link = root.join("modules/a/node_modules/lodash");
  assert_eq!(fs::read_link(&a_link).unwrap(), root.join("node_modules/lodash"));
  let b_link = root.join("modules/b/node_modules/lodash");
  assert_eq!(fs::read_link(&b_link).unwrap(), root.join("node_modules/lodash"));
}

#[tokio::test]
async fn disjoint_ranges_only_partially_hoist() {
  let tmp = tempfile::tempdir().unwrap();
  let root = tmp.path();
  write_pkg(root, "root", "1.0.0", "{}");
  write_pkg(&root.join("modules/a"), "a", "1.0.0", r#"{ "lodash": "^3.0.0" }"#);
  write_pkg(&root.join("modules/b"), "b", "1.0.0", r#"{ "lodash": "^4.0.0" }"#);
  write_pkg(&root.join("modules/c"), "c", "1.0.0", r#"{ "lodash": "^4.0.0" }"#);

  let c = ctx(root);
  let set = discovery::discover(&c).await.unwrap();
  let requests = coalescer::coalesce(&set.modules);
  let requests = filter::filter(requests, &set.modules, &set.installed_dependencies, &c);
  let plan = planner::plan(requests, &set.installed_dependencies, &c.no_hoist_rules, &c.root).unwrap();

  let by_target = planner::placements_by_target(&plan);
  assert!(by_target.get(root).unwrap().contains(&"lodash@\"^4.0.0\"".to_string()));
  assert!(by_target
    .get(&root.join("modules/a"))
    .unwrap()
    .contains(&"lodash@\"^3.0.0\"".to_string()));
}

#[tokio::test]
async fn local_module_shadows_installed_dependency() {
  let tmp = tempfile::tempdir().unwrap();
  let root = tmp.path();
  write_pkg(root, "root", "1.0.0", "{}");
  write_pkg(&root.join("modules/utils"), "utils", "2.0.0", "{}");
  write_pkg(&root.join("modules/b"), "b", "1.0.0", r#"{ "utils": "^2.0.0" }"#);

  let c = ctx(root);
  let set = discovery::discover(&c).await.unwrap();
  let requests = coalescer::coalesce(&set.modules);
  let filtered = filter::filter(requests, &set.modules, &set.installed_dependencies, &c);
  assert!(filtered.requests_for("utils").is_empty());

  let results = linker::repair(&set.modules, &set.installed_dependencies, &c);
  let (_, dep, outcome) = results.iter().find(|(_, dep, _)| dep == "utils").unwrap();
  assert_eq!(dep, "utils");
  assert_eq!(*outcome, linker::LinkOutcome::LocalModule);

  let link = root.join("modules/b/node_modules/utils");
  assert_eq!(fs::read_link(&link).unwrap(), root.join("modules/utils"));
}

#[tokio::test]
async fn no_hoist_rule_keeps_separate_placements() {
  let tmp = tempfile::tempdir().unwrap();
  let root = tmp.path();
  write_pkg(root, "root", "1.0.0", "{}");
  write_pkg(&root.join("modules/a"), "a", "1.0.0", r#"{ "aurelia-cli": "^1.0.0" }"#);
  write_pkg(&root.join("modules/b"), "b", "1.0.0", r#"{ "aurelia-cli": "^1.0.0" }"#);

  let mut c = ctx(root);
  c.no_hoist_rules = vec![modhoist::planner::NoHoistRule::parse("aurelia-*")];
  let set = discovery::discover(&c).await.unwrap();
  let requests = coalescer::coalesce(&set.modules);
  let requests = filter::filter(requests, &set.modules, &set.installed_dependencies, &c);
  let plan = planner::plan(requests, &set.installed_dependencies, &c.no_hoist_rules, &c.root).unwrap();

  assert!(plan.requests_at(root).is_empty());
  assert_eq!(plan.requests_at(&root.join("modules/a")).len(), 1);
  assert_eq!(plan.requests_at(&root.join("modules/b")).len(), 1);
}

#[tokio::test]
async fn scoped_packages_round_trip_through_discovery_and_linking() {
  let tmp = tempfile::tempdir().unwrap();
  let root = tmp.path();
  write_pkg(root, "root", "1.0.0", "{}");
  write_pkg(&root.join("modules/a"), "a", "1.0.0", r#"{ "@scope/pkg": "^1.0.0" }"#);
  write_pkg(&root.join("node_modules/@scope/pkg"), "@scope/pkg", "1.2.0", "{}");

  let c = ctx(root);
  let set = discovery::discover(&c).await.unwrap();
  assert_eq!(set.installed_dependencies.len(), 1);

  let results = linker::repair(&set.modules, &set.installed_dependencies, &c);
  assert_eq!(results.len(), 1);
  let link = root.join("modules/a/node_modules/@scope/pkg");
  assert_eq!(fs::read_link(&link).unwrap(), root.join("node_modules/@scope/pkg"));
}
