//! Manifest reader (§4.1): parses one `package.json` into a `ModuleInfo`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::ManifestError;

/// One resolved manifest, combined with the on-disk location the discovery
/// crawler found it at.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
  /// Absolute path of the enclosing folder of the module's directory.
  pub location: PathBuf,
  /// The on-disk folder name, which may diverge from the canonical name.
  pub real_folder_name: String,
  /// The relative path this module should occupy under `node_modules`.
  pub canonical_folder_name: String,
  pub name: String,
  pub version: String,
  /// Merged runtime/dev/peer dependency ranges, keyed by name.
  pub dependencies: BTreeMap<String, String>,
  pub postinstall_command: Option<String>,
  pub bin_entries: BTreeMap<String, String>,
  pub is_scoped: bool,
}

impl ModuleInfo {
  pub fn full_module_path(&self) -> PathBuf {
    self.location.join(&self.real_folder_name)
  }

  /// The path `self` would occupy if installed directly under
  /// `node_modules_dir`, accounting for scoped names occupying two path
  /// segments on disk (`@scope/pkg` -> `node_modules/@scope/pkg`).
  pub fn path_under(&self, node_modules_dir: &Path) -> PathBuf {
    node_modules_dir.join(canonical_path(&self.canonical_folder_name))
  }
}

/// Splits a canonical folder name like `@scope/pkg` into its on-disk path
/// segments; an unscoped name is a single segment.
pub fn canonical_path(canonical_folder_name: &str) -> PathBuf {
  canonical_folder_name.split('/').collect::<PathBuf>()
}

#[derive(Debug, Deserialize, Default)]
struct Scripts {
  #[serde(default)]
  postinstall: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PackageJsonFile {
  #[serde(default)]
  name: String,
  #[serde(default)]
  version: String,
  #[serde(default)]
  dependencies: BTreeMap<String, String>,
  #[serde(default, rename = "devDependencies")]
  dev_dependencies: BTreeMap<String, String>,
  #[serde(default, rename = "peerDependencies")]
  peer_dependencies: BTreeMap<String, String>,
  #[serde(default)]
  scripts: Scripts,
  #[serde(default)]
  bin: Option<Value>,
}

/// Reads and parses the manifest at `join(module_folder, "package.json")`,
/// then combines it with the folder's on-disk identity to produce the full
/// `ModuleInfo` record. `production` suppresses the devDependencies overlay.
pub fn read_module(module_folder: &Path, production: bool) -> Result<ModuleInfo, ManifestError> {
  let manifest_path = module_folder.join("package.json");
  let contents = fs::read_to_string(&manifest_path)
    .map_err(|e| ManifestError::new(manifest_path.clone(), e.to_string()))?;
  let parsed: PackageJsonFile = serde_json::from_str(&contents)
    .map_err(|e| ManifestError::new(manifest_path.clone(), e.to_string()))?;

  let mut dependencies = parsed.dependencies.clone();
  if !production {
    for (name, range) in &parsed.dev_dependencies {
      dependencies.insert(name.clone(), range.clone());
    }
  }
  for (name, range) in &parsed.peer_dependencies {
    dependencies.insert(name.clone(), range.clone());
  }

  let bin_entries = normalize_bin(parsed.bin.as_ref(), &parsed.name, &manifest_path)?;
  let is_scoped = parsed.name.starts_with('@');

  let location = module_folder
    .parent()
    .map(Path::to_path_buf)
    .unwrap_or_else(|| module_folder.to_path_buf());
  let real_folder_name = module_folder
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();

  Ok(ModuleInfo {
    location,
    real_folder_name,
    canonical_folder_name: parsed.name.clone(),
    name: parsed.name,
    version: parsed.version,
    dependencies,
    postinstall_command: parsed.scripts.postinstall,
    bin_entries,
    is_scoped,
  })
}

/// Normalizes the three manifest shapes the `bin` field can take: absent →
/// empty, a single string → `{ name: string }`, a mapping → passthrough.
/// Any other JSON shape is a malformed manifest.
fn normalize_bin(
  bin: Option<&Value>,
  package_name: &str,
  manifest_path: &Path,
) -> Result<BTreeMap<String, String>, ManifestError> {
  match bin {
    None => Ok(BTreeMap::new()),
    Some(Value::String(path)) => {
      let mut map = BTreeMap::new();
      map.insert(package_name.to_string(), path.clone());
      Ok(map)
    }
    Some(Value::Object(entries)) => {
      let mut map = BTreeMap::new();
      for (name, value) in entries {
        match value {
          Value::String(path) => {
            map.insert(name.clone(), path.clone());
          }
          _ => {
            return Err(ManifestError::new(
              manifest_path.to_path_buf(),
              format!("bin entry '{name}' must be a string"),
            ))
          }
        }
      }
      Ok(map)
    }
    Some(_) => Err(ManifestError::new(
      manifest_path.to_path_buf(),
      "bin field must be a string or an object of strings".to_string(),
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  fn write_manifest(dir: &Path, contents: &str) {
    let mut f = fs::File::create(dir.join("package.json")).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
  }

  #[test]
  fn merges_dev_then_peer_over_runtime() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
      dir.path(),
      r#"{
        "name": "pkg",
        "version": "1.0.0",
        "dependencies": { "a": "^1.0.0", "b": "^1.0.0" },
        "devDependencies": { "a": "^2.0.0" },
        "peerDependencies": { "b": "^3.0.0" }
      }"#,
    );
    let info = read_module(dir.path(), false).unwrap();
    assert_eq!(info.dependencies.get("a").unwrap(), "^2.0.0");
    assert_eq!(info.dependencies.get("b").unwrap(), "^3.0.0");
  }

  #[test]
  fn production_skips_dev_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(
      dir.path(),
      r#"{
        "name": "pkg",
        "version": "1.0.0",
        "dependencies": { "a": "^1.0.0" },
        "devDependencies": { "a": "^2.0.0" }
      }"#,
    );
    let info = read_module(dir.path(), true).unwrap();
    assert_eq!(info.dependencies.get("a").unwrap(), "^1.0.0");
  }

  #[test]
  fn bin_string_shape_normalizes_to_package_name() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), r#"{ "name": "tool", "bin": "./bin/cli.js" }"#);
    let info = read_module(dir.path(), false).unwrap();
    assert_eq!(info.bin_entries.get("tool").unwrap(), "./bin/cli.js");
  }

  #[test]
  fn bin_number_is_a_manifest_error() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), r#"{ "name": "tool", "bin": 4 }"#);
    assert!(read_module(dir.path(), false).is_err());
  }

  #[test]
  fn missing_manifest_error_includes_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_module(dir.path(), false).unwrap_err();
    assert!(err.to_string().contains("package.json"));
  }

  #[test]
  fn scoped_name_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), r#"{ "name": "@scope/pkg", "version": "1.0.0" }"#);
    let info = read_module(dir.path(), false).unwrap();
    assert!(info.is_scoped);
    assert_eq!(info.canonical_folder_name, "@scope/pkg");
  }
}
