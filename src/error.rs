use std::path::PathBuf;

use thiserror::Error;

/// Failure reading or parsing a single module's manifest.
#[derive(Debug, Error)]
#[error("could not read manifest at '{path}': {message}")]
pub struct ManifestError {
  pub path: PathBuf,
  pub message: String,
}

impl ManifestError {
  pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
    Self { path, message: message.into() }
  }
}

/// The external installer exited with a non-zero status.
#[derive(Debug, Error)]
#[error("installer failed for '{target}' with exit code {code}")]
pub struct InstallerError {
  pub target: PathBuf,
  pub code: i32,
}

/// A placement invariant was violated by the hoist planner. This can only
/// happen if the planner's own candidate-path enumeration has a bug.
#[derive(Debug, Error)]
#[error("placement invariant violated: {0}")]
pub struct PlacementInvariantViolation(pub String);

/// Top-level error type the runner distinguishes for exit-code purposes.
#[derive(Debug, Error)]
pub enum AppError {
  /// Expected early-exit condition: started outside the project root, or
  /// the local-modules folder doesn't exist. Logged at info, exit 0.
  #[error("{0}")]
  Uncritical(String),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Installer(#[from] InstallerError),

  #[error(transparent)]
  PlacementInvariant(#[from] PlacementInvariantViolation),

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl AppError {
  /// Exit code per the CLI contract in §6: 0 on success or a recognized
  /// uncritical early exit, 1 on anything else fatal.
  pub fn exit_code(&self) -> i32 {
    match self {
      AppError::Uncritical(_) => 0,
      _ => 1,
    }
  }
}
