//! The ordered list of copy steps that turns a build tree into a package.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::build::BuildOutputs;
use crate::config::{BuildConfiguration, LayoutMode};
use crate::consts::{HEADER_DEPENDENCIES, RUNTIME_HEADER_DIR};
use crate::toolchain::ToolchainBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyKind {
  Directory,
  File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
  /// Leave an existing destination untouched.
  SkipIfExists,
  /// Remove any existing destination and copy again.
  AlwaysRefresh,
}

/// Assembly stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  Toolchain,
  DependencyHeaders,
  RuntimeHeaders,
  RuntimeLibrary,
  Executable,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Toolchain => "toolchain",
      Self::DependencyHeaders => "dependency-headers",
      Self::RuntimeHeaders => "runtime-headers",
      Self::RuntimeLibrary => "runtime-library",
      Self::Executable => "executable",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyStep {
  pub stage: Stage,
  pub source: PathBuf,
  pub destination: PathBuf,
  pub kind: CopyKind,
  pub policy: OverwritePolicy,
  /// Paths relative to the staging root removed after a fresh copy.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub prune: Vec<PathBuf>,
}

impl CopyStep {
  fn directory(stage: Stage, source: PathBuf, destination: PathBuf) -> Self {
    Self {
      stage,
      source,
      destination,
      kind: CopyKind::Directory,
      policy: OverwritePolicy::SkipIfExists,
      prune: Vec::new(),
    }
  }

  fn refreshed_file(stage: Stage, source: &Path, dest_dir: &Path) -> Self {
    let destination = match source.file_name() {
      Some(name) => dest_dir.join(name),
      None => dest_dir.to_path_buf(),
    };
    Self {
      stage,
      source: source.to_path_buf(),
      destination,
      kind: CopyKind::File,
      policy: OverwritePolicy::AlwaysRefresh,
      prune: Vec::new(),
    }
  }
}

/// Ordered copy operations for one assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactManifest {
  pub staging_dir: PathBuf,
  pub steps: Vec<CopyStep>,
}

impl ArtifactManifest {
  /// Lay out every step for this configuration.
  ///
  /// `bundle` is the toolchain to mirror, if this run ships one. The link
  /// layout never mirrors a toolchain.
  pub fn build(config: &BuildConfiguration, bundle: Option<&ToolchainBundle>, outputs: &BuildOutputs) -> Self {
    let staging = &config.staging_dir;
    let include = staging.join("include");
    let mut steps = Vec::new();

    if let (Some(bundle), LayoutMode::Copy) = (bundle, config.layout) {
      for dir in &bundle.directories {
        let Some(name) = dir.file_name() else { continue };
        let mut step = CopyStep::directory(Stage::Toolchain, dir.clone(), staging.join(name));
        step.prune = bundle.prune_for(Path::new(name));
        steps.push(step);
      }
    }

    for dep in HEADER_DEPENDENCIES {
      steps.push(CopyStep::directory(
        Stage::DependencyHeaders,
        config.source_dir.join("extern").join(dep).join("include").join(dep),
        include.join(dep),
      ));
    }

    steps.push(CopyStep::directory(
      Stage::RuntimeHeaders,
      config.source_dir.join("src").join(RUNTIME_HEADER_DIR),
      include.join(RUNTIME_HEADER_DIR),
    ));

    let lib = staging.join("lib");
    steps.push(CopyStep::refreshed_file(Stage::RuntimeLibrary, &outputs.runtime_library, &lib));
    for aux in &outputs.auxiliary_libraries {
      steps.push(CopyStep::refreshed_file(Stage::RuntimeLibrary, aux, &lib));
    }

    steps.push(CopyStep::refreshed_file(
      Stage::Executable,
      &outputs.executable,
      &staging.join("bin"),
    ));

    Self {
      staging_dir: staging.clone(),
      steps,
    }
  }

  pub fn steps_in(&self, stage: Stage) -> impl Iterator<Item = &CopyStep> {
    self.steps.iter().filter(move |s| s.stage == stage)
  }
}
