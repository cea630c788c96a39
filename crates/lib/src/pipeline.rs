//! The build-and-assemble pipeline.
//!
//! Stages run strictly in order against one [`BuildConfiguration`]:
//! toolchain preparation (parser fetch or compiler location), configure,
//! build, and assembly. The first failure ends the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::assemble::{ArtifactAssembler, ArtifactManifest, AssemblyReport, CopyError, Stage};
use crate::build::{BuildDriver, BuildOutputs, DriverError};
use crate::config::BuildConfiguration;
use crate::platform::PlatformProfile;
use crate::process::CommandRunner;
use crate::toolchain::{
  FetchError, FetchOutcome, LocateError, LocatedToolchain, ToolchainBundle, bundle_root, fetch_parser,
  locate_toolchain,
};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Locate(#[from] LocateError),

  #[error(transparent)]
  Driver(#[from] DriverError),

  #[error(transparent)]
  Copy(#[from] CopyError),
}

/// Result of the toolchain stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolchainSetup {
  pub parser: Option<FetchOutcome>,
  pub located: Option<LocatedToolchain>,
  /// Root of the bundle mirrored into the package, if any.
  pub bundle_root: Option<PathBuf>,
}

/// Everything a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  pub profile: PlatformProfile,
  pub toolchain: ToolchainSetup,
  pub outputs: BuildOutputs,
  pub assembly: AssemblyReport,
  pub duration_ms: u128,
}

/// Fetch the parser release or locate the compilers, per platform capability.
///
/// The bundle root is resolved and checked first, so a misconfigured root
/// fails before any download or build.
pub fn prepare_toolchain(
  config: &BuildConfiguration,
  runner: &impl CommandRunner,
) -> Result<ToolchainSetup, PipelineError> {
  let profile = config.profile;
  let located = locate_if_needed(config, runner)?;
  let bundle_root = bundle_root(config, located.as_ref());
  if let Some(root) = &bundle_root {
    require_root(root)?;
  }

  let parser = if profile.needs_prebuilt_parser() {
    Some(fetch_parser(profile, &config.parser)?)
  } else {
    None
  };

  Ok(ToolchainSetup {
    parser,
    located,
    bundle_root,
  })
}

fn locate_if_needed(
  config: &BuildConfiguration,
  runner: &impl CommandRunner,
) -> Result<Option<LocatedToolchain>, LocateError> {
  if config.profile.needs_toolchain_locate() {
    locate_toolchain(config, runner).map(Some)
  } else {
    Ok(None)
  }
}

/// Open the toolchain bundle to mirror, if this run ships one.
fn open_bundle(config: &BuildConfiguration, root: Option<&PathBuf>) -> Result<Option<ToolchainBundle>, CopyError> {
  let Some(root) = root else {
    debug!(profile = %config.profile, "no toolchain bundle to ship");
    return Ok(None);
  };
  require_root(root)?;
  ToolchainBundle::open(root, config.profile.toolchain_prune_list())
    .map(Some)
    .map_err(|source| CopyError::Io {
      path: root.clone(),
      source,
    })
}

fn require_root(root: &Path) -> Result<(), CopyError> {
  if root.exists() {
    Ok(())
  } else {
    Err(CopyError::MissingSource {
      stage: Stage::Toolchain,
      path: root.to_path_buf(),
    })
  }
}

/// Compute the manifest a build would execute, without building or writing.
///
/// Windows still queries the compiler, since the bundle root comes from it.
pub fn plan(config: &BuildConfiguration, runner: &impl CommandRunner) -> Result<ArtifactManifest, PipelineError> {
  let located = locate_if_needed(config, runner)?;
  let root = bundle_root(config, located.as_ref());
  let bundle = open_bundle(config, root.as_ref())?;
  Ok(ArtifactManifest::build(
    config,
    bundle.as_ref(),
    &BuildOutputs::expected(config),
  ))
}

/// Run the whole pipeline.
pub fn run(config: &BuildConfiguration, runner: &impl CommandRunner) -> Result<PipelineReport, PipelineError> {
  let started = Instant::now();
  info!(
    profile = %config.profile,
    build_type = config.build_type.as_str(),
    staging = %config.staging_dir.display(),
    "starting pipeline"
  );

  let toolchain = prepare_toolchain(config, runner)?;

  let driver = BuildDriver::new(config, runner);
  driver.configure(toolchain.located.as_ref())?;
  let outputs = driver.build()?;

  let bundle = open_bundle(config, toolchain.bundle_root.as_ref())?;
  let manifest = ArtifactManifest::build(config, bundle.as_ref(), &outputs);
  let assembly = ArtifactAssembler::new(config).assemble(&manifest)?;

  let duration_ms = started.elapsed().as_millis();
  info!(duration_ms, "pipeline finished");

  Ok(PipelineReport {
    profile: config.profile,
    toolchain,
    outputs,
    assembly,
    duration_ms,
  })
}
