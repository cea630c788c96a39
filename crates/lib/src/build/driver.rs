//! Native build backend invocation.
//!
//! The CMake project is configured once and then built for exactly two
//! targets. Both steps run through [`run_checked`], so a failing backend
//! surfaces its captured output unchanged.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::BuildConfiguration;
use crate::consts::{DEFAULT_WINDOWS_GENERATOR, EXECUTABLE_TARGET, RUNTIME_TARGET};
use crate::platform::PlatformProfile;
use crate::process::{CommandRunner, Invocation, ProcessError, run_checked};
use crate::toolchain::LocatedToolchain;

const CMAKE: &str = "cmake";

/// Errors from configuring or building the native project.
#[derive(Debug, Error)]
pub enum DriverError {
  #[error("failed to create build directory '{path}'")]
  BuildDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("configure failed")]
  Configure(#[source] ProcessError),

  #[error("build failed")]
  Build(#[source] ProcessError),
}

/// Where the two build targets leave their outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutputs {
  pub executable: PathBuf,
  pub runtime_library: PathBuf,
  /// Extra static libraries shipped next to the runtime (Windows only).
  pub auxiliary_libraries: Vec<PathBuf>,
}

impl BuildOutputs {
  pub fn expected(config: &BuildConfiguration) -> Self {
    Self {
      executable: config.executable_output(),
      runtime_library: config.runtime_output(),
      auxiliary_libraries: config
        .profile
        .auxiliary_static_libraries()
        .iter()
        .map(|rel| config.build_dir.join(rel))
        .collect(),
    }
  }
}

/// Assemble the configure command for this configuration.
pub fn configure_invocation(config: &BuildConfiguration, located: Option<&LocatedToolchain>) -> Invocation {
  let mut invocation = Invocation::new(CMAKE)
    .arg(&config.source_dir)
    .arg(format!("-DCMAKE_BUILD_TYPE={}", config.build_type.as_str()));

  if config.profile.static_link_supported() {
    invocation = invocation.arg("-DSTATIC_BUILD=ON");
  }

  let generator = match config.profile {
    PlatformProfile::Windows => Some(
      config
        .generator
        .clone()
        .unwrap_or_else(|| DEFAULT_WINDOWS_GENERATOR.to_string()),
    ),
    PlatformProfile::Linux | PlatformProfile::MacOs => config.generator.clone(),
  };
  if let Some(generator) = generator {
    invocation = invocation.arg("-G").arg(generator);
  }

  let compilers = located.map(|l| &l.compilers).or(config.compilers.as_ref());
  if let Some(compilers) = compilers {
    invocation = invocation
      .arg(format!("-DCMAKE_C_COMPILER={}", compilers.c.display()))
      .arg(format!("-DCMAKE_CXX_COMPILER={}", compilers.cxx.display()))
      .arg(format!("-DCMAKE_RC_COMPILER={}", compilers.rc.display()));
  }

  invocation.current_dir(&config.build_dir)
}

/// Assemble the build command for both targets.
pub fn build_invocation(config: &BuildConfiguration) -> Invocation {
  Invocation::new(CMAKE)
    .args(["--build", ".", "--target", EXECUTABLE_TARGET, RUNTIME_TARGET])
    .arg("-j")
    .arg(config.parallelism.to_string())
    .current_dir(&config.build_dir)
}

/// Drives the native build backend for one configuration.
pub struct BuildDriver<'a, R> {
  config: &'a BuildConfiguration,
  runner: &'a R,
}

impl<'a, R: CommandRunner> BuildDriver<'a, R> {
  pub fn new(config: &'a BuildConfiguration, runner: &'a R) -> Self {
    Self { config, runner }
  }

  /// Run the configure step in the build directory, creating it if needed.
  pub fn configure(&self, located: Option<&LocatedToolchain>) -> Result<(), DriverError> {
    let build_dir = &self.config.build_dir;
    fs::create_dir_all(build_dir).map_err(|source| DriverError::BuildDir {
      path: build_dir.clone(),
      source,
    })?;

    info!(
      build_type = self.config.build_type.as_str(),
      build_dir = %build_dir.display(),
      "configuring native build"
    );
    run_checked(self.runner, &configure_invocation(self.config, located)).map_err(DriverError::Configure)?;
    Ok(())
  }

  /// Build the executable and runtime targets.
  pub fn build(&self) -> Result<BuildOutputs, DriverError> {
    info!(
      targets = ?[EXECUTABLE_TARGET, RUNTIME_TARGET],
      jobs = self.config.parallelism,
      "building native targets"
    );
    run_checked(self.runner, &build_invocation(self.config)).map_err(DriverError::Build)?;
    Ok(BuildOutputs::expected(self.config))
  }
}
