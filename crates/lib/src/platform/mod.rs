pub mod arch;
pub mod profile;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use arch::Arch;
pub use profile::{Capabilities, PlatformProfile};

/// The host is not one of the platforms the distribution supports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported platform: {os}-{arch}")]
pub struct UnsupportedPlatformError {
  pub os: String,
  pub arch: String,
}

/// Resolved host identity: a platform profile plus its CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Host {
  pub profile: PlatformProfile,
  pub arch: Arch,
}

impl Host {
  /// Detect the current host.
  ///
  /// Fails for any OS or architecture outside the supported set.
  pub fn detect() -> Result<Self, UnsupportedPlatformError> {
    Self::from_names(std::env::consts::OS, std::env::consts::ARCH)
  }

  /// Resolve a host from `std::env::consts` style names
  pub fn from_names(os: &str, arch: &str) -> Result<Self, UnsupportedPlatformError> {
    let unsupported = || UnsupportedPlatformError {
      os: os.to_string(),
      arch: arch.to_string(),
    };

    Ok(Self {
      profile: PlatformProfile::from_os_name(os).ok_or_else(unsupported)?,
      arch: Arch::from_name(arch).ok_or_else(unsupported)?,
    })
  }

  /// Returns the platform triple string (e.g., "x86_64-linux")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.profile)
  }
}

impl fmt::Display for Host {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
