//! Toolchain acquisition.
//!
//! Linux and macOS download the prebuilt parser release ([`fetch`]); Windows
//! discovers a locally installed clang ([`locate`]). Either way the result is a
//! [`ToolchainBundle`] whose top-level directories are mirrored into the
//! staging root.

pub mod fetch;
pub mod locate;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::BuildConfiguration;

pub use fetch::{FetchError, FetchOutcome, fetch_parser};
pub use locate::{IncludeDiscovery, LocateError, LocatedToolchain, locate_toolchain};

/// A toolchain distribution to mirror into the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainBundle {
  pub root: PathBuf,
  /// Top-level directories of `root`, sorted by name.
  pub directories: Vec<PathBuf>,
  /// Paths relative to the staging root removed after mirroring.
  pub prune: Vec<PathBuf>,
}

impl ToolchainBundle {
  /// List the top-level directories of `root`.
  pub fn open(root: &Path, prune: &[&str]) -> io::Result<Self> {
    let mut directories = Vec::new();
    for entry in fs::read_dir(root)? {
      let entry = entry?;
      if entry.file_type()?.is_dir() {
        directories.push(entry.path());
      }
    }
    directories.sort();

    Ok(Self {
      root: root.to_path_buf(),
      directories,
      prune: prune.iter().map(PathBuf::from).collect(),
    })
  }

  /// Prune entries that fall under the given mirrored directory name.
  pub fn prune_for(&self, directory_name: &Path) -> Vec<PathBuf> {
    self
      .prune
      .iter()
      .filter(|p| p.starts_with(directory_name))
      .cloned()
      .collect()
  }
}

/// Root of the bundle to mirror, if this run ships one.
///
/// An explicit override wins, then a located compiler's resource directory,
/// then the platform default.
pub fn bundle_root(config: &BuildConfiguration, located: Option<&LocatedToolchain>) -> Option<PathBuf> {
  config
    .toolchain_root
    .clone()
    .or_else(|| located.and_then(|l| l.bundle_root()).map(Path::to_path_buf))
    .or_else(|| config.profile.default_toolchain_root())
}
