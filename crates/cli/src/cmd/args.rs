//! Flags shared by the pipeline commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use xsim_dist_lib::config::{BuildConfiguration, ConfigOptions, LayoutMode};
use xsim_dist_lib::platform::Host;

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
  /// Root of the xsim CMake project
  #[arg(long, default_value = ".")]
  pub source: PathBuf,

  /// CMake binary directory
  #[arg(long, default_value = "build")]
  pub build_dir: PathBuf,

  /// Directory the package is assembled into
  #[arg(long, default_value = "dist")]
  pub staging: PathBuf,

  /// Build with CMAKE_BUILD_TYPE=Debug (also enabled by the DEBUG variable)
  #[arg(long)]
  pub debug: bool,

  /// CMake generator (defaults to CMAKE_GENERATOR, or Ninja on Windows)
  #[arg(long)]
  pub generator: Option<String>,

  /// Parallel build jobs (defaults to the number of CPUs)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Parser release URL; `{platform}` expands to linux or macos
  #[arg(long)]
  pub parser_url: Option<String>,

  /// Expected SHA-256 of the parser release archive
  #[arg(long)]
  pub parser_sha256: Option<String>,

  /// Toolchain directory to ship instead of the platform default
  #[arg(long)]
  pub toolchain_root: Option<PathBuf>,

  /// Symlink artifacts instead of copying them (development layout)
  #[arg(long)]
  pub link: bool,
}

impl BuildArgs {
  fn options(&self) -> ConfigOptions {
    ConfigOptions {
      source_dir: self.source.clone(),
      build_dir: self.build_dir.clone(),
      staging_dir: self.staging.clone(),
      debug: self.debug,
      generator: self.generator.clone(),
      jobs: self.jobs,
      parser_url: self.parser_url.clone(),
      parser_sha256: self.parser_sha256.clone(),
      toolchain_root: self.toolchain_root.clone(),
      layout: if self.link { LayoutMode::Link } else { LayoutMode::Copy },
      ..Default::default()
    }
  }

  pub fn configuration(&self) -> Result<BuildConfiguration> {
    configuration(self.options())
  }
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
  /// CMake binary directory; the release is unpacked into its slang-dist/
  #[arg(long, default_value = "build")]
  pub build_dir: PathBuf,

  /// Unpack into this directory instead
  #[arg(long)]
  pub cache_dir: Option<PathBuf>,

  /// Parser release URL; `{platform}` expands to linux or macos
  #[arg(long)]
  pub parser_url: Option<String>,

  /// Expected SHA-256 of the parser release archive
  #[arg(long)]
  pub parser_sha256: Option<String>,
}

impl FetchArgs {
  pub fn configuration(&self) -> Result<BuildConfiguration> {
    configuration(ConfigOptions {
      source_dir: PathBuf::from("."),
      build_dir: self.build_dir.clone(),
      parser_url: self.parser_url.clone(),
      parser_sha256: self.parser_sha256.clone(),
      parser_cache_dir: self.cache_dir.clone(),
      ..Default::default()
    })
  }
}

fn configuration(options: ConfigOptions) -> Result<BuildConfiguration> {
  let host = Host::detect().context("Failed to detect host platform")?;
  debug!(%host, "detected host");
  Ok(BuildConfiguration::from_env(host.profile, options))
}
