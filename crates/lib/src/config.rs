//! Pipeline configuration.
//!
//! A [`BuildConfiguration`] is constructed once at pipeline entry and passed by
//! reference to every component. [`BuildConfiguration::from_env`] is the only
//! place the process environment is consulted.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::consts::{
  ENV_DEBUG, ENV_GENERATOR, ENV_PARSER_URL, ENV_TOOLCHAIN_ROOT, PARSER_CACHE_DIR_NAME, PARSER_URL_TEMPLATE,
};
use crate::platform::PlatformProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildType {
  Debug,
  Release,
}

impl BuildType {
  /// Returns the `CMAKE_BUILD_TYPE` value
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "Debug",
      Self::Release => "Release",
    }
  }
}

/// How artifacts are placed into the staging directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
  /// Copy every artifact; the result is redistributable.
  #[default]
  Copy,
  /// Symlink every artifact back into the source and build trees.
  Link,
}

/// Explicit compiler paths handed to the native build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerPaths {
  pub c: PathBuf,
  pub cxx: PathBuf,
  pub rc: PathBuf,
}

/// Where the prebuilt parser release comes from and where it is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserSource {
  /// URL with a `{platform}` placeholder.
  pub url_template: String,
  /// Lowercase hex SHA-256 the archive must match, if pinned.
  pub sha256: Option<String>,
  pub cache_dir: PathBuf,
}

impl ParserSource {
  /// Expand the URL template for a platform.
  pub fn url_for(&self, profile: PlatformProfile) -> String {
    self.url_template.replace("{platform}", profile.as_str())
  }
}

/// Caller-supplied settings, before environment overrides are applied.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
  pub staging_dir: PathBuf,
  pub debug: bool,
  pub generator: Option<String>,
  pub compilers: Option<CompilerPaths>,
  pub jobs: Option<usize>,
  pub parser_url: Option<String>,
  pub parser_sha256: Option<String>,
  pub parser_cache_dir: Option<PathBuf>,
  pub toolchain_root: Option<PathBuf>,
  pub search_path: Option<OsString>,
  pub layout: LayoutMode,
}

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfiguration {
  pub profile: PlatformProfile,
  /// Root of the CMake project (holds `extern/` and `src/runtime/`).
  pub source_dir: PathBuf,
  /// CMake binary directory.
  pub build_dir: PathBuf,
  /// Destination root of the assembled package.
  pub staging_dir: PathBuf,
  pub build_type: BuildType,
  pub generator: Option<String>,
  /// Compiler overrides; on Windows these replace the search-path lookup.
  pub compilers: Option<CompilerPaths>,
  /// Value passed to the native build's `-j`.
  pub parallelism: usize,
  pub parser: ParserSource,
  /// Overrides the platform's default toolchain bundle root.
  pub toolchain_root: Option<PathBuf>,
  /// Executable search path used to locate compilers.
  #[serde(skip)]
  pub search_path: Option<OsString>,
  pub layout: LayoutMode,
}

impl BuildConfiguration {
  /// Build a configuration from explicit options only.
  pub fn new(profile: PlatformProfile, options: ConfigOptions) -> Self {
    let parser_cache_dir = options
      .parser_cache_dir
      .unwrap_or_else(|| options.build_dir.join(PARSER_CACHE_DIR_NAME));

    Self {
      profile,
      source_dir: absolute(&options.source_dir),
      build_dir: absolute(&options.build_dir),
      staging_dir: absolute(&options.staging_dir),
      build_type: if options.debug { BuildType::Debug } else { BuildType::Release },
      generator: options.generator.filter(|g| !g.is_empty()),
      compilers: options.compilers,
      parallelism: options.jobs.unwrap_or_else(num_cpus).max(1),
      parser: ParserSource {
        url_template: options.parser_url.unwrap_or_else(|| PARSER_URL_TEMPLATE.to_string()),
        sha256: options.parser_sha256.map(|s| s.to_lowercase()),
        cache_dir: absolute(&parser_cache_dir),
      },
      toolchain_root: options.toolchain_root.map(|p| absolute(&p)),
      search_path: options.search_path,
      layout: options.layout,
    }
  }

  /// Build a configuration, filling gaps from the process environment.
  ///
  /// - `DEBUG` (any value) forces a Debug build
  /// - `CMAKE_GENERATOR` supplies the generator when none was given
  /// - `XSIM_DIST_PARSER_URL` supplies the parser URL template when none was given
  /// - `XSIM_DIST_TOOLCHAIN_ROOT` supplies the toolchain root when none was given
  /// - `PATH` becomes the compiler search path when none was given
  pub fn from_env(profile: PlatformProfile, mut options: ConfigOptions) -> Self {
    if std::env::var_os(ENV_DEBUG).is_some() {
      options.debug = true;
    }
    if options.generator.is_none() {
      options.generator = std::env::var(ENV_GENERATOR).ok();
    }
    if options.parser_url.is_none() {
      options.parser_url = std::env::var(ENV_PARSER_URL).ok().filter(|u| !u.is_empty());
    }
    if options.toolchain_root.is_none() {
      options.toolchain_root = std::env::var_os(ENV_TOOLCHAIN_ROOT)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);
    }
    if options.search_path.is_none() {
      options.search_path = std::env::var_os("PATH");
    }

    Self::new(profile, options)
  }

  /// Build-directory path of the executable target's output.
  pub fn executable_output(&self) -> PathBuf {
    self
      .build_dir
      .join(crate::consts::EXECUTABLE_BUILD_DIR)
      .join(self.profile.executable_name())
  }

  /// Build-directory path of the runtime target's output.
  pub fn runtime_output(&self) -> PathBuf {
    self
      .build_dir
      .join(crate::consts::RUNTIME_BUILD_DIR)
      .join(self.profile.runtime_library_name())
  }
}

/// Resolve a path against the working directory without touching the filesystem.
///
/// Existing paths are canonicalized (without UNC prefixes on Windows).
fn absolute(path: &Path) -> PathBuf {
  if let Ok(canonical) = dunce::canonicalize(path) {
    return canonical;
  }
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
