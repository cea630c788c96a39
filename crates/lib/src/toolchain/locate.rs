//! Compiler discovery for platforms without a bundled toolchain.
//!
//! The project requires clang on Windows. The locator finds `clang`,
//! `clang++`, and `llvm-rc` on the executable search path, then asks clang
//! where its own headers live so they can ship with the package.
//!
//! # Include root discovery
//!
//! `clang -print-resource-dir` is tried first. If that fails, the locator
//! falls back to preprocessing empty input with `-v` and reading the first
//! path after the `#include <...> search starts here:` line. The diagnostic
//! format is not a stable interface and may change between clang releases.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BuildConfiguration, CompilerPaths};
use crate::process::{CommandRunner, Invocation, ProcessError, run_checked};

pub const C_COMPILER: &str = "clang";
pub const CXX_COMPILER: &str = "clang++";
pub const RC_COMPILER: &str = "llvm-rc";

/// Marker line in clang's verbose preprocessing output.
pub const INCLUDE_SEARCH_MARKER: &str = "#include <...> search starts here:";

/// Errors that can occur while locating the toolchain.
#[derive(Debug, Error)]
pub enum LocateError {
  /// A required tool is not on the search path.
  #[error("required tool '{tool}' not found on the executable search path")]
  ToolchainNotFound { tool: String },

  /// The compiler ran but its include root could not be determined.
  #[error("could not determine include root of {compiler}\n{output}")]
  IncludeRootNotFound { compiler: PathBuf, output: String },

  #[error(transparent)]
  Process(#[from] ProcessError),
}

/// How the include root was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeDiscovery {
  ResourceDir,
  DiagnosticScrape,
}

/// A discovered compiler installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedToolchain {
  pub compilers: CompilerPaths,
  /// Compiler-provided system include directory.
  pub include_root: PathBuf,
  pub discovery: IncludeDiscovery,
}

impl LocatedToolchain {
  /// Directory mirrored into the package: the compiler's resource directory.
  pub fn bundle_root(&self) -> Option<&Path> {
    self.include_root.parent()
  }
}

/// Locate the compilers and their include root.
///
/// Compiler overrides from the configuration take the place of the search
/// path lookup.
pub fn locate_toolchain(
  config: &BuildConfiguration,
  runner: &impl CommandRunner,
) -> Result<LocatedToolchain, LocateError> {
  let compilers = match &config.compilers {
    Some(compilers) => compilers.clone(),
    None => {
      let search_path = config.search_path.as_deref();
      CompilerPaths {
        c: find_tool(C_COMPILER, search_path, &config.source_dir)?,
        cxx: find_tool(CXX_COMPILER, search_path, &config.source_dir)?,
        rc: find_tool(RC_COMPILER, search_path, &config.source_dir)?,
      }
    }
  };

  info!(c = %compilers.c.display(), cxx = %compilers.cxx.display(), rc = %compilers.rc.display(), "located compilers");

  let (include_root, discovery) = match query_resource_dir(&compilers.c, runner) {
    Some(root) => (root, IncludeDiscovery::ResourceDir),
    None => {
      warn!(compiler = %compilers.c.display(), "resource dir query failed, scraping preprocessor diagnostics");
      (scrape_include_root(&compilers.c, runner)?, IncludeDiscovery::DiagnosticScrape)
    }
  };

  debug!(include_root = %include_root.display(), ?discovery, "resolved include root");

  Ok(LocatedToolchain {
    compilers,
    include_root,
    discovery,
  })
}

/// Find one tool on the search path.
pub fn find_tool(name: &str, search_path: Option<&OsStr>, cwd: &Path) -> Result<PathBuf, LocateError> {
  let not_found = || LocateError::ToolchainNotFound { tool: name.to_string() };
  let search_path = search_path.ok_or_else(not_found)?;
  which::which_in(name, Some(search_path), cwd).map_err(|_| not_found())
}

fn query_resource_dir(compiler: &Path, runner: &impl CommandRunner) -> Option<PathBuf> {
  let invocation = Invocation::new(compiler).arg("-print-resource-dir");
  let output = run_checked(runner, &invocation).ok()?;

  let resource_dir = output.stdout.trim();
  if resource_dir.is_empty() {
    return None;
  }

  let include_root = PathBuf::from(resource_dir).join("include");
  include_root.is_dir().then_some(include_root)
}

fn scrape_include_root(compiler: &Path, runner: &impl CommandRunner) -> Result<PathBuf, LocateError> {
  let invocation = Invocation::new(compiler).args(["-E", "-x", "c++", "-", "-v"]);
  let output = run_checked(runner, &invocation)?;
  let diagnostics = output.combined();

  parse_include_root(&diagnostics).ok_or_else(|| LocateError::IncludeRootNotFound {
    compiler: compiler.to_path_buf(),
    output: diagnostics,
  })
}

/// Extract the first include search path following [`INCLUDE_SEARCH_MARKER`].
pub fn parse_include_root(diagnostics: &str) -> Option<PathBuf> {
  let mut lines = diagnostics.lines();
  lines.find(|line| line.trim() == INCLUDE_SEARCH_MARKER)?;

  let first = lines.next()?.trim();
  if first.is_empty() || first.starts_with("End of search list") {
    return None;
  }

  // Framework directories on macOS carry a suffix.
  let path = first.trim_end_matches(" (framework directory)");
  Some(PathBuf::from(path))
}
