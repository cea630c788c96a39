//! Per-platform capabilities and naming.
//!
//! Every platform-dependent decision in the pipeline is answered here, so
//! downstream code matches on the profile instead of re-reading host identity.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::consts::{EXECUTABLE_STEM, GCC_VERSION, RUNTIME_STEM};

/// Host platforms the distribution can be assembled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformProfile {
  Linux,
  MacOs,
  Windows,
}

/// Boolean capability set of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
  /// The parser release must be downloaded before configuring.
  pub needs_prebuilt_parser: bool,
  /// A locally installed compiler must be discovered before configuring.
  pub needs_toolchain_locate: bool,
  /// The native build accepts `-DSTATIC_BUILD=ON`.
  pub static_link_supported: bool,
}

impl PlatformProfile {
  /// Map a `std::env::consts::OS` style name to a profile
  pub fn from_os_name(name: &str) -> Option<Self> {
    match name {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase identifier used in archive names and output
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "macos",
      Self::Windows => "windows",
    }
  }

  pub fn capabilities(&self) -> Capabilities {
    match self {
      Self::Linux => Capabilities {
        needs_prebuilt_parser: true,
        needs_toolchain_locate: false,
        static_link_supported: true,
      },
      Self::MacOs => Capabilities {
        needs_prebuilt_parser: true,
        needs_toolchain_locate: false,
        static_link_supported: false,
      },
      Self::Windows => Capabilities {
        needs_prebuilt_parser: false,
        needs_toolchain_locate: true,
        static_link_supported: true,
      },
    }
  }

  pub fn needs_prebuilt_parser(&self) -> bool {
    self.capabilities().needs_prebuilt_parser
  }

  pub fn needs_toolchain_locate(&self) -> bool {
    self.capabilities().needs_toolchain_locate
  }

  pub fn static_link_supported(&self) -> bool {
    self.capabilities().static_link_supported
  }

  /// File name of the parser release archive, if this platform downloads one.
  pub fn parser_archive_name(&self) -> Option<String> {
    self
      .needs_prebuilt_parser()
      .then(|| format!("slang-{}.tar.gz", self.as_str()))
  }

  pub fn executable_name(&self) -> String {
    match self {
      Self::Windows => format!("{}.exe", EXECUTABLE_STEM),
      Self::Linux | Self::MacOs => EXECUTABLE_STEM.to_string(),
    }
  }

  /// File name of the runtime library. Static on Windows, shared elsewhere.
  pub fn runtime_library_name(&self) -> String {
    match self {
      Self::Linux => format!("lib{}.so", RUNTIME_STEM),
      Self::MacOs => format!("lib{}.dylib", RUNTIME_STEM),
      Self::Windows => format!("{}.lib", RUNTIME_STEM),
    }
  }

  /// Static libraries that must ship next to the runtime, relative to the
  /// build directory.
  ///
  /// Linking statically against the runtime does not pull these in
  /// transitively, so consumers need them in `lib/` as well.
  pub fn auxiliary_static_libraries(&self) -> &'static [&'static str] {
    match self {
      Self::Windows => &["extern/marl/marl.lib", "extern/fmt/fmt.lib"],
      Self::Linux | Self::MacOs => &[],
    }
  }

  /// Toolchain bundle root used when no override is configured.
  ///
  /// Windows has no fixed location; its root comes from the locator.
  pub fn default_toolchain_root(&self) -> Option<PathBuf> {
    match self {
      Self::Linux => Some(PathBuf::from(format!("/usr/local/gcc-{}", GCC_VERSION))),
      Self::MacOs | Self::Windows => None,
    }
  }

  /// Paths, relative to each mirrored toolchain directory's parent, removed
  /// after copying to keep the package small.
  pub fn toolchain_prune_list(&self) -> &'static [&'static str] {
    match self {
      Self::Linux => &[
        "share/doc",
        "share/info",
        "share/man",
        "share/locale",
        "bin/lto-dump",
        "bin/gcov-dump",
        "bin/gcov-tool",
      ],
      Self::MacOs => &[],
      Self::Windows => &["share"],
    }
  }
}

impl fmt::Display for PlatformProfile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
