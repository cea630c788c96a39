//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated source, toolchain, and staging trees.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A source checkout with the header trees the package ships.
  pub fn with_sources() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("src/extern/marl/include/marl/scheduler.h", "// marl\n");
    env.write_file("src/extern/logic/include/logic/logic.hh", "// logic\n");
    env.write_file("src/src/runtime/module.hh", "// module\n");
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// A GCC-like toolchain root.
  pub fn toolchain(&self) -> PathBuf {
    self.write_file("gcc/bin/g++", "g++");
    self.write_file("gcc/lib64/libstdc++.a", "archive");
    self.write_file("gcc/share/man/man1/g++.1", "man");
    self.path("gcc")
  }

  /// `xsim-dist` running inside the temp directory with a scrubbed environment.
  pub fn cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("xsim-dist");
    cmd.current_dir(self.temp.path());
    for var in [
      "DEBUG",
      "CMAKE_GENERATOR",
      "XSIM_DIST_PARSER_URL",
      "XSIM_DIST_TOOLCHAIN_ROOT",
      "RUST_LOG",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }

  /// Standard pipeline flags pointing into this environment.
  pub fn pipeline_args(&self, toolchain: &Path) -> Vec<String> {
    vec![
      "--source".to_string(),
      self.path("src").display().to_string(),
      "--build-dir".to_string(),
      self.path("build").display().to_string(),
      "--staging".to_string(),
      self.path("stage").display().to_string(),
      "--toolchain-root".to_string(),
      toolchain.display().to_string(),
    ]
  }
}
