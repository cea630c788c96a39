//! Test utilities for xsim-dist-lib.
//!
//! Cross-platform shell helpers, a recording [`CommandRunner`], and builders
//! for the source, toolchain, and archive fixtures the pipeline consumes.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::config::BuildConfiguration;
use crate::process::{CommandOutput, CommandRunner, Invocation};

/// Returns the command and args to echo a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

/// Returns the command and args to create a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  ("/usr/bin/touch", vec![filename.to_string()])
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> (&'static str, Vec<String>) {
  (
    "powershell.exe",
    vec![
      "-NoProfile".to_string(),
      "-Command".to_string(),
      format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
    ],
  )
}

/// Returns a command that prints `msg` to stderr and exits with `code`.
#[cfg(unix)]
pub fn failing_cmd(msg: &str, code: i32) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), format!("echo {} >&2; exit {}", msg, code)])
}

#[cfg(windows)]
pub fn failing_cmd(msg: &str, code: i32) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {} 1>&2 & exit /b {}", msg, code)])
}

type Responder = Box<dyn Fn(&Invocation) -> io::Result<CommandOutput>>;

/// A [`CommandRunner`] that records every invocation and answers with a closure.
pub struct RecordingRunner {
  calls: RefCell<Vec<Invocation>>,
  respond: Responder,
}

impl RecordingRunner {
  /// Every invocation succeeds with empty output.
  pub fn succeeding() -> Self {
    Self::with(|_| Ok(ok_output("")))
  }

  pub fn with(respond: impl Fn(&Invocation) -> io::Result<CommandOutput> + 'static) -> Self {
    Self {
      calls: RefCell::new(Vec::new()),
      respond: Box::new(respond),
    }
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }

  /// Number of recorded configure invocations (`cmake` without `--build`).
  pub fn configure_calls(&self) -> usize {
    self
      .calls
      .borrow()
      .iter()
      .filter(|inv| is_cmake(inv) && !is_build(inv))
      .count()
  }

  pub fn build_calls(&self) -> usize {
    self.calls.borrow().iter().filter(|inv| is_cmake(inv) && is_build(inv)).count()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
    self.calls.borrow_mut().push(invocation.clone());
    (self.respond)(invocation)
  }
}

fn is_cmake(inv: &Invocation) -> bool {
  inv.program == "cmake"
}

fn is_build(inv: &Invocation) -> bool {
  inv.args.iter().any(|a| a == "--build")
}

pub fn ok_output(stdout: &str) -> CommandOutput {
  CommandOutput {
    code: Some(0),
    success: true,
    stdout: stdout.to_string(),
    stderr: String::new(),
  }
}

pub fn failed_output(code: i32, stderr: &str) -> CommandOutput {
  CommandOutput {
    code: Some(code),
    success: false,
    stdout: String::new(),
    stderr: stderr.to_string(),
  }
}

/// A runner standing in for the native build: `cmake --build` writes empty
/// files at the target output paths, everything else succeeds silently.
pub fn stub_native_build(config: &BuildConfiguration) -> RecordingRunner {
  let mut outputs = vec![config.executable_output(), config.runtime_output()];
  outputs.extend(
    config
      .profile
      .auxiliary_static_libraries()
      .iter()
      .map(|rel| config.build_dir.join(rel)),
  );

  RecordingRunner::with(move |inv| {
    if is_cmake(inv) && is_build(inv) {
      for path in &outputs {
        write_file(path, b"");
      }
    }
    Ok(ok_output(""))
  })
}

/// Write a file, creating parent directories.
pub fn write_file(path: &Path, content: &[u8]) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}

/// Populate a CMake project tree with the headers the assembler mirrors.
pub fn source_tree(root: &Path) {
  write_file(&root.join("extern/marl/include/marl/scheduler.h"), b"// marl scheduler\n");
  write_file(&root.join("extern/marl/include/marl/event.h"), b"// marl event\n");
  write_file(&root.join("extern/logic/include/logic/logic.hh"), b"// logic\n");
  write_file(&root.join("src/runtime/module.hh"), b"// runtime module\n");
  write_file(&root.join("src/runtime/scheduler.hh"), b"// runtime scheduler\n");
}

/// Populate a GCC-like toolchain root, including paths the Linux prune list removes.
pub fn toolchain_tree(root: &Path) {
  write_file(&root.join("bin/g++"), b"g++");
  write_file(&root.join("bin/lto-dump"), b"lto-dump");
  write_file(&root.join("lib64/libstdc++.a"), b"archive");
  write_file(&root.join("include/c++/11.2.0/vector"), b"// vector\n");
  write_file(&root.join("share/man/man1/g++.1"), b"man");
  write_file(&root.join("share/gcc-11.2.0/python/hook.py"), b"# hook\n");
}

/// Build a gzip'd tarball whose entries all live under `top/`.
pub fn tar_gz(top: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
  tar_gz_with_links(top, &[], files)
}

/// Like [`tar_gz`], with `(name, target)` symlinks appended before the files.
/// Link targets are stored verbatim.
pub fn tar_gz_with_links(top: &str, links: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
  let encoder = GzEncoder::new(Vec::new(), Compression::default());
  let mut builder = tar::Builder::new(encoder);

  for (name, target) in links {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    builder
      .append_link(&mut header, format!("{}/{}", top, name), target)
      .unwrap();
  }

  for (name, data) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
      .append_data(&mut header, format!("{}/{}", top, name), *data)
      .unwrap();
  }

  let mut encoder = builder.into_inner().unwrap();
  encoder.flush().unwrap();
  encoder.finish().unwrap()
}

/// Render an error with its source chain the way `{:#}` on `anyhow::Error` does.
pub fn error_chain(err: &dyn std::error::Error) -> String {
  let mut rendered = err.to_string();
  let mut source = err.source();
  while let Some(cause) = source {
    rendered.push_str(": ");
    rendered.push_str(&cause.to_string());
    source = cause.source();
  }
  rendered
}
