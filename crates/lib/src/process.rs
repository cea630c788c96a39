//! Scoped subprocess invocation.
//!
//! Every external tool (the native build backend, the compiler) runs through a
//! [`CommandRunner`]. Output is always captured, and [`run_checked`] turns a
//! non-zero exit into a [`ProcessError`] carrying that output verbatim.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: OsString,
  pub args: Vec<OsString>,
  pub cwd: Option<PathBuf>,
}

impl Invocation {
  pub fn new(program: impl AsRef<OsStr>) -> Self {
    Self {
      program: program.as_ref().to_os_string(),
      args: Vec::new(),
      cwd: None,
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Arguments as lossy strings, for logging and assertions.
  pub fn args_lossy(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.to_string_lossy())?;
    for arg in &self.args {
      write!(f, " {}", arg.to_string_lossy())?;
    }
    Ok(())
  }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code; `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub success: bool,
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  /// Stdout followed by stderr, as the tool printed them.
  pub fn combined(&self) -> String {
    let mut out = self.stdout.clone();
    if !out.is_empty() && !self.stderr.is_empty() && !out.ends_with('\n') {
      out.push('\n');
    }
    out.push_str(&self.stderr);
    out
  }
}

/// Seam between the pipeline and the operating system's process API.
pub trait CommandRunner {
  /// Run the invocation to completion and capture its output.
  ///
  /// Returns `Err` only when the process could not be started.
  fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
    let mut command = Command::new(&invocation.program);
    command
      .args(&invocation.args)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }

    debug!(cwd = ?invocation.cwd, "spawning process");
    let output = command.output()?;

    Ok(CommandOutput {
      code: output.status.code(),
      success: output.status.success(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }
}

/// Errors from a scoped invocation.
#[derive(Debug, Error)]
pub enum ProcessError {
  /// The program could not be started at all.
  #[error("failed to start `{command}`")]
  Spawn {
    command: String,
    #[source]
    source: io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("`{command}` exited with {}\n{output}", exit_status(.code))]
  Failed {
    command: String,
    code: Option<i32>,
    output: String,
  },
}

impl ProcessError {
  /// Captured output of a failed process, untranslated.
  pub fn output(&self) -> Option<&str> {
    match self {
      ProcessError::Failed { output, .. } => Some(output),
      ProcessError::Spawn { .. } => None,
    }
  }
}

fn exit_status(code: &Option<i32>) -> String {
  code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

/// Run an invocation and require a successful exit.
pub fn run_checked(runner: &impl CommandRunner, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
  info!(command = %invocation, "running");

  let output = runner.run(invocation).map_err(|source| ProcessError::Spawn {
    command: invocation.to_string(),
    source,
  })?;

  if !output.success {
    if !output.stderr.is_empty() {
      debug!(stderr = %output.stderr, "command stderr");
    }
    if !output.stdout.is_empty() {
      debug!(stdout = %output.stdout, "command stdout");
    }

    return Err(ProcessError::Failed {
      command: invocation.to_string(),
      code: output.code,
      output: output.combined(),
    });
  }

  Ok(output)
}
