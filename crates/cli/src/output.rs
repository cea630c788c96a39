//! Terminal rendering for the CLI.
//!
//! Status lines go to stdout, errors to stderr. Every line is built as plain
//! text first; color is applied to the leading symbol only, and only when the
//! stream supports it.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use xsim_dist_lib::assemble::{CopyStep, OverwritePolicy};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  /// Created once, left alone afterwards.
  pub const CREATE: &str = "+";
  /// Replaced on every run.
  pub const REFRESH: &str = "~";
  pub const SOURCE: &str = "→";
  pub const PRUNE: &str = "-";
}

/// Archive sizes, in binary units.
pub fn format_size(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_elapsed(millis: u128) -> String {
  let secs = millis / 1000;
  match secs {
    0 => format!("{}ms", millis),
    1..60 => format!("{}.{:02}s", secs, (millis % 1000) / 10),
    _ => format!("{}m {}s", secs / 60, secs % 60),
  }
}

fn policy_symbol(policy: OverwritePolicy) -> &'static str {
  match policy {
    OverwritePolicy::SkipIfExists => symbols::CREATE,
    OverwritePolicy::AlwaysRefresh => symbols::REFRESH,
  }
}

/// The destination line of a planned step, relative to the staging directory.
pub fn step_line(step: &CopyStep, staging: &Path) -> String {
  let destination = step.destination.strip_prefix(staging).unwrap_or(&step.destination);
  format!("{} ({})", destination.display(), step.stage)
}

/// Source and prune lines shown under a step in verbose mode.
pub fn step_details(step: &CopyStep) -> Vec<String> {
  let mut lines = vec![format!("{} {}", symbols::SOURCE, step.source.display())];
  lines.extend(step.prune.iter().map(|rel| format!("{} {}", symbols::PRUNE, rel.display())));
  lines
}

pub fn print_step(step: &CopyStep, staging: &Path, verbose: bool) {
  let symbol = policy_symbol(step.policy);
  println!(
    "  {} {}",
    symbol.if_supports_color(Stream::Stdout, |s| match step.policy {
      OverwritePolicy::SkipIfExists => s.green().to_string(),
      OverwritePolicy::AlwaysRefresh => s.yellow().to_string(),
    }),
    step_line(step, staging)
  );
  if verbose {
    for line in step_details(step) {
      println!("      {}", line.if_supports_color(Stream::Stdout, |s| s.dimmed()));
    }
  }
}

/// Headline plus one `caused by` line per source; multi-line causes such as
/// captured tool output are indented under their cause.
pub fn error_report(err: &anyhow::Error) -> String {
  let mut report = err.to_string();
  for cause in err.chain().skip(1) {
    let text = cause.to_string();
    let mut lines = text.lines();
    if let Some(first) = lines.next() {
      report.push_str("\n  caused by: ");
      report.push_str(first);
    }
    for line in lines {
      report.push_str("\n    ");
      report.push_str(line);
    }
  }
  report
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(err: &anyhow::Error) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    error_report(err)
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
