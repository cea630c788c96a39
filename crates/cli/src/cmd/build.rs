//! Implementation of the `xsim-dist build` command.

use anyhow::{Context, Result};

use xsim_dist_lib::pipeline::{self, PipelineReport};
use xsim_dist_lib::process::SystemRunner;

use super::args::BuildArgs;
use crate::output::{OutputFormat, format_elapsed, format_size, print_info, print_json, print_stat, print_success};

pub fn cmd_build(args: &BuildArgs, output: OutputFormat) -> Result<()> {
  let config = args.configuration()?;

  let report = pipeline::run(&config, &SystemRunner).context("Build failed")?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_summary(&report);
  }
  Ok(())
}

fn print_summary(report: &PipelineReport) {
  if let Some(parser) = &report.toolchain.parser {
    if parser.downloaded {
      print_info(&format!(
        "Fetched {} ({})",
        parser.archive,
        format_size(parser.bytes)
      ));
    } else {
      print_info(&format!("Using cached parser release at {}", parser.cache_dir.display()));
    }
  }
  if let Some(located) = &report.toolchain.located {
    print_info(&format!("Using compiler {}", located.compilers.cxx.display()));
  }
  match &report.toolchain.bundle_root {
    Some(root) => print_info(&format!("Toolchain bundle: {}", root.display())),
    None => print_info("No toolchain bundle shipped"),
  }

  print_success(&format!(
    "Package assembled at {}",
    report.assembly.staging_dir.display()
  ));
  print_stat("Copied", &report.assembly.copied().to_string());
  print_stat("Skipped", &report.assembly.skipped().to_string());
  print_stat("Refreshed", &report.assembly.refreshed().to_string());
  print_stat(
    "Duration",
    &format_elapsed(report.duration_ms),
  );
}
