//! Implementation of the `xsim-dist plan` command.
//!
//! Prints the artifact manifest without building or writing anything.

use anyhow::{Context, Result};

use xsim_dist_lib::assemble::ArtifactManifest;
use xsim_dist_lib::pipeline;
use xsim_dist_lib::process::SystemRunner;

use super::args::BuildArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_step};

pub fn cmd_plan(args: &BuildArgs, verbose: bool, output: OutputFormat) -> Result<()> {
  let config = args.configuration()?;

  let manifest = pipeline::plan(&config, &SystemRunner).context("Failed to plan assembly")?;

  if output.is_json() {
    return print_json(&manifest);
  }

  println!("Staging: {}", manifest.staging_dir.display());
  print_stat("Build type", config.build_type.as_str());
  print_stat("Jobs", &config.parallelism.to_string());
  println!();
  print_steps(&manifest, verbose);
  println!();
  println!("{} step(s)", manifest.steps.len());
  Ok(())
}

fn print_steps(manifest: &ArtifactManifest, verbose: bool) {
  for step in &manifest.steps {
    print_step(step, &manifest.staging_dir, verbose);
  }
}
