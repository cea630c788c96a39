use anyhow::{Context, Result};

use xsim_dist_lib::toolchain::fetch_parser;

use super::args::FetchArgs;
use crate::output::{OutputFormat, format_size, print_json, print_stat, print_success};

pub fn cmd_fetch(args: &FetchArgs, output: OutputFormat) -> Result<()> {
  let config = args.configuration()?;

  let outcome = fetch_parser(config.profile, &config.parser).context("Failed to fetch parser release")?;

  if output.is_json() {
    return print_json(&outcome);
  }

  if outcome.downloaded {
    print_success(&format!("Unpacked {} into {}", outcome.archive, outcome.cache_dir.display()));
    print_stat("Source", &outcome.url);
    print_stat("Size", &format_size(outcome.bytes));
  } else {
    print_success(&format!("Parser release already cached at {}", outcome.cache_dir.display()));
  }
  Ok(())
}
