use anyhow::{Context, Result};

use xsim_dist_lib::platform::Host;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let host = Host::detect().context("Failed to detect host platform")?;
  let profile = host.profile;
  let toolchain_root = profile.default_toolchain_root();

  if output.is_json() {
    return print_json(&serde_json::json!({
      "platform": host.triple(),
      "profile": profile,
      "arch": host.arch,
      "capabilities": profile.capabilities(),
      "executable": profile.executable_name(),
      "runtime_library": profile.runtime_library_name(),
      "parser_archive": profile.parser_archive_name(),
      "default_toolchain_root": toolchain_root,
    }));
  }

  println!("System:");
  print_stat("Platform", &host.triple());
  print_stat("Prebuilt parser", yes_no(profile.needs_prebuilt_parser()));
  print_stat("Locate compilers", yes_no(profile.needs_toolchain_locate()));
  print_stat("Static link", yes_no(profile.static_link_supported()));
  print_stat("Executable", &profile.executable_name());
  print_stat("Runtime library", &profile.runtime_library_name());
  if let Some(archive) = profile.parser_archive_name() {
    print_stat("Parser archive", &archive);
  }
  if let Some(root) = toolchain_root {
    print_stat("Toolchain root", &root.display().to_string());
  }
  Ok(())
}

fn yes_no(value: bool) -> &'static str {
  if value { "yes" } else { "no" }
}
