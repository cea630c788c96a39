mod cmd;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, FetchArgs};
use output::{OutputFormat, print_error};

/// xsim-dist - Build and package the xsim simulator
#[derive(Parser)]
#[command(name = "xsim-dist")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Fetch the toolchain, build both targets, and assemble the package
  Build(BuildArgs),

  /// Show the artifact manifest a build would execute
  Plan(BuildArgs),

  /// Download and unpack the prebuilt parser release only
  Fetch(FetchArgs),

  /// Display detected platform and its capabilities
  Info,
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(&args, cli.output),
    Commands::Plan(args) => cmd::cmd_plan(&args, cli.verbose, cli.output),
    Commands::Fetch(args) => cmd::cmd_fetch(&args, cli.output),
    Commands::Info => cmd::cmd_info(cli.output),
  };

  if let Err(err) = result {
    print_error(&err);
    std::process::exit(1);
  }
}
