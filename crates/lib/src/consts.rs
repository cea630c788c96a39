//! Names and pinned values shared across the pipeline.

pub const APP_NAME: &str = "xsim-dist";

/// CMake target producing the simulator executable.
pub const EXECUTABLE_TARGET: &str = "xsim-bin";

/// CMake target producing the simulator runtime library.
pub const RUNTIME_TARGET: &str = "xsim-runtime";

pub const EXECUTABLE_STEM: &str = "xsim";
pub const RUNTIME_STEM: &str = "xsim-runtime";

/// Build-directory relative locations of the two target outputs.
pub const EXECUTABLE_BUILD_DIR: &str = "tools";
pub const RUNTIME_BUILD_DIR: &str = "src/runtime";

/// Release archive of the SystemVerilog parser. `{platform}` is `linux` or `macos`.
pub const PARSER_URL_TEMPLATE: &str =
  "https://github.com/MikePopoloski/slang/releases/download/nightly/slang-{platform}.tar.gz";
pub const PARSER_CACHE_DIR_NAME: &str = "slang-dist";

pub const GCC_VERSION: &str = "11.2.0";

/// External dependencies whose public headers ship under `include/<name>/`.
pub const HEADER_DEPENDENCIES: [&str; 2] = ["marl", "logic"];
pub const RUNTIME_HEADER_DIR: &str = "runtime";

pub const DEFAULT_WINDOWS_GENERATOR: &str = "Ninja";

pub const ENV_DEBUG: &str = "DEBUG";
pub const ENV_GENERATOR: &str = "CMAKE_GENERATOR";
pub const ENV_PARSER_URL: &str = "XSIM_DIST_PARSER_URL";
pub const ENV_TOOLCHAIN_ROOT: &str = "XSIM_DIST_TOOLCHAIN_ROOT";
