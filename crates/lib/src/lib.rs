//! xsim-dist-lib: build and package the xsim simulator
//!
//! This crate turns an xsim source checkout into a self-contained package:
//! - `platform`: host detection and per-platform capabilities
//! - `toolchain`: parser release fetch (Linux/macOS) and compiler location (Windows)
//! - `build`: CMake configure and build of the executable and runtime
//! - `assemble`: the artifact manifest and its idempotent execution
//! - `pipeline`: all of the above, in order

pub mod assemble;
pub mod build;
pub mod config;
pub mod consts;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod toolchain;
pub mod util;
