//! Native build of the simulator executable and runtime library.

pub mod driver;

pub use driver::{BuildDriver, BuildOutputs, DriverError, build_invocation, configure_invocation};
