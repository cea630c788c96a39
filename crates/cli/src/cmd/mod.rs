mod args;
mod build;
mod fetch;
mod info;
mod plan;

pub use args::{BuildArgs, FetchArgs};
pub use build::cmd_build;
pub use fetch::cmd_fetch;
pub use info::cmd_info;
pub use plan::cmd_plan;
