//! CLI subcommand implementations.

pub mod days;
pub mod sessions;
pub mod status;
mod util;
