//! SNOO export CLI library.
//!
//! This crate provides the CLI interface for exporting SNOO sleep data.

mod cli;
pub mod commands;
mod config;
pub mod render;

pub use cli::{Cli, Commands, RangeArgs};
pub use config::Config;
