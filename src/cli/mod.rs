//! Command-line interface

pub mod commands;

pub use commands::{cmd_mine, cmd_node_start, cmd_validate, CliResult};
