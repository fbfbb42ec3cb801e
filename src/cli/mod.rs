//! CLI module for redraft - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
