//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - draft: run the automated refine loop
//! - review: run the human-in-the-loop refine loop
//! - metrics: gather system metrics and print a report
//! - sessions: inspect stored sessions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Redraft - an iterative refine-review loop for text artifacts
#[derive(Parser, Debug)]
#[command(name = "redraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft an artifact with the automated rule reviewer
    Draft {
        /// Task description for the initial draft
        task: String,

        /// Override the configured iteration budget
        #[arg(short = 'n', long)]
        max_iterations: Option<u32>,
    },

    /// Draft an artifact with a human operator reviewing each cycle
    Review {
        /// Task description for the initial draft
        task: String,

        /// Override the configured iteration budget
        #[arg(short = 'n', long)]
        max_iterations: Option<u32>,
    },

    /// Gather CPU/memory/disk metrics and print a system report
    Metrics,

    /// Inspect stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

/// Session inspection subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List stored session ids, most recent first
    List,

    /// Show a stored session
    Show {
        /// Session id
        id: String,
    },

    /// Delete a stored session
    Delete {
        /// Session id
        id: String,
    },
}
