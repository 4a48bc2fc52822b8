//! CLI arguments and environment variable handling using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tappal routing core driver
#[derive(Parser, Debug, Clone)]
#[command(name = "tappal")]
#[command(about = "Run tappal routing operations against a YAML fixture")]
#[command(version)]
pub struct Args {
    /// Fixture file holding officers, tappals, movements and comments
    #[arg(long, env = "TAPPAL_FIXTURES")]
    pub fixtures: PathBuf,

    /// Routing configuration (YAML)
    #[arg(long, env = "TAPPAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Write the resulting state back to the fixture file
    #[arg(long)]
    pub save: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open a tappal as an officer
    Access {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tappal: String,
    },

    /// Show a tappal's raw movement history and chain status
    History {
        #[arg(long)]
        tappal: String,
    },

    /// List officers a tappal may be forwarded to
    Targets {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tappal: String,
    },

    /// Forward a tappal to another officer
    Forward {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tappal: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        reason: String,
    },

    /// Change a tappal's status
    Transition {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tappal: String,
        /// Pending, "In Progress", "Under Review", Completed or Rejected
        #[arg(long)]
        status: String,
        #[arg(long)]
        reason: String,
    },

    /// Add a comment to a tappal
    Comment {
        #[arg(long)]
        officer: String,
        #[arg(long)]
        tappal: String,
        #[arg(long)]
        body: String,
    },
}

impl Command {
    /// Whether the command changes stored state.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Forward { .. } | Self::Transition { .. } | Self::Comment { .. }
        )
    }
}
