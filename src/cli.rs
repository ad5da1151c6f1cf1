//! CLI definitions for Flowpilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Flowpilot CLI.
#[derive(Parser)]
#[command(name = "flowpilot")]
#[command(about = "Extract, reconcile and apply workflows in a live editor tab")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/flowpilot.toml", global = true)]
    pub config: PathBuf,

    /// Remote debugging endpoint, overriding the configuration
    #[arg(long, env = "FLOWPILOT_CDP_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Attach to the first tab whose URL contains this text
    #[arg(long, global = true)]
    pub target: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Report whether the attached tab is a workflow editor
    Detect,

    /// Print the current workflow as JSON
    Extract {
        /// Write the workflow to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the editor's workflow with the one in FILE
    Apply {
        /// Workflow JSON file
        file: PathBuf,
    },

    /// Apply a list of change operations
    ApplyChanges {
        /// JSON file holding a change list or `{"changes": [...]}`
        file: PathBuf,

        /// Workflow the changes were computed against
        #[arg(long)]
        original: Option<PathBuf>,
    },

    /// List node types known to the editor
    NodeTypes,

    /// List credentials configured in the editor
    Credentials,

    /// Follow the editor and report workflow changes until interrupted
    Watch {
        /// Directory where the latest workflow is kept
        #[arg(long)]
        store: Option<PathBuf>,
    },
}
