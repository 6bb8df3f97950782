// src/cli.rs

//! CLI definitions for the caiman binary
//!
//! This module contains all command-line interface definitions using clap.
//! Dispatch lives in `main.rs`; each subcommand maps 1:1 to an engine
//! workflow or an environment operation on the backend.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "caiman")]
#[command(author = "Caiman Contributors")]
#[command(version)]
#[command(
    about = "Package-state synchronization and mutation orchestration for conda environments",
    long_about = None
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh the package view (installed + available) for an environment
    Prime {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,
    },

    /// Update all packages or a selected subset
    Update {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,

        /// Update every package in the environment
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Packages to update
        names: Vec<String>,

        /// Version pins aligned by index to the names ("none" leaves a
        /// name unpinned)
        #[arg(long, value_delimiter = ',')]
        versions: Vec<String>,
    },

    /// Update all packages after an explicit confirmation
    UpdateAllConfirm {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,

        /// Skip the prompt and proceed
        #[arg(short, long)]
        yes: bool,
    },

    /// Invalidate the available-package cache and re-prime
    RefreshAvailable {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,
    },

    /// Remove packages from an environment
    Remove {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,

        /// Packages to remove
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Announce an intended batch modification without applying it
    ApplyModifications {
        /// Target environment name
        #[arg(short = 'n', long)]
        env: String,

        /// Announce a modification of every package
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Packages in the batch
        names: Vec<String>,
    },

    /// Environment operations
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// List environments known to the manager
    List,

    /// Create a new environment
    Create {
        /// New environment name
        name: String,

        /// Initial package specs ("name" or "name=version")
        specs: Vec<String>,
    },

    /// Clone an existing environment under a new name
    Clone {
        /// Source environment
        source: String,

        /// New environment name
        target: String,
    },

    /// Delete an environment
    Remove {
        /// Environment to delete
        name: String,

        /// Skip the prompt and proceed
        #[arg(short, long)]
        yes: bool,
    },

    /// Print an environment definition (YAML) to stdout
    Export {
        /// Environment to export
        name: String,
    },

    /// Create an environment from an exported definition file
    Import {
        /// New environment name
        name: String,

        /// Definition file (YAML)
        file: PathBuf,
    },
}
