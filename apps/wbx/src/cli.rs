//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wbx_types::{BuildVariant, CleanScope};

/// wbx - Build orchestrator for WebAssembly web apps
#[derive(Parser)]
#[command(name = "wbx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build orchestrator for WebAssembly web apps")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Write structured debug logs to the wbx log folder
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the project
    #[command(alias = "b")]
    Build {
        /// Build the release variant into the distribution folder
        #[arg(short, long)]
        release: bool,

        /// Rebuild everything, ignoring incremental state
        #[arg(short, long)]
        force: bool,

        /// Build a single executable target
        #[arg(short, long, value_name = "NAME")]
        target: Option<String>,
    },

    /// Merge generated tags into the entry document and publish web documents
    Merge {
        /// Publish for the release variant
        #[arg(short, long)]
        release: bool,

        /// Publish every document, not only changed ones
        #[arg(short, long)]
        force: bool,
    },

    /// Remove cached build state and outputs
    Clean {
        /// What to remove
        #[arg(value_enum, default_value_t = CleanScope::All)]
        scope: CleanScope,
    },
}

pub fn variant(release: bool) -> BuildVariant {
    if release {
        BuildVariant::Release
    } else {
        BuildVariant::Debug
    }
}
