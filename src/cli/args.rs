//! Command line argument parsing
//!
//! Subcommands map one-to-one onto fleet operations:
//! - `modpack add|list|remove`: manage modpack templates
//! - `server add|list|remove|set-hostname`: manage server records
//! - `create`, `start`, `stop`, `remove`, `status`: container lifecycle
//! - `rotate`: schedule a season rotation
//! - `show-config`, `init-config`: configuration discovery helpers

use crate::schema::JavaRuntime;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "epoxi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Game server fleet manager with season rotation")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path (skips discovery)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage modpack templates
    #[command(subcommand)]
    Modpack(ModpackCommand),
    /// Manage server records
    #[command(subcommand)]
    Server(ServerCommand),
    /// Create a server's volume and container
    Create { server: String },
    /// Start a server's container and watch it through the warm-up
    Start { server: String },
    /// Stop a server: console stop first, forced stop after the grace period
    Stop { server: String },
    /// Force-remove a server's container
    Remove { server: String },
    /// Show live status of one server, or all of them
    Status { server: Option<String> },
    /// Rotate a server onto a new season cloned from a modpack
    Rotate {
        server: String,
        modpack: String,
        /// Unix time (seconds) to run at; defaults to a few seconds from now
        #[arg(long = "at", value_name = "EPOCH_SECONDS")]
        at: Option<i64>,
    },
    /// Show configuration discovery information
    ShowConfig,
    /// Write a default configuration file to ~/.epoxi/config.toml
    InitConfig,
}

#[derive(Debug, Subcommand)]
pub enum ModpackCommand {
    /// Register a modpack and create its template volume
    Add {
        id: String,
        /// Startup script, relative to the server data directory
        #[arg(long = "script")]
        startup_script: String,
        /// Java major version (8, 11, 17 or 21)
        #[arg(long = "java", default_value_t = 21)]
        java: u32,
    },
    /// List modpacks
    List,
    /// Delete a modpack and its template volume
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Register a server
    Add {
        id: String,
        /// Display name
        #[arg(long = "name")]
        name: String,
        /// Startup script, relative to the server data directory
        #[arg(long = "script")]
        startup_script: String,
        /// Java major version (8, 11, 17 or 21)
        #[arg(long = "java", default_value_t = 21)]
        java: u32,
        /// Public hostname routed through the proxy
        #[arg(long = "hostname", default_value = "")]
        hostname: String,
        /// Starting season id (defaults to <id>.000.00)
        #[arg(long = "season")]
        season: Option<String>,
    },
    /// List servers
    List,
    /// Remove the container, then the server record and proxy route
    Remove { id: String },
    /// Change the proxy hostname
    SetHostname { id: String, hostname: String },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

/// Java runtime from a CLI version number.
pub fn java_runtime(version: u32) -> JavaRuntime {
    JavaRuntime::from(version)
}

/// Rotation time from a CLI epoch value.
pub fn rotation_time(at: Option<i64>) -> Result<Option<DateTime<Utc>>, String> {
    match at {
        None => Ok(None),
        Some(seconds) => DateTime::from_timestamp(seconds, 0)
            .map(Some)
            .ok_or_else(|| format!("Invalid rotation time: {}", seconds)),
    }
}
