//! CLI-specific functionality for the fleet manager
//!
//! This module contains argument parsing and configuration discovery.

pub mod args;
pub mod config;

pub use args::{Args, Commands, ModpackCommand, ServerCommand};
pub use config::{ConfigDiscovery, ConfigError, FleetConfig};
