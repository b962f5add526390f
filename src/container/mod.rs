//! Container runtime adapter.
//!
//! Wraps the Docker/Podman control plane (via the bollard API) behind the
//! [`ContainerRuntime`] trait so orchestration code can run against test
//! doubles. Every operation reports success or failure as a [`Result`]; none
//! of them panics across the boundary.
//!
//! ## Architecture
//!
//! - [`client`]: Docker/Podman API client wrapper with connection management
//! - [`runtime`]: the [`ContainerRuntime`] trait and its Docker implementation
//! - [`config`]: Container configuration builders for game and utility containers
//! - [`console`]: Writing lines to a running container's stdin
//! - [`monitor`]: One-shot resource statistics sampling
//! - [`stats`]: Translation of raw counters into percentage gauges
//! - [`volume`]: Volume creation and removal
//!
//! ## Usage
//!
//! ```rust,no_run
//! use epoxi::container::{ContainerConfig, ContainerRuntime, DockerRuntime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = DockerRuntime::new().await?;
//!
//!     runtime.create_volume("epoxi-server-01").await?;
//!     let config = ContainerConfig::game_server(
//!         "eclipse-temurin:21-jre-alpine",
//!         "epoxi-server-01",
//!         "/server/start.sh",
//!         "epoxi-ingress",
//!     )?;
//!     runtime.create_container("epoxi-server-01", &config).await?;
//!     runtime.start_container("epoxi-server-01").await?;
//!
//!     runtime.send_stdin("epoxi-server-01", "say hello").await?;
//!     println!("running: {}", runtime.is_running("epoxi-server-01").await?);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod console;
mod monitor;
mod runtime;
mod stats;
mod volume;

pub use client::{ContainerClient, ContainerClientConfig, ContainerState};
pub use config::{ContainerConfig, ContainerConfigBuilder};
pub use console::ConsoleWriter;
pub use monitor::ResourceMonitor;
pub use runtime::{ContainerRuntime, DockerRuntime, DockerRuntimeConfig};
pub use stats::StatsSample;
pub use volume::{VolumeConfig, VolumeManager};

/// Container runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Docker/Podman API error
    #[error("Container API error: {0}")]
    ApiError(#[from] bollard::errors::Error),

    /// Container or volume not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Container configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing to a container's console failed
    #[error("Console error: {0}")]
    ConsoleError(String),

    /// No statistics sample could be read
    #[error("Stats unavailable for {0}")]
    StatsUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// General error
    #[error("Container error: {0}")]
    Other(String),
}

impl ContainerError {
    /// Map a bollard error, turning a daemon 404 into [`ContainerError::NotFound`].
    pub(crate) fn from_api(name: &str, error: bollard::errors::Error) -> Self {
        match error {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            } => ContainerError::NotFound(name.to_string()),
            e => ContainerError::ApiError(e),
        }
    }
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
