//! Docker/Podman client wrapper.
//!
//! Provides a simplified interface to the bollard Docker API with automatic
//! connection handling, fallback strategies, and health checking.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use std::sync::Arc;
use tracing::{debug, info};

/// Container client configuration.
#[derive(Debug, Clone)]
pub struct ContainerClientConfig {
    /// Socket timeout in seconds
    pub timeout: u64,
}

impl Default for ContainerClientConfig {
    fn default() -> Self {
        Self { timeout: 120 }
    }
}

/// Docker/Podman API client wrapper.
///
/// Manages connection to Docker or Podman daemon with automatic fallback
/// and health checking.
#[derive(Clone)]
pub struct ContainerClient {
    docker: Arc<Docker>,
}

impl ContainerClient {
    /// Create a new container client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if neither Docker nor Podman are available or connection fails.
    pub async fn new() -> Result<Self> {
        Self::with_config(ContainerClientConfig::default()).await
    }

    /// Create a new container client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if connection to container runtime fails.
    pub async fn with_config(config: ContainerClientConfig) -> Result<Self> {
        let docker = Self::connect(config.timeout)?;

        let client = Self {
            docker: Arc::new(docker),
        };

        client.ping().await?;

        Ok(client)
    }

    /// Connect to Docker or Podman daemon.
    ///
    /// Tries, in order: local defaults (Unix socket, named pipe or
    /// DOCKER_HOST), the rootless Podman socket, the system Podman socket.
    fn connect(timeout: u64) -> Result<Docker> {
        debug!("Attempting to connect to container runtime...");

        match Docker::connect_with_local_defaults() {
            Ok(docker) => {
                info!("Connected to container runtime via local defaults");
                return Ok(docker);
            }
            Err(e) => {
                debug!("Local defaults failed: {}", e);
            }
        }

        #[cfg(unix)]
        {
            let mut sockets = Vec::new();
            if let Ok(home) = std::env::var("HOME") {
                sockets.push(format!("unix://{}/run/podman/podman.sock", home));
            }
            sockets.push("unix:///run/podman/podman.sock".to_string());

            for socket in sockets {
                debug!("Trying Podman socket: {}", socket);
                match Docker::connect_with_socket(&socket, timeout, bollard::API_DEFAULT_VERSION) {
                    Ok(docker) => {
                        info!("Connected to Podman via {}", socket);
                        return Ok(docker);
                    }
                    Err(e) => {
                        debug!("Podman socket {} failed: {}", socket, e);
                    }
                }
            }
        }

        #[cfg(not(unix))]
        let _ = timeout;

        Err(ContainerError::Other(
            "Failed to connect to Docker or Podman. Please ensure Docker or Podman is installed and running.".to_string()
        ))
    }

    /// Ping the container runtime to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns error if ping fails.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await.map_err(|e| {
            ContainerError::Other(format!("Failed to ping container runtime: {}", e))
        })?;
        debug!("Container runtime ping successful");
        Ok(())
    }

    /// Get the underlying Docker client.
    pub fn docker(&self) -> &Docker {
        &self.docker
    }

    /// Check if an image exists locally.
    ///
    /// # Errors
    ///
    /// Returns error if image inspection fails.
    pub async fn image_exists(&self, image: &str) -> Result<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ContainerError::ApiError(e)),
        }
    }

    /// Get container state (running, stopped, etc.) by name or ID.
    ///
    /// # Errors
    ///
    /// Returns error if container is not found or inspection fails.
    pub async fn container_state(&self, name_or_id: &str) -> Result<ContainerState> {
        let inspect = self
            .docker
            .inspect_container(
                name_or_id,
                None::<bollard::query_parameters::InspectContainerOptions>,
            )
            .await
            .map_err(|e| ContainerError::from_api(name_or_id, e))?;

        let state = inspect.state.ok_or_else(|| {
            ContainerError::Other(format!("Container {} has no state", name_or_id))
        })?;

        if state.running.unwrap_or(false) {
            Ok(ContainerState::Running)
        } else if state.paused.unwrap_or(false) {
            Ok(ContainerState::Paused)
        } else if state.restarting.unwrap_or(false) {
            Ok(ContainerState::Restarting)
        } else if state.dead.unwrap_or(false) {
            Ok(ContainerState::Dead)
        } else {
            Ok(ContainerState::Stopped)
        }
    }
}

/// Container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Container is running
    Running,
    /// Container is paused
    Paused,
    /// Container is restarting
    Restarting,
    /// Container is stopped
    Stopped,
    /// Container is dead
    Dead,
}

impl ContainerState {
    /// Whether the game process is up. Only `Running` counts.
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}
