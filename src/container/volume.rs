//! Container volume management.
//!
//! Season datasets, modpack templates and server data all live in named
//! volumes created through here.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use std::collections::HashMap;
use tracing::{debug, info};

/// Volume configuration.
#[derive(Debug, Clone)]
pub struct VolumeConfig {
    /// Volume name
    pub name: String,
    /// Volume driver
    pub driver: String,
    /// Volume labels
    pub labels: HashMap<String, String>,
}

impl VolumeConfig {
    /// Local-driver volume labelled as managed by the fleet.
    pub fn managed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: HashMap::from([("epoxi.managed".to_string(), "true".to_string())]),
            ..Default::default()
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            driver: "local".to_string(),
            labels: HashMap::new(),
        }
    }
}

/// Volume manager for persistent storage.
#[derive(Clone)]
pub struct VolumeManager {
    docker: Docker,
}

impl VolumeManager {
    /// Create a new volume manager.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Create a new volume.
    ///
    /// Creating a volume whose name already exists succeeds and leaves the
    /// existing data in place.
    ///
    /// # Errors
    ///
    /// Returns error if volume creation fails.
    pub async fn create_volume(&self, config: &VolumeConfig) -> Result<String> {
        debug!("Creating volume: {}", config.name);

        let labels: HashMap<&str, &str> = config
            .labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let response = self
            .docker
            .create_volume(bollard::volume::CreateVolumeOptions {
                name: config.name.as_str(),
                driver: config.driver.as_str(),
                driver_opts: HashMap::new(),
                labels,
            })
            .await?;

        info!("Created volume: {}", response.name);

        Ok(response.name)
    }

    /// Remove a volume.
    ///
    /// # Errors
    ///
    /// Returns error if volume removal fails.
    pub async fn remove_volume(&self, volume_name: &str, force: bool) -> Result<()> {
        debug!("Removing volume: {}", volume_name);

        self.docker
            .remove_volume(
                volume_name,
                Some(bollard::volume::RemoveVolumeOptions { force }),
            )
            .await
            .map_err(|e| ContainerError::from_api(volume_name, e))?;

        info!("Removed volume: {}", volume_name);
        Ok(())
    }

    /// Check if a volume exists.
    ///
    /// # Errors
    ///
    /// Returns error if volume inspection fails.
    pub async fn volume_exists(&self, volume_name: &str) -> Result<bool> {
        match self.docker.inspect_volume(volume_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ContainerError::ApiError(e)),
        }
    }
}
