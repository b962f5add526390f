//! The container runtime seam.
//!
//! [`ContainerRuntime`] is the only surface orchestration code talks to.
//! [`DockerRuntime`] implements it over bollard; tests substitute doubles.

use crate::container::{
    ContainerClient, ContainerConfig, ContainerError, ConsoleWriter, ResourceMonitor, Result,
    StatsSample, VolumeConfig, VolumeManager,
};
use async_trait::async_trait;
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Operations the fleet needs from a container engine.
///
/// Calls are identified by container or volume name. Container calls also
/// accept the engine ID returned by [`ContainerRuntime::create_container`].
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a named volume. Creating an existing volume is not an error.
    async fn create_volume(&self, name: &str) -> Result<()>;

    /// Remove a named volume.
    async fn remove_volume(&self, name: &str) -> Result<()>;

    /// Create (but do not start) a container, returning its engine ID.
    async fn create_container(&self, name: &str, config: &ContainerConfig) -> Result<String>;

    async fn start_container(&self, name: &str) -> Result<()>;

    /// Force-stop a container, bypassing any console shutdown.
    async fn stop_container(&self, name: &str) -> Result<()>;

    /// Force-remove a container, running or not.
    async fn remove_container(&self, name: &str) -> Result<()>;

    /// Write one console line to the container's main process.
    async fn send_stdin(&self, name: &str, text: &str) -> Result<()>;

    async fn is_running(&self, name: &str) -> Result<bool>;

    /// Read one resource sample.
    async fn read_stats(&self, name: &str) -> Result<StatsSample>;
}

/// Docker runtime settings.
#[derive(Debug, Clone)]
pub struct DockerRuntimeConfig {
    /// Pull missing images before creating containers
    pub auto_pull: bool,
    /// Seconds the engine waits before killing a force-stopped container
    pub force_stop_timeout: Duration,
}

impl Default for DockerRuntimeConfig {
    fn default() -> Self {
        Self {
            auto_pull: true,
            force_stop_timeout: Duration::from_secs(10),
        }
    }
}

/// [`ContainerRuntime`] backed by a Docker or Podman daemon.
#[derive(Clone)]
pub struct DockerRuntime {
    client: ContainerClient,
    volumes: VolumeManager,
    console: ConsoleWriter,
    monitor: ResourceMonitor,
    config: DockerRuntimeConfig,
}

impl DockerRuntime {
    /// Connect with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if no container daemon is reachable.
    pub async fn new() -> Result<Self> {
        Self::with_config(DockerRuntimeConfig::default()).await
    }

    /// Connect with custom settings.
    ///
    /// # Errors
    ///
    /// Returns error if no container daemon is reachable.
    pub async fn with_config(config: DockerRuntimeConfig) -> Result<Self> {
        let client = ContainerClient::new().await?;
        Ok(Self::from_client(client, config))
    }

    /// Build on an already connected client.
    pub fn from_client(client: ContainerClient, config: DockerRuntimeConfig) -> Self {
        let docker = client.docker().clone();
        Self {
            volumes: VolumeManager::new(docker.clone()),
            console: ConsoleWriter::new(docker.clone()),
            monitor: ResourceMonitor::new(docker),
            client,
            config,
        }
    }

    /// Get the underlying client.
    pub fn client(&self) -> &ContainerClient {
        &self.client
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        if !self.config.auto_pull || self.client.image_exists(image).await? {
            return Ok(());
        }
        self.pull_image(image).await
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        info!("Pulling image: {}", image);

        let mut stream = self.client.docker().create_image(
            Some(bollard::image::CreateImageOptions {
                from_image: image,
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        debug!("Pull status: {}", status);
                    }
                    if let Some(error) = info.error {
                        return Err(ContainerError::Other(format!(
                            "Pull of {} failed: {}",
                            image, error
                        )));
                    }
                }
                Err(e) => return Err(ContainerError::ApiError(e)),
            }
        }

        info!("Pulled image: {}", image);
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create_volume(&self, name: &str) -> Result<()> {
        self.volumes
            .create_volume(&VolumeConfig::managed(name))
            .await
            .map(|_| ())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.volumes.remove_volume(name, false).await
    }

    async fn create_container(&self, name: &str, config: &ContainerConfig) -> Result<String> {
        self.ensure_image(config.image()).await?;

        debug!("Creating container {} from {}", name, config.image());

        let container_config = bollard::container::Config {
            image: Some(config.image.clone()),
            cmd: config.cmd.clone(),
            working_dir: config.working_dir.clone(),
            labels: config.labels.clone(),
            exposed_ports: config.exposed_ports_map(),
            tty: Some(config.tty),
            open_stdin: Some(config.open_stdin),
            attach_stdin: Some(config.open_stdin),
            host_config: Some(config.host_config.clone()),
            ..Default::default()
        };

        let options = bollard::container::CreateContainerOptions {
            name,
            ..Default::default()
        };

        let response = self
            .client
            .docker()
            .create_container(Some(options), container_config)
            .await?;

        for warning in &response.warnings {
            warn!("Container {}: {}", name, warning);
        }
        info!("Created container {} ({})", name, response.id);

        Ok(response.id)
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        self.client
            .docker()
            .start_container(
                name,
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(|e| ContainerError::from_api(name, e))?;

        info!("Started container: {}", name);
        Ok(())
    }

    async fn stop_container(&self, name: &str) -> Result<()> {
        let options = bollard::container::StopContainerOptions {
            t: self.config.force_stop_timeout.as_secs() as i64,
        };

        self.client
            .docker()
            .stop_container(name, Some(options))
            .await
            .map_err(|e| ContainerError::from_api(name, e))?;

        info!("Stopped container: {}", name);
        Ok(())
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let options = bollard::container::RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.client
            .docker()
            .remove_container(name, Some(options))
            .await
            .map_err(|e| ContainerError::from_api(name, e))?;

        info!("Removed container: {}", name);
        Ok(())
    }

    async fn send_stdin(&self, name: &str, text: &str) -> Result<()> {
        self.console.send_line(name, text).await
    }

    async fn is_running(&self, name: &str) -> Result<bool> {
        Ok(self.client.container_state(name).await?.is_running())
    }

    async fn read_stats(&self, name: &str) -> Result<StatsSample> {
        self.monitor.sample(name).await
    }
}
