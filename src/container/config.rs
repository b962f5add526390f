//! Container configuration builders.
//!
//! Provides a fluent API for building container configurations, plus the two
//! shapes the fleet actually creates: long-running game server containers and
//! disposable volume copy containers.

use crate::container::{ContainerError, Result};
use crate::env::{copy, server};
use crate::naming;
use bollard::service::{HostConfig, Mount, MountTypeEnum};
use std::collections::HashMap;

/// Container configuration builder.
pub struct ContainerConfigBuilder {
    image: Option<String>,
    cmd: Option<Vec<String>>,
    working_dir: Option<String>,
    labels: HashMap<String, String>,
    mounts: Vec<Mount>,
    network_mode: Option<String>,
    exposed_ports: Vec<u16>,
    tty: bool,
    open_stdin: bool,
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerConfigBuilder {
    /// Create a new container configuration builder.
    pub fn new() -> Self {
        Self {
            image: None,
            cmd: None,
            working_dir: None,
            labels: HashMap::new(),
            mounts: Vec::new(),
            network_mode: None,
            exposed_ports: Vec::new(),
            tty: false,
            open_stdin: false,
        }
    }

    /// Set the container image.
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the command to run in the container.
    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(cmd.into_iter().map(|s| s.into()).collect());
        self
    }

    /// Set the working directory in the container.
    pub fn working_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add a label to the container.
    pub fn label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Mount a named volume at `target`.
    pub fn volume<S: Into<String>, T: Into<String>>(
        mut self,
        source: S,
        target: T,
        read_only: bool,
    ) -> Self {
        self.mounts.push(Mount {
            target: Some(target.into()),
            source: Some(source.into()),
            typ: Some(MountTypeEnum::VOLUME),
            read_only: Some(read_only),
            ..Default::default()
        });
        self
    }

    /// Attach the container to a network (e.g. a pre-existing overlay).
    pub fn network_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.network_mode = Some(mode.into());
        self
    }

    /// Expose a TCP port on the container network.
    pub fn expose_port(mut self, port: u16) -> Self {
        self.exposed_ports.push(port);
        self
    }

    /// Allocate a pseudo-TTY.
    pub fn tty(mut self, enable: bool) -> Self {
        self.tty = enable;
        self
    }

    /// Keep stdin open so console commands can be written to it.
    pub fn open_stdin(mut self, enable: bool) -> Self {
        self.open_stdin = enable;
        self
    }

    /// Build the container configuration.
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or invalid.
    pub fn build(self) -> Result<ContainerConfig> {
        let image = self
            .image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| ContainerError::ConfigError("Image is required".to_string()))?;

        let host_config = HostConfig {
            mounts: if self.mounts.is_empty() {
                None
            } else {
                Some(self.mounts)
            },
            network_mode: self.network_mode,
            ..Default::default()
        };

        Ok(ContainerConfig {
            image,
            cmd: self.cmd,
            working_dir: self.working_dir,
            labels: if self.labels.is_empty() {
                None
            } else {
                Some(self.labels)
            },
            exposed_ports: self.exposed_ports,
            tty: self.tty,
            open_stdin: self.open_stdin,
            host_config,
        })
    }
}

/// Container configuration.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Image name
    pub image: String,
    /// Command to run
    pub cmd: Option<Vec<String>>,
    /// Working directory
    pub working_dir: Option<String>,
    /// Labels
    pub labels: Option<HashMap<String, String>>,
    /// Exposed TCP ports
    pub exposed_ports: Vec<u16>,
    /// Pseudo-TTY allocation
    pub tty: bool,
    /// Keep stdin open
    pub open_stdin: bool,
    /// Host configuration
    pub host_config: HostConfig,
}

impl ContainerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::new()
    }

    /// Game server container: one volume at the data directory, the game
    /// port exposed, interactive stdin and tty, attached to `network`.
    pub fn game_server(
        image: &str,
        volume_name: &str,
        startup_command: &str,
        network: &str,
    ) -> Result<Self> {
        Self::builder()
            .image(image)
            .cmd([startup_command])
            .working_dir(server::DATA_DIR)
            .volume(volume_name, server::DATA_DIR, false)
            .network_mode(network)
            .expose_port(server::GAME_PORT)
            .tty(true)
            .open_stdin(true)
            .label("epoxi.managed", "true")
            .build()
    }

    /// Disposable container copying `source_volume` into `target_volume`.
    pub fn volume_copy(image: &str, source_volume: &str, target_volume: &str) -> Result<Self> {
        Self::builder()
            .image(image)
            .cmd(naming::copy_command())
            .volume(source_volume, copy::SOURCE_DIR, true)
            .volume(target_volume, copy::TARGET_DIR, false)
            .label("epoxi.managed", "true")
            .build()
    }

    /// Get the image name.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Source volumes of all mounts, in mount order.
    pub fn volume_sources(&self) -> Vec<&str> {
        self.host_config
            .mounts
            .iter()
            .flatten()
            .filter_map(|mount| mount.source.as_deref())
            .collect()
    }

    /// Exposed ports keyed the way the Docker API expects (`25565/tcp`).
    pub(crate) fn exposed_ports_map(&self) -> Option<HashMap<String, HashMap<(), ()>>> {
        if self.exposed_ports.is_empty() {
            return None;
        }
        Some(
            self.exposed_ports
                .iter()
                .map(|port| (format!("{}/tcp", port), HashMap::new()))
                .collect(),
        )
    }
}
