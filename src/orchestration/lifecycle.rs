//! Single-shot lifecycle operations on one server's container.

use crate::container::{ContainerConfig, ContainerError, ContainerRuntime};
use crate::env::server::STOP_COMMAND;
use crate::notify::Notices;
use crate::orchestration::{ContainerSettings, Timing};
use crate::schema::{Server, ServerStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Caller-facing lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Failed to create volume {volume}: {source}")]
    CreateVolume {
        volume: String,
        #[source]
        source: ContainerError,
    },

    #[error("Failed to create container {container}: {source}")]
    CreateContainer {
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("Failed to start container {container}: {source}")]
    Start {
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("Failed to stop container {container}: {source}")]
    Stop {
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("Failed to remove container {container}: {source}")]
    Remove {
        container: String,
        #[source]
        source: ContainerError,
    },
}

/// How a stop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The game shut down on its console `stop` within the grace period
    Graceful,
    /// The container was still up after the grace period and was force-stopped
    Forced,
}

/// Lifecycle operations exposed to the management surface.
#[derive(Clone)]
pub struct ServerLifecycle {
    runtime: Arc<dyn ContainerRuntime>,
    notices: Notices,
    timing: Timing,
    settings: ContainerSettings,
}

impl ServerLifecycle {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        notices: Notices,
        timing: Timing,
        settings: ContainerSettings,
    ) -> Self {
        Self {
            runtime,
            notices,
            timing,
            settings,
        }
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    /// Create the server's volume, then its container. Nothing is started.
    ///
    /// # Errors
    ///
    /// Returns the first failing step; the admin channel is told as well.
    pub async fn create(&self, server: &Server) -> Result<String, LifecycleError> {
        let volume = server.volume_name();
        let container = server.container_name();

        if let Err(source) = self.runtime.create_volume(&volume).await {
            let err = LifecycleError::CreateVolume { volume, source };
            self.report(server, "create volume", &err).await;
            return Err(err);
        }

        let result = match ContainerConfig::game_server(
            &server.image(),
            &volume,
            &server.startup_command(),
            &self.settings.network,
        ) {
            Ok(config) => self.runtime.create_container(&container, &config).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(id) => {
                info!("[{}] Created container {}", server.id, container);
                Ok(id)
            }
            Err(source) => {
                let err = LifecycleError::CreateContainer { container, source };
                self.report(server, "create container", &err).await;
                Err(err)
            }
        }
    }

    /// Start the container, then check it is still up after the warm-up.
    ///
    /// The result reflects the start call only; a container found dead after
    /// the warm-up is reported as fatal but does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns error if the start command fails.
    pub async fn start(&self, server: &Server) -> Result<(), LifecycleError> {
        let container = server.container_name();

        if let Err(source) = self.runtime.start_container(&container).await {
            let err = LifecycleError::Start { container, source };
            self.report(server, "start", &err).await;
            return Err(err);
        }

        tokio::time::sleep(self.timing.warmup).await;

        match self.runtime.is_running(&container).await {
            Ok(true) => debug!("[{}] Survived warm-up", server.id),
            Ok(false) => {
                self.fatal(
                    server,
                    &format!(
                        "server container did not survive {} seconds after start",
                        self.timing.warmup.as_secs()
                    ),
                )
                .await;
            }
            Err(e) => {
                self.fatal(server, &format!("could not inspect container after start: {}", e))
                    .await;
            }
        }

        Ok(())
    }

    /// Ask the game to stop, and force-stop only if it is still up after the
    /// grace period.
    ///
    /// # Errors
    ///
    /// Returns error if the console write, the inspection or the forced stop fails.
    pub async fn stop(&self, server: &Server) -> Result<StopOutcome, LifecycleError> {
        let outcome = stop_gracefully(self.runtime.as_ref(), &server.container_name(), &self.timing)
            .await
            .map_err(|source| LifecycleError::Stop {
                container: server.container_name(),
                source,
            });

        if let Err(err) = &outcome {
            self.report(server, "stop", err).await;
        }
        outcome
    }

    /// Force-remove the container whether or not it is running.
    ///
    /// A missing container is returned as an error but not reported to admins.
    ///
    /// # Errors
    ///
    /// Returns error if removal fails.
    pub async fn remove(&self, server: &Server) -> Result<(), LifecycleError> {
        let container = server.container_name();

        match self.runtime.remove_container(&container).await {
            Ok(()) => Ok(()),
            Err(source @ ContainerError::NotFound(_)) => {
                debug!("[{}] No container {} to remove", server.id, container);
                Err(LifecycleError::Remove { container, source })
            }
            Err(source) => {
                let err = LifecycleError::Remove { container, source };
                self.report(server, "remove", &err).await;
                Err(err)
            }
        }
    }

    /// Live status; a missing sample yields the not-running status.
    pub async fn status(&self, server: &Server) -> ServerStatus {
        let container = server.container_name();

        let sample = match self.runtime.read_stats(&container).await {
            Ok(sample) => sample,
            Err(e) => {
                debug!("[{}] No stats sample: {}", server.id, e);
                return ServerStatus::not_running(&server.id);
            }
        };

        let running = self.runtime.is_running(&container).await.unwrap_or(false);
        sample.into_status(&server.id, running)
    }

    async fn report(&self, server: &Server, step: &str, err: &LifecycleError) {
        warn!("[{}] {} failed: {}", server.id, step, err);
        self.notices
            .non_fatal(&server.id, step, &err.to_string())
            .await;
    }

    async fn fatal(&self, server: &Server, reason: &str) {
        error!("[{}] {}", server.id, reason);
        self.notices.fatal(&server.id, reason).await;
    }
}

/// Two-stage shutdown: console `stop`, wait out the grace period, then a
/// forced stop if and only if the container still reports running.
pub(crate) async fn stop_gracefully(
    runtime: &dyn ContainerRuntime,
    container: &str,
    timing: &Timing,
) -> Result<StopOutcome, ContainerError> {
    runtime.send_stdin(container, STOP_COMMAND).await?;

    tokio::time::sleep(timing.stop_grace).await;

    if !runtime.is_running(container).await? {
        info!("{} stopped gracefully", container);
        return Ok(StopOutcome::Graceful);
    }

    warn!(
        "{} still running after {}s, forcing stop",
        container,
        timing.stop_grace.as_secs()
    );
    runtime.stop_container(container).await?;
    Ok(StopOutcome::Forced)
}
