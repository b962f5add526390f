//! Fleet management facade.
//!
//! [`Fleet`] wires the store, the container runtime, notifications, the
//! proxy routes and the rotation scheduler together and exposes the
//! operations an API or CLI maps onto. Inputs are validated before any side
//! effect; validation failures go back to the caller only.

use crate::container::{ContainerError, ContainerRuntime};
use crate::naming;
use crate::notify::{Messages, Notices, Notifier};
use crate::orchestration::{
    ContainerSettings, ErrorIsolation, LifecycleError, RotationPipeline, RotationScheduler,
    ScheduledRotation, ServerLifecycle, StopOutcome, Timing,
};
use crate::proxy::ProxyRoutes;
use crate::schema::validation::{
    ValidationError, validate_hostname, validate_modpack_id, validate_server_id,
};
use crate::schema::{JavaRuntime, Modpack, Server, ServerStatus};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Errors returned to the caller of a fleet operation.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Failed to provision volume: {0}")]
    Container(#[from] ContainerError),
}

impl FleetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::Store(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;

/// Everything configurable about a fleet besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct FleetOptions {
    pub timing: Timing,
    pub containers: ContainerSettings,
    pub messages: Messages,
    /// Proxy routes file; route updates are skipped without one
    pub proxy_hosts_file: Option<PathBuf>,
    /// Delay applied to rotation requests without an explicit time
    pub default_schedule_delay: Duration,
}

/// Fields of a server registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServer {
    pub id: String,
    pub name: String,
    pub startup_script: String,
    pub java_runtime: JavaRuntime,
    pub proxy_hostname: String,
    /// Starting season; `<id>.000.00` when absent
    pub initial_season: Option<String>,
}

impl NewServer {
    fn into_server(self) -> Server {
        let current_season = self
            .initial_season
            .unwrap_or_else(|| naming::initial_season_id(&self.id));
        Server {
            id: self.id,
            name: self.name,
            current_season,
            proxy_hostname: self.proxy_hostname,
            startup_script: self.startup_script,
            java_runtime: self.java_runtime,
        }
    }
}

/// The managed fleet.
pub struct Fleet {
    store: Arc<dyn Store>,
    runtime: Arc<dyn ContainerRuntime>,
    notices: Notices,
    lifecycle: ServerLifecycle,
    scheduler: RotationScheduler,
    proxy: Option<ProxyRoutes>,
    default_schedule_delay: Duration,
}

impl Fleet {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        options: FleetOptions,
    ) -> Self {
        let notices = Notices::new(notifier, options.messages);
        let lifecycle = ServerLifecycle::new(
            runtime.clone(),
            notices.clone(),
            options.timing,
            options.containers.clone(),
        );
        let pipeline = RotationPipeline::new(
            runtime.clone(),
            store.clone(),
            notices.clone(),
            options.timing,
            options.containers,
        );
        let scheduler = RotationScheduler::new(pipeline, runtime.clone(), store.clone());

        Self {
            store,
            runtime,
            notices,
            lifecycle,
            scheduler,
            proxy: options.proxy_hosts_file.map(ProxyRoutes::new),
            default_schedule_delay: options.default_schedule_delay,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn lifecycle(&self) -> &ServerLifecycle {
        &self.lifecycle
    }

    // Modpacks

    /// Register a modpack and create its empty template volume.
    pub async fn register_modpack(&self, modpack: Modpack) -> Result<Modpack> {
        modpack.validate()?;
        self.ensure_absent_modpack(&modpack.id).await?;

        self.runtime.create_volume(&modpack.volume_name()).await?;
        self.store.insert_modpack(modpack.clone()).await?;

        info!("Registered modpack {} ({})", modpack.id, modpack.java_runtime);
        Ok(modpack)
    }

    pub async fn list_modpacks(&self) -> Result<Vec<Modpack>> {
        Ok(self.store.list_modpacks().await?)
    }

    /// Delete a modpack row; its template volume is removed on a best-effort basis.
    pub async fn delete_modpack(&self, id: &str) -> Result<()> {
        validate_modpack_id(id)?;
        let modpack = self.store.get_modpack(id).await?;
        self.store.delete_modpack(id).await?;

        ErrorIsolation::new(self.notices.clone(), id)
            .non_fatal(
                "remove modpack volume",
                self.runtime.remove_volume(&modpack.volume_name()),
            )
            .await;

        info!("Deleted modpack {}", id);
        Ok(())
    }

    // Servers

    /// Register a server. Its container is not created until [`Fleet::create`].
    pub async fn register_server(&self, new_server: NewServer) -> Result<Server> {
        let server = new_server.into_server();
        server.validate()?;
        self.store.insert_server(server.clone()).await?;

        self.route(&server.id, |proxy| {
            let hostname = server.proxy_hostname.clone();
            let container = server.container_name();
            async move { proxy.add_mapping(&hostname, &container).await }
        })
        .await;

        info!("Registered server {} at season {}", server.id, server.current_season);
        Ok(server)
    }

    pub async fn get_server(&self, id: &str) -> Result<Server> {
        validate_server_id(id)?;
        Ok(self.store.get_server(id).await?)
    }

    pub async fn list_servers(&self) -> Result<Vec<Server>> {
        Ok(self.store.list_servers().await?)
    }

    /// Change the public hostname and move the proxy route with it.
    pub async fn update_hostname(&self, id: &str, hostname: &str) -> Result<Server> {
        validate_hostname(hostname)?;
        let server = self.get_server(id).await?;
        self.store.update_server_hostname(id, hostname).await?;

        let previous = server.proxy_hostname.clone();
        let hostname_owned = hostname.to_string();
        let container = server.container_name();
        self.route(id, |proxy| async move {
            proxy.remove_mapping(&previous).await?;
            proxy.add_mapping(&hostname_owned, &container).await
        })
        .await;

        Ok(Server {
            proxy_hostname: hostname.to_string(),
            ..server
        })
    }

    /// Remove the server's container, then its row and proxy route.
    ///
    /// A container that no longer exists does not block the deletion.
    pub async fn delete_server(&self, id: &str) -> Result<()> {
        let server = self.get_server(id).await?;

        match self.lifecycle.remove(&server).await {
            Ok(()) => {}
            Err(LifecycleError::Remove {
                source: ContainerError::NotFound(_),
                ..
            }) => warn!("[{}] No container to remove", id),
            Err(e) => return Err(e.into()),
        }

        self.store.delete_server(id).await?;

        let hostname = server.proxy_hostname.clone();
        self.route(id, |proxy| async move { proxy.remove_mapping(&hostname).await })
            .await;

        info!("Deleted server {}", id);
        Ok(())
    }

    // Lifecycle

    pub async fn create(&self, id: &str) -> Result<String> {
        let server = self.get_server(id).await?;
        Ok(self.lifecycle.create(&server).await?)
    }

    pub async fn start(&self, id: &str) -> Result<()> {
        let server = self.get_server(id).await?;
        Ok(self.lifecycle.start(&server).await?)
    }

    pub async fn stop(&self, id: &str) -> Result<StopOutcome> {
        let server = self.get_server(id).await?;
        Ok(self.lifecycle.stop(&server).await?)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let server = self.get_server(id).await?;
        Ok(self.lifecycle.remove(&server).await?)
    }

    pub async fn status(&self, id: &str) -> Result<ServerStatus> {
        let server = self.get_server(id).await?;
        Ok(self.lifecycle.status(&server).await)
    }

    /// Status of every registered server.
    pub async fn status_all(&self) -> Result<Vec<ServerStatus>> {
        let servers = self.store.list_servers().await?;
        let mut statuses = Vec::with_capacity(servers.len());
        for server in &servers {
            statuses.push(self.lifecycle.status(server).await);
        }
        Ok(statuses)
    }

    // Rotation

    /// Request a rotation of server `server_id` onto `modpack_id`.
    ///
    /// Returns once the rotation is scheduled; its result is only visible
    /// through notifications and the returned handle.
    pub async fn request_rotation(
        &self,
        server_id: &str,
        modpack_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> Result<ScheduledRotation> {
        validate_server_id(server_id)?;
        validate_modpack_id(modpack_id)?;

        let modpack = self.store.get_modpack(modpack_id).await?;
        let server = self.store.get_server(server_id).await?;

        let at = at.unwrap_or_else(|| {
            Utc::now()
                + chrono::Duration::from_std(self.default_schedule_delay)
                    .unwrap_or_else(|_| chrono::Duration::zero())
        });

        Ok(self.scheduler.schedule(&server, &modpack, at).await)
    }

    /// Servers with a rotation currently running or queued behind one.
    pub fn active_rotations(&self) -> usize {
        self.scheduler.active_servers()
    }

    /// Cancel rotations still waiting for their start time.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    async fn ensure_absent_modpack(&self, id: &str) -> Result<()> {
        match self.store.get_modpack(id).await {
            Ok(_) => Err(StoreError::AlreadyExists {
                kind: "modpack",
                id: id.to_string(),
            }
            .into()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a proxy route change if a routes file is configured. Failures
    /// are reported to admins and never fail the calling operation.
    async fn route<F, Fut>(&self, server_id: &str, change: F)
    where
        F: FnOnce(ProxyRoutes) -> Fut,
        Fut: std::future::Future<Output = crate::proxy::Result<()>>,
    {
        let Some(proxy) = self.proxy.clone() else {
            return;
        };
        ErrorIsolation::new(self.notices.clone(), server_id)
            .non_fatal("update proxy route", change(proxy))
            .await;
    }
}
