//! Deferred rotations.
//!
//! Each request spawns one background task that waits until the requested
//! time and then runs the pipeline. Only that wait can be cancelled, through
//! [`RotationScheduler::shutdown`]; a running pipeline always finishes.
//! Rotations of the same server are serialized by a per-server lock, and
//! each run re-reads the server row once it holds the lock so a queued
//! rotation builds on the season its predecessor produced.

use crate::container::ContainerRuntime;
use crate::naming;
use crate::orchestration::{ErrorIsolation, RotationPipeline, RotationReport};
use crate::schema::{Modpack, Server};
use crate::store::Store;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// Seconds to wait before `at`, never negative.
pub fn delay_until(at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    Duration::from_secs((at.timestamp() - now.timestamp()).max(0) as u64)
}

/// Handle on one requested rotation.
#[derive(Debug)]
pub struct ScheduledRotation {
    pub id: Uuid,
    pub server_id: String,
    pub scheduled_for: DateTime<Utc>,
    pub delay: Duration,
    handle: JoinHandle<Option<RotationReport>>,
}

impl ScheduledRotation {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the background task. `None` if the wait was cancelled or the
    /// rotation could not begin.
    pub async fn join(self) -> Option<RotationReport> {
        match self.handle.await {
            Ok(report) => report,
            Err(e) => {
                error!("Rotation task {} for {} failed: {}", self.id, self.server_id, e);
                None
            }
        }
    }
}

/// Spawns and tracks deferred rotations.
#[derive(Clone)]
pub struct RotationScheduler {
    pipeline: RotationPipeline,
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn Store>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    shutdown: CancellationToken,
}

impl RotationScheduler {
    pub fn new(
        pipeline: RotationPipeline,
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            pipeline,
            runtime,
            store,
            locks: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Request a rotation of `server` onto `modpack` at `at`.
    ///
    /// Players are told right away, on the broadcast channel and in game;
    /// the rotation itself runs later on a background task.
    pub async fn schedule(
        &self,
        server: &Server,
        modpack: &Modpack,
        at: DateTime<Utc>,
    ) -> ScheduledRotation {
        let id = Uuid::new_v4();
        let delay = delay_until(at, Utc::now());
        let notices = self.pipeline.notices().clone();

        info!(
            "[{}] Rotation {} onto {} scheduled in {}s",
            server.id,
            id,
            modpack.id,
            delay.as_secs()
        );

        let handle = tokio::spawn(self.clone().run_after(
            id,
            server.clone(),
            modpack.clone(),
            delay,
            self.shutdown.child_token(),
        ));

        notices.rotation_scheduled(&server.id).await;
        ErrorIsolation::new(notices.clone(), &server.id)
            .non_fatal(
                "in-game schedule notice",
                self.runtime.send_stdin(
                    &server.container_name(),
                    &naming::say_command(notices.ingame_schedule()),
                ),
            )
            .await;

        ScheduledRotation {
            id,
            server_id: server.id.clone(),
            scheduled_for: at,
            delay,
            handle,
        }
    }

    /// Servers with a rotation running or queued behind one.
    pub fn active_servers(&self) -> usize {
        self.locks.len()
    }

    /// Cancel every rotation still waiting for its start time.
    pub fn shutdown(&self) {
        info!("Cancelling pending rotations");
        self.shutdown.cancel();
    }

    async fn run_after(
        self,
        id: Uuid,
        requested: Server,
        modpack: Modpack,
        delay: Duration,
        cancel: CancellationToken,
    ) -> Option<RotationReport> {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("[{}] Rotation {} cancelled before it started", requested.id, id);
                return None;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let lock = self
            .locks
            .entry(requested.id.clone())
            .or_default()
            .clone();
        let report = {
            let _guard = lock.lock().await;
            self.run_locked(id, &requested, &modpack).await
        };

        // Drop the entry unless another rotation of this server holds a clone.
        self.locks
            .remove_if(&requested.id, |_, entry| Arc::strong_count(entry) <= 2);
        report
    }

    async fn run_locked(
        &self,
        id: Uuid,
        requested: &Server,
        modpack: &Modpack,
    ) -> Option<RotationReport> {
        let server = match self.store.get_server(&requested.id).await {
            Ok(server) => server,
            Err(e) => {
                ErrorIsolation::new(self.pipeline.notices().clone(), &requested.id)
                    .fatal(&format!("rotation {} could not load server: {}", id, e))
                    .await;
                return None;
            }
        };

        Some(self.pipeline.run(&server, modpack).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_delay_until() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(
            delay_until(Utc.timestamp_opt(1_700_000_030, 0).unwrap(), now),
            Duration::from_secs(30)
        );
        assert_eq!(
            delay_until(Utc.timestamp_opt(1_699_999_000, 0).unwrap(), now),
            Duration::ZERO
        );
        assert_eq!(delay_until(now, now), Duration::ZERO);
    }
}
