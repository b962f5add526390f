//! Season rotation.
//!
//! A rotation clones a modpack's template volume into a fresh season volume,
//! retires the running container and starts a replacement on the new volume.
//! Stages run strictly in order and at most once. Every stage up to the
//! season pointer update is non-fatal: a failure is reported and the next
//! stage runs anyway. Re-creation, start and the survival check end a
//! rotation early, and nothing already done is rolled back.

use crate::container::{ContainerConfig, ContainerError, ContainerRuntime};
use crate::naming;
use crate::notify::Notices;
use crate::orchestration::lifecycle::stop_gracefully;
use crate::orchestration::{
    ContainerSettings, ErrorIsolation, RotationOutcome, RotationReport, RotationStage, Timing,
};
use crate::schema::{Modpack, Season, Server};
use crate::store::Store;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs rotations against injected runtime, store and notifier handles.
#[derive(Clone)]
pub struct RotationPipeline {
    runtime: Arc<dyn ContainerRuntime>,
    store: Arc<dyn Store>,
    notices: Notices,
    timing: Timing,
    settings: ContainerSettings,
}

impl RotationPipeline {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        store: Arc<dyn Store>,
        notices: Notices,
        timing: Timing,
        settings: ContainerSettings,
    ) -> Self {
        Self {
            runtime,
            store,
            notices,
            timing,
            settings,
        }
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Rotate `server` onto a new season cloned from `modpack`.
    ///
    /// Never fails: every error is either reported and skipped or ends the
    /// run as [`RotationOutcome::Fatal`].
    pub async fn run(&self, server: &Server, modpack: &Modpack) -> RotationReport {
        let isolation = ErrorIsolation::new(self.notices.clone(), &server.id);
        let mut report = RotationReport::new(&server.id);
        let container = server.container_name();

        info!(
            "[{}] Rotating from season {} using modpack {}",
            server.id, server.current_season, modpack.id
        );

        // Derive and record the new season before touching any container.
        let season = match Season::next_for(server, modpack) {
            Ok(season) => season,
            Err(e) => {
                return self
                    .abort(&isolation, report, RotationStage::Scheduled, e.to_string())
                    .await;
            }
        };
        report.season_id = Some(season.id.clone());

        let inserted = isolation
            .non_fatal("record season", self.store.insert_season(season.clone()))
            .await;
        report.record(RotationStage::Scheduled, inserted.error());

        let duplicated = isolation
            .non_fatal("duplicate dataset", self.duplicate_dataset(modpack, &season))
            .await;
        report.record(RotationStage::Duplicating, duplicated.error());

        let announced = isolation
            .non_fatal(
                "in-game notice",
                self.runtime.send_stdin(
                    &container,
                    &naming::say_command(self.notices.ingame_rotation()),
                ),
            )
            .await;
        self.notices.rotation_starting(&server.id).await;
        report.record(RotationStage::Notifying, announced.error());

        let stopped = isolation
            .non_fatal(
                "stop old container",
                stop_gracefully(self.runtime.as_ref(), &container, &self.timing),
            )
            .await;
        report.record(RotationStage::Stopping, stopped.error());

        let removed = isolation
            .non_fatal(
                "remove old container",
                self.runtime.remove_container(&container),
            )
            .await;
        report.record(RotationStage::Removing, removed.error());

        // The pointer moves even when earlier stages were skipped.
        let pointer = isolation
            .non_fatal(
                "update season pointer",
                self.store.update_server_season(&server.id, &season.id),
            )
            .await;
        report.record(RotationStage::PointerUpdated, pointer.error());

        // The old container may still own the name; only the new id is started.
        let engine_id = match self
            .recreate_container(&container, modpack, &season)
            .await
        {
            Ok(engine_id) => engine_id,
            Err(e) => {
                return self
                    .abort(
                        &isolation,
                        report,
                        RotationStage::Recreating,
                        format!("new server container could not be created: {}", e),
                    )
                    .await;
            }
        };
        report.record(RotationStage::Recreating, None);

        if let Err(e) = self.runtime.start_container(&engine_id).await {
            return self
                .abort(
                    &isolation,
                    report,
                    RotationStage::Starting,
                    format!("new server container failed to start: {}", e),
                )
                .await;
        }

        tokio::time::sleep(self.timing.survival).await;

        let survival_failure = match self.runtime.is_running(&engine_id).await {
            Ok(true) => None,
            Ok(false) => Some(format!(
                "server container did not survive {} seconds after creation",
                self.timing.survival.as_secs()
            )),
            Err(e) => Some(format!("could not inspect new server container: {}", e)),
        };
        if let Some(reason) = survival_failure {
            return self
                .abort(&isolation, report, RotationStage::Starting, reason)
                .await;
        }
        report.record(RotationStage::Starting, None);

        self.notices.rotation_complete(&server.id).await;
        info!(
            "[{}] Rotation to season {} complete",
            server.id, season.id
        );
        report
    }

    /// Clone the modpack template into the season volume with a disposable
    /// copy container. Completion is assumed after the copy wait.
    async fn duplicate_dataset(
        &self,
        modpack: &Modpack,
        season: &Season,
    ) -> Result<(), ContainerError> {
        let target = season.volume_name();
        self.runtime.create_volume(&target).await?;

        let config = ContainerConfig::volume_copy(
            &self.settings.utility_image,
            &modpack.volume_name(),
            &target,
        )?;
        let copier = naming::copy_container_name();
        self.runtime.create_container(&copier, &config).await?;

        let copied = match self.runtime.start_container(&copier).await {
            Ok(()) => {
                debug!("Copying {} into {} via {}", modpack.volume_name(), target, copier);
                tokio::time::sleep(self.timing.copy_wait).await;
                Ok(())
            }
            Err(e) => Err(e),
        };

        let removed = self.runtime.remove_container(&copier).await;
        copied.and(removed)
    }

    async fn recreate_container(
        &self,
        container: &str,
        modpack: &Modpack,
        season: &Season,
    ) -> Result<String, ContainerError> {
        let config = ContainerConfig::game_server(
            &modpack.image(),
            &season.volume_name(),
            &modpack.startup_command(),
            &self.settings.network,
        )?;
        self.runtime.create_container(container, &config).await
    }

    async fn abort(
        &self,
        isolation: &ErrorIsolation,
        mut report: RotationReport,
        stage: RotationStage,
        reason: String,
    ) -> RotationReport {
        isolation.fatal(&reason).await;
        report.record(stage, Some(reason.clone()));
        report.outcome = RotationOutcome::Fatal { stage, reason };
        report
    }
}
