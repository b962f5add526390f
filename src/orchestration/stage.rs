//! Rotation stages and the record of one rotation run.

use serde::Serialize;

/// Position of a rotation in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStage {
    Scheduled,
    Duplicating,
    Notifying,
    Stopping,
    Removing,
    PointerUpdated,
    Recreating,
    Starting,
    Done,
    FatalFailed,
}

impl RotationStage {
    /// Whether the rotation has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RotationStage::Done | RotationStage::FatalFailed)
    }
}

impl std::fmt::Display for RotationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RotationStage::Scheduled => "scheduled",
            RotationStage::Duplicating => "duplicating dataset",
            RotationStage::Notifying => "notifying players",
            RotationStage::Stopping => "stopping old container",
            RotationStage::Removing => "removing old container",
            RotationStage::PointerUpdated => "updating season pointer",
            RotationStage::Recreating => "recreating container",
            RotationStage::Starting => "starting new container",
            RotationStage::Done => "done",
            RotationStage::FatalFailed => "failed",
        };
        f.write_str(name)
    }
}

/// One attempted stage and, if it failed, why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: RotationStage,
    pub error: Option<String>,
}

impl StageRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// How a rotation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RotationOutcome {
    Completed,
    Fatal { stage: RotationStage, reason: String },
}

/// Everything one rotation run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationReport {
    pub server_id: String,
    pub season_id: Option<String>,
    pub stages: Vec<StageRecord>,
    pub outcome: RotationOutcome,
}

impl RotationReport {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            season_id: None,
            stages: Vec::new(),
            outcome: RotationOutcome::Completed,
        }
    }

    pub fn record(&mut self, stage: RotationStage, error: Option<String>) {
        self.stages.push(StageRecord { stage, error });
    }

    pub fn attempted(&self, stage: RotationStage) -> bool {
        self.stages.iter().any(|record| record.stage == stage)
    }

    /// Stages that failed without stopping the rotation.
    pub fn skipped(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|record| !record.succeeded())
    }

    /// Last stage reached.
    pub fn final_stage(&self) -> RotationStage {
        match self.outcome {
            RotationOutcome::Completed => RotationStage::Done,
            RotationOutcome::Fatal { .. } => RotationStage::FatalFailed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RotationOutcome::Completed
    }
}
