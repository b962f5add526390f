//! Server lifecycle and season rotation.
//!
//! - [`isolation`]: the non-fatal step wrapper and fatal reporting
//! - [`lifecycle`]: single-shot create/start/stop/remove/status operations
//! - [`pipeline`]: the ordered season rotation workflow
//! - [`scheduler`]: deferred rotation requests on background tasks
//! - [`stage`]: rotation stages and per-run reports
//!
//! All waits are fixed-duration timers configured through [`Timing`]; state
//! is re-checked only after a wait elapses.

pub mod isolation;
pub mod lifecycle;
pub mod pipeline;
pub mod scheduler;
pub mod stage;

pub use isolation::{ErrorIsolation, StepOutcome};
pub use lifecycle::{LifecycleError, ServerLifecycle, StopOutcome};
pub use pipeline::RotationPipeline;
pub use scheduler::{RotationScheduler, ScheduledRotation};
pub use stage::{RotationOutcome, RotationReport, RotationStage, StageRecord};

use std::time::Duration;

/// Fixed waits used by lifecycle operations and rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after the console `stop` before checking whether to force-stop
    pub stop_grace: Duration,
    /// Wait after a lifecycle start before the advisory liveness check
    pub warmup: Duration,
    /// Wait after a rotation start before the survival check
    pub survival: Duration,
    /// Wait for the dataset copy container to finish
    pub copy_wait: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            stop_grace: Duration::from_secs(10),
            warmup: Duration::from_secs(10),
            survival: Duration::from_secs(60),
            copy_wait: Duration::from_secs(10),
        }
    }
}

/// Container settings shared by every container the fleet creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    /// Network game containers attach to
    pub network: String,
    /// Image of the disposable copy container
    pub utility_image: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            network: "epoxi-ingress".to_string(),
            utility_image: "alpine".to_string(),
        }
    }
}
