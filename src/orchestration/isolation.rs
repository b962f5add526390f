//! Step-level error isolation.
//!
//! A non-fatal step runs, and on failure is logged and reported to the admin
//! channel; the caller then moves on to its next step. Fatal conditions are
//! detected by the caller and reported through [`ErrorIsolation::fatal`].

use crate::notify::Notices;
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, error, warn};

/// Result of a non-fatal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Done(T),
    Failed(String),
}

impl<T> StepOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done(_))
    }

    pub fn error(&self) -> Option<String> {
        match self {
            StepOutcome::Done(_) => None,
            StepOutcome::Failed(message) => Some(message.clone()),
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            StepOutcome::Done(value) => Some(value),
            StepOutcome::Failed(_) => None,
        }
    }
}

/// Runs steps on behalf of one server.
#[derive(Clone)]
pub struct ErrorIsolation {
    notices: Notices,
    server_id: String,
}

impl ErrorIsolation {
    pub fn new(notices: Notices, server_id: impl Into<String>) -> Self {
        Self {
            notices,
            server_id: server_id.into(),
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Run `step`; a failure is reported and returned, never propagated.
    pub async fn non_fatal<T, E, F>(&self, step: &str, work: F) -> StepOutcome<T>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        match work.await {
            Ok(value) => {
                debug!("[{}] {} succeeded", self.server_id, step);
                StepOutcome::Done(value)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(
                    "[{}] Non-fatal failure in {}, continuing: {}",
                    self.server_id, step, message
                );
                self.notices
                    .non_fatal(&self.server_id, step, &message)
                    .await;
                StepOutcome::Failed(message)
            }
        }
    }

    /// Report a condition that ends the surrounding workflow.
    pub async fn fatal(&self, reason: &str) {
        error!("[{}] Fatal: {}", self.server_id, reason);
        self.notices.fatal(&self.server_id, reason).await;
    }
}
