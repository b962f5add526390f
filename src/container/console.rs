//! Console input for running containers.
//!
//! Game servers read operator commands from their main process's stdin. This
//! attaches to that stream, writes one line and detaches without waiting for
//! any response.

use crate::container::{ContainerError, Result};
use bollard::Docker;
use bollard::container::{AttachContainerOptions, AttachContainerResults};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Writes console lines to a container's main process.
#[derive(Clone)]
pub struct ConsoleWriter {
    docker: Docker,
}

impl ConsoleWriter {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Write `text` followed by a newline to the container's stdin.
    ///
    /// # Errors
    ///
    /// Returns error if attachment or the write fails.
    pub async fn send_line(&self, container: &str, text: &str) -> Result<()> {
        debug!("Writing to console of {}: {}", container, text);

        let options = AttachContainerOptions::<String> {
            stdin: Some(true),
            stream: Some(true),
            stdout: Some(false),
            stderr: Some(false),
            logs: Some(false),
            ..Default::default()
        };

        let AttachContainerResults { output, mut input } = self
            .docker
            .attach_container(container, Some(options))
            .await
            .map_err(|e| ContainerError::from_api(container, e))?;

        let line = console_line(text);
        input
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ContainerError::ConsoleError(format!("{}: {}", container, e)))?;
        input
            .flush()
            .await
            .map_err(|e| ContainerError::ConsoleError(format!("{}: {}", container, e)))?;

        // Detach right away; the command's output is not awaited.
        drop(output);
        drop(input);

        Ok(())
    }
}

/// Terminate `text` with exactly one newline.
fn console_line(text: &str) -> String {
    format!("{}\n", text.trim_end_matches(['\r', '\n']))
}
