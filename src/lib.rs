//! # Epoxi
//!
//! A fleet manager for single-instance game server containers with season
//! rotation: cloning a modpack template into a fresh volume, retiring the
//! running container and launching a replacement bound to the new data,
//! while admins and players are kept informed over webhook channels.
//!
//! ## Architecture Overview
//!
//! - **[`container`]**: container runtime adapter over Docker/Podman (bollard)
//! - **[`orchestration`]**: lifecycle operations, the rotation pipeline and deferred scheduling
//! - **[`store`]**: row persistence for servers, modpacks and seasons
//! - **[`notify`]**: admin and broadcast notification channels
//! - **[`proxy`]**: reverse-proxy host mappings
//! - **[`fleet`]**: the facade wiring everything together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epoxi::container::DockerRuntime;
//! use epoxi::fleet::{Fleet, FleetOptions};
//! use epoxi::notify::LogNotifier;
//! use epoxi::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fleet = Fleet::new(
//!         Arc::new(DockerRuntime::new().await?),
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LogNotifier),
//!         FleetOptions::default(),
//!     );
//!
//!     let rotation = fleet.request_rotation("01", "vanilla", None).await?;
//!     if let Some(report) = rotation.join().await {
//!         println!("rotation finished: {:?}", report.outcome);
//!     }
//!     Ok(())
//! }
//! ```

/// Environment constants and path utilities.
///
/// Centralizes resource naming prefixes, in-container paths and the
/// configuration file locations.
pub mod env;

/// Pure derivation of container, volume and season names.
pub mod naming;

/// Servers, modpacks, seasons and their validation.
pub mod schema;

/// Container runtime adapter.
pub mod container;

pub mod store;

pub mod notify;

pub mod proxy;

/// Lifecycle operations and season rotation.
///
/// Error isolation, the two-stage stop protocol, survival checks and the
/// rotation pipeline with its deferred scheduler.
pub mod orchestration;

pub mod fleet;

// CLI module for command-line interface
pub mod cli;

pub use container::{ContainerError, ContainerRuntime, DockerRuntime};
pub use fleet::{Fleet, FleetError, FleetOptions, NewServer};
pub use notify::{Channel, Notifier};
pub use orchestration::{RotationOutcome, RotationReport, RotationStage};
pub use schema::{JavaRuntime, Modpack, Season, Server, ServerStatus};
pub use store::{JsonFileStore, MemoryStore, Store};
