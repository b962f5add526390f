//! Fleet data model.
//!
//! - [`Server`]: a managed game server and its current season pointer
//! - [`Modpack`]: a template dataset and the runtime it needs
//! - [`Season`]: one append-only generation of a server's dataset
//! - [`ServerStatus`]: live container status, derived per query

pub mod types;
pub mod validation;

pub use types::{JavaRuntime, Modpack, Season, Server, ServerStatus};
pub use validation::ValidationError;
