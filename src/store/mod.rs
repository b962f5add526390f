//! Row store for servers, modpacks and seasons.
//!
//! Orchestration only needs exact-id lookups, inserts, a couple of
//! single-field updates and full scans, so the [`Store`] trait stays that
//! small. [`MemoryStore`] keeps rows in process; [`JsonFileStore`] also
//! persists them to one JSON document after every write.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::schema::{Modpack, Season, Server};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Row-level persistence boundary.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_server(&self, id: &str) -> Result<Server>;
    async fn list_servers(&self) -> Result<Vec<Server>>;
    async fn insert_server(&self, server: Server) -> Result<()>;
    async fn delete_server(&self, id: &str) -> Result<()>;

    /// Point the server at a different season.
    async fn update_server_season(&self, id: &str, season_id: &str) -> Result<()>;

    async fn update_server_hostname(&self, id: &str, hostname: &str) -> Result<()>;

    async fn get_modpack(&self, id: &str) -> Result<Modpack>;
    async fn list_modpacks(&self) -> Result<Vec<Modpack>>;
    async fn insert_modpack(&self, modpack: Modpack) -> Result<()>;
    async fn delete_modpack(&self, id: &str) -> Result<()>;

    async fn get_season(&self, id: &str) -> Result<Season>;
    async fn list_seasons(&self) -> Result<Vec<Season>>;

    /// Append a season row. Seasons are never updated or deleted.
    async fn insert_season(&self, season: Season) -> Result<()>;
}

/// All rows, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub servers: BTreeMap<String, Server>,
    #[serde(default)]
    pub modpacks: BTreeMap<String, Modpack>,
    #[serde(default)]
    pub seasons: BTreeMap<String, Season>,
}

const SERVER: &str = "server";
const MODPACK: &str = "modpack";
const SEASON: &str = "season";

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn insert_new<T>(
    rows: &mut BTreeMap<String, T>,
    kind: &'static str,
    id: String,
    row: T,
) -> Result<()> {
    if rows.contains_key(&id) {
        return Err(StoreError::AlreadyExists { kind, id });
    }
    rows.insert(id, row);
    Ok(())
}

impl StoreData {
    pub(crate) fn server(&self, id: &str) -> Result<Server> {
        self.servers
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(SERVER, id))
    }

    pub(crate) fn insert_server(&mut self, server: Server) -> Result<()> {
        insert_new(&mut self.servers, SERVER, server.id.clone(), server)
    }

    pub(crate) fn delete_server(&mut self, id: &str) -> Result<()> {
        self.servers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(SERVER, id))
    }

    pub(crate) fn server_mut(&mut self, id: &str) -> Result<&mut Server> {
        self.servers
            .get_mut(id)
            .ok_or_else(|| not_found(SERVER, id))
    }

    pub(crate) fn modpack(&self, id: &str) -> Result<Modpack> {
        self.modpacks
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(MODPACK, id))
    }

    pub(crate) fn insert_modpack(&mut self, modpack: Modpack) -> Result<()> {
        insert_new(&mut self.modpacks, MODPACK, modpack.id.clone(), modpack)
    }

    pub(crate) fn delete_modpack(&mut self, id: &str) -> Result<()> {
        self.modpacks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(MODPACK, id))
    }

    pub(crate) fn season(&self, id: &str) -> Result<Season> {
        self.seasons
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(SEASON, id))
    }

    pub(crate) fn insert_season(&mut self, season: Season) -> Result<()> {
        insert_new(&mut self.seasons, SEASON, season.id.clone(), season)
    }
}
