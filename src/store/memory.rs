use crate::schema::{Modpack, Season, Server};
use crate::store::{Result, Store, StoreData};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-process store. Rows are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing rows.
    pub fn with_data(data: StoreData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Copy of all rows.
    pub async fn snapshot(&self) -> StoreData {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_server(&self, id: &str) -> Result<Server> {
        self.data.read().await.server(id)
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        Ok(self.data.read().await.servers.values().cloned().collect())
    }

    async fn insert_server(&self, server: Server) -> Result<()> {
        self.data.write().await.insert_server(server)
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        self.data.write().await.delete_server(id)
    }

    async fn update_server_season(&self, id: &str, season_id: &str) -> Result<()> {
        self.data.write().await.server_mut(id)?.current_season = season_id.to_string();
        Ok(())
    }

    async fn update_server_hostname(&self, id: &str, hostname: &str) -> Result<()> {
        self.data.write().await.server_mut(id)?.proxy_hostname = hostname.to_string();
        Ok(())
    }

    async fn get_modpack(&self, id: &str) -> Result<Modpack> {
        self.data.read().await.modpack(id)
    }

    async fn list_modpacks(&self) -> Result<Vec<Modpack>> {
        Ok(self.data.read().await.modpacks.values().cloned().collect())
    }

    async fn insert_modpack(&self, modpack: Modpack) -> Result<()> {
        self.data.write().await.insert_modpack(modpack)
    }

    async fn delete_modpack(&self, id: &str) -> Result<()> {
        self.data.write().await.delete_modpack(id)
    }

    async fn get_season(&self, id: &str) -> Result<Season> {
        self.data.read().await.season(id)
    }

    async fn list_seasons(&self) -> Result<Vec<Season>> {
        Ok(self.data.read().await.seasons.values().cloned().collect())
    }

    async fn insert_season(&self, season: Season) -> Result<()> {
        self.data.write().await.insert_season(season)
    }
}
