//! JSON document store.
//!
//! All rows live in memory and the whole document is rewritten after every
//! mutation: serialized to a sibling temp file, synced, then renamed over the
//! target so a crash never leaves a half-written store behind.

use crate::schema::{Modpack, Season, Server};
use crate::store::{Result, Store, StoreData};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Store persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let data = if async_fs::try_exists(&path).await? {
            let bytes = async_fs::read(&path).await?;
            let data: StoreData = serde_json::from_slice(&bytes)?;
            info!(
                "Loaded store from {} ({} servers, {} modpacks, {} seasons)",
                path.display(),
                data.servers.len(),
                data.modpacks.len(),
                data.seasons.len()
            );
            data
        } else {
            debug!("No store at {}, starting empty", path.display());
            StoreData::default()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist. Nothing is written when `change` fails.
    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreData) -> Result<()> + Send,
    {
        let mut data = self.data.lock().await;
        let mut updated = data.clone();
        change(&mut updated)?;
        self.persist(&updated).await?;
        *data = updated;
        Ok(())
    }

    async fn persist(&self, data: &StoreData) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            async_fs::create_dir_all(parent).await?;
        }

        let serialized = serde_json::to_vec_pretty(data)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = async_fs::File::create(&temp_path).await?;
        file.write_all(&serialized).await?;
        file.sync_all().await?;
        drop(file);

        async_fs::rename(&temp_path, &self.path).await?;
        debug!("Persisted store to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn get_server(&self, id: &str) -> Result<Server> {
        self.data.lock().await.server(id)
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        Ok(self.data.lock().await.servers.values().cloned().collect())
    }

    async fn insert_server(&self, server: Server) -> Result<()> {
        self.mutate(|data| data.insert_server(server)).await
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        self.mutate(|data| data.delete_server(id)).await
    }

    async fn update_server_season(&self, id: &str, season_id: &str) -> Result<()> {
        self.mutate(|data| {
            data.server_mut(id)?.current_season = season_id.to_string();
            Ok(())
        })
        .await
    }

    async fn update_server_hostname(&self, id: &str, hostname: &str) -> Result<()> {
        self.mutate(|data| {
            data.server_mut(id)?.proxy_hostname = hostname.to_string();
            Ok(())
        })
        .await
    }

    async fn get_modpack(&self, id: &str) -> Result<Modpack> {
        self.data.lock().await.modpack(id)
    }

    async fn list_modpacks(&self) -> Result<Vec<Modpack>> {
        Ok(self.data.lock().await.modpacks.values().cloned().collect())
    }

    async fn insert_modpack(&self, modpack: Modpack) -> Result<()> {
        self.mutate(|data| data.insert_modpack(modpack)).await
    }

    async fn delete_modpack(&self, id: &str) -> Result<()> {
        self.mutate(|data| data.delete_modpack(id)).await
    }

    async fn get_season(&self, id: &str) -> Result<Season> {
        self.data.lock().await.season(id)
    }

    async fn list_seasons(&self) -> Result<Vec<Season>> {
        Ok(self.data.lock().await.seasons.values().cloned().collect())
    }

    async fn insert_season(&self, season: Season) -> Result<()> {
        self.mutate(|data| data.insert_season(season)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::JavaRuntime;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .insert_modpack(Modpack {
                id: "vanilla".to_string(),
                startup_script: "run.sh".to_string(),
                java_runtime: JavaRuntime::Java17,
            })
            .await
            .unwrap();
        store
            .insert_season(Season {
                id: "01.001.00".to_string(),
                modpack_id: "vanilla".to_string(),
            })
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let modpack = reopened.get_modpack("vanilla").await.unwrap();
        assert_eq!(modpack.java_runtime, JavaRuntime::Java17);
        assert_eq!(reopened.list_seasons().await.unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_mutation_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.delete_modpack("missing").await.is_err());
        assert!(!path.exists());
    }
}
