//! Reverse-proxy host mappings.
//!
//! The proxy reads a JSON document whose `mappings` object maps a public
//! hostname onto `container:port`. Updates are read-modify-write of the whole
//! file; fields other than `mappings` are preserved untouched.

use crate::env::server::GAME_PORT;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::{debug, info};

const MAPPINGS_KEY: &str = "mappings";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Proxy hosts file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Proxy hosts file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Proxy hosts file {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Handle on a proxy hosts file.
#[derive(Debug, Clone)]
pub struct ProxyRoutes {
    path: PathBuf,
}

impl ProxyRoutes {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Route `hostname` to the game port of `container`. Empty hostnames are ignored.
    pub async fn add_mapping(&self, hostname: &str, container: &str) -> Result<()> {
        if hostname.is_empty() {
            return Ok(());
        }

        let target = format!("{}:{}", container, GAME_PORT);
        self.update(|mappings| {
            mappings.insert(hostname.to_string(), Value::String(target.clone()));
        })
        .await?;

        info!("Proxy now routes {} to {}", hostname, target);
        Ok(())
    }

    /// Drop the route for `hostname`, if any. Empty hostnames are ignored.
    pub async fn remove_mapping(&self, hostname: &str) -> Result<()> {
        if hostname.is_empty() {
            return Ok(());
        }

        self.update(|mappings| {
            mappings.remove(hostname);
        })
        .await?;

        info!("Proxy route for {} removed", hostname);
        Ok(())
    }

    /// Current hostname to target routes.
    pub async fn mappings(&self) -> Result<BTreeMap<String, String>> {
        let document = self.read().await?;
        Ok(document
            .get(MAPPINGS_KEY)
            .and_then(Value::as_object)
            .map(|mappings| {
                mappings
                    .iter()
                    .filter_map(|(host, target)| {
                        target.as_str().map(|t| (host.clone(), t.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read(&self) -> Result<Map<String, Value>> {
        if !async_fs::try_exists(&self.path).await? {
            debug!("No proxy hosts file at {}", self.path.display());
            return Ok(Map::new());
        }

        let text = async_fs::read_to_string(&self.path).await?;
        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&text)? {
            Value::Object(document) => Ok(document),
            _ => Err(ProxyError::NotAnObject(self.path.clone())),
        }
    }

    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut document = self.read().await?;

        let mut mappings = match document.remove(MAPPINGS_KEY) {
            Some(Value::Object(mappings)) => mappings,
            _ => Map::new(),
        };
        change(&mut mappings);
        document.insert(MAPPINGS_KEY.to_string(), Value::Object(mappings));

        let serialized = serde_json::to_string_pretty(&Value::Object(document))?;
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }
        async_fs::write(&self.path, serialized).await?;
        Ok(())
    }
}
