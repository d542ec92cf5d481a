use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed keys for the persisted store subsets.
pub const SETTINGS_KEY: &str = "ai-image-generator-settings";
pub const CURRENT_RESULT_KEY: &str = "ai-image-generator-current";
pub const GALLERY_KEY: &str = "ai-image-generator-gallery";
pub const USER_KEY: &str = "ai-image-generator-user";
pub const SYSTEM_KEY: &str = "ai-drawing-system";

/// Key-value persistence for store subsets: one JSON file per fixed key in
/// a config directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform config directory
    /// (e.g. `~/.config/gemini-draw`).
    pub fn in_config_dir() -> Result<Self, ClientError> {
        let base = dirs::config_dir()
            .ok_or_else(|| ClientError::Persist("no config directory available".into()))?;
        Ok(Self::new(base.join("gemini-draw")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Loads the value under `key`, `Ok(None)` when nothing was saved yet.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ClientError::Persist(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::Persist(format!("corrupt state under key \"{key}\": {e}"))
        })?;
        debug!(key, "loaded persisted state");
        Ok(Some(value))
    }

    /// Serializes `value` under `key`, creating the directory on first use.
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ClientError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            ClientError::Persist(format!("failed to create {}: {e}", self.dir.display()))
        })?;
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| ClientError::Persist(format!("failed to serialize \"{key}\": {e}")))?;
        let path = self.path_for(key);
        tokio::fs::write(&path, json).await.map_err(|e| {
            ClientError::Persist(format!("failed to write {}: {e}", path.display()))
        })?;
        debug!(key, "saved persisted state");
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), ClientError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Persist(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
