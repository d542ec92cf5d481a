use crate::error::ClientError;
use crate::persist::{self, LocalStore};
use serde::{Deserialize, Serialize};

/// System-wide preferences persisted under the `ai-drawing-system` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemPreferences {
    pub theme: String,
    pub language: String,
    pub animations: bool,
    pub compact_mode: bool,
    pub auto_save_history: bool,
    pub max_history_items: usize,
    pub default_image_size: String,
    pub auto_optimize_prompt: bool,
    pub verbose_logging: bool,
}

impl Default for SystemPreferences {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            language: "zh-CN".to_string(),
            animations: true,
            compact_mode: false,
            auto_save_history: true,
            max_history_items: 1000,
            default_image_size: "1024x1024".to_string(),
            auto_optimize_prompt: false,
            verbose_logging: false,
        }
    }
}

impl SystemPreferences {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Loads the saved preferences, defaults when nothing was saved yet.
    pub async fn restore_from(local: &LocalStore) -> Result<Self, ClientError> {
        Ok(local.load(persist::SYSTEM_KEY).await?.unwrap_or_default())
    }

    pub async fn persist_to(&self, local: &LocalStore) -> Result<(), ClientError> {
        local.save(persist::SYSTEM_KEY, self).await
    }
}
