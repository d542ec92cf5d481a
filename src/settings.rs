use crate::models::ApiConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.juheai.top";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TRANSLATION_MODEL: &str = "gpt-4.1";

/// User-supplied API settings plus interface preferences. Generation may not
/// proceed unless both `base_url` and `api_key` are non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsStore {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub translation_model: String,
    pub version: String,
    pub theme: String,
    pub language: String,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            translation_model: DEFAULT_TRANSLATION_MODEL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            theme: "light".to_string(),
            language: "zh-CN".to_string(),
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ApiConfigUpdate {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl SettingsStore {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    /// Model to send upstream, falling back to the default when unset.
    pub fn current_model(&self) -> &str {
        if self.model.is_empty() {
            DEFAULT_MODEL
        } else {
            &self.model
        }
    }

    /// Snapshot read by the orchestrator at the start of each request.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.current_model().to_string(),
        }
    }

    pub fn update_api_config(&mut self, update: ApiConfigUpdate) {
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(api_key) = update.api_key {
            self.api_key = api_key;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
    }

    pub fn reset_api_config(&mut self) {
        self.base_url = DEFAULT_BASE_URL.to_string();
        self.api_key.clear();
        self.model = DEFAULT_MODEL.to_string();
    }

    /// Records a new version string, returning true when it changed.
    pub fn check_version_update(&mut self, new_version: &str) -> bool {
        if self.version != new_version {
            self.version = new_version.to_string();
            return true;
        }
        false
    }
}
