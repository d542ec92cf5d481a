use crate::backend::{BackendClient, RegisterRequest};
use crate::error::ClientError;
use crate::models::{StorageInfo, UserInfo};
use crate::persist::{self, LocalStore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Login session: token, account info, and server-side storage quota.
/// A 401 from any backend call forces `logout`.
#[derive(Debug, Default)]
pub struct UserStore {
    user_info: Option<UserInfo>,
    token: String,
    storage_info: Option<StorageInfo>,
}

/// Fields persisted between sessions.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedUserState {
    pub user_info: Option<UserInfo>,
    pub token: String,
    pub storage_info: Option<StorageInfo>,
    pub is_logged_in: bool,
}

impl UserStore {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty() && self.user_info.is_some()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    pub fn storage_info(&self) -> Option<&StorageInfo> {
        self.storage_info.as_ref()
    }

    /// Name shown in the interface: username, else the email local part.
    pub fn display_name(&self) -> String {
        match &self.user_info {
            Some(info) if !info.username.is_empty() => info.username.clone(),
            Some(info) => info.email.split('@').next().unwrap_or("").to_string(),
            None => String::new(),
        }
    }

    pub fn storage_usage_percentage(&self) -> f64 {
        self.storage_info
            .as_ref()
            .map(|s| s.usage_percentage)
            .unwrap_or(0.0)
    }

    pub fn remaining_storage_formatted(&self) -> String {
        let remaining = self
            .storage_info
            .as_ref()
            .map(|s| s.remaining_space)
            .unwrap_or(0);
        format_file_size(remaining)
    }

    /// Email + password login. On success the token is kept here and
    /// installed on the backend client for subsequent requests.
    pub async fn login(
        &mut self,
        backend: &BackendClient,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let auth = backend.login(email, password).await?;
        info!(email, "login succeeded");
        backend.set_token(&auth.access_token);
        self.token = auth.access_token;
        self.user_info = Some(auth.user);
        Ok(())
    }

    pub async fn register(
        &mut self,
        backend: &BackendClient,
        request: &RegisterRequest,
    ) -> Result<(), ClientError> {
        let auth = backend.register(request).await?;
        info!(email = %request.email, "registration succeeded");
        backend.set_token(&auth.access_token);
        self.token = auth.access_token;
        self.user_info = Some(auth.user);
        Ok(())
    }

    pub async fn send_verification_code(
        &self,
        backend: &BackendClient,
        email: &str,
    ) -> Result<(), ClientError> {
        backend.send_verification_code(email).await
    }

    pub fn logout(&mut self, backend: &BackendClient) {
        self.user_info = None;
        self.token.clear();
        self.storage_info = None;
        backend.clear_token();
        info!("logged out");
    }

    pub fn update_storage_info(&mut self, storage_info: StorageInfo) {
        self.storage_info = Some(storage_info);
    }

    pub fn persisted_state(&self) -> PersistedUserState {
        PersistedUserState {
            user_info: self.user_info.clone(),
            token: self.token.clone(),
            storage_info: self.storage_info.clone(),
            is_logged_in: self.is_authenticated(),
        }
    }

    /// Restores a saved session and reinstalls the token on the client.
    pub fn restore(&mut self, backend: &BackendClient, state: PersistedUserState) {
        self.user_info = state.user_info;
        self.token = state.token;
        self.storage_info = state.storage_info;
        if !self.token.is_empty() {
            backend.set_token(&self.token);
        }
    }

    /// Hydrates the saved session from local storage under the
    /// `ai-image-generator-user` key. Nothing saved yet keeps the defaults.
    pub async fn restore_from(
        &mut self,
        backend: &BackendClient,
        local: &LocalStore,
    ) -> Result<(), ClientError> {
        if let Some(state) = local.load(persist::USER_KEY).await? {
            self.restore(backend, state);
        }
        Ok(())
    }

    /// Writes the persisted subset back to local storage.
    pub async fn persist_to(&self, local: &LocalStore) -> Result<(), ClientError> {
        local.save(persist::USER_KEY, &self.persisted_state()).await
    }
}

/// Human-readable byte count, two decimal places.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes as f64).ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    format!("{:.2} {}", value, UNITS[exponent])
        .replace(".00 ", " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_sizes_format_with_units() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn display_name_falls_back_to_email_local_part() {
        let mut store = UserStore::default();
        assert_eq!(store.display_name(), "");
        store.user_info = Some(UserInfo {
            username: String::new(),
            email: "alex@example.com".into(),
        });
        assert_eq!(store.display_name(), "alex");
        store.user_info = Some(UserInfo {
            username: "drawfan".into(),
            email: "alex@example.com".into(),
        });
        assert_eq!(store.display_name(), "drawfan");
    }

    #[test]
    fn authenticated_needs_token_and_user() {
        let mut store = UserStore::default();
        assert!(!store.is_authenticated());
        store.token = "jwt".into();
        assert!(!store.is_authenticated());
        store.user_info = Some(UserInfo {
            username: "a".into(),
            email: "a@example.com".into(),
        });
        assert!(store.is_authenticated());
    }

    #[test]
    fn persisted_state_reflects_login_status() {
        let mut store = UserStore::default();
        store.token = "jwt".into();
        store.user_info = Some(UserInfo {
            username: "a".into(),
            email: "a@example.com".into(),
        });
        let state = store.persisted_state();
        assert!(state.is_logged_in);
        assert_eq!(state.token, "jwt");
    }

    #[tokio::test]
    async fn session_round_trips_under_the_user_key() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::new(dir.path());
        let backend = BackendClient::new("http://localhost:5000");

        let mut store = UserStore::default();
        store.token = "jwt".into();
        store.user_info = Some(UserInfo {
            username: "drawfan".into(),
            email: "a@example.com".into(),
        });
        store.update_storage_info(StorageInfo {
            usage_percentage: 40.0,
            remaining_space: 1024,
        });
        store.persist_to(&local).await.unwrap();
        assert!(dir.path().join("ai-image-generator-user.json").exists());

        let mut restored = UserStore::default();
        restored.restore_from(&backend, &local).await.unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.token(), "jwt");
        assert_eq!(restored.display_name(), "drawfan");
        assert_eq!(restored.storage_usage_percentage(), 40.0);
    }

    #[tokio::test]
    async fn restore_from_empty_storage_stays_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalStore::new(dir.path());
        let backend = BackendClient::new("http://localhost:5000");

        let mut store = UserStore::default();
        store.restore_from(&backend, &local).await.unwrap();
        assert!(!store.is_authenticated());
    }
}
