use crate::backend::GalleryApi;
use crate::error::ClientError;
use crate::models::{GalleryItem, SaveImageRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_MAX_COUNT: usize = 20;

/// Server-persisted gallery mirror: an ordered, capacity-bounded,
/// newest-first list. Local state only changes after the backend confirms,
/// so a failed call leaves the collection untouched.
#[derive(Debug)]
pub struct GalleryStore {
    images: Vec<GalleryItem>,
    selected: Option<String>,
    loading: bool,
    expanded: bool,
    max_count: usize,
}

impl Default for GalleryStore {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            selected: None,
            loading: false,
            expanded: true,
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}

/// Only the expansion flag survives restarts; the list itself is reloaded
/// from the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedGalleryState {
    pub expanded: bool,
}

impl GalleryStore {
    pub fn with_capacity_limit(max_count: usize) -> Self {
        Self {
            max_count,
            ..Self::default()
        }
    }

    pub fn images(&self) -> &[GalleryItem] {
        &self.images
    }

    pub fn count(&self) -> usize {
        self.images.len()
    }

    pub fn is_full(&self) -> bool {
        self.images.len() >= self.max_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Newest entry, relying on the server's newest-first ordering.
    pub fn latest(&self) -> Option<&GalleryItem> {
        self.images.first()
    }

    pub fn selected(&self) -> Option<&GalleryItem> {
        let id = self.selected.as_deref()?;
        self.images.iter().find(|img| img.image_id == id)
    }

    /// Replaces the whole collection with the server's response. No merge;
    /// the server already orders newest-first.
    pub async fn load(&mut self, api: &dyn GalleryApi, simple: bool) -> Result<(), ClientError> {
        self.loading = true;
        let result = api.list_images(simple).await;
        self.loading = false;
        let images = result?;
        info!(count = images.len(), "gallery list loaded");
        self.images = images;
        Ok(())
    }

    pub async fn refresh(&mut self, api: &dyn GalleryApi) -> Result<(), ClientError> {
        self.load(api, true).await
    }

    /// Sends a create request; on confirmation prepends the canonical item
    /// and evicts the oldest entry past capacity.
    pub async fn save(
        &mut self,
        api: &dyn GalleryApi,
        request: &SaveImageRequest,
    ) -> Result<GalleryItem, ClientError> {
        let saved = api.save_image(request).await?;
        info!(image_id = %saved.image_id, "image saved to gallery");
        self.images.insert(0, saved.clone());
        if self.images.len() > self.max_count {
            self.images.pop();
        }
        Ok(saved)
    }

    /// Sends a delete request; on confirmation removes the matching item and
    /// clears the selection if it pointed at it. A confirmed delete of an id
    /// the local list never held leaves the collection unchanged.
    pub async fn remove(&mut self, api: &dyn GalleryApi, image_id: &str) -> Result<(), ClientError> {
        api.delete_image(image_id).await?;
        if let Some(index) = self.images.iter().position(|img| img.image_id == image_id) {
            self.images.remove(index);
            info!(%image_id, "image removed from gallery");
        }
        if self.selected.as_deref() == Some(image_id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn select(&mut self, image_id: &str) -> Option<&GalleryItem> {
        if self.images.iter().any(|img| img.image_id == image_id) {
            self.selected = Some(image_id.to_string());
            self.images.iter().find(|img| img.image_id == image_id)
        } else {
            None
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn clear_all(&mut self) {
        self.images.clear();
        self.selected = None;
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    pub fn persisted_state(&self) -> PersistedGalleryState {
        PersistedGalleryState {
            expanded: self.expanded,
        }
    }

    pub fn restore(&mut self, state: PersistedGalleryState) {
        self.expanded = state.expanded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(id: &str) -> GalleryItem {
        GalleryItem {
            image_id: id.to_string(),
            image_url: format!("https://oss.example.com/{id}.png"),
            prompt: format!("prompt {id}"),
            model: "model-x".into(),
            elapsed_time: "1.0".into(),
            created_at: Utc::now(),
            model_response: String::new(),
        }
    }

    fn save_request(prompt: &str) -> SaveImageRequest {
        SaveImageRequest {
            image_data: "data:image/png;base64,AAAA".into(),
            prompt: prompt.into(),
            model: "model-x".into(),
            elapsed_time: "1.0".into(),
            model_response: String::new(),
        }
    }

    /// Backend double that answers from canned data and counts saves.
    struct FakeBackend {
        listing: Vec<GalleryItem>,
        fail_with: Option<String>,
        saves: AtomicUsize,
    }

    impl FakeBackend {
        fn new(listing: Vec<GalleryItem>) -> Self {
            Self {
                listing,
                fail_with: None,
                saves: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                listing: Vec::new(),
                fail_with: Some(message.to_string()),
                saves: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GalleryApi for FakeBackend {
        async fn list_images(&self, _simple: bool) -> Result<Vec<GalleryItem>, ClientError> {
            if let Some(msg) = &self.fail_with {
                return Err(ClientError::Gallery(msg.clone()));
            }
            Ok(self.listing.clone())
        }

        async fn save_image(&self, request: &SaveImageRequest) -> Result<GalleryItem, ClientError> {
            if let Some(msg) = &self.fail_with {
                return Err(ClientError::Gallery(msg.clone()));
            }
            let n = self.saves.fetch_add(1, Ordering::SeqCst);
            let mut saved = item(&format!("srv_{n}"));
            saved.prompt = request.prompt.clone();
            Ok(saved)
        }

        async fn delete_image(&self, _image_id: &str) -> Result<(), ClientError> {
            if let Some(msg) = &self.fail_with {
                return Err(ClientError::Gallery(msg.clone()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_replaces_collection_wholesale() {
        let backend = FakeBackend::new(vec![item("a"), item("b")]);
        let mut store = GalleryStore::default();
        store.images.push(item("stale"));

        store.load(&backend, true).await.unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.images()[0].image_id, "a");
    }

    #[tokio::test]
    async fn load_twice_is_idempotent() {
        let backend = FakeBackend::new(vec![item("a"), item("b")]);
        let mut store = GalleryStore::default();
        store.load(&backend, true).await.unwrap();
        let first: Vec<_> = store.images().to_vec();
        store.load(&backend, true).await.unwrap();
        assert_eq!(store.images(), first.as_slice());
    }

    #[tokio::test]
    async fn save_prepends_canonical_item() {
        let backend = FakeBackend::new(Vec::new());
        let mut store = GalleryStore::default();
        store.images.push(item("old"));

        let saved = store.save(&backend, &save_request("a cat")).await.unwrap();
        assert_eq!(store.images()[0], saved);
        assert_eq!(saved.prompt, "a cat");
    }

    #[tokio::test]
    async fn capacity_invariant_holds_for_any_save_sequence() {
        let backend = FakeBackend::new(Vec::new());
        let mut store = GalleryStore::with_capacity_limit(5);
        for i in 0..12 {
            store
                .save(&backend, &save_request(&format!("prompt {i}")))
                .await
                .unwrap();
            assert!(store.count() <= 5);
        }
        assert_eq!(store.count(), 5);
        // Oldest entries were evicted from the tail.
        assert_eq!(store.images()[0].prompt, "prompt 11");
        assert_eq!(store.images()[4].prompt, "prompt 7");
    }

    #[tokio::test]
    async fn remove_unknown_id_leaves_collection_unchanged() {
        let backend = FakeBackend::new(Vec::new());
        let mut store = GalleryStore::default();
        store.images.push(item("a"));

        store.remove(&backend, "missing").await.unwrap();
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn remove_clears_matching_selection() {
        let backend = FakeBackend::new(Vec::new());
        let mut store = GalleryStore::default();
        store.images.push(item("a"));
        store.select("a").unwrap();

        store.remove(&backend, "a").await.unwrap();
        assert!(store.selected().is_none());
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn failed_operations_leave_local_state_unchanged() {
        let backend = FakeBackend::failing("quota exceeded");
        let mut store = GalleryStore::default();
        store.images.push(item("a"));

        assert!(store.load(&backend, true).await.is_err());
        assert!(store.save(&backend, &save_request("x")).await.is_err());
        assert!(store.remove(&backend, "a").await.is_err());
        assert_eq!(store.count(), 1);
        assert!(!store.is_loading());
    }

    #[test]
    fn selecting_unknown_id_returns_none() {
        let mut store = GalleryStore::default();
        store.images.push(item("a"));
        assert!(store.select("b").is_none());
        assert!(store.selected().is_none());
    }

    #[test]
    fn expansion_flag_round_trips() {
        let mut store = GalleryStore::default();
        store.toggle_expanded();
        let snapshot = store.persisted_state();
        let mut fresh = GalleryStore::default();
        fresh.restore(snapshot);
        assert!(!fresh.is_expanded());
    }
}
