use crate::error::ClientError;
use crate::models::{GalleryItem, GenerationResult, GenerationStats, UploadedImage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::codec::MAX_UPLOAD_BYTES;

/// In-flight state of the drawing surface: the busy flag, the single current
/// result, running counters, and reference images held for the next request.
#[derive(Debug, Default)]
pub struct GeneratorStore {
    loading: bool,
    current_result: GenerationResult,
    stats: GenerationStats,
    uploaded_images: Vec<UploadedImage>,
    start_instant: Option<Instant>,
}

/// The fields persisted between sessions (current result + stats).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedGeneratorState {
    pub current_result: GenerationResult,
    pub stats: GenerationStats,
}

impl GeneratorStore {
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_result(&self) -> &GenerationResult {
        &self.current_result
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn has_result(&self) -> bool {
        !self.current_result.image_url.is_empty()
    }

    pub fn can_generate(&self, prompt: &str) -> bool {
        !self.loading && !prompt.trim().is_empty()
    }

    /// Marks the store busy, clears the previous result, stamps the start
    /// time, and counts the attempt.
    pub fn start(&mut self, prompt: &str, model: &str) {
        self.loading = true;
        self.clear_current_result();
        self.start_instant = Some(Instant::now());
        self.current_result.prompt = prompt.to_string();
        self.current_result.model = model.to_string();
        self.stats.total_generations += 1;
    }

    /// Seconds since `start`, 0 when no generation is in flight.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_instant
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Formatted elapsed time, one decimal place, matching the backend's
    /// `elapsed_time` convention.
    pub fn elapsed_time_string(&self) -> String {
        format!("{:.1}", self.elapsed_secs())
    }

    /// Publishes an optimistic result before persistence confirms. The busy
    /// flag stays on; the persistence outcome decides which counter moves.
    pub fn publish_unsaved(&mut self, image_url: String, model_response: String) {
        self.current_result.image_url = image_url;
        self.current_result.model_response = model_response;
        self.current_result.elapsed_time = self.elapsed_time_string();
        self.current_result.timestamp = Some(Utc::now());
        self.current_result.image_id.clear();
    }

    /// Overwrites the current result with the backend's canonical fields
    /// after a confirmed save, and closes out the attempt as a success.
    pub fn complete(&mut self, saved: &GalleryItem) {
        let elapsed = self.elapsed_secs();
        self.current_result.image_url = saved.image_url.clone();
        self.current_result.image_id = saved.image_id.clone();
        if !saved.elapsed_time.is_empty() {
            self.current_result.elapsed_time = saved.elapsed_time.clone();
        } else {
            self.current_result.elapsed_time = self.elapsed_time_string();
        }
        self.current_result.timestamp = Some(saved.created_at);
        self.current_result.model_response = saved.model_response.clone();
        self.stats.success_count += 1;
        self.stats.total_time_secs += elapsed;
        self.loading = false;
    }

    /// Closes out the attempt as a success whose save did not go through.
    /// The optimistic result stays visible with an empty `image_id`.
    pub fn complete_without_save(&mut self) {
        self.stats.success_count += 1;
        self.stats.total_time_secs += self.elapsed_secs();
        self.loading = false;
    }

    /// Closes out the attempt as a failure.
    pub fn fail(&mut self) {
        self.loading = false;
        self.stats.failure_count += 1;
    }

    pub fn clear_current_result(&mut self) {
        self.current_result = GenerationResult::default();
    }

    /// Adopts a gallery entry as the current result (user picked it).
    pub fn set_from_gallery(&mut self, item: &GalleryItem) {
        self.current_result = GenerationResult {
            image_url: item.image_url.clone(),
            prompt: item.prompt.clone(),
            model: item.model.clone(),
            elapsed_time: item.elapsed_time.clone(),
            timestamp: Some(item.created_at),
            model_response: item.model_response.clone(),
            image_id: item.image_id.clone(),
        };
    }

    pub fn uploaded_images(&self) -> &[UploadedImage] {
        &self.uploaded_images
    }

    /// Accepts a reference image after validating type and size.
    pub fn add_uploaded_image(&mut self, image: UploadedImage) -> Result<(), ClientError> {
        if !image.mime_type.starts_with("image/") {
            return Err(ClientError::Codec(format!(
                "\"{}\" is not a valid image file",
                image.name
            )));
        }
        if image.size_bytes > MAX_UPLOAD_BYTES {
            return Err(ClientError::Codec(format!(
                "image \"{}\" exceeds the 10MB upload limit",
                image.name
            )));
        }
        self.uploaded_images.push(image);
        Ok(())
    }

    pub fn remove_uploaded_image(&mut self, index: usize) {
        if index < self.uploaded_images.len() {
            self.uploaded_images.remove(index);
        } else {
            warn!(index, "ignoring removal of out-of-range uploaded image");
        }
    }

    pub fn clear_uploaded_images(&mut self) {
        self.uploaded_images.clear();
    }

    /// Takes the uploaded images for one request, leaving the store empty.
    pub fn take_uploaded_images(&mut self) -> Vec<UploadedImage> {
        std::mem::take(&mut self.uploaded_images)
    }

    pub fn reset_stats(&mut self) {
        self.stats = GenerationStats::default();
    }

    pub fn persisted_state(&self) -> PersistedGeneratorState {
        PersistedGeneratorState {
            current_result: self.current_result.clone(),
            stats: self.stats.clone(),
        }
    }

    pub fn restore(&mut self, state: PersistedGeneratorState) {
        self.current_result = state.current_result;
        self.stats = state.stats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn item(id: &str) -> GalleryItem {
        GalleryItem {
            image_id: id.to_string(),
            image_url: format!("https://oss.example.com/{id}.png"),
            prompt: "a cat".into(),
            model: "model-x".into(),
            elapsed_time: "2.5".into(),
            created_at: Utc::now(),
            model_response: "done".into(),
        }
    }

    fn upload(name: &str, mime: &str, size: u64) -> UploadedImage {
        UploadedImage {
            id: Uuid::new_v4(),
            name: name.into(),
            base64: String::new(),
            mime_type: mime.into(),
            data_url: String::new(),
            size_bytes: size,
        }
    }

    #[test]
    fn start_clears_result_and_counts_attempt() {
        let mut store = GeneratorStore::default();
        store.start("a cat", "model-x");
        assert!(store.is_loading());
        assert_eq!(store.stats().total_generations, 1);
        assert_eq!(store.current_result().prompt, "a cat");
        assert_eq!(store.current_result().image_url, "");
    }

    #[test]
    fn optimistic_publish_keeps_image_id_empty() {
        let mut store = GeneratorStore::default();
        store.start("a cat", "model-x");
        store.publish_unsaved("data:image/png;base64,AAAA".into(), "done".into());
        assert!(store.has_result());
        assert!(!store.current_result().is_persisted());
        assert!(store.is_loading());
    }

    #[test]
    fn complete_adopts_canonical_fields() {
        let mut store = GeneratorStore::default();
        store.start("a cat", "model-x");
        store.publish_unsaved("data:image/png;base64,AAAA".into(), "done".into());
        store.complete(&item("img_7"));
        let result = store.current_result();
        assert_eq!(result.image_id, "img_7");
        assert_eq!(result.image_url, "https://oss.example.com/img_7.png");
        assert_eq!(result.elapsed_time, "2.5");
        assert!(!store.is_loading());
        assert_eq!(store.stats().success_count, 1);
    }

    #[test]
    fn fail_increments_failure_counter_only() {
        let mut store = GeneratorStore::default();
        store.start("a cat", "model-x");
        store.fail();
        assert!(!store.is_loading());
        assert_eq!(store.stats().failure_count, 1);
        assert_eq!(store.stats().success_count, 0);
    }

    #[test]
    fn can_generate_requires_idle_and_nonblank_prompt() {
        let mut store = GeneratorStore::default();
        assert!(store.can_generate("a cat"));
        assert!(!store.can_generate("   "));
        store.start("a cat", "model-x");
        assert!(!store.can_generate("a cat"));
    }

    #[test]
    fn upload_validation_rejects_type_and_size() {
        let mut store = GeneratorStore::default();
        assert!(store.add_uploaded_image(upload("notes.txt", "text/plain", 10)).is_err());
        assert!(store
            .add_uploaded_image(upload("big.png", "image/png", MAX_UPLOAD_BYTES + 1))
            .is_err());
        assert!(store.add_uploaded_image(upload("ok.png", "image/png", 1024)).is_ok());
        assert_eq!(store.uploaded_images().len(), 1);
    }

    #[test]
    fn out_of_range_removal_is_ignored() {
        let mut store = GeneratorStore::default();
        store.remove_uploaded_image(3);
        assert!(store.uploaded_images().is_empty());
    }

    #[test]
    fn persisted_state_round_trips() {
        let mut store = GeneratorStore::default();
        store.start("a cat", "model-x");
        store.publish_unsaved("data:image/png;base64,AAAA".into(), "done".into());
        store.complete(&item("img_1"));

        let snapshot = store.persisted_state();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: PersistedGeneratorState = serde_json::from_str(&json).unwrap();

        let mut fresh = GeneratorStore::default();
        fresh.restore(restored);
        assert_eq!(fresh.current_result().image_id, "img_1");
        assert_eq!(fresh.stats().success_count, 1);
    }
}
