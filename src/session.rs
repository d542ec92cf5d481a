use crate::backend::GalleryApi;
use crate::error::ClientError;
use crate::gallery::GalleryStore;
use crate::gemini::GenerationApi;
use crate::generator::GeneratorStore;
use crate::models::{GenerateRequest, GenerationResult, SaveImageRequest};
use crate::persist::{self, LocalStore};
use crate::settings::SettingsStore;
use std::sync::Arc;
use tracing::{info, warn};

/// One user session: the three stores plus the two remote collaborators,
/// composed into the generate → display → persist workflow. `&mut self` on
/// [`generate`](StudioSession::generate) rules out a second in-flight
/// generation on the same session.
pub struct StudioSession {
    pub settings: SettingsStore,
    pub generator: GeneratorStore,
    pub gallery: GalleryStore,
    generation_api: Arc<dyn GenerationApi>,
    gallery_api: Arc<dyn GalleryApi>,
}

impl StudioSession {
    pub fn new(generation_api: Arc<dyn GenerationApi>, gallery_api: Arc<dyn GalleryApi>) -> Self {
        Self {
            settings: SettingsStore::default(),
            generator: GeneratorStore::default(),
            gallery: GalleryStore::default(),
            generation_api,
            gallery_api,
        }
    }

    /// Runs one end-to-end generation:
    /// checks the API settings, calls the generative API with the prompt and
    /// any reference images, publishes the decoded image optimistically as a
    /// data URL, then persists it to the gallery. A persistence failure
    /// leaves the optimistic result visible and unsaved (`image_id` empty)
    /// and is logged as a warning rather than failing the call.
    pub async fn generate(
        &mut self,
        request: GenerateRequest,
    ) -> Result<GenerationResult, ClientError> {
        let config = self.settings.api_config();
        if !config.is_configured() {
            return Err(ClientError::Configuration(
                "API settings are not configured".into(),
            ));
        }

        let model = if request.model.is_empty() {
            config.model.clone()
        } else {
            request.model.clone()
        };
        info!(prompt = %request.prompt, %model, "starting generation");
        self.generator.start(&request.prompt, &model);

        let payload = match self
            .generation_api
            .generate_content(&config, &request.prompt, &request.reference_images)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                self.generator.fail();
                return Err(e);
            }
        };

        let data_url = format!(
            "data:{};base64,{}",
            payload.image_mime_type, payload.image_base64
        );
        self.generator
            .publish_unsaved(data_url.clone(), payload.model_response.clone());

        let save_request = SaveImageRequest {
            image_data: data_url,
            prompt: request.prompt.clone(),
            model,
            elapsed_time: self.generator.current_result().elapsed_time.clone(),
            model_response: payload.model_response,
        };
        match self.gallery.save(self.gallery_api.as_ref(), &save_request).await {
            Ok(saved) => {
                self.generator.complete(&saved);
                info!(image_id = %saved.image_id, "generation persisted");
            }
            Err(e) => {
                // The image stays visible; only the save is lost.
                warn!("failed to persist generated image: {e}");
                self.generator.complete_without_save();
            }
        }

        Ok(self.generator.current_result().clone())
    }

    /// Replaces the gallery with the server's list.
    pub async fn load_gallery(&mut self, simple: bool) -> Result<(), ClientError> {
        self.gallery.load(self.gallery_api.as_ref(), simple).await
    }

    /// Deletes a gallery image; if it was the current result, the result
    /// keeps showing (unsaved from now on) but the selection is cleared.
    pub async fn remove_image(&mut self, image_id: &str) -> Result<(), ClientError> {
        self.gallery.remove(self.gallery_api.as_ref(), image_id).await
    }

    /// Adopts a gallery entry as the current result.
    pub fn select_gallery_image(&mut self, image_id: &str) -> Option<GenerationResult> {
        let item = self.gallery.select(image_id)?.clone();
        self.generator.set_from_gallery(&item);
        Some(self.generator.current_result().clone())
    }

    /// Hydrates settings, current result + stats, and the gallery expansion
    /// flag from local storage. Missing keys keep their defaults.
    pub async fn restore_from(&mut self, local: &LocalStore) -> Result<(), ClientError> {
        if let Some(settings) = local.load(persist::SETTINGS_KEY).await? {
            self.settings = settings;
        }
        if let Some(state) = local.load(persist::CURRENT_RESULT_KEY).await? {
            self.generator.restore(state);
        }
        if let Some(state) = local.load(persist::GALLERY_KEY).await? {
            self.gallery.restore(state);
        }
        Ok(())
    }

    /// Writes the persisted subsets back to local storage.
    pub async fn persist_to(&self, local: &LocalStore) -> Result<(), ClientError> {
        local.save(persist::SETTINGS_KEY, &self.settings).await?;
        local
            .save(persist::CURRENT_RESULT_KEY, &self.generator.persisted_state())
            .await?;
        local
            .save(persist::GALLERY_KEY, &self.gallery.persisted_state())
            .await?;
        Ok(())
    }
}
