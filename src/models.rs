use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of the API settings read at the start of each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ApiConfig {
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}

/// Parameters for one generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub reference_images: Vec<UploadedImage>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            reference_images: Vec::new(),
        }
    }
}

/// The single "current" drawing result. Empty strings mean unset;
/// `image_id` is non-empty only after the backend confirmed the save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResult {
    pub image_url: String,
    pub prompt: String,
    pub model: String,
    pub elapsed_time: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub model_response: String,
    pub image_id: String,
}

impl GenerationResult {
    pub fn is_persisted(&self) -> bool {
        !self.image_id.is_empty()
    }
}

/// One server-persisted gallery entry, in backend wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryItem {
    pub image_id: String,
    pub image_url: String,
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub elapsed_time: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub model_response: String,
}

/// A reference image selected by the user, held only for the duration of
/// one generation request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub id: Uuid,
    pub name: String,
    pub base64: String,
    pub mime_type: String,
    pub data_url: String,
    pub size_bytes: u64,
}

/// Running counters across a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationStats {
    pub total_generations: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_time_secs: f64,
}

impl GenerationStats {
    /// Success rate in percent.
    pub fn success_rate(&self) -> f64 {
        if self.total_generations == 0 {
            return 0.0;
        }
        self.success_count as f64 / self.total_generations as f64 * 100.0
    }

    /// Mean elapsed seconds over successful generations.
    pub fn average_time(&self) -> f64 {
        if self.success_count == 0 {
            return 0.0;
        }
        self.total_time_secs / self.success_count as f64
    }
}

/// Envelope every backend response is wrapped in. `code == 200` is the only
/// success value; anything else is an application-level failure carrying
/// `message`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// Payload of `GET /api/images/list`.
#[derive(Debug, Deserialize)]
pub struct ImageListData {
    #[serde(default)]
    pub images: Vec<GalleryItem>,
}

/// Payload of `POST /api/images/add`.
#[derive(Debug, Deserialize)]
pub struct SavedImageData {
    pub image: GalleryItem,
}

/// Body of `POST /api/images/add`.
#[derive(Debug, Serialize)]
pub struct SaveImageRequest {
    pub image_data: String,
    pub prompt: String,
    pub model: String,
    pub elapsed_time: String,
    pub model_response: String,
}

/// Account info returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    #[serde(default)]
    pub username: String,
    pub email: String,
}

/// Server-side storage quota for the logged-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageInfo {
    #[serde(default)]
    pub usage_percentage: f64,
    #[serde(default)]
    pub remaining_space: u64,
}

/// Payload of the login/register endpoints.
#[derive(Debug, Deserialize)]
pub struct AuthData {
    pub user: UserInfo,
    pub access_token: String,
}
