pub mod backend;
pub mod codec;
pub mod error;
pub mod gallery;
pub mod gemini;
pub mod generator;
pub mod models;
pub mod persist;
pub mod session;
pub mod settings;
pub mod system;
pub mod translate;
pub mod user;

pub use backend::{BackendClient, GalleryApi};
pub use error::ClientError;
pub use gallery::GalleryStore;
pub use gemini::{GeminiClient, GenerationApi, GenerationPayload};
pub use generator::GeneratorStore;
pub use models::{
    ApiConfig, GalleryItem, GenerateRequest, GenerationResult, GenerationStats, UploadedImage,
};
pub use persist::LocalStore;
pub use session::StudioSession;
pub use settings::SettingsStore;
pub use user::UserStore;
