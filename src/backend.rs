use crate::error::ClientError;
use crate::models::{
    ApiResponse, AuthData, GalleryItem, ImageListData, SaveImageRequest, SavedImageData,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use tracing::{error, warn};

/// Seam over the image-persistence endpoints so stores and the orchestrator
/// can be exercised against a double in tests.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn list_images(&self, simple: bool) -> Result<Vec<GalleryItem>, ClientError>;
    async fn save_image(&self, request: &SaveImageRequest) -> Result<GalleryItem, ClientError>;
    async fn delete_image(&self, image_id: &str) -> Result<(), ClientError>;
}

/// Which error variant an endpoint's application-level failure maps to.
#[derive(Debug, Clone, Copy)]
enum ErrorDomain {
    Gallery,
    Auth,
}

impl ErrorDomain {
    fn wrap(self, message: String) -> ClientError {
        match self {
            ErrorDomain::Gallery => ClientError::Gallery(message),
            ErrorDomain::Auth => ClientError::Auth(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub code: String,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateImageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_response: Option<String>,
}

/// Payload of `GET /api/images/{id}`.
#[derive(Debug, Deserialize)]
struct ImageDetailData {
    image: GalleryItem,
}

/// Client for the backend REST API. Every response is wrapped in the
/// `{code, message, data}` envelope; `code == 200` is the only success
/// value. A bearer token, once set, is attached to every request.
pub struct BackendClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: RwLock::new(None),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().expect("token lock poisoned").as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and decodes the application envelope. Transport
    /// failures map to `Network`; 401 means the session expired (caller
    /// forces logout); 403 is a permission failure; any other non-2xx and
    /// any `code != 200` surface the server's message in the endpoint's
    /// error domain.
    async fn envelope<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        domain: ErrorDomain,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("backend returned 401, session expired");
            return Err(ClientError::Auth("session expired, please log in again".into()));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(ClientError::Auth("insufficient permissions".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "backend request failed: {body}");
            return Err(domain.wrap(format!("request failed ({status})")));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| domain.wrap(format!("invalid backend response: {e}")))?;
        if !envelope.is_ok() {
            return Err(domain.wrap(envelope.message));
        }
        Ok(envelope)
    }

    /// Envelope plus a mandatory `data` payload.
    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        domain: ErrorDomain,
    ) -> Result<T, ClientError> {
        let envelope = self.envelope(builder, domain).await?;
        envelope
            .data
            .ok_or_else(|| domain.wrap("backend response missing data".into()))
    }

    // --- Auth endpoints ---

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthData, ClientError> {
        let builder = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        self.execute(builder, ErrorDomain::Auth).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthData, ClientError> {
        let builder = self.client.post(self.url("/api/auth/register")).json(request);
        self.execute(builder, ErrorDomain::Auth).await
    }

    /// Requests a verification code for registration (`send_type` 1).
    pub async fn send_verification_code(&self, email: &str) -> Result<(), ClientError> {
        let builder = self
            .client
            .post(self.url("/api/auth/send-code"))
            .json(&json!({ "email": email, "send_type": 1 }));
        // Success carries no data.
        self.envelope::<serde_json::Value>(builder, ErrorDomain::Auth)
            .await?;
        Ok(())
    }

    // --- Image endpoints beyond the GalleryApi seam ---

    pub async fn get_image(&self, image_id: &str) -> Result<GalleryItem, ClientError> {
        let builder = self.client.get(self.url(&format!("/api/images/{image_id}")));
        let data: ImageDetailData = self.execute(builder, ErrorDomain::Gallery).await?;
        Ok(data.image)
    }

    pub async fn update_image(
        &self,
        image_id: &str,
        request: &UpdateImageRequest,
    ) -> Result<GalleryItem, ClientError> {
        let builder = self
            .client
            .put(self.url(&format!("/api/images/{image_id}")))
            .json(request);
        let data: ImageDetailData = self.execute(builder, ErrorDomain::Gallery).await?;
        Ok(data.image)
    }
}

#[async_trait]
impl GalleryApi for BackendClient {
    async fn list_images(&self, simple: bool) -> Result<Vec<GalleryItem>, ClientError> {
        let builder = self
            .client
            .get(self.url("/api/images/list"))
            .query(&[("simple", simple)]);
        let data: ImageListData = self.execute(builder, ErrorDomain::Gallery).await?;
        Ok(data.images)
    }

    async fn save_image(&self, request: &SaveImageRequest) -> Result<GalleryItem, ClientError> {
        let builder = self.client.post(self.url("/api/images/add")).json(request);
        let data: SavedImageData = self.execute(builder, ErrorDomain::Gallery).await?;
        Ok(data.image)
    }

    async fn delete_image(&self, image_id: &str) -> Result<(), ClientError> {
        let builder = self
            .client
            .delete(self.url(&format!("/api/images/{image_id}")));
        self.envelope::<serde_json::Value>(builder, ErrorDomain::Gallery)
            .await?;
        Ok(())
    }
}
