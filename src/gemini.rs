use crate::error::ClientError;
use crate::models::{ApiConfig, UploadedImage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// Instruction prepended to every drawing prompt, matching what the product
/// sends upstream.
const PROMPT_PREFIX: &str = "请帮我画图：";

/// Parsed output of one generateContent call: at most one inline image plus
/// the concatenated text parts.
#[derive(Debug, Clone)]
pub struct GenerationPayload {
    pub image_base64: String,
    pub image_mime_type: String,
    pub model_response: String,
}

/// Seam over the generative-image API so the orchestrator can be exercised
/// against a double in tests.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    async fn generate_content(
        &self,
        config: &ApiConfig,
        prompt: &str,
        reference_images: &[UploadedImage],
    ) -> Result<GenerationPayload, ClientError>;
}

/// Client for the `{base_url}/v1beta/models/{model}:generateContent`
/// endpoint. Credentials come from the per-request [`ApiConfig`] snapshot,
/// never from the client itself.
pub struct GeminiClient {
    client: Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn build_request_body(prompt: &str, reference_images: &[UploadedImage]) -> serde_json::Value {
        let mut parts = vec![json!({ "text": format!("{PROMPT_PREFIX}{prompt}") })];
        for image in reference_images {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.base64,
                }
            }));
        }
        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"]
            }
        })
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationApi for GeminiClient {
    async fn generate_content(
        &self,
        config: &ApiConfig,
        prompt: &str,
        reference_images: &[UploadedImage],
    ) -> Result<GenerationPayload, ClientError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        info!(%url, images = reference_images.len(), "calling generative API");

        let body = Self::build_request_body(prompt, reference_images);
        if let Ok(mut logged) = serde_json::to_value(&body) {
            truncate_base64_in_json(&mut logged);
            info!("request body: {logged}");
        }

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(%status, "generative API error: {error_body}");
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message: extract_upstream_message(&error_body, status.as_u16()),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if let Ok(mut logged) = serde_json::from_str::<serde_json::Value>(&response_text) {
            truncate_base64_in_json(&mut logged);
            info!("response body: {logged}");
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ClientError::ResponseFormat(format!("parse error: {e}")))?;
        parse_generation_payload(&parsed)
    }
}

/// Pulls `error.message` out of an upstream JSON error body, falling back to
/// a status-coded generic message.
fn extract_upstream_message(body: &str, status: u16) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| format!("API request failed ({status})"))
}

/// Replaces long base64 `data` strings with a short preview so request and
/// response logs stay readable. The cut is taken on a character boundary;
/// upstream is free to put arbitrary UTF-8 in any string field.
fn truncate_base64_in_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 {
                            let prefix: String = s.chars().take(50).collect();
                            let dropped = s.chars().count().saturating_sub(50);
                            *val = serde_json::Value::String(format!(
                                "{prefix}...[truncated {dropped} chars]"
                            ));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

// --- Response parsing ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType", alias = "mime_type", default = "default_mime")]
    mime_type: String,
}

fn default_mime() -> String {
    "image/png".to_string()
}

/// Takes the first candidate's parts: at most one inline image, all text
/// parts space-joined and trimmed. No candidates or no image is a
/// `ResponseFormat` failure.
fn parse_generation_payload(resp: &GeminiResponse) -> Result<GenerationPayload, ClientError> {
    let candidate = resp
        .candidates
        .first()
        .ok_or_else(|| ClientError::ResponseFormat("no candidates in response".into()))?;

    let mut image: Option<(String, String)> = None;
    let mut texts: Vec<&str> = Vec::new();
    for part in &candidate.content.parts {
        match part {
            Part::Inline { inline_data } if image.is_none() => {
                image = Some((inline_data.data.clone(), inline_data.mime_type.clone()));
            }
            Part::Text { text } => texts.push(text),
            _ => {}
        }
    }

    let (image_base64, image_mime_type) =
        image.ok_or_else(|| ClientError::ResponseFormat("no image data in response".into()))?;
    Ok(GenerationPayload {
        image_base64,
        image_mime_type,
        model_response: texts.join(" ").trim().to_string(),
    })
}
