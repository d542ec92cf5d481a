use crate::error::ClientError;
use crate::settings::SettingsStore;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// System prompt steering the chat model toward drawing-prompt translation.
const SYSTEM_PROMPT: &str =
    "你是一个英文绘图提示词翻译助手，擅长将用户的文字翻译为精准的英文，以便于绘制描述精准的图像";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Translates a prompt to English through the OpenAI-compatible
/// `/v1/chat/completions` endpoint, using the same credentials as image
/// generation and the configured translation model.
pub async fn translate_to_english(
    client: &Client,
    settings: &SettingsStore,
    text: &str,
) -> Result<String, ClientError> {
    if !settings.is_configured() {
        return Err(ClientError::Configuration(
            "API settings are not configured".into(),
        ));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(ClientError::Configuration(
            "nothing to translate".into(),
        ));
    }

    let url = format!(
        "{}/v1/chat/completions",
        settings.base_url.trim_end_matches('/')
    );
    let body = json!({
        "model": settings.translation_model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": text }
        ]
    });

    info!(model = %settings.translation_model, "translating prompt");
    let response = client
        .post(&url)
        .bearer_auth(&settings.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Upstream {
            status: status.as_u16(),
            message: extract_message(&body, status.as_u16()),
        });
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| ClientError::ResponseFormat(format!("parse error: {e}")))?;
    let translated = parsed
        .choices
        .first()
        .map(|c| c.message.content.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ClientError::ResponseFormat("no translation in response".into()))?;
    Ok(translated)
}

fn extract_message(body: &str, status: u16) -> String {
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
        .unwrap_or_else(|_| format!("translation request failed ({status})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn blank_input_is_rejected_before_any_network_call() {
        let settings = SettingsStore {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        let err = translate_to_english(&Client::new(), &settings, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[tokio::test]
    async fn unconfigured_settings_are_rejected() {
        let settings = SettingsStore::default();
        let err = translate_to_english(&Client::new(), &settings, "一只猫")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn chat_response_takes_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":" a cat "}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.trim(), "a cat");
    }
}
