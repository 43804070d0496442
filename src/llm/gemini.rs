use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::media::encode_data_url;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_generation_timing;

const GEMINI_RETRY_BASE_DELAY_MS: u64 = 900;
const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub base_url: String,
    pub api_key: String,
    pub image_model: String,
    pub image_fallback_model: String,
    pub text_model: String,
    pub temperature: f32,
    pub max_output_tokens: i32,
    pub request_timeout: Duration,
    pub max_retry_attempts: usize,
    pub retry_base_delay: Duration,
}

impl GeminiSettings {
    pub fn from_config(config: &Config) -> Self {
        GeminiSettings {
            base_url: config.gemini_base_url.clone(),
            api_key: config.gemini_api_key.clone(),
            image_model: config.gemini_image_model.clone(),
            image_fallback_model: config.gemini_image_fallback_model.clone(),
            text_model: config.gemini_text_model.clone(),
            temperature: config.gemini_temperature,
            max_output_tokens: config.gemini_max_output_tokens,
            request_timeout: Duration::from_secs(config.gemini_request_timeout_seconds),
            max_retry_attempts: config.gemini_max_retry_attempts,
            retry_base_delay: Duration::from_millis(GEMINI_RETRY_BASE_DELAY_MS),
        }
    }
}

/// Thin client over Gemini `generateContent` for the two calls a card needs.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    settings: GeminiSettings,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn gemini_should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn gemini_should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let prompts: Vec<Value> = contents
            .iter()
            .filter_map(|content| content.get("parts").and_then(|parts| parts.as_array()))
            .flatten()
            .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
            .map(|text| json!(truncate_for_log(text, 200)))
            .collect();
        summary.insert("prompts".to_string(), Value::Array(prompts));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut other_parts = 0usize;
    let mut text_preview = None;

    let candidates = response.candidates.as_deref().unwrap_or(&[]);
    for candidate in candidates {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                GeminiPart::InlineData { .. } => image_parts += 1,
                GeminiPart::Other(_) => other_parts += 1,
            }
        }
    }

    json!({
        "candidates": candidates.len(),
        "textParts": text_parts,
        "inlineParts": image_parts,
        "otherParts": other_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

/// Parts of the first candidate only; later candidates are never consulted.
fn first_candidate_parts(response: GeminiResponse) -> Vec<GeminiPart> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
}

fn extract_image_data_url(response: GeminiResponse) -> Option<String> {
    first_candidate_parts(response)
        .into_iter()
        .find_map(|part| match part {
            GeminiPart::InlineData { inline_data } if !inline_data.data.is_empty() => {
                let mime_type = inline_data
                    .mime_type
                    .filter(|mime| !mime.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                Some(encode_data_url(&mime_type, &inline_data.data))
            }
            _ => None,
        })
}

/// Text of the first part only; a note that does not lead the reply is
/// treated as missing.
fn extract_first_text(response: GeminiResponse) -> Option<String> {
    match first_candidate_parts(response).into_iter().next()? {
        GeminiPart::Text { text } if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}

impl GeminiClient {
    pub fn new(client: Client, settings: GeminiSettings) -> Self {
        GeminiClient { client, settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(get_http_client().clone(), GeminiSettings::from_config(config))
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn redact_api_key(&self, text: &str) -> String {
        let key = self.settings.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    fn retry_delay(&self, attempt: usize) -> Duration {
        let attempt = attempt.max(1) as u32;
        self.settings.retry_base_delay.saturating_mul(attempt)
    }

    async fn call_gemini_api(&self, model: &str, payload: &Value) -> Result<GeminiResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let max_attempts = self.settings.max_retry_attempts.max(1);
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = match self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.settings.api_key)
                .timeout(self.settings.request_timeout)
                .json(payload)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    let err_text = self.redact_api_key(&err.to_string());
                    let should_retry = gemini_should_retry_error(&err) && attempt < max_attempts;
                    warn!(
                        "Gemini request failed to send: {} (model={}, timeout={}, connect={}, retrying={})",
                        err_text,
                        model,
                        err.is_timeout(),
                        err.is_connect(),
                        should_retry
                    );
                    if should_retry {
                        tokio::time::sleep(self.retry_delay(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("Gemini request failed: {}", err_text));
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let (message, body_summary) = summarize_error_body(&body);
                let should_retry = gemini_should_retry_status(status) && attempt < max_attempts;
                warn!(
                    "Gemini API error: model={}, status={}, body={}, retrying={}",
                    model,
                    status,
                    self.redact_api_key(&body_summary),
                    should_retry
                );
                if should_retry {
                    tokio::time::sleep(self.retry_delay(attempt)).await;
                    continue;
                }
                let detail = self.redact_api_key(&message.unwrap_or(body_summary));
                return Err(anyhow!(
                    "Gemini request failed with status {}: {}",
                    status,
                    detail
                ));
            }

            let value = response.json::<GeminiResponse>().await.map_err(|err| {
                anyhow!(
                    "Gemini response was not valid JSON: {}",
                    self.redact_api_key(&err.to_string())
                )
            })?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                let response_summary = summarize_gemini_response(&value);
                debug!(target: "llm.gemini", model = model, response = %response_summary);
            }
            return Ok(value);
        }
    }

    /// Asks `model` for artwork and returns the first inline image as a data
    /// URL. `Ok(None)` means the model answered without an image.
    pub async fn generate_image(&self, model: &str, prompt: &str) -> Result<Option<String>> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"]
            },
        });

        log_generation_timing("gemini", model, "generate_image", None, || async {
            let response = self.call_gemini_api(model, &payload).await?;
            Ok(extract_image_data_url(response))
        })
        .await
    }

    /// Raw text of the first text part of the first candidate.
    pub async fn generate_text(&self, prompt: &str) -> Result<Option<String>> {
        let model = self.settings.text_model.as_str();
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "maxOutputTokens": self.settings.max_output_tokens,
            },
        });

        let metadata = json!({ "temperature": self.settings.temperature });
        log_generation_timing("gemini", model, "generate_text", Some(metadata), || async {
            let response = self.call_gemini_api(model, &payload).await?;
            Ok(extract_first_text(response))
        })
        .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn test_settings(base_url: &str) -> GeminiSettings {
        GeminiSettings {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            image_model: "image-primary".to_string(),
            image_fallback_model: "image-alternate".to_string(),
            text_model: "text-model".to_string(),
            temperature: 0.7,
            max_output_tokens: 200,
            request_timeout: Duration::from_secs(5),
            max_retry_attempts: 1,
            retry_base_delay: Duration::from_millis(10),
        }
    }

    pub(crate) fn image_body(mime: &str, data: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your image." },
                    { "inlineData": { "mimeType": mime, "data": data } }
                ]}
            }]
        })
    }

    pub(crate) fn text_body(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    #[test]
    fn extracts_first_inline_image_as_data_url() {
        let response: GeminiResponse =
            serde_json::from_value(image_body("image/jpeg", "QUJD")).unwrap();
        assert_eq!(
            extract_image_data_url(response).as_deref(),
            Some("data:image/jpeg;base64,QUJD")
        );
    }

    #[test]
    fn missing_mime_type_defaults_to_png() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": { "data": "QUJD" } }] } }]
        }))
        .unwrap();
        assert_eq!(
            extract_image_data_url(response).as_deref(),
            Some("data:image/png;base64,QUJD")
        );
    }

    #[test]
    fn empty_or_partless_responses_have_no_image() {
        for body in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{ "content": {} }] }),
            text_body("no picture today"),
        ] {
            let response: GeminiResponse = serde_json::from_value(body).unwrap();
            assert!(extract_image_data_url(response).is_none());
        }
    }

    #[test]
    fn unknown_part_shapes_do_not_break_parsing() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "First line." },
                { "functionCall": { "name": "noop" } }
            ]}}]
        }))
        .unwrap();
        assert_eq!(extract_first_text(response).as_deref(), Some("First line."));
    }

    #[test]
    fn text_is_read_from_the_first_part_only() {
        for parts in [
            json!([{ "functionCall": { "name": "noop" } }, { "text": "Later line." }]),
            json!([{ "text": "  " }, { "text": "Later line." }]),
            json!([]),
        ] {
            let response: GeminiResponse = serde_json::from_value(json!({
                "candidates": [{ "content": { "parts": parts } }]
            }))
            .unwrap();
            assert!(extract_first_text(response).is_none());
        }
    }

    #[test]
    fn error_body_summary_prefers_api_message() {
        let (message, _) =
            summarize_error_body(r#"{"error":{"code":400,"message":"API key not valid"}}"#);
        assert_eq!(message.as_deref(), Some("API key not valid"));
        let (message, summary) = summarize_error_body("  ");
        assert!(message.is_none());
        assert_eq!(summary, "empty response body");
    }

    #[tokio::test]
    async fn image_request_sends_key_header_and_modalities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/image-primary:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_body("image/png", "QUJD")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(Client::new(), test_settings(&server.uri()));
        let image = client.generate_image("image-primary", "prompt").await.unwrap();
        assert_eq!(image.as_deref(), Some("data:image/png;base64,QUJD"));
    }

    #[tokio::test]
    async fn text_request_carries_sampling_bounds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-model:generateContent"))
            .and(body_partial_json(json!({
                "generationConfig": { "maxOutputTokens": 200 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_body("A quiet note.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(Client::new(), test_settings(&server.uri()));
        let text = client.generate_text("prompt").await.unwrap();
        assert_eq!(text.as_deref(), Some("A quiet note."));
    }

    #[tokio::test]
    async fn server_errors_are_retried_up_to_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let mut settings = test_settings(&server.uri());
        settings.max_retry_attempts = 3;
        let client = GeminiClient::new(Client::new(), settings);
        let err = client.generate_text("prompt").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried_and_key_is_redacted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":{"message":"bad key test-key"}}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = test_settings(&server.uri());
        settings.max_retry_attempts = 3;
        let client = GeminiClient::new(Client::new(), settings);
        let err = client.generate_text("prompt").await.unwrap_err().to_string();
        assert!(err.contains("[redacted]"));
        assert!(!err.contains("test-key"));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(Client::new(), test_settings(&server.uri()));
        assert!(client.generate_image("image-primary", "prompt").await.is_err());
    }
}
