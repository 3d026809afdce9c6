use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::backend::geolocation::Coordinates;
use crate::config::GeminiConfig;
use crate::error::ContentError;

/// One prompt to the generative API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// JSON schema; when set the reply is constrained to JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Ground the reply in map places around this point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_location: Option<Coordinates>,
}

impl GenerationRequest {
    pub fn text(model: &str, prompt: impl Into<String>) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.into(),
            response_schema: None,
            maps_location: None,
        }
    }

    pub fn json(model: &str, prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            response_schema: Some(schema),
            ..Self::text(model, prompt)
        }
    }

    pub fn grounded(model: &str, prompt: impl Into<String>, at: Coordinates) -> Self {
        Self {
            maps_location: Some(at),
            ..Self::text(model, prompt)
        }
    }
}

/// A place the model cited from map search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceReference {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    #[serde(default)]
    pub places: Vec<PlaceReference>,
}

/// Anything that can answer a generation request.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ContentError>;
}

/// Minimal Gemini client over the `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    max_attempts: u32,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, ContentError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// Pause before the next attempt: 100ms * 2^attempt.
pub fn backoff_delay(attempt: u32) -> StdDuration {
    StdDuration::from_millis(100u64 * 2u64.pow(attempt))
}

/// Rate limits and server errors may clear up; anything else will not.
pub fn is_retryable(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Worst-case wall time for one `generate` call: every attempt timing out
/// plus the backoff between them.
pub fn retry_budget(config: &GeminiConfig) -> StdDuration {
    let attempts = config.max_attempts.max(1);
    let per_attempt = StdDuration::from_secs(config.timeout_secs) * attempts;
    (1..attempts).map(backoff_delay).fold(per_attempt, |acc, d| acc + d)
}

/// Request body for `generateContent`.
pub fn build_request_body(request: &GenerationRequest) -> Value {
    let mut body = json!({
        "contents": [
            { "parts": [ { "text": request.prompt } ] }
        ]
    });
    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }
    if let Some(at) = request.maps_location {
        body["tools"] = json!([{ "googleMaps": {} }]);
        body["toolConfig"] = json!({
            "retrievalConfig": {
                "latLng": { "latitude": at.lat, "longitude": at.lng }
            }
        });
    }
    body
}

#[async_trait]
impl ContentBackend for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ContentError> {
        let api_key = self.api_key.as_deref().ok_or(ContentError::MissingApiKey)?;
        let url = self.endpoint(&request.model);
        let body = build_request_body(&request);

        // Retry transport failures, 429 and 5xx with exponential backoff
        let mut attempt = 0u32;
        let mut last_err = None;
        while attempt < self.max_attempts {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await;
            match res {
                Ok(r) => {
                    let status = r.status();
                    let body_text = r.text().await?;
                    if status.is_success() {
                        let j: Value = serde_json::from_str(&body_text)?;
                        return parse_generation_response(&j);
                    }
                    tracing::debug!(attempt, status = status.as_u16(), "gemini returned error status");
                    let err = ContentError::Status {
                        status: status.as_u16(),
                        body: body_text,
                    };
                    if !is_retryable(status.as_u16()) {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "gemini transport error");
                    last_err = Some(ContentError::Transport(e));
                }
            }
            if attempt < self.max_attempts {
                sleep(backoff_delay(attempt)).await;
            }
        }
        Err(last_err.unwrap_or(ContentError::EmptyResponse))
    }
}

/// Pull text and cited places out of a `generateContent` reply.
pub fn parse_generation_response(j: &Value) -> Result<GenerationResponse, ContentError> {
    let text = extract_candidate_text(j).ok_or(ContentError::EmptyResponse)?;
    Ok(GenerationResponse {
        text,
        places: extract_places(j),
    })
}

/// Gemini replies carry content as a string, an object with `text`, or an
/// object with `parts`. Parts are concatenated.
pub fn extract_candidate_text(j: &Value) -> Option<String> {
    let content = j.pointer("/candidates/0/content")?;
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    if let Some(text) = content.get("text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let parts = content.get("parts").and_then(Value::as_array)?;
    let mut out = String::new();
    for p in parts {
        if let Some(s) = p.as_str() {
            out.push_str(s);
        } else if let Some(text) = p.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Map chunks from the grounding metadata. Chunks without a maps entry are skipped.
pub fn extract_places(j: &Value) -> Vec<PlaceReference> {
    let Some(chunks) = j
        .pointer("/candidates/0/groundingMetadata/groundingChunks")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    chunks
        .iter()
        .filter_map(|chunk| {
            let maps = chunk.get("maps")?;
            let title = maps.get("title").and_then(Value::as_str)?;
            let uri = maps.get("uri").and_then(Value::as_str).unwrap_or_default();
            Some(PlaceReference {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}
