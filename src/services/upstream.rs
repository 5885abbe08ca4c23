// src/services/upstream.rs
use crate::errors::ConceptShotError;
use log::error;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default multimodal AI gateway endpoint the proxy forwards to.
pub const DEFAULT_UPSTREAM_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Text model used by the analysis actions.
pub const ANALYSIS_MODEL: &str = "google/gemini-3-flash-preview";

/// Multimodal model used by the generation actions.
pub const IMAGE_MODEL: &str = "google/gemini-3-pro-image-preview";

/// One chat-completions call against the hosted AI gateway, with the status
/// classification every action shares: 429 and 402 become typed results, any
/// other non-2xx fails with the gateway's body.
pub struct UpstreamClient {
    client: Client,
    url: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConceptShotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConceptShotError::Upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        })
    }

    pub async fn chat(&self, body: Value) -> Result<Value, ConceptShotError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ConceptShotError::Upstream(format!("AI gateway request failed: {}", e)))?;

        let status = response.status();
        match status.as_u16() {
            429 => Err(ConceptShotError::RateLimited),
            402 => Err(ConceptShotError::QuotaExceeded),
            s if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                error!("AI gateway error: {} {}", s, body);
                Err(ConceptShotError::Gateway { status: s, body })
            }
            _ => response.json().await.map_err(|e| {
                ConceptShotError::Upstream(format!("failed to parse AI gateway response: {}", e))
            }),
        }
    }
}

/// Text content of the first choice, with markdown code fences stripped.
/// The models are asked for pure JSON but occasionally wrap it anyway.
pub fn text_content(response: &Value) -> Result<String, ConceptShotError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ConceptShotError::AnalysisParse("no text content in AI response".to_string())
        })?;
    Ok(strip_code_fence(content.trim()).to_string())
}

pub fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.strip_suffix('\n').unwrap_or(rest)
}

/// Parses the model's text content as the expected JSON record.
pub fn parse_json_payload<T: DeserializeOwned>(response: &Value) -> Result<T, ConceptShotError> {
    let content = text_content(response)?;
    serde_json::from_str(&content).map_err(|e| {
        error!("JSON parse error: {} in {}", e, content);
        ConceptShotError::AnalysisParse(format!("model returned malformed JSON: {}", e))
    })
}

/// Extracts an image data URI from a multimodal response. The gateway has
/// emitted four different shapes over time; all are still accepted.
pub fn image_data_uri(response: &Value) -> Option<String> {
    let message = &response["choices"][0]["message"];

    // Preferred shape: a top-level images array.
    if let Some(images) = message["images"].as_array() {
        if let Some(url) = images
            .first()
            .and_then(|img| img["image_url"]["url"].as_str())
        {
            return Some(url.to_string());
        }
    }

    let content = &message["content"];
    if let Some(parts) = content.as_array() {
        for part in parts {
            if part["type"] == "image_url" {
                if let Some(url) = part["image_url"]["url"].as_str() {
                    return Some(url.to_string());
                }
            }
            if part["type"] == "image" {
                if let Some(url) = part["image"]["url"].as_str() {
                    return Some(url.to_string());
                }
            }
            if let Some(inline) = part.get("inline_data") {
                if let (Some(mime), Some(data)) =
                    (inline["mime_type"].as_str(), inline["data"].as_str())
                {
                    return Some(format!("data:{};base64,{}", mime, data));
                }
            }
        }
    } else if let Some(text) = content.as_str() {
        if text.starts_with("data:") {
            return Some(text.to_string());
        }
    }

    None
}
