// src/services/gateway_client.rs
use crate::errors::ConceptShotError;
use crate::models::GatewayRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Seam between the orchestrator and the gateway proxy. Everything the
/// workflow sends over the wire goes through `invoke`, so error
/// classification lives in exactly one place and tests can substitute a
/// recording fake.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value, ConceptShotError>;
}

/// Production gateway: one JSON POST to `POST /functions/analyze-product`
/// with an optional shared-secret header and an explicit per-call timeout.
pub struct HttpGateway {
    client: Client,
    endpoint: String,
    app_secret: Option<String>,
}

impl HttpGateway {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(
        endpoint: impl Into<String>,
        app_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConceptShotError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConceptShotError::Upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            app_secret,
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value, ConceptShotError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(secret) = &self.app_secret {
            builder = builder.header("x-app-secret", secret);
        }

        let response = builder.send().await.map_err(|e| {
            ConceptShotError::Upstream(format!("gateway request failed: {}", e))
        })?;

        let status = response.status();
        match status.as_u16() {
            429 => Err(ConceptShotError::RateLimited),
            402 => Err(ConceptShotError::QuotaExceeded),
            401 => Err(ConceptShotError::Unauthorized),
            s if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(ConceptShotError::Gateway { status: s, body })
            }
            _ => response.json().await.map_err(|e| {
                ConceptShotError::Upstream(format!("invalid gateway response: {}", e))
            }),
        }
    }
}

/// Pulls the `imageDataUri` field out of a generation response.
pub fn image_from_response(response: &Value) -> Result<String, ConceptShotError> {
    response["imageDataUri"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ConceptShotError::Generation("gateway response carried no imageDataUri".to_string())
        })
}
