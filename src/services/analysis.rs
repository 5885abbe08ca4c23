// src/services/analysis.rs
//
// The three standalone analysis steps of the wizard. Each is one
// request/response call against the gateway proxy: no retries, no caching,
// and re-running a step may legitimately produce different content.

use crate::errors::ConceptShotError;
use crate::models::{DetailRecommendation, GatewayRequest, ReferenceAnalysis, TextureAnalysis};
use crate::services::gateway_client::Gateway;
use serde_json::Value;

fn parse_field<T: serde::de::DeserializeOwned>(
    response: &Value,
    field: &str,
) -> Result<T, ConceptShotError> {
    let value = response
        .get(field)
        .cloned()
        .ok_or_else(|| ConceptShotError::AnalysisParse(format!("missing `{}` field", field)))?;
    serde_json::from_value(value)
        .map_err(|e| ConceptShotError::AnalysisParse(format!("malformed `{}`: {}", field, e)))
}

/// `analyze`: container/texture analysis of the product photo plus the
/// derived generation prompt for the texture-concept style.
pub async fn analyze_texture(
    gateway: &dyn Gateway,
    product_image: &str,
) -> Result<(TextureAnalysis, String), ConceptShotError> {
    let response = gateway
        .invoke(&GatewayRequest {
            image_base64: Some(product_image.to_string()),
            ..GatewayRequest::new("analyze")
        })
        .await?;

    let analysis: TextureAnalysis = parse_field(&response, "analysis")?;
    let prompt = response["generationPrompt"]
        .as_str()
        .ok_or_else(|| ConceptShotError::AnalysisParse("missing `generationPrompt`".to_string()))?
        .to_string();
    Ok((analysis, prompt))
}

/// `analyze-reference`: scene description of the style reference image.
pub async fn analyze_reference(
    gateway: &dyn Gateway,
    reference_image: &str,
) -> Result<ReferenceAnalysis, ConceptShotError> {
    let response = gateway
        .invoke(&GatewayRequest {
            image_base64: Some(reference_image.to_string()),
            ..GatewayRequest::new("analyze-reference")
        })
        .await?;
    parse_field(&response, "referenceAnalysis")
}

/// `analyze-details`: product category plus recommended detail shots.
pub async fn recommend_details(
    gateway: &dyn Gateway,
    product_image: &str,
) -> Result<DetailRecommendation, ConceptShotError> {
    let response = gateway
        .invoke(&GatewayRequest {
            image_base64: Some(product_image.to_string()),
            ..GatewayRequest::new("analyze-details")
        })
        .await?;
    parse_field(&response, "detailRecommendation")
}
