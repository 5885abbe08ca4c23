// src/handlers.rs
use crate::errors::ConceptShotError;
use crate::models::{
    ColorDetection, DetailRecommendation, GatewayRequest, MainShotMood, ReferenceAnalysis,
    TextureAnalysis,
};
use crate::prompts;
use crate::services::image_processor::ensure_data_uri;
use crate::services::upstream::{image_data_uri, parse_json_payload, ANALYSIS_MODEL, IMAGE_MODEL};
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use serde_json::{json, Value};

/// `POST /functions/analyze-product`: shared-secret check, then dispatch on
/// the `action` discriminator.
pub async fn analyze_product(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<GatewayRequest>,
) -> Result<HttpResponse, ConceptShotError> {
    verify_app_secret(&req, state.app_secret.as_deref())?;

    let request = body.into_inner();
    info!("action {} started", request.action);

    match request.action.as_str() {
        "analyze" => analyze(&state, &request).await,
        "analyze-details" => analyze_details(&state, &request).await,
        "analyze-reference" => analyze_reference(&state, &request).await,
        "detect-color" => detect_color(&state, &request).await,
        "analyze-main-shot" => analyze_main_shot(&state, &request).await,
        "generate" => generate(&state, &request).await,
        "generate-basic-details" => generate_basic_details(&state, &request).await,
        "generate-ai-recommended" => generate_ai_recommended(&state, &request).await,
        "outpaint" => outpaint(&state, &request).await,
        other => Err(ConceptShotError::Validation(format!(
            "Invalid action: {}",
            other
        ))),
    }
}

/// CORS preflight; headers themselves come from the DefaultHeaders layer.
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "conceptshot",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn verify_app_secret(req: &HttpRequest, expected: Option<&str>) -> Result<(), ConceptShotError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = req
        .headers()
        .get("x-app-secret")
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        return Err(ConceptShotError::Unauthorized);
    }
    Ok(())
}

fn require_image(field: Option<&String>, name: &str) -> Result<String, ConceptShotError> {
    field
        .map(|s| ensure_data_uri(s))
        .ok_or_else(|| ConceptShotError::Validation(format!("{} is required", name)))
}

/// Chat request against the text model: one system prompt, one image, one
/// user instruction.
fn analysis_body(system: &str, user: &str, image: &str, max_tokens: u32, temperature: f64) -> Value {
    json!({
        "model": ANALYSIS_MODEL,
        "messages": [
            { "role": "system", "content": system },
            {
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": image } },
                    { "type": "text", "text": user }
                ]
            }
        ],
        "temperature": temperature,
        "max_tokens": max_tokens
    })
}

/// Multimodal generation request: zero or more images followed by the prompt.
fn generation_body(images: &[&str], prompt: &str) -> Value {
    let mut content: Vec<Value> = images
        .iter()
        .map(|image| json!({ "type": "image_url", "image_url": { "url": image } }))
        .collect();
    content.push(json!({ "type": "text", "text": prompt }));
    json!({
        "model": IMAGE_MODEL,
        "messages": [{ "role": "user", "content": content }],
        "modalities": ["image", "text"],
        "temperature": 1
    })
}

async fn generate_image(
    state: &AppState,
    images: &[&str],
    prompt: &str,
) -> Result<String, ConceptShotError> {
    let response = state.upstream.chat(generation_body(images, prompt)).await?;
    image_data_uri(&response)
        .ok_or_else(|| ConceptShotError::Generation("no image in AI response".to_string()))
}

async fn analyze(state: &AppState, request: &GatewayRequest) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let response = state
        .upstream
        .chat(analysis_body(
            prompts::TEXTURE_ANALYSIS_SYSTEM,
            prompts::TEXTURE_ANALYSIS_USER,
            &image,
            500,
            0.1,
        ))
        .await?;

    let analysis: TextureAnalysis = parse_json_payload(&response)?;
    let generation_prompt = prompts::build_texture_prompt(&analysis);
    Ok(HttpResponse::Ok().json(json!({
        "analysis": analysis,
        "generationPrompt": generation_prompt
    })))
}

async fn analyze_details(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let response = state
        .upstream
        .chat(analysis_body(
            prompts::DETAIL_ANALYSIS_SYSTEM,
            prompts::DETAIL_ANALYSIS_USER,
            &image,
            800,
            0.3,
        ))
        .await?;

    let recommendation: DetailRecommendation = parse_json_payload(&response)?;
    Ok(HttpResponse::Ok().json(json!({ "detailRecommendation": recommendation })))
}

async fn analyze_reference(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let response = state
        .upstream
        .chat(analysis_body(
            prompts::REFERENCE_ANALYSIS_SYSTEM,
            prompts::REFERENCE_ANALYSIS_USER,
            &image,
            500,
            0.1,
        ))
        .await?;

    let analysis: ReferenceAnalysis = parse_json_payload(&response)?;
    Ok(HttpResponse::Ok().json(json!({ "referenceAnalysis": analysis })))
}

async fn detect_color(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let response = state
        .upstream
        .chat(analysis_body(
            prompts::DETECT_COLOR_SYSTEM,
            prompts::DETECT_COLOR_USER,
            &image,
            300,
            0.1,
        ))
        .await?;

    let detection: ColorDetection = parse_json_payload(&response)?;
    Ok(HttpResponse::Ok().json(detection))
}

async fn analyze_main_shot(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let response = state
        .upstream
        .chat(analysis_body(
            prompts::MAIN_SHOT_MOOD_SYSTEM,
            prompts::MAIN_SHOT_MOOD_USER,
            &image,
            400,
            0.2,
        ))
        .await?;

    let mood: MainShotMood = parse_json_payload(&response)?;
    Ok(HttpResponse::Ok().json(json!({ "moodData": mood })))
}

async fn generate(state: &AppState, request: &GatewayRequest) -> Result<HttpResponse, ConceptShotError> {
    let prompt = request
        .prompt
        .as_deref()
        .ok_or_else(|| ConceptShotError::Validation("prompt is required".to_string()))?;
    let ratio_instruction = request.aspect_ratio.map(|r| r.instruction());

    // The composite template takes over the whole prompt when a reference
    // analysis is attached; otherwise the ratio hint is appended.
    let effective_prompt = match &request.reference_analysis {
        Some(analysis) => prompts::build_composite_prompt(analysis, ratio_instruction),
        None => match ratio_instruction {
            Some(instruction) => format!("{}, {}", prompt, instruction),
            None => prompt.to_string(),
        },
    };

    let mut images = Vec::new();
    let product;
    if let Some(raw) = &request.product_image_base64 {
        product = ensure_data_uri(raw);
        images.push(product.as_str());
    }
    let reference;
    if let Some(raw) = &request.reference_image_base64 {
        reference = ensure_data_uri(raw);
        images.push(reference.as_str());
    }

    let uri = generate_image(state, &images, &effective_prompt).await?;
    Ok(HttpResponse::Ok().json(json!({ "imageDataUri": uri })))
}

async fn generate_basic_details(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let product = require_image(request.product_image_base64.as_ref(), "productImageBase64")?;
    let shot_index = request
        .shot_index
        .ok_or_else(|| ConceptShotError::Validation("shotIndex is required".to_string()))?;
    if !(1..=2).contains(&shot_index) {
        return Err(ConceptShotError::Validation(
            "shotIndex must be 1 or 2".to_string(),
        ));
    }

    let first_shot = request.reference_image_base64.as_deref().map(ensure_data_uri);
    let mut prompt = prompts::build_basic_detail_prompt(
        shot_index,
        request.detected_category.as_deref(),
        request.background_tone.as_deref(),
        request.background_hex.as_deref(),
        first_shot.is_some(),
    );
    if let Some(ratio) = request.aspect_ratio {
        prompt.push_str(", ");
        prompt.push_str(ratio.instruction());
    }

    let mut images = vec![product.as_str()];
    if let Some(first) = &first_shot {
        images.push(first.as_str());
    }

    let uri = generate_image(state, &images, &prompt).await?;
    Ok(HttpResponse::Ok().json(json!({ "imageDataUri": uri, "shotIndex": shot_index })))
}

async fn generate_ai_recommended(
    state: &AppState,
    request: &GatewayRequest,
) -> Result<HttpResponse, ConceptShotError> {
    let product = require_image(request.product_image_base64.as_ref(), "productImageBase64")?;
    let label = request
        .shot_label
        .as_deref()
        .ok_or_else(|| ConceptShotError::Validation("shotLabel is required".to_string()))?;

    let mut prompt = prompts::build_ai_detail_prompt(label, request.main_shot_mood.as_ref());
    if let Some(ratio) = request.aspect_ratio {
        prompt.push_str(", ");
        prompt.push_str(ratio.instruction());
    }

    let uri = generate_image(state, &[product.as_str()], &prompt).await?;
    Ok(HttpResponse::Ok().json(json!({ "imageDataUri": uri })))
}

async fn outpaint(state: &AppState, request: &GatewayRequest) -> Result<HttpResponse, ConceptShotError> {
    let image = require_image(request.image_base64.as_ref(), "imageBase64")?;
    let prompt =
        prompts::build_outpaint_prompt(request.aspect_ratio.map(|r| r.instruction()));

    let uri = generate_image(state, &[image.as_str()], &prompt).await?;
    Ok(HttpResponse::Ok().json(json!({ "imageDataUri": uri })))
}
