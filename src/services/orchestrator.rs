// src/services/orchestrator.rs
//
// The generation workflow coordinator. One run turns a session (product
// photo, style, options) into a `GeneratedImageSet`:
//
//   main shot  ──┐ (concurrent)
//   detect-color ┘
//        │
//   basic detail shot 1 → basic detail shot 2   (strictly sequential;
//        │                                       shot 2 references shot 1)
//   analyze-main-shot → N ai-recommended shots  (parallel fan-out)
//
// Only a main-shot failure aborts the run. Color detection, mood analysis
// and every individual detail shot degrade gracefully: the failure is
// logged, the key is absent from the result set, and the run continues.

use crate::errors::ConceptShotError;
use crate::models::{
    basic_shot_id, ColorDetection, GatewayRequest, GeneratedImageSet, GenerationSession,
    MainShotMood, RunOutcome, ShotFailure, StyleSelection, MAIN_SHOT_ID,
};
use crate::prompts;
use crate::services::gateway_client::{image_from_response, Gateway};
use chrono::Utc;
use futures_util::future::join_all;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    /// Styles without a generation branch yet sleep this long instead of
    /// calling the gateway.
    stub_delay: Duration,
    /// Bundled camera-angle reference sent with the dynamic-angle style.
    angle_reference: Option<String>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            stub_delay: Duration::from_secs(3),
            angle_reference: None,
        }
    }

    pub fn with_stub_delay(mut self, delay: Duration) -> Self {
        self.stub_delay = delay;
        self
    }

    pub fn with_angle_reference(mut self, data_uri: impl Into<String>) -> Self {
        self.angle_reference = Some(data_uri.into());
        self
    }

    /// Runs one complete generation pass. Returns an error only when the
    /// main-shot branch fails; every other failure is recorded in
    /// `RunOutcome::skipped`.
    pub async fn run(&self, session: &GenerationSession) -> Result<RunOutcome, ConceptShotError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            "run {}: style {:?}, basic_details={}, ai_recommended={} ({} selected)",
            run_id,
            session.style,
            session.options.basic_details,
            session.options.ai_recommended,
            session.options.selected_ai_details.len()
        );

        // Main shot and color pre-detection are independent outputs; start
        // them together and join.
        let (main_result, color_hint) = tokio::join!(
            self.generate_main_shot(session),
            self.detect_color(session)
        );
        let main_image = main_result?;

        let mut images = GeneratedImageSet::default();
        let mut skipped = Vec::new();
        if let Some(uri) = &main_image {
            images.insert(MAIN_SHOT_ID, uri.clone());
        }

        if session.options.basic_details {
            self.generate_basic_shots(session, color_hint.as_ref(), &mut images, &mut skipped)
                .await;
        }

        if session.options.ai_recommended {
            match images.main_shot() {
                Some(main_uri) => {
                    let main_uri = main_uri.to_string();
                    self.generate_ai_shots(session, &main_uri, &mut images, &mut skipped)
                        .await;
                }
                None => {
                    info!("run {}: no main shot, skipping AI-recommended shots", run_id);
                }
            }
        }

        let outcome = RunOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            images,
            skipped,
        };
        info!(
            "run {}: {} image(s), {} skipped",
            run_id,
            outcome.images.len(),
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// Style dispatch. Exactly one branch executes per run; the request
    /// shape per style never depends on prior run history.
    async fn generate_main_shot(
        &self,
        session: &GenerationSession,
    ) -> Result<Option<String>, ConceptShotError> {
        let ratio = session.options.main_ratio;
        let request = match session.style {
            StyleSelection::DarklightStudio => GatewayRequest {
                prompt: Some(prompts::DARKLIGHT_STUDIO_PROMPT.to_string()),
                product_image_base64: Some(session.product_image.clone()),
                aspect_ratio: Some(ratio),
                ..GatewayRequest::new("generate")
            },
            StyleSelection::DynamicAngle => GatewayRequest {
                prompt: Some(prompts::build_dynamic_angle_prompt(
                    self.angle_reference.is_some(),
                )),
                product_image_base64: Some(session.product_image.clone()),
                reference_image_base64: self.angle_reference.clone(),
                aspect_ratio: Some(ratio),
                ..GatewayRequest::new("generate")
            },
            StyleSelection::Custom => {
                let reference_image = session.reference_image.clone().ok_or_else(|| {
                    ConceptShotError::Validation(
                        "custom style requires a reference image".to_string(),
                    )
                })?;
                let reference_analysis = session.reference_analysis.clone().ok_or_else(|| {
                    ConceptShotError::Validation(
                        "custom style requires a reference analysis".to_string(),
                    )
                })?;
                GatewayRequest {
                    prompt: Some(prompts::CUSTOM_BASE_PROMPT.to_string()),
                    product_image_base64: Some(session.product_image.clone()),
                    reference_image_base64: Some(reference_image),
                    reference_analysis: Some(reference_analysis),
                    aspect_ratio: Some(ratio),
                    ..GatewayRequest::new("generate")
                }
            }
            StyleSelection::TextureConcept => {
                let prompt = session.texture_prompt.clone().ok_or_else(|| {
                    ConceptShotError::Validation(
                        "texture-concept style requires a prior texture analysis".to_string(),
                    )
                })?;
                GatewayRequest {
                    prompt: Some(prompt),
                    aspect_ratio: Some(ratio),
                    ..GatewayRequest::new("generate")
                }
            }
            // Remaining styles have no generation branch yet; the fixed
            // delay stands in for one.
            StyleSelection::MinimalStudio
            | StyleSelection::NatureLifestyle
            | StyleSelection::TechFuturistic => {
                tokio::time::sleep(self.stub_delay).await;
                return Ok(None);
            }
        };

        let response = self.gateway.invoke(&request).await?;
        Ok(Some(image_from_response(&response)?))
    }

    /// Best-effort color pre-detection for the basic detail shots. Never
    /// aborts the run; a failure just drops the background hints.
    async fn detect_color(&self, session: &GenerationSession) -> Option<ColorDetection> {
        if !session.options.basic_details {
            return None;
        }
        let request = GatewayRequest {
            image_base64: Some(session.product_image.clone()),
            ..GatewayRequest::new("detect-color")
        };
        match self.gateway.invoke(&request).await {
            Ok(response) => match serde_json::from_value::<ColorDetection>(response) {
                Ok(detection) => Some(detection),
                Err(e) => {
                    warn!("detect-color returned an unexpected shape: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("detect-color failed, continuing without hints: {}", e);
                None
            }
        }
    }

    /// Two basic detail shots, strictly in order: shot 2 must visually match
    /// shot 1, so it carries shot 1's image as a reference. If shot 1 failed,
    /// shot 2 still attempts without the reference.
    async fn generate_basic_shots(
        &self,
        session: &GenerationSession,
        color_hint: Option<&ColorDetection>,
        images: &mut GeneratedImageSet,
        skipped: &mut Vec<ShotFailure>,
    ) {
        let first = self
            .generate_basic_shot(session, 1, color_hint, None)
            .await;
        let first_image = match first {
            Ok(uri) => {
                images.insert(basic_shot_id(1), uri.clone());
                Some(uri)
            }
            Err(e) => {
                warn!("basic detail shot 1 failed: {}", e);
                skipped.push(ShotFailure {
                    shot_id: basic_shot_id(1),
                    reason: e.to_string(),
                });
                None
            }
        };

        match self
            .generate_basic_shot(session, 2, color_hint, first_image.as_deref())
            .await
        {
            Ok(uri) => images.insert(basic_shot_id(2), uri),
            Err(e) => {
                warn!("basic detail shot 2 failed: {}", e);
                skipped.push(ShotFailure {
                    shot_id: basic_shot_id(2),
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn generate_basic_shot(
        &self,
        session: &GenerationSession,
        shot_index: u32,
        color_hint: Option<&ColorDetection>,
        first_shot: Option<&str>,
    ) -> Result<String, ConceptShotError> {
        let request = GatewayRequest {
            product_image_base64: Some(session.product_image.clone()),
            reference_image_base64: first_shot.map(|s| s.to_string()),
            shot_index: Some(shot_index),
            aspect_ratio: Some(session.options.basic_ratio),
            detected_category: color_hint.map(|c| c.detected_category.clone()),
            background_tone: color_hint.map(|c| c.background_tone.clone()),
            background_hex: color_hint.map(|c| c.background_hex.clone()),
            ..GatewayRequest::new("generate-basic-details")
        };
        let response = self.gateway.invoke(&request).await?;
        image_from_response(&response)
    }

    /// Mood extraction from the finished main shot, then one parallel
    /// request per selected AI detail. All requests carry the same mood so
    /// the detail set stays visually consistent.
    async fn generate_ai_shots(
        &self,
        session: &GenerationSession,
        main_image: &str,
        images: &mut GeneratedImageSet,
        skipped: &mut Vec<ShotFailure>,
    ) {
        let mood = self.analyze_main_shot(main_image).await;

        let shots = session.options.selected_ai_details.iter().map(|id| {
            let request = GatewayRequest {
                product_image_base64: Some(session.product_image.clone()),
                shot_label: Some(session.detail_label(id)),
                main_shot_mood: mood.clone(),
                aspect_ratio: Some(session.options.ai_ratio),
                ..GatewayRequest::new("generate-ai-recommended")
            };
            let gateway = Arc::clone(&self.gateway);
            async move {
                let result = gateway.invoke(&request).await;
                (id.clone(), result.and_then(|r| image_from_response(&r)))
            }
        });

        for (id, result) in join_all(shots).await {
            match result {
                Ok(uri) => images.insert(id, uri),
                Err(e) => {
                    warn!("AI detail shot {} failed: {}", id, e);
                    skipped.push(ShotFailure {
                        shot_id: id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Best-effort mood descriptor; a failure means the AI shots simply run
    /// without a consistency constraint.
    async fn analyze_main_shot(&self, main_image: &str) -> Option<MainShotMood> {
        let request = GatewayRequest {
            image_base64: Some(main_image.to_string()),
            ..GatewayRequest::new("analyze-main-shot")
        };
        match self.gateway.invoke(&request).await {
            Ok(response) => match serde_json::from_value::<MainShotMood>(response["moodData"].clone()) {
                Ok(mood) => Some(mood),
                Err(e) => {
                    warn!("analyze-main-shot returned an unexpected shape: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("analyze-main-shot failed, continuing without mood: {}", e);
                None
            }
        }
    }
}
