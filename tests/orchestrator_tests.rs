// tests/orchestrator_tests.rs
//
// Workflow tests against a recording fake gateway: request shapes per style
// branch, the sequential basic-shot dependency, graceful degradation of the
// optional steps, and result-set merge behavior.

use async_trait::async_trait;
use conceptshot::errors::ConceptShotError;
use conceptshot::models::{
    AspectRatio, DetailOptions, GatewayRequest, GenerationSession, StyleSelection,
};
use conceptshot::services::{Gateway, Orchestrator};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PRODUCT: &str = "data:image/jpeg;base64,PRODUCT";
const REFERENCE: &str = "data:image/jpeg;base64,REFERENCE";

/// Records every request and answers with canned per-action responses.
/// Failures are injected per action, or per `action:shotIndex` for the
/// basic detail shots.
struct MockGateway {
    calls: Mutex<Vec<GatewayRequest>>,
    failures: HashMap<String, u16>,
    counter: AtomicUsize,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: HashMap::new(),
            counter: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, key: &str, status: u16) -> Self {
        self.failures.insert(key.to_string(), status);
        self
    }

    fn calls(&self) -> Vec<GatewayRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, action: &str) -> Vec<GatewayRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.action == action)
            .collect()
    }

    fn failure_for(&self, request: &GatewayRequest) -> Option<u16> {
        if let Some(index) = request.shot_index {
            let keyed = format!("{}:{}", request.action, index);
            if let Some(status) = self.failures.get(&keyed) {
                return Some(*status);
            }
        }
        self.failures.get(&request.action).copied()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value, ConceptShotError> {
        self.calls.lock().unwrap().push(request.clone());

        if let Some(status) = self.failure_for(request) {
            return Err(match status {
                429 => ConceptShotError::RateLimited,
                402 => ConceptShotError::QuotaExceeded,
                s => ConceptShotError::Gateway {
                    status: s,
                    body: "injected failure".to_string(),
                },
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(match request.action.as_str() {
            "generate" => json!({ "imageDataUri": "data:image/png;base64,MAIN" }),
            "generate-basic-details" => json!({
                "imageDataUri": format!(
                    "data:image/png;base64,BASIC{}",
                    request.shot_index.unwrap_or(0)
                ),
                "shotIndex": request.shot_index
            }),
            "generate-ai-recommended" => {
                json!({ "imageDataUri": format!("data:image/png;base64,AI{}", n) })
            }
            "detect-color" => json!({
                "detectedCategory": "serum",
                "dominantColor": "amber",
                "backgroundHex": "#F4EDE2",
                "backgroundTone": "warm ivory"
            }),
            "analyze-main-shot" => json!({ "moodData": {
                "lightingStyle": "hard single spotlight",
                "backgroundTone": "deep charcoal",
                "colorTemperature": "cool",
                "compositionStyle": "centered hero",
                "moodKeywords": ["dramatic", "premium"]
            }}),
            other => json!({ "error": format!("unexpected action {}", other) }),
        })
    }
}

fn orchestrator(gateway: &Arc<MockGateway>) -> Orchestrator {
    Orchestrator::new(Arc::clone(gateway) as Arc<dyn Gateway>)
        .with_stub_delay(Duration::from_millis(1))
}

fn session(style: StyleSelection) -> GenerationSession {
    GenerationSession::new(PRODUCT, style)
}

#[tokio::test]
async fn texture_concept_without_options_issues_one_generate_call() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::TextureConcept);
    session.texture_prompt = Some("TXTING style beauty product photography".to_string());

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].action, "generate");
    assert_eq!(
        calls[0].prompt.as_deref(),
        Some("TXTING style beauty product photography")
    );
    // Texture branch sends no images, only the derived prompt.
    assert!(calls[0].product_image_base64.is_none());
    assert!(calls[0].reference_image_base64.is_none());

    assert_eq!(outcome.images.len(), 1);
    assert_eq!(
        outcome.images.main_shot(),
        Some("data:image/png;base64,MAIN")
    );
    assert!(outcome.skipped.is_empty());
}

#[tokio::test]
async fn basic_details_run_sequentially_and_shot_two_references_shot_one() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.basic_details = true;

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let basic = gateway.calls_for("generate-basic-details");
    assert_eq!(basic.len(), 2);
    assert_eq!(basic[0].shot_index, Some(1));
    assert_eq!(basic[1].shot_index, Some(2));

    // Shot 2 was only built after shot 1 resolved: it carries shot 1's
    // returned image as its visual reference.
    assert!(basic[0].reference_image_base64.is_none());
    assert_eq!(
        basic[1].reference_image_base64.as_deref(),
        Some("data:image/png;base64,BASIC1")
    );

    // Color hints from the pre-detection landed on both shots.
    for shot in &basic {
        assert_eq!(shot.detected_category.as_deref(), Some("serum"));
        assert_eq!(shot.background_tone.as_deref(), Some("warm ivory"));
        assert_eq!(shot.background_hex.as_deref(), Some("#F4EDE2"));
    }

    let mut ids: Vec<&str> = outcome.images.ids().collect();
    ids.sort();
    assert_eq!(ids, vec!["basic-1", "basic-2", "main"]);
}

#[tokio::test]
async fn ai_shots_share_one_mood_and_fan_out_per_selected_id() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.ai_recommended = true;
    session.options.selected_ai_details = vec![
        "case-open".to_string(),
        "wearing-side".to_string(),
        "touch-closeup".to_string(),
    ];

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let calls = gateway.calls();
    let main_index = calls.iter().position(|c| c.action == "generate").unwrap();
    let mood_index = calls
        .iter()
        .position(|c| c.action == "analyze-main-shot")
        .unwrap();
    assert!(mood_index > main_index);
    // The mood step analyzes the finished main shot, not the product photo.
    assert_eq!(
        calls[mood_index].image_base64.as_deref(),
        Some("data:image/png;base64,MAIN")
    );

    let ai = gateway.calls_for("generate-ai-recommended");
    assert_eq!(ai.len(), 3);
    for call in &ai {
        let mood = call.main_shot_mood.as_ref().expect("mood missing");
        assert_eq!(mood.background_tone, "deep charcoal");
        assert_eq!(mood.mood_keywords, vec!["dramatic", "premium"]);
    }

    assert_eq!(outcome.images.len(), 4);
    for id in ["case-open", "wearing-side", "touch-closeup"] {
        assert!(outcome.images.contains(id), "missing {}", id);
    }
}

#[tokio::test]
async fn quota_exhaustion_on_main_shot_aborts_the_run() {
    let gateway = Arc::new(MockGateway::new().failing("generate", 402));
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.basic_details = true;
    session.options.ai_recommended = true;
    session.options.selected_ai_details = vec!["case-open".to_string()];

    let err = orchestrator(&gateway).run(&session).await.unwrap_err();
    assert!(matches!(err, ConceptShotError::QuotaExceeded));

    // No detail-shot call of either kind was attempted.
    assert!(gateway.calls_for("generate-basic-details").is_empty());
    assert!(gateway.calls_for("generate-ai-recommended").is_empty());
    assert!(gateway.calls_for("analyze-main-shot").is_empty());
}

#[tokio::test]
async fn failed_color_detection_degrades_to_hintless_basic_shots() {
    let gateway = Arc::new(MockGateway::new().failing("detect-color", 500));
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.basic_details = true;

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let basic = gateway.calls_for("generate-basic-details");
    assert_eq!(basic.len(), 2);
    for shot in &basic {
        assert!(shot.detected_category.is_none());
        assert!(shot.background_tone.is_none());
        assert!(shot.background_hex.is_none());
    }

    // The run still completed in full.
    assert_eq!(outcome.images.len(), 3);
    assert!(outcome.images.main_shot().is_some());
}

#[tokio::test]
async fn failed_first_basic_shot_still_attempts_shot_two_without_reference() {
    let gateway = Arc::new(MockGateway::new().failing("generate-basic-details:1", 500));
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.basic_details = true;

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let basic = gateway.calls_for("generate-basic-details");
    assert_eq!(basic.len(), 2);
    assert!(basic[1].reference_image_base64.is_none());

    // Merge completeness: only the calls that resolved have keys.
    assert!(outcome.images.contains("main"));
    assert!(!outcome.images.contains("basic-1"));
    assert!(outcome.images.contains("basic-2"));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].shot_id, "basic-1");
}

#[tokio::test]
async fn failed_mood_analysis_degrades_to_unconstrained_ai_shots() {
    let gateway = Arc::new(MockGateway::new().failing("analyze-main-shot", 500));
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.ai_recommended = true;
    session.options.selected_ai_details = vec!["case-open".to_string()];

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    let ai = gateway.calls_for("generate-ai-recommended");
    assert_eq!(ai.len(), 1);
    assert!(ai[0].main_shot_mood.is_none());
    assert!(outcome.images.contains("case-open"));
}

#[tokio::test]
async fn rate_limited_ai_shot_is_dropped_not_fatal() {
    let gateway = Arc::new(MockGateway::new().failing("generate-ai-recommended", 429));
    let mut session = session(StyleSelection::DarklightStudio);
    session.options.ai_recommended = true;
    session.options.selected_ai_details = vec!["case-open".to_string()];

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();
    assert!(outcome.images.main_shot().is_some());
    assert!(!outcome.images.contains("case-open"));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].shot_id, "case-open");
}

#[tokio::test]
async fn stub_styles_make_no_network_calls() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::MinimalStudio);
    session.options.ai_recommended = true;
    session.options.selected_ai_details = vec!["case-open".to_string()];

    let outcome = orchestrator(&gateway).run(&session).await.unwrap();

    // No main shot means AI-recommended shots are skipped too; the only
    // call allowed would have been detect-color, which was not enabled.
    assert!(gateway.calls().is_empty());
    assert!(outcome.images.is_empty());
}

#[tokio::test]
async fn aspect_ratios_pass_through_per_shot_category() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::DarklightStudio);
    session.options = DetailOptions {
        basic_details: true,
        ai_recommended: true,
        selected_ai_details: vec!["case-open".to_string()],
        main_ratio: AspectRatio::Portrait916,
        basic_ratio: AspectRatio::Square,
        ai_ratio: AspectRatio::Landscape43,
    };

    orchestrator(&gateway).run(&session).await.unwrap();

    let main = &gateway.calls_for("generate")[0];
    assert_eq!(main.aspect_ratio, Some(AspectRatio::Portrait916));
    for shot in gateway.calls_for("generate-basic-details") {
        assert_eq!(shot.aspect_ratio, Some(AspectRatio::Square));
    }
    for shot in gateway.calls_for("generate-ai-recommended") {
        assert_eq!(shot.aspect_ratio, Some(AspectRatio::Landscape43));
    }
}

#[tokio::test]
async fn dynamic_angle_adapts_to_a_missing_bundled_reference() {
    // Without a configured angle reference: no second image, and no prompt
    // clause pointing at one.
    let gateway = Arc::new(MockGateway::new());
    orchestrator(&gateway)
        .run(&session(StyleSelection::DynamicAngle))
        .await
        .unwrap();
    let main = &gateway.calls_for("generate")[0];
    assert!(main.reference_image_base64.is_none());
    let prompt = main.prompt.as_deref().unwrap();
    assert!(!prompt.contains("second reference image"));

    // With one: the image is attached and the prompt refers to it.
    let gateway = Arc::new(MockGateway::new());
    Orchestrator::new(Arc::clone(&gateway) as Arc<dyn Gateway>)
        .with_stub_delay(Duration::from_millis(1))
        .with_angle_reference(REFERENCE)
        .run(&session(StyleSelection::DynamicAngle))
        .await
        .unwrap();
    let main = &gateway.calls_for("generate")[0];
    assert_eq!(main.reference_image_base64.as_deref(), Some(REFERENCE));
    let prompt = main.prompt.as_deref().unwrap();
    assert!(prompt.contains("second reference image"));
}

#[tokio::test]
async fn custom_style_sends_reference_image_and_analysis() {
    let gateway = Arc::new(MockGateway::new());
    let mut session = session(StyleSelection::Custom);
    session.reference_image = Some(REFERENCE.to_string());
    session.reference_analysis = Some(serde_json::from_value(json!({
        "color_palette": "muted sage and cream",
        "lighting": "soft window light",
        "mood": "calm",
        "environment": "stone shelf",
        "surface": "travertine"
    })).unwrap());

    orchestrator(&gateway).run(&session).await.unwrap();

    let main = &gateway.calls_for("generate")[0];
    assert_eq!(main.product_image_base64.as_deref(), Some(PRODUCT));
    assert_eq!(main.reference_image_base64.as_deref(), Some(REFERENCE));
    let analysis = main.reference_analysis.as_ref().expect("analysis missing");
    assert_eq!(analysis.surface, "travertine");
}

#[tokio::test]
async fn custom_style_without_reference_fails_validation_before_any_call() {
    let gateway = Arc::new(MockGateway::new());
    let session = session(StyleSelection::Custom);

    let err = orchestrator(&gateway).run(&session).await.unwrap_err();
    assert!(matches!(err, ConceptShotError::Validation(_)));
    assert!(gateway.calls_for("generate").is_empty());
}
