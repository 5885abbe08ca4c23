// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Key under which the main concept shot lands in a [`GeneratedImageSet`].
pub const MAIN_SHOT_ID: &str = "main";

/// Key for a basic detail shot (`basic-1`, `basic-2`).
pub fn basic_shot_id(index: u32) -> String {
    format!("basic-{}", index)
}

/// The visual style chosen exactly once per run; selects the generation
/// branch and prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleSelection {
    MinimalStudio,
    DynamicAngle,
    NatureLifestyle,
    TechFuturistic,
    TextureConcept,
    DarklightStudio,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait916,
    #[serde(rename = "16:9")]
    Landscape169,
    #[serde(rename = "3:4")]
    Portrait34,
    #[serde(rename = "4:3")]
    Landscape43,
}

impl AspectRatio {
    /// English instruction appended to generation prompts.
    pub fn instruction(&self) -> &'static str {
        match self {
            AspectRatio::Square => "square 1:1 aspect ratio",
            AspectRatio::Portrait916 => "vertical portrait 9:16 aspect ratio",
            AspectRatio::Landscape169 => "horizontal landscape 16:9 aspect ratio",
            AspectRatio::Portrait34 => "vertical 3:4 aspect ratio",
            AspectRatio::Landscape43 => "horizontal 4:3 aspect ratio",
        }
    }
}

/// Output options picked on the last wizard step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailOptions {
    pub basic_details: bool,
    pub ai_recommended: bool,
    /// Ids from the detail recommendation the user left checked.
    pub selected_ai_details: Vec<String>,
    pub main_ratio: AspectRatio,
    pub basic_ratio: AspectRatio,
    pub ai_ratio: AspectRatio,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            basic_details: false,
            ai_recommended: false,
            selected_ai_details: Vec::new(),
            main_ratio: AspectRatio::Square,
            basic_ratio: AspectRatio::Square,
            ai_ratio: AspectRatio::Square,
        }
    }
}

/// Result of the `analyze` step: what the product container looks like and
/// which texture concept fits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureAnalysis {
    pub container_color: String,
    pub container_material: String,
    pub container_type: String,
    pub product_category: String,
    pub selected_texture: String,
    #[serde(default)]
    pub texture_reason_ko: String,
}

/// Result of the `analyze-reference` step: scene description of the
/// user-provided style reference image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceAnalysis {
    pub color_palette: String,
    pub lighting: String,
    pub mood: String,
    pub environment: String,
    pub surface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailShotOption {
    pub id: String,
    pub label: String,
    #[serde(rename = "defaultChecked", default)]
    pub default_checked: bool,
}

/// Result of the `analyze-details` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRecommendation {
    pub category: String,
    pub details: Vec<DetailShotOption>,
}

/// Result of the best-effort `detect-color` pre-step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorDetection {
    pub detected_category: String,
    pub dominant_color: String,
    pub background_hex: String,
    pub background_tone: String,
}

/// Mood descriptor extracted from the completed main shot, carried into every
/// AI-recommended detail shot so they stay visually consistent with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainShotMood {
    pub lighting_style: String,
    pub background_tone: String,
    pub color_temperature: String,
    pub composition_style: String,
    #[serde(default)]
    pub mood_keywords: Vec<String>,
}

/// Wire body for `POST /functions/analyze-product`. Absent fields are left
/// out of the serialized payload entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_analysis: Option<ReferenceAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_shot_mood: Option<MainShotMood>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shot_label: Option<String>,
}

impl GatewayRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }
}

/// Shot id -> image data URI. Keys exist only for calls that succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedImageSet(BTreeMap<String, String>);

impl GeneratedImageSet {
    pub fn insert(&mut self, shot_id: impl Into<String>, data_uri: impl Into<String>) {
        self.0.insert(shot_id.into(), data_uri.into());
    }

    pub fn get(&self, shot_id: &str) -> Option<&str> {
        self.0.get(shot_id).map(|s| s.as_str())
    }

    pub fn main_shot(&self) -> Option<&str> {
        self.get(MAIN_SHOT_ID)
    }

    pub fn contains(&self, shot_id: &str) -> bool {
        self.0.contains_key(shot_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything one generation run needs as input. Replaces the scattered
/// per-component state of the original wizard with one explicit record.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    /// Product photo as a data URI, already resized below the payload cap.
    pub product_image: String,
    /// Style reference image; only present for the `custom` style.
    pub reference_image: Option<String>,
    pub style: StyleSelection,
    pub options: DetailOptions,
    /// Prompt derived from the texture analysis; required by the
    /// `texture-concept` branch.
    pub texture_prompt: Option<String>,
    /// Scene analysis of the reference image; required by `custom`.
    pub reference_analysis: Option<ReferenceAnalysis>,
    /// Labels for the selected AI detail ids, when a recommendation ran.
    pub detail_recommendation: Option<DetailRecommendation>,
}

impl GenerationSession {
    pub fn new(product_image: impl Into<String>, style: StyleSelection) -> Self {
        Self {
            product_image: product_image.into(),
            reference_image: None,
            style,
            options: DetailOptions::default(),
            texture_prompt: None,
            reference_analysis: None,
            detail_recommendation: None,
        }
    }

    /// Korean label for an AI detail id, falling back to the id itself.
    pub fn detail_label(&self, id: &str) -> String {
        self.detail_recommendation
            .as_ref()
            .and_then(|rec| rec.details.iter().find(|d| d.id == id))
            .map(|d| d.label.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// A detail-shot call that failed and was dropped from the result set.
#[derive(Debug, Clone, Serialize)]
pub struct ShotFailure {
    pub shot_id: String,
    pub reason: String,
}

/// Terminal artifact of one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub images: GeneratedImageSet,
    /// Non-fatal failures, for display and diagnostics only.
    pub skipped: Vec<ShotFailure>,
}
