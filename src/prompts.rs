// src/prompts.rs
//
// Every prompt template the proxy and the orchestrator send to the
// multimodal gateway. Templates ask the model for pure JSON where a
// structured result is expected; the parse side still treats the output
// as untrusted.

use crate::models::{MainShotMood, ReferenceAnalysis, TextureAnalysis};

/// System prompt for the `analyze` action (texture-concept style).
pub const TEXTURE_ANALYSIS_SYSTEM: &str = r#"You are a beauty product photography expert. Analyze this product image and return ONLY a JSON object:
{
  "container_color": "1~2 color words in English",
  "container_material": "glass or plastic or metal or other",
  "container_type": "pump bottle or cream jar or tube or spray or dropper or other",
  "product_category": "shampoo or body wash or cleanser or serum or ampoule or moisturizer or cream or mask or scrub or toner or perfume or body oil or other",
  "selected_texture": "one of: foam_lather / cream_swirl / gel_oil_drip / crystal_grain / silk_drape / water_drops / mochi_stretch",
  "texture_reason_ko": "이 텍스처를 선택한 이유 한 문장 (한국어)"
}

Texture rules:
- foam_lather: shampoo, body wash, cleansing foam
- cream_swirl: moisturizer, cream, hair mask
- gel_oil_drip: serum, ampoule, facial oil
- crystal_grain: scrub, peeling gel
- silk_drape: perfume, body oil, luxury skincare
- water_drops: toner, essence, mist
- mochi_stretch: cleansing cream, clay mask

Return ONLY the JSON. No markdown, no explanation."#;

pub const TEXTURE_ANALYSIS_USER: &str = "이 제품 이미지를 분석해주세요.";

/// System prompt for the `analyze-details` action.
pub const DETAIL_ANALYSIS_SYSTEM: &str = r#"You are a professional product photography planner.
Analyze this product image and determine the product category and recommend 3-5 detail shots that would best showcase this product.
Return ONLY a JSON object:
{
  "category": "product category in Korean (e.g. 무선 이어폰, 화장품, 스킨케어 등)",
  "details": [
    { "id": "unique-id", "label": "shot description in Korean", "defaultChecked": true },
    ...
  ]
}
Each detail shot should be specific to this product type. Use descriptive Korean labels.
Mark the top 3 most important shots as defaultChecked: true, others as false.
Return ONLY the JSON. No markdown, no explanation."#;

pub const DETAIL_ANALYSIS_USER: &str = "이 제품 이미지를 분석하고 최적의 상세컷을 추천해주세요.";

/// System prompt for the `analyze-reference` action.
pub const REFERENCE_ANALYSIS_SYSTEM: &str = r#"You are a professional photography scene analyst.
Analyze this reference image and describe the background concept in detail.
Return ONLY a JSON object:
{
  "color_palette": "dominant colors and tones",
  "lighting": "lighting style and direction",
  "mood": "overall mood and atmosphere",
  "environment": "background environment description",
  "surface": "surface material the product should sit on"
}
Return ONLY the JSON. No markdown, no explanation."#;

pub const REFERENCE_ANALYSIS_USER: &str = "Analyze this reference image.";

/// System prompt for the `detect-color` pre-step.
pub const DETECT_COLOR_SYSTEM: &str = r##"You are a product photography color analyst.
Look at this product image and determine the product category and the background tone that detail shots should share.
Return ONLY a JSON object:
{
  "detectedCategory": "short product category in English",
  "dominantColor": "dominant product color in English",
  "backgroundHex": "#RRGGBB background color that complements the product",
  "backgroundTone": "short tone description (e.g. warm ivory, cool grey)"
}
Return ONLY the JSON. No markdown, no explanation."##;

pub const DETECT_COLOR_USER: &str = "Detect the product color and a matching background tone.";

/// System prompt for the `analyze-main-shot` mood extraction.
pub const MAIN_SHOT_MOOD_SYSTEM: &str = r#"You are a photography art director.
Analyze this finished concept shot and summarize its visual mood so that additional detail shots can match it.
Return ONLY a JSON object:
{
  "lightingStyle": "lighting style and direction",
  "backgroundTone": "background tone description",
  "colorTemperature": "warm or cool or neutral",
  "compositionStyle": "composition style description",
  "moodKeywords": ["3-5 short mood keywords"]
}
Return ONLY the JSON. No markdown, no explanation."#;

pub const MAIN_SHOT_MOOD_USER: &str = "Summarize the visual mood of this concept shot.";

/// Fixed main-shot template for the `darklight-studio` style.
pub const DARKLIGHT_STUDIO_PROMPT: &str = "Premium dark studio product photography, the product standing on a glossy black reflective surface, a single dramatic spotlight from the upper left carving hard-edged highlights along the container silhouette, deep charcoal-to-black gradient background, thin rim light separating the product from the background, subtle mirror reflection below, preserve the product label, typography, proportions and structural design exactly, photorealistic, ultra-clean, high detail";

/// Fixed main-shot template for the `dynamic-angle` style. The camera-angle
/// clause only makes sense when the bundled angle reference is attached as a
/// second image, so it is omitted otherwise.
pub fn build_dynamic_angle_prompt(has_angle_reference: bool) -> String {
    let angle_clause = if has_angle_reference {
        "the product shot from a steep upward angle matching the camera angle of the second reference image"
    } else {
        "the product shot from a steep upward angle"
    };
    format!(
        "Dynamic low-angle hero product photography, {}, strong diagonal composition, bold directional lighting with crisp shadow shapes, high contrast seamless studio background, slight wide-angle perspective exaggeration, floating dust particles catching the key light, preserve the product label, typography, proportions and structural design exactly, do not generate new text, photorealistic, editorial, high detail",
        angle_clause
    )
}

/// Base instruction for the `custom` style; the proxy expands it with the
/// composite template when a reference analysis is attached.
pub const CUSTOM_BASE_PROMPT: &str = "Composite the uploaded product onto the reference background, keeping the product exactly as photographed";

fn texture_phrase(texture: &str) -> &'static str {
    match texture {
        "foam_lather" => "entirely enveloped in billowing dense white foam forming a soft organic sculptural shape around the entire package, thick foam dripping down the sides in streams",
        "gel_oil_drip" => "with transparent gel oil dripping slowly from the pump head down all sides of the bottle in slow viscous streams, pooling in a glossy translucent puddle around the base",
        "crystal_grain" => "partially buried in and surrounded by chunky coarse sea salt crystal granules overflowing around it, warm amber liquid dripping from a glass ledge below",
        "silk_drape" => "placed on softly draped shiny silk satin fabric in complementary tones, the product rests on the flowing textile surface, elegant editorial still life",
        "water_drops" => "surrounded by floating transparent circular water droplets and a curling ribbon of clear gel liquid, pure white background, minimal editorial",
        "mochi_stretch" => "with thick stretchy mochi-textured cream being pulled upward by a wooden spatula stretching in a long viscous strand, hand holding spatula from above",
        // cream_swirl, and the fallback for anything the model invents
        _ => "with a generous peaked swirl of thick white cream texture piled on top of the open lid, rich whipped texture with soft peaks, cream radiating outward on the surface",
    }
}

fn background_phrase(texture: &str) -> &'static str {
    match texture {
        "foam_lather" => "soft grey gradient background",
        "gel_oil_drip" => "soft blue-grey gradient background",
        "crystal_grain" => "warm beige-grey gradient background",
        "silk_drape" => "pastel complementary toned background",
        "water_drops" => "pure white background",
        "mochi_stretch" => "neutral soft grey background",
        _ => "pure white reflective surface, clean studio background",
    }
}

/// Assembles the `generationPrompt` returned by the `analyze` action.
pub fn build_texture_prompt(analysis: &TextureAnalysis) -> String {
    format!(
        "TXTING style beauty product photography, {} {} {} {}, {}, {}, soft studio lighting, clean editorial product photography, high detail",
        analysis.container_color,
        analysis.container_material,
        analysis.container_type,
        analysis.product_category,
        texture_phrase(&analysis.selected_texture),
        background_phrase(&analysis.selected_texture),
    )
}

/// Composite-photography template for the `custom` style, embedding the
/// reference scene analysis.
pub fn build_composite_prompt(analysis: &ReferenceAnalysis, ratio_instruction: Option<&str>) -> String {
    let mut prompt = format!(
        r#"ROLE:
You are a "Product Mockup Auto-Generation AI".
The user uploads ONE product image.
Preserve the product's label, typography, proportions, silhouette, and structural design exactly.
Only transform the background, lighting, and environment according to the style rules.

GLOBAL RULES (MANDATORY):
- Preserve brand logo and text exactly (no distortion, no replacement, no new typography)
- Do NOT generate new text or copywriting
- Do NOT modify product structure, materials, label layout, or proportions
- No literal fruit/food objects (macro textures allowed)
- No low-budget, home-shopping, flyer-style aesthetic
- Maintain photorealistic, ultra-clean, premium studio quality
- No props unless abstract and non-literal

Reference scene analysis:
- Color palette: {}
- Lighting: {}
- Mood: {}
- Environment: {}
- Surface: {}

Composite the product image from Step 1 onto the reference image background.
Replace any product in the reference image with the Step 1 product image, using only the background from the reference.

Match the product's perspective, surface reflections, shadow direction and intensity
to the light sources in the background.
Reproduce all product label text and graphic elements sharply and without distortion.
The final result must look like a single cohesive photograph with physically consistent
lighting and material response throughout."#,
        analysis.color_palette,
        analysis.lighting,
        analysis.mood,
        analysis.environment,
        analysis.surface,
    );
    if let Some(instruction) = ratio_instruction {
        prompt.push(' ');
        prompt.push_str(instruction);
    }
    prompt
}

/// Prompt for one basic detail shot. Shot 1 establishes the look; shot 2 is
/// instructed to match shot 1's background, lighting and color grade.
pub fn build_basic_detail_prompt(
    shot_index: u32,
    detected_category: Option<&str>,
    background_tone: Option<&str>,
    background_hex: Option<&str>,
    has_first_shot_reference: bool,
) -> String {
    let mut prompt = String::from(match shot_index {
        1 => "Close-up product detail photography, extreme macro focus on the product's cap, nozzle and label area, shallow depth of field, crisp texture of the container material, preserve the product label, typography and proportions exactly, photorealistic, clean editorial detail shot, high detail",
        _ => "Close-up product detail photography, three-quarter view focused on the product body and base, shallow depth of field, crisp material texture, preserve the product label, typography and proportions exactly, photorealistic, clean editorial detail shot, high detail",
    });
    if let Some(category) = detected_category {
        prompt.push_str(&format!(", product category: {}", category));
    }
    match (background_tone, background_hex) {
        (Some(tone), Some(hex)) => {
            prompt.push_str(&format!(", seamless {} background ({})", tone, hex));
        }
        (Some(tone), None) => prompt.push_str(&format!(", seamless {} background", tone)),
        (None, Some(hex)) => prompt.push_str(&format!(", seamless background in {}", hex)),
        (None, None) => {}
    }
    if shot_index >= 2 && has_first_shot_reference {
        prompt.push_str(
            ", match the second reference image's background, lighting direction and color grade exactly so both detail shots read as one photo set",
        );
    }
    prompt
}

/// Prompt for one AI-recommended detail shot, constrained by the main-shot
/// mood when available.
pub fn build_ai_detail_prompt(shot_label: &str, mood: Option<&MainShotMood>) -> String {
    let mut prompt = format!(
        "Product detail photography: {}, preserve the product label, typography, proportions and structural design exactly, do not generate new text, photorealistic, clean editorial quality, high detail",
        shot_label
    );
    if let Some(mood) = mood {
        prompt.push_str(&format!(
            ", match the main concept shot: {} lighting, {} background, {} color temperature, {} composition",
            mood.lighting_style, mood.background_tone, mood.color_temperature, mood.composition_style
        ));
        if !mood.mood_keywords.is_empty() {
            prompt.push_str(&format!(", mood: {}", mood.mood_keywords.join(", ")));
        }
    }
    prompt
}

/// Prompt for the `outpaint` action: extend a generated image to a new ratio
/// without touching the product.
pub fn build_outpaint_prompt(ratio_instruction: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extend this photograph beyond its current borders, continuing the existing background, surface and lighting seamlessly, do not modify, move or rescale the product, no new objects, no text, photorealistic continuation of the same scene",
    );
    if let Some(instruction) = ratio_instruction {
        prompt.push_str(", final image in ");
        prompt.push_str(instruction);
    }
    prompt
}
