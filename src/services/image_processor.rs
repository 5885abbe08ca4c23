// src/services/image_processor.rs
use crate::errors::ConceptShotError;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::GenericImageView;
use std::path::Path;

/// Longest edge a payload image may have before it is downscaled.
pub const MAX_EDGE: u32 = 1024;

/// JPEG quality used when re-encoding a downscaled image (0.85 in the
/// original client).
pub const JPEG_QUALITY: u8 = 85;

pub struct ImageProcessor {
    max_edge: u32,
    jpeg_quality: u8,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            max_edge: MAX_EDGE,
            jpeg_quality: JPEG_QUALITY,
        }
    }
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_edge(max_edge: u32) -> Self {
        Self {
            max_edge,
            ..Self::default()
        }
    }

    /// Reads a local image file into a base64 data URI.
    pub fn file_to_data_uri(&self, path: &Path) -> Result<String, ConceptShotError> {
        let data = std::fs::read(path)
            .map_err(|e| ConceptShotError::ImageProcessing(format!("failed to read image: {}", e)))?;
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        };
        Ok(to_data_uri(&data, mime))
    }

    /// Downscales the image so its longer edge equals the cap, re-encoding as
    /// JPEG. Returns the input string unchanged when already within bounds,
    /// which makes the operation idempotent.
    pub fn resize_to_cap(&self, data_uri: &str) -> Result<String, ConceptShotError> {
        let (_, data) = decode_data_uri(data_uri)?;
        let img = image::load_from_memory(&data)
            .map_err(|e| ConceptShotError::ImageProcessing(format!("failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();
        if width <= self.max_edge && height <= self.max_edge {
            return Ok(data_uri.to_string());
        }

        let ratio = self.max_edge as f32 / width.max(height) as f32;
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);
        let resized = img
            .resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
            .to_rgb8();

        let mut output = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, self.jpeg_quality);
        encoder.encode_image(&resized).map_err(|e| {
            ConceptShotError::ImageProcessing(format!("failed to encode resized image: {}", e))
        })?;

        Ok(to_data_uri(&output, "image/jpeg"))
    }
}

pub fn to_data_uri(data: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(data))
}

/// Accepts both a full data URI and raw base64, the same leniency the proxy
/// extends to clients. Returns the mime type and the decoded bytes.
pub fn decode_data_uri(input: &str) -> Result<(String, Vec<u8>), ConceptShotError> {
    let (mime, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                ConceptShotError::ImageProcessing("malformed data URI".to_string())
            })?;
            let mime = header.strip_suffix(";base64").unwrap_or(header);
            (mime.to_string(), payload)
        }
        None => ("image/jpeg".to_string(), input),
    };
    let data = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ConceptShotError::ImageProcessing(format!("invalid base64: {}", e)))?;
    Ok((mime, data))
}

/// Normalizes an incoming image field to a data URI the AI gateway accepts.
pub fn ensure_data_uri(input: &str) -> String {
    if input.starts_with("data:") {
        input.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", input)
    }
}
