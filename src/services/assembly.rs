// src/services/assembly.rs
use crate::errors::ConceptShotError;
use crate::models::GeneratedImageSet;
use crate::services::image_processor::decode_data_uri;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Filename a shot is saved under, derived from its id and mime type.
pub fn image_filename(shot_id: &str, mime: &str) -> String {
    format!("concept-shot-{}.{}", shot_id, extension_for(mime))
}

/// Writes one generated image to disk.
pub fn save_image(data_uri: &str, path: &Path) -> Result<(), ConceptShotError> {
    let (_, data) = decode_data_uri(data_uri)?;
    std::fs::write(path, data)
        .map_err(|e| ConceptShotError::ImageProcessing(format!("failed to save image: {}", e)))
}

/// Packs every resolved entry of the result set into a zip archive. Entries
/// that never resolved have no key, so nothing is skipped here beyond what
/// the orchestrator already dropped.
pub fn build_archive(images: &GeneratedImageSet) -> Result<Vec<u8>, ConceptShotError> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut archive = ZipWriter::new(&mut cursor);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (shot_id, data_uri) in images.iter() {
            let (mime, data) = decode_data_uri(data_uri)?;
            archive
                .start_file(image_filename(shot_id, &mime), options)
                .map_err(|e| ConceptShotError::Serialization(format!("zip error: {}", e)))?;
            archive
                .write_all(&data)
                .map_err(|e| ConceptShotError::Serialization(format!("zip error: {}", e)))?;
        }
        archive
            .finish()
            .map_err(|e| ConceptShotError::Serialization(format!("zip error: {}", e)))?;
    }
    Ok(cursor.into_inner())
}
