// photo-prep/src/processors/compressor.rs
use crate::core::Result;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::Path;

pub const MAX_QUALITY: u8 = 100;

/// Encodes images as baseline JPEG at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    quality: u8,
}

impl Compressor {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, MAX_QUALITY),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn compress_to_bytes(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        image.write_with_encoder(encoder)?;
        Ok(buffer)
    }

    pub fn save(&self, image: &DynamicImage, path: &Path) -> Result<u64> {
        log::debug!(
            "Saving image to {} with quality {}",
            path.display(),
            self.quality
        );

        let bytes = self.compress_to_bytes(image)?;
        write_bytes(path, &bytes)
    }
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<u64> {
    std::fs::write(path, bytes)?;
    log::info!("Saved image: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len() as u64)
}
