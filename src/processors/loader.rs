// photo-prep/src/processors/loader.rs
use crate::core::{PhotoToolError, Result};
use crate::processors::metadata::{MetadataProcessor, ORIENTATION_NORMAL};
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// A decoded photo with orientation applied and alpha removed, plus what it
/// took to get there.
pub struct LoadedPhoto {
    pub image: DynamicImage,
    pub source_format: Option<ImageFormat>,
    pub source_bytes: Vec<u8>,
    pub orientation: u32,
    pub flattened: bool,
}

impl LoadedPhoto {
    pub fn source_len(&self) -> u64 {
        self.source_bytes.len() as u64
    }

    /// True when the source bytes already are what an encoder output would
    /// describe: an upright JPEG without transparency.
    pub fn is_normalized_jpeg(&self) -> bool {
        self.source_format == Some(ImageFormat::Jpeg)
            && self.orientation == ORIENTATION_NORMAL
            && !self.flattened
    }
}

/// Largest width or height accepted from a decoder.
pub const MAX_DIMENSION: u32 = 100_000;

#[derive(Clone, Default)]
pub struct Loader;

impl Loader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<LoadedPhoto> {
        log::debug!("Loading image from: {}", path.display());

        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(PhotoToolError::InvalidParameter(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        self.load_from_bytes(bytes)
    }

    pub fn load_from_bytes(&self, bytes: Vec<u8>) -> Result<LoadedPhoto> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let source_format = reader.format();
        let decoded = reader.decode().map_err(|e| {
            PhotoToolError::ProcessingError(format!("Failed to decode image: {}", e))
        })?;

        let (width, height) = decoded.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PhotoToolError::ProcessingError(format!(
                "Image dimensions {}x{} exceed maximum {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        let metadata = MetadataProcessor::new();
        let orientation = metadata
            .read_orientation(&bytes)
            .unwrap_or(ORIENTATION_NORMAL);
        let oriented = metadata.apply_orientation(decoded, orientation);
        let (image, flattened) = flatten(oriented);

        log::debug!(
            "Loaded image: {}x{} pixels, orientation {}, flattened: {}",
            image.width(),
            image.height(),
            orientation,
            flattened
        );

        Ok(LoadedPhoto {
            image,
            source_format,
            source_bytes: bytes,
            orientation,
            flattened,
        })
    }
}

/// Reduces any pixel layout to 8-bit gray or RGB. Alpha is dropped, which is
/// the same as compositing onto the colour already stored under it.
pub fn flatten(image: DynamicImage) -> (DynamicImage, bool) {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => (image, false),
        color => {
            let had_alpha = color.has_alpha();
            (DynamicImage::ImageRgb8(image.to_rgb8()), had_alpha)
        }
    }
}
