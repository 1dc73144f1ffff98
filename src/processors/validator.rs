// photo-prep/src/processors/validator.rs
use crate::core::{PhotoToolError, Result, ValidationRecord};
use crate::utils::{calculate_aspect_ratio, collect_image_paths, file_stem, size_in_kb};
use image::ImageReader;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Measures one file; `None` when it cannot be opened as an image.
    pub fn validate_one(&self, path: &Path) -> Option<ValidationRecord> {
        match self.measure(path) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Error while processing {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn validate_folder(&self, dir: &Path) -> Result<Vec<ValidationRecord>> {
        let paths = collect_image_paths(dir)?;
        let records: Vec<ValidationRecord> = paths
            .iter()
            .filter_map(|path| self.validate_one(path))
            .collect();

        log::info!(
            "Validated {} of {} photos in {}",
            records.len(),
            paths.len(),
            dir.display()
        );
        Ok(records)
    }

    fn measure(&self, path: &Path) -> Result<ValidationRecord> {
        let target_name = file_stem(path).ok_or_else(|| {
            PhotoToolError::InvalidParameter(format!("Invalid file name: {}", path.display()))
        })?;
        let file_size = std::fs::metadata(path)?.len();
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()?;

        Ok(ValidationRecord {
            target_name,
            file_size_kb: size_in_kb(file_size),
            width,
            height,
            ratio: calculate_aspect_ratio(width, height),
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
