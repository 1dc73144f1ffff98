// photo-prep/src/processors/cropper.rs
use crate::core::{Result, StageError};
use crate::processors::compressor::Compressor;
use crate::processors::loader::Loader;
use crate::utils::{
    collect_image_paths, create_progress_bar, jpeg_output_path, validate_stage_dirs, OutputTracker,
};
use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

/// Axis-aligned crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Centered box with the target width/height ratio, or `None` when the
/// current ratio is already within `tolerance` of it.
pub fn crop_box(width: u32, height: u32, target_ratio: f64, tolerance: f64) -> Option<CropBox> {
    if width == 0 || height == 0 {
        return None;
    }

    let current_ratio = width as f64 / height as f64;
    if (current_ratio - target_ratio).abs() < tolerance {
        return None;
    }

    if current_ratio > target_ratio {
        let new_width = ((height as f64 * target_ratio).round() as u32).clamp(1, width);
        Some(CropBox {
            x: (width - new_width) / 2,
            y: 0,
            width: new_width,
            height,
        })
    } else {
        let new_height = ((width as f64 / target_ratio).round() as u32).clamp(1, height);
        Some(CropBox {
            x: 0,
            y: (height - new_height) / 2,
            width,
            height: new_height,
        })
    }
}

#[derive(Debug, Default)]
pub struct CropReport {
    pub cropped: Vec<PathBuf>,
    pub errors: Vec<StageError>,
}

pub struct Cropper {
    target_ratio: f64,
    tolerance: f64,
    loader: Loader,
    compressor: Compressor,
}

impl Cropper {
    pub fn new(target_ratio: f64, tolerance: f64, quality: u8) -> Self {
        Self {
            target_ratio,
            tolerance,
            loader: Loader::new(),
            compressor: Compressor::new(quality),
        }
    }

    pub fn crop_to_ratio(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        match crop_box(width, height, self.target_ratio, self.tolerance) {
            Some(b) => {
                log::debug!(
                    "Cropping {}x{} to {}x{} at ({}, {})",
                    width,
                    height,
                    b.width,
                    b.height,
                    b.x,
                    b.y
                );
                image.crop_imm(b.x, b.y, b.width, b.height)
            }
            None => image,
        }
    }

    pub fn crop_folder(&self, input_dir: &Path, output_dir: &Path) -> Result<CropReport> {
        validate_stage_dirs(input_dir, output_dir)?;
        let inputs = collect_image_paths(input_dir)?;
        std::fs::create_dir_all(output_dir)?;

        log::info!(
            "Cropping {} photos in {} to aspect ratio {}",
            inputs.len(),
            input_dir.display(),
            self.target_ratio
        );

        let pb = create_progress_bar(inputs.len(), "crop");
        let mut tracker = OutputTracker::default();
        let mut report = CropReport::default();

        for input in &inputs {
            match self.crop_file(input, output_dir, &mut tracker) {
                Ok(path) => report.cropped.push(path),
                Err(e) => {
                    log::warn!("Failed to crop {}: {}", input.display(), e);
                    report.errors.push(StageError {
                        file: input.clone(),
                        message: e.to_string(),
                    });
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message(format!("{} cropped", report.cropped.len()));
        Ok(report)
    }

    fn crop_file(
        &self,
        input: &Path,
        output_dir: &Path,
        tracker: &mut OutputTracker,
    ) -> Result<PathBuf> {
        let output = jpeg_output_path(output_dir, input)?;
        let photo = self.loader.load(input)?;
        let cropped = self.crop_to_ratio(photo.image);

        tracker.claim(&output, input);
        self.compressor.save(&cropped, &output)?;
        Ok(output)
    }
}
