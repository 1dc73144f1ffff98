// photo-prep/src/processors/size_adjuster.rs
use crate::core::{ByteBudget, Result, StageError};
use crate::processors::compressor::{write_bytes, Compressor, MAX_QUALITY};
use crate::processors::loader::Loader;
use crate::utils::{
    collect_image_paths, create_progress_bar, jpeg_output_path, size_in_kb, validate_stage_dirs,
    OutputTracker,
};
use image::DynamicImage;
use std::path::{Path, PathBuf};

pub const QUALITY_STEP: u8 = 5;
pub const QUALITY_FLOOR: u8 = 4;
pub const FAILED_DIR: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Unfit {
    /// Below the minimum even at quality 100.
    TooSmall { size_kb: f64 },
    /// Above the maximum at the lowest quality tried.
    TooLarge { size_kb: f64, quality: u8 },
}

#[derive(Debug)]
pub enum BudgetFit {
    Fitted { bytes: Vec<u8>, quality: u8 },
    Unfit(Unfit),
}

/// Encodes at quality 100 and steps the quality down by 5 until the result
/// is no larger than `budget.max_kb`. Qualities at or below 4 are never tried.
pub fn fit_to_byte_budget(image: &DynamicImage, budget: ByteBudget) -> Result<BudgetFit> {
    let mut quality = MAX_QUALITY;
    let mut bytes = Compressor::new(quality).compress_to_bytes(image)?;
    let mut size_kb = size_in_kb(bytes.len() as u64);

    if size_kb < budget.min_kb {
        return Ok(BudgetFit::Unfit(Unfit::TooSmall { size_kb }));
    }

    while size_kb > budget.max_kb {
        if quality <= QUALITY_FLOOR + QUALITY_STEP {
            return Ok(BudgetFit::Unfit(Unfit::TooLarge { size_kb, quality }));
        }
        quality -= QUALITY_STEP;
        bytes = Compressor::new(quality).compress_to_bytes(image)?;
        size_kb = size_in_kb(bytes.len() as u64);
        log::debug!("Quality {} -> {:.2} KB", quality, size_kb);
    }

    Ok(BudgetFit::Fitted { bytes, quality })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    /// Source already in budget; written without a quality search.
    PassedThrough { reencoded: bool },
    Fitted { quality: u8 },
    Failed(Unfit),
}

#[derive(Debug, Clone)]
pub struct AdjustedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: ResizeOutcome,
}

#[derive(Debug, Default)]
pub struct AdjustReport {
    pub files: Vec<AdjustedFile>,
    pub errors: Vec<StageError>,
}

impl AdjustReport {
    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, ResizeOutcome::Failed(_)))
            .count()
    }
}

pub struct SizeAdjuster {
    budget: ByteBudget,
    loader: Loader,
}

impl SizeAdjuster {
    pub fn new(budget: ByteBudget) -> Self {
        Self {
            budget,
            loader: Loader::new(),
        }
    }

    pub fn adjust_folder(&self, input_dir: &Path, output_dir: &Path) -> Result<AdjustReport> {
        validate_stage_dirs(input_dir, output_dir)?;
        let inputs = collect_image_paths(input_dir)?;
        let failed_dir = output_dir.join(FAILED_DIR);
        std::fs::create_dir_all(&failed_dir)?;

        log::info!(
            "Fitting {} photos from {} into {:.0}-{:.0} KB",
            inputs.len(),
            input_dir.display(),
            self.budget.min_kb,
            self.budget.max_kb
        );

        let pb = create_progress_bar(inputs.len(), "resize");
        let mut tracker = OutputTracker::default();
        let mut report = AdjustReport::default();

        for input in &inputs {
            match self.adjust_file(input, output_dir, &failed_dir, &mut tracker) {
                Ok(file) => report.files.push(file),
                Err(e) => {
                    log::warn!("{}: error during processing: {}", input.display(), e);
                    report.errors.push(StageError {
                        file: input.clone(),
                        message: e.to_string(),
                    });
                }
            }
            pb.inc(1);
        }
        pb.finish_with_message(format!("{} failed", report.failed_count()));

        let failed = report.failed_count();
        if failed > 0 {
            log::warn!(
                "{} photos failed to resize and were moved to {}",
                failed,
                failed_dir.display()
            );
        } else {
            log::info!("All photos resized successfully");
        }

        Ok(report)
    }

    fn adjust_file(
        &self,
        input: &Path,
        output_dir: &Path,
        failed_dir: &Path,
        tracker: &mut OutputTracker,
    ) -> Result<AdjustedFile> {
        let photo = self.loader.load(input)?;
        let original_kb = size_in_kb(photo.source_len());
        let accepted = jpeg_output_path(output_dir, input)?;

        let (output, outcome, bytes) = if self.budget.contains(original_kb) {
            if photo.is_normalized_jpeg() {
                let outcome = ResizeOutcome::PassedThrough { reencoded: false };
                (accepted, outcome, photo.source_bytes)
            } else {
                let bytes = Compressor::new(MAX_QUALITY).compress_to_bytes(&photo.image)?;
                (accepted, ResizeOutcome::PassedThrough { reencoded: true }, bytes)
            }
        } else {
            match fit_to_byte_budget(&photo.image, self.budget)? {
                BudgetFit::Fitted { bytes, quality } => {
                    (accepted, ResizeOutcome::Fitted { quality }, bytes)
                }
                BudgetFit::Unfit(unfit) => {
                    log::warn!("{}: does not fit the byte budget: {:?}", input.display(), unfit);
                    let bytes = Compressor::new(MAX_QUALITY).compress_to_bytes(&photo.image)?;
                    let output = jpeg_output_path(failed_dir, input)?;
                    (output, ResizeOutcome::Failed(unfit), bytes)
                }
            }
        };

        tracker.claim(&output, input);
        write_bytes(&output, &bytes)?;

        Ok(AdjustedFile {
            input: input.to_path_buf(),
            output,
            outcome,
        })
    }
}
