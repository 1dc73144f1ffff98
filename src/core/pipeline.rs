// photo-prep/src/core/pipeline.rs
use super::{PipelineConfig, Result, ValidationRecord};
use crate::processors::{
    AdjustReport, CropReport, Cropper, Extraction, FetchReport, Fetcher, RecordExtractor,
    Reconciler, SizeAdjuster, Table, Validator,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Crop,
    Resize,
    Validate,
}

/// Where each stage writes under one root directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub downloaded: PathBuf,
    pub cropped: PathBuf,
    pub resized: PathBuf,
    pub report: PathBuf,
}

impl Workspace {
    pub fn under(root: &Path) -> Self {
        Self {
            downloaded: root.join("downloaded"),
            cropped: root.join("cropped"),
            resized: root.join("resized"),
            report: root.join("photo_validation_results.csv"),
        }
    }
}

/// Where the first stage reads from.
pub enum PipelineInput<'a> {
    Table(&'a Table),
    Directory(&'a Path),
}

#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub extraction: Option<Extraction>,
    pub fetch: Option<FetchReport>,
    pub crop: Option<CropReport>,
    pub adjust: Option<AdjustReport>,
    pub validation: Option<Vec<ValidationRecord>>,
    /// `Some(Err)` when the report could not be written.
    pub report: Option<std::result::Result<PathBuf, String>>,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> RecordExtractor {
        RecordExtractor::new(self.config.columns.clone())
    }

    pub fn fetcher(&self) -> Fetcher {
        Fetcher::new(self.config.request_delay, self.config.request_timeout)
    }

    pub fn cropper(&self) -> Cropper {
        Cropper::new(
            self.config.target_ratio,
            self.config.ratio_tolerance,
            self.config.encode_quality,
        )
    }

    pub fn size_adjuster(&self) -> SizeAdjuster {
        SizeAdjuster::new(self.config.budget)
    }

    pub fn validator(&self) -> Validator {
        Validator::new()
    }

    pub fn reconciler(&self) -> Reconciler {
        let key = &self.config.columns.photo_name;
        Reconciler::new(key.clone(), key.clone())
    }

    /// Runs `stages` in the given order, feeding each stage the previous
    /// stage's output directory. Validation writes the report, joined onto
    /// the table when the input is one.
    pub fn run(
        &self,
        input: PipelineInput<'_>,
        stages: &[Stage],
        workspace: &Workspace,
    ) -> Result<PipelineSummary> {
        let mut summary = PipelineSummary::default();
        let (table, mut current) = match input {
            PipelineInput::Table(table) => (Some(table), workspace.downloaded.clone()),
            PipelineInput::Directory(dir) => (None, dir.to_path_buf()),
        };

        for stage in stages {
            log::info!("Running stage {:?} on {}", stage, current.display());
            match stage {
                Stage::Download => {
                    let Some(table) = table else {
                        log::warn!("Download stage needs a table input, skipping");
                        continue;
                    };
                    let extraction = self.extractor().extract(table)?;
                    let fetch = self.fetcher().fetch(&extraction.records, &workspace.downloaded)?;
                    summary.extraction = Some(extraction);
                    summary.fetch = Some(fetch);
                    current = workspace.downloaded.clone();
                }
                Stage::Crop => {
                    summary.crop = Some(self.cropper().crop_folder(&current, &workspace.cropped)?);
                    current = workspace.cropped.clone();
                }
                Stage::Resize => {
                    summary.adjust =
                        Some(self.size_adjuster().adjust_folder(&current, &workspace.resized)?);
                    current = workspace.resized.clone();
                }
                Stage::Validate => {
                    let records = self.validator().validate_folder(&current)?;
                    summary.report = Some(self.write_report(&records, table, &workspace.report));
                    summary.validation = Some(records);
                }
            }
        }

        Ok(summary)
    }

    fn write_report(
        &self,
        records: &[ValidationRecord],
        table: Option<&Table>,
        path: &Path,
    ) -> std::result::Result<PathBuf, String> {
        let reconciler = self.reconciler();
        reconciler
            .reconcile(records, table)
            .and_then(|report| reconciler.write_report(&report, path))
            .map(|_| path.to_path_buf())
            .map_err(|e| {
                log::error!("Failed to save validation results: {}", e);
                e.to_string()
            })
    }
}
