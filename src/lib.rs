mod cli;
mod core;
mod processors;
mod utils;

pub use cli::{Cli, Commands, StageArg};
pub use crate::core::pipeline::{Pipeline, PipelineInput, PipelineSummary, Stage, Workspace};
pub use crate::core::{
    ByteBudget, ColumnNames, PhotoToolError, PipelineConfig, ProfileRecord,
    Result, StageError, ValidationRecord,
};
pub use processors::{
    crop_box, fit_to_byte_budget, AdjustReport, AdjustedFile, BudgetFit, Compressor, CropBox,
    CropReport, Cropper, Extraction, FetchErrorKind, FetchFailure, FetchReport, Fetcher,
    LoadedPhoto, Loader, MetadataProcessor, Reconciler, RecordExtractor, ResizeOutcome, RowSkip,
    SizeAdjuster, SkipReason, Table, Unfit, Validator, FAILED_DIR, MAX_QUALITY,
    MEASUREMENT_COLUMNS,
};
pub use utils::{
    calculate_aspect_ratio, collect_image_paths, format_file_size, is_supported_format,
    size_in_kb,
};

pub mod prelude {
    pub use crate::{
        Cropper, Fetcher, Pipeline, PipelineConfig, Reconciler, RecordExtractor, SizeAdjuster,
        Stage, Table, Validator, Workspace,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
