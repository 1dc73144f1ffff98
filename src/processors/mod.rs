// photo-prep/src/processors/mod.rs
mod compressor;
mod cropper;
mod extractor;
mod fetcher;
mod loader;
mod metadata;
mod reconciler;
mod size_adjuster;
mod validator;

pub use compressor::{Compressor, MAX_QUALITY};
pub use cropper::{crop_box, CropBox, CropReport, Cropper};
pub use extractor::{Extraction, RecordExtractor, RowSkip, SkipReason, Table};
pub use fetcher::{FetchErrorKind, FetchFailure, FetchReport, Fetcher};
pub use loader::{LoadedPhoto, Loader};
pub use metadata::MetadataProcessor;
pub use reconciler::{Reconciler, MEASUREMENT_COLUMNS};
pub use size_adjuster::{
    fit_to_byte_budget, AdjustReport, AdjustedFile, BudgetFit, ResizeOutcome, SizeAdjuster, Unfit,
    FAILED_DIR,
};
pub use validator::Validator;

pub mod prelude {
    pub use super::{Cropper, Fetcher, RecordExtractor, Reconciler, SizeAdjuster, Validator};
}
