// photo-prep/src/core/mod.rs
pub mod pipeline;

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TARGET_RATIO: f64 = 0.75;
pub const DEFAULT_RATIO_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MIN_KB: f64 = 50.0;
pub const DEFAULT_MAX_KB: f64 = 1024.0;

/// Names of the three source columns a record is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub id: String,
    pub url: String,
    pub photo_name: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "Confirmation_Number".to_string(),
            url: "Image_URL".to_string(),
            photo_name: "Photo_Name".to_string(),
        }
    }
}

/// Acceptable encoded file size range, in KB (1 KB = 1024 bytes), inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ByteBudget {
    pub min_kb: f64,
    pub max_kb: f64,
}

impl ByteBudget {
    pub fn new(min_kb: f64, max_kb: f64) -> Self {
        Self { min_kb, max_kb }
    }

    pub fn contains(&self, size_kb: f64) -> bool {
        self.min_kb <= size_kb && size_kb <= self.max_kb
    }
}

impl Default for ByteBudget {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_KB, DEFAULT_MAX_KB)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub columns: ColumnNames,
    pub target_ratio: f64,
    pub ratio_tolerance: f64,
    pub budget: ByteBudget,
    pub encode_quality: u8,
    pub request_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            target_ratio: DEFAULT_TARGET_RATIO,
            ratio_tolerance: DEFAULT_RATIO_TOLERANCE,
            budget: ByteBudget::default(),
            encode_quality: 95,
            request_delay: Duration::from_millis(200),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.target_ratio.is_finite() || self.target_ratio <= 0.0 {
            return Err(PhotoToolError::InvalidParameter(format!(
                "Target ratio must be a positive number, got {}",
                self.target_ratio
            )));
        }

        if !self.ratio_tolerance.is_finite() || self.ratio_tolerance < 0.0 {
            return Err(PhotoToolError::InvalidParameter(
                "Ratio tolerance cannot be negative".to_string(),
            ));
        }

        if self.budget.min_kb < 0.0 || self.budget.max_kb < 0.0 {
            return Err(PhotoToolError::InvalidParameter(
                "Byte budget bounds cannot be negative".to_string(),
            ));
        }

        if self.budget.min_kb > self.budget.max_kb {
            return Err(PhotoToolError::InvalidParameter(format!(
                "Minimum size {} KB exceeds maximum size {} KB",
                self.budget.min_kb, self.budget.max_kb
            )));
        }

        if self.encode_quality == 0 || self.encode_quality > 100 {
            return Err(PhotoToolError::InvalidParameter(
                "Quality must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

/// One row of the source table, reduced to what the fetcher needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub identifier: String,
    pub source_url: String,
    pub target_name: String,
}

/// Measurements of one image on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    pub target_name: String,
    pub file_size_kb: f64,
    pub width: u32,
    pub height: u32,
    pub ratio: Option<f64>,
}

/// A file a folder stage could not process.
#[derive(Debug, Clone)]
pub struct StageError {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum PhotoToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Column not found in table: {0}")]
    MissingColumn(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

pub type Result<T> = std::result::Result<T, PhotoToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_budget() {
        let config = PipelineConfig {
            budget: ByteBudget::new(200.0, 100.0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PhotoToolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_zero_ratio_and_quality() {
        let config = PipelineConfig {
            target_ratio: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            encode_quality: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn budget_bounds_are_inclusive() {
        let budget = ByteBudget::new(50.0, 1024.0);
        assert!(budget.contains(50.0));
        assert!(budget.contains(1024.0));
        assert!(!budget.contains(49.99));
        assert!(!budget.contains(1024.01));
    }
}
