// photo-prep/src/utils/mod.rs
use crate::core::{PhotoToolError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
pub const OUTPUT_EXTENSION: &str = "jpg";

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn size_in_kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

/// Width over height, or `None` for a zero height.
pub fn calculate_aspect_ratio(width: u32, height: u32) -> Option<f64> {
    if height == 0 {
        None
    } else {
        Some(width as f64 / height as f64)
    }
}

pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

/// Supported images directly inside `dir`, ordered by file name.
pub fn collect_image_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PhotoToolError::InvalidParameter(format!(
            "Input directory does not exist: {}",
            dir.display()
        )));
    }

    let paths = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_supported_format(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    Ok(paths)
}

/// Output location for `input` inside `output_dir`: same stem, JPEG extension.
pub fn jpeg_output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = file_stem(input).ok_or_else(|| {
        PhotoToolError::InvalidParameter(format!("Invalid file name: {}", input.display()))
    })?;
    Ok(output_dir.join(format!("{}.{}", stem, OUTPUT_EXTENSION)))
}

/// Rejects directory pairs a folder stage cannot safely run on.
pub fn validate_stage_dirs(input_dir: &Path, output_dir: &Path) -> Result<()> {
    if !input_dir.is_dir() {
        return Err(PhotoToolError::InvalidParameter(format!(
            "Input path is not a directory: {}",
            input_dir.display()
        )));
    }

    if output_dir.exists() && !output_dir.is_dir() {
        return Err(PhotoToolError::InvalidParameter(format!(
            "Output path exists but is not a directory: {}",
            output_dir.display()
        )));
    }

    if input_dir == output_dir {
        return Err(PhotoToolError::InvalidParameter(
            "Input and output directories cannot be the same".to_string(),
        ));
    }

    Ok(())
}

/// Tracks output paths written during one stage run so overwrites get logged.
#[derive(Default)]
pub struct OutputTracker {
    seen: HashSet<PathBuf>,
}

impl OutputTracker {
    pub fn claim(&mut self, output: &Path, input: &Path) {
        if !self.seen.insert(output.to_path_buf()) {
            log::warn!(
                "{} overwrites an earlier output at {}",
                input.display(),
                output.display()
            );
        }
    }
}

pub fn create_progress_bar(total: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb.set_prefix(label.to_string());
    pb
}
