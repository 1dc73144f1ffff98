// photo-prep/src/cli.rs
use crate::core::pipeline::Stage;
use crate::core::{
    ByteBudget, ColumnNames, PipelineConfig, DEFAULT_MAX_KB, DEFAULT_MIN_KB, DEFAULT_TARGET_RATIO,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "photo-prep", version, about = "Download, crop, resize and validate profile photos")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the photos listed in a CSV table
    Download {
        /// CSV or Excel file with one row per photo
        #[arg(short, long)]
        input: PathBuf,
        /// Worksheet to read from a workbook table (default: the first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Directory to save downloaded photos
        #[arg(short, long, default_value = "photos/downloaded")]
        output: PathBuf,
        /// Also validate the downloads and write a report joined onto the table
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Crop every photo in a directory to a width/height ratio
    Crop {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TARGET_RATIO)]
        ratio: f64,
        /// JPEG quality of cropped output (1-100)
        #[arg(short, long, default_value_t = 95)]
        quality: u8,
    },
    /// Re-encode photos so their file size falls within a KB range
    Resize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Measure photos and write a CSV report
    Validate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, default_value = "data/output_reports/photo_validation_results.csv")]
        report: PathBuf,
        /// Original table to left-join the measurements onto
        #[arg(short, long)]
        table: Option<PathBuf>,
        /// Worksheet to read from a workbook table (default: the first sheet)
        #[arg(long)]
        sheet: Option<String>,
        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Run several stages in order, each reading the previous stage's output
    Run {
        /// CSV or Excel table to download from (required for the download stage)
        #[arg(short, long, conflicts_with = "input_dir")]
        table: Option<PathBuf>,
        /// Worksheet to read from a workbook table (default: the first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Start from an existing photo directory instead of a table
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Root directory for stage outputs and the report
        #[arg(short, long, default_value = "photo_prep_output")]
        workdir: PathBuf,
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            default_values = ["download", "crop", "resize", "validate"]
        )]
        stages: Vec<StageArg>,
        #[arg(long, default_value_t = DEFAULT_TARGET_RATIO)]
        ratio: f64,
        #[command(flatten)]
        columns: ColumnArgs,
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        budget: BudgetArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ColumnArgs {
    #[arg(long, default_value = "Confirmation_Number")]
    pub id_column: String,
    #[arg(long, default_value = "Image_URL")]
    pub url_column: String,
    #[arg(long, default_value = "Photo_Name")]
    pub name_column: String,
}

impl ColumnArgs {
    pub fn to_columns(&self) -> ColumnNames {
        ColumnNames {
            id: self.id_column.clone(),
            url: self.url_column.clone(),
            photo_name: self.name_column.clone(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Pause before each request, in milliseconds
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,
    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct BudgetArgs {
    #[arg(long, default_value_t = DEFAULT_MIN_KB)]
    pub min_kb: f64,
    #[arg(long, default_value_t = DEFAULT_MAX_KB)]
    pub max_kb: f64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageArg {
    Download,
    Crop,
    Resize,
    Validate,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Download => Stage::Download,
            StageArg::Crop => Stage::Crop,
            StageArg::Resize => Stage::Resize,
            StageArg::Validate => Stage::Validate,
        }
    }
}

impl Commands {
    /// Pipeline settings for this command, defaults for anything it doesn't set.
    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        match self {
            Commands::Download { columns, fetch, .. } => {
                config.columns = columns.to_columns();
                apply_fetch(&mut config, fetch);
            }
            Commands::Crop { ratio, quality, .. } => {
                config.target_ratio = *ratio;
                config.encode_quality = *quality;
            }
            Commands::Resize { budget, .. } => {
                config.budget = ByteBudget::new(budget.min_kb, budget.max_kb);
            }
            Commands::Validate { columns, .. } => {
                config.columns = columns.to_columns();
            }
            Commands::Run {
                ratio,
                columns,
                fetch,
                budget,
                ..
            } => {
                config.target_ratio = *ratio;
                config.columns = columns.to_columns();
                config.budget = ByteBudget::new(budget.min_kb, budget.max_kb);
                apply_fetch(&mut config, fetch);
            }
        }
        config
    }
}

fn apply_fetch(config: &mut PipelineConfig, fetch: &FetchArgs) {
    config.request_delay = Duration::from_millis(fetch.delay_ms);
    config.request_timeout = Duration::from_secs(fetch.timeout_secs);
}
