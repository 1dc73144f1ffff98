use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use photo_prep::{
    format_file_size, Cli, Commands, FetchReport, Pipeline, PipelineInput, PipelineSummary,
    Stage, Table, Workspace, FAILED_DIR,
};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let pipeline = Pipeline::new(cli.command.config()).context("invalid settings")?;

    match &cli.command {
        Commands::Download {
            input,
            sheet,
            output,
            report,
            ..
        } => process_download(&pipeline, input, sheet.as_deref(), output, report.as_deref()),
        Commands::Crop { input, output, .. } => process_crop(&pipeline, input, output),
        Commands::Resize { input, output, .. } => process_resize(&pipeline, input, output),
        Commands::Validate {
            input,
            report,
            table,
            sheet,
            ..
        } => process_validate(&pipeline, input, report, table.as_deref(), sheet.as_deref()),
        Commands::Run {
            table,
            sheet,
            input_dir,
            workdir,
            stages,
            ..
        } => {
            let stages: Vec<Stage> = stages.iter().map(|s| Stage::from(*s)).collect();
            let table = table.as_deref().map(|path| (path, sheet.as_deref()));
            process_run(&pipeline, table, input_dir.as_deref(), workdir, &stages)
        }
    }
}

fn load_table(path: &Path, sheet: Option<&str>) -> anyhow::Result<Table> {
    Table::from_path(path, sheet)
        .with_context(|| format!("failed to load table {}", path.display()))
}

fn process_download(
    pipeline: &Pipeline,
    input: &Path,
    sheet: Option<&str>,
    output: &Path,
    report: Option<&Path>,
) -> anyhow::Result<()> {
    let table = load_table(input, sheet)?;
    let extraction = pipeline.extractor().extract(&table)?;
    for skip in &extraction.skipped {
        println!("Skipped row {}: {:?}", skip.row, skip.reason);
    }

    println!("Downloading {} photos...", extraction.records.len());
    let fetch = pipeline.fetcher().fetch(&extraction.records, output)?;
    print_fetch(&fetch);

    if let Some(report) = report {
        println!("Validating the downloaded photos...");
        let records = pipeline.validator().validate_folder(output)?;
        let reconciler = pipeline.reconciler();
        let joined = reconciler.reconcile(&records, Some(&table))?;
        match reconciler.write_report(&joined, report) {
            Ok(()) => println!("Validation results saved to {}", report.display()),
            Err(e) => eprintln!("Failed to save validation results: {}", e),
        }
    }

    Ok(())
}

fn process_crop(pipeline: &Pipeline, input: &Path, output: &Path) -> anyhow::Result<()> {
    let report = pipeline.cropper().crop_folder(input, output)?;
    println!(
        "Cropped {} photos to {} ({} failed)",
        report.cropped.len(),
        output.display(),
        report.errors.len()
    );
    for error in &report.errors {
        println!("  {}: {}", error.file.display(), error.message);
    }
    Ok(())
}

fn process_resize(pipeline: &Pipeline, input: &Path, output: &Path) -> anyhow::Result<()> {
    let report = pipeline.size_adjuster().adjust_folder(input, output)?;

    for file in &report.files {
        let size = std::fs::metadata(&file.output).map(|m| m.len()).unwrap_or(0);
        log::debug!(
            "{} -> {} ({}, {:?})",
            file.input.display(),
            file.output.display(),
            format_file_size(size),
            file.outcome
        );
    }

    println!(
        "Resized photos saved to {} ({} ok)",
        output.display(),
        report.files.len() - report.failed_count()
    );
    let failed = report.failed_count();
    if failed > 0 {
        println!(
            "{} photos failed to resize and were moved to {}",
            failed,
            output.join(FAILED_DIR).display()
        );
    }
    for error in &report.errors {
        println!("  {}: {}", error.file.display(), error.message);
    }
    Ok(())
}

fn process_validate(
    pipeline: &Pipeline,
    input: &Path,
    report: &Path,
    table: Option<&Path>,
    sheet: Option<&str>,
) -> anyhow::Result<()> {
    let table = table.map(|path| load_table(path, sheet)).transpose()?;
    let records = pipeline.validator().validate_folder(input)?;
    println!("Validated {} photos in {}", records.len(), input.display());

    let reconciler = pipeline.reconciler();
    let joined = reconciler.reconcile(&records, table.as_ref())?;
    match reconciler.write_report(&joined, report) {
        Ok(()) => println!("Validation results saved to {}", report.display()),
        Err(e) => eprintln!("Failed to save validation results: {}", e),
    }
    Ok(())
}

fn process_run(
    pipeline: &Pipeline,
    table: Option<(&Path, Option<&str>)>,
    input_dir: Option<&Path>,
    workdir: &Path,
    stages: &[Stage],
) -> anyhow::Result<()> {
    let workspace = Workspace::under(workdir);
    let loaded = table
        .map(|(path, sheet)| load_table(path, sheet))
        .transpose()?;

    let input = match (&loaded, input_dir) {
        (Some(table), _) => PipelineInput::Table(table),
        (None, Some(dir)) => PipelineInput::Directory(dir),
        (None, None) => bail!("either --table or --input-dir is required"),
    };

    let summary = pipeline.run(input, stages, &workspace)?;
    print_summary(&summary);
    Ok(())
}

fn print_fetch(fetch: &FetchReport) {
    if fetch.failures.is_empty() {
        println!("All {} photos downloaded successfully.", fetch.downloaded.len());
        return;
    }

    println!("{} photo downloads failed:", fetch.failures.len());
    for failure in &fetch.failures {
        println!(
            "  {} (ID: {}) {}: {}",
            failure.record.target_name,
            failure.record.identifier,
            failure.record.source_url,
            failure.cause
        );
    }
}

fn print_summary(summary: &PipelineSummary) {
    if let Some(extraction) = &summary.extraction {
        println!(
            "Extracted {} records ({} rows skipped)",
            extraction.records.len(),
            extraction.skipped.len()
        );
    }
    if let Some(fetch) = &summary.fetch {
        print_fetch(fetch);
    }
    if let Some(crop) = &summary.crop {
        println!("Cropped {} photos ({} failed)", crop.cropped.len(), crop.errors.len());
    }
    if let Some(adjust) = &summary.adjust {
        println!(
            "Resized {} photos, {} moved to {}/",
            adjust.files.len() - adjust.failed_count(),
            adjust.failed_count(),
            FAILED_DIR
        );
    }
    if let Some(records) = &summary.validation {
        println!("Validated {} photos", records.len());
    }
    match &summary.report {
        Some(Ok(path)) => println!("Validation results saved to {}", path.display()),
        Some(Err(e)) => eprintln!("Failed to save validation results: {}", e),
        None => {}
    }
}
