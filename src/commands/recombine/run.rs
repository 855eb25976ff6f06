use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use super::contrast::{LevelAdjustment, adjust_pages};
use super::indexer::{ScanIndexer, check_extraction, list_extracted};
use super::merge::merge_pairs;
use super::pairing::{PairingStrategy, PositionalPairing};
use super::rotation::{plan_rotations, rotate_scans, rotated_path};
use super::split::{half_path, split_scans};
use super::tools::{AlignAndMerge, ImageMagick, Pdfimages, Toolchain};
use super::workspace::Workspace;
use crate::cli::{LayoutMode, MergeFailurePolicy, RecombineArgs};
use crate::error::RecombineError;
use crate::model::{
    Half, MergePair, OrientedScan, OutputPage, PageFailure, RecombineRunManifest, RunCounts,
    RunPaths, ScanImages, ScanRotation, ScanSequence, ToolVersions,
};
use crate::util::{
    ensure_directory, now_utc_string, root_name, sha256_file, utc_compact_string, write_json_pretty,
};

/// Everything one run needs; passed to each stage instead of global paths.
#[derive(Debug, Clone)]
pub struct RecombineConfig {
    pub pdf_path: PathBuf,
    pub output_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub align_and_merge: PathBuf,
    pub mode: LayoutMode,
    pub levels: LevelAdjustment,
    pub on_merge_failure: MergeFailurePolicy,
    pub dry_run: bool,
    pub command: String,
}

impl RecombineConfig {
    pub fn from_args(args: &RecombineArgs) -> Self {
        Self {
            pdf_path: args.pdf_scan.clone(),
            output_dir: args.output_dir.clone(),
            tmp_dir: args.tmp_dir.clone(),
            align_and_merge: args.align_and_merge.clone(),
            mode: args.mode,
            levels: LevelAdjustment {
                black_percent: args.black_point,
                white_percent: args.white_point,
            },
            on_merge_failure: args.on_merge_failure,
            dry_run: args.dry_run,
            command: render_recombine_command(args),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub scan_count: usize,
    pub merge_plan: Vec<MergePair>,
    pub output_pages: Vec<OutputPage>,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Default)]
struct RunRecord {
    scan_indices: Vec<u64>,
    rotations: Vec<ScanRotation>,
    merge_plan: Vec<MergePair>,
    output_pages: Vec<OutputPage>,
    failed_pages: Vec<PageFailure>,
}

pub fn run(args: RecombineArgs) -> Result<()> {
    let config = RecombineConfig::from_args(&args);

    let extractor = Pdfimages::new(&args.pdfimages_bin);
    let raster = ImageMagick::new(&args.convert_bin);
    let merger = AlignAndMerge::new(&args.align_and_merge);
    let tools = Toolchain {
        extractor: &extractor,
        raster: &raster,
        merger: &merger,
    };

    let report = run_pipeline(&config, &tools, &PositionalPairing)?;

    info!(path = %report.manifest_path.display(), "wrote recombine run manifest");
    info!(
        run_id = %report.run_id,
        scans = report.scan_count,
        pairs = report.merge_plan.len(),
        pages = report.output_pages.len(),
        dry_run = config.dry_run,
        "recombine completed"
    );

    Ok(())
}

pub fn run_pipeline(
    config: &RecombineConfig,
    tools: &Toolchain<'_>,
    pairing: &dyn PairingStrategy,
) -> Result<RunReport> {
    preflight(config)?;

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let workspace = Workspace::acquire(&config.tmp_dir)?;

    info!(
        run_id = %run_id,
        pdf = %config.pdf_path.display(),
        mode = config.mode.as_str(),
        pairing = pairing.name(),
        "starting recombine"
    );

    let mut record = RunRecord::default();
    let result = execute(config, tools, pairing, &workspace, &mut record);

    let status = match &result {
        Ok(()) if config.dry_run => "planned",
        Ok(()) => "completed",
        Err(err) => match err.downcast_ref::<RecombineError>() {
            Some(RecombineError::IncompletePages { .. }) => "incomplete",
            _ => "failed",
        },
    };

    let manifest = RecombineRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        mode: config.mode.as_str().to_string(),
        command: config.command.clone(),
        input_sha256: sha256_file(&config.pdf_path).ok(),
        failure_reason: result.as_ref().err().map(|err| format!("{err:#}")),
        tool_versions: ToolVersions {
            extractor: tools.extractor.version(),
            raster: tools.raster.version(),
        },
        paths: RunPaths {
            input_pdf: config.pdf_path.display().to_string(),
            output_dir: config.output_dir.display().to_string(),
            tmp_dir: config.tmp_dir.display().to_string(),
            align_and_merge: config.align_and_merge.display().to_string(),
        },
        counts: RunCounts {
            scan_count: record.scan_indices.len(),
            pair_count: record.merge_plan.len(),
            pages_written: record.output_pages.len(),
            pages_failed: record.failed_pages.len(),
        },
        scan_indices: record.scan_indices,
        rotations: record.rotations,
        merge_plan: record.merge_plan.clone(),
        output_pages: record.output_pages.clone(),
        failed_pages: record.failed_pages,
    };

    if let Err(write_err) = write_json_pretty(&workspace.manifest, &manifest) {
        if result.is_ok() {
            return Err(write_err);
        }
        warn!(error = %write_err, "failed to write run manifest for failed run");
    }

    result?;

    Ok(RunReport {
        run_id,
        scan_count: manifest.counts.scan_count,
        merge_plan: record.merge_plan,
        output_pages: record.output_pages,
        manifest_path: workspace.manifest.clone(),
    })
}

fn preflight(config: &RecombineConfig) -> Result<()> {
    if !config.pdf_path.is_file() {
        return Err(RecombineError::InputNotFound(config.pdf_path.clone()).into());
    }
    config.levels.validate()?;
    Ok(())
}

fn execute(
    config: &RecombineConfig,
    tools: &Toolchain<'_>,
    pairing: &dyn PairingStrategy,
    workspace: &Workspace,
    record: &mut RunRecord,
) -> Result<()> {
    let root = root_name(&config.pdf_path);
    let sequence = extract_sequence(config, tools, workspace, &root)?;
    record.scan_indices = sequence.indices();

    if config.dry_run {
        let planned = planned_images(&sequence, config.mode, workspace);
        record.merge_plan = pairing.build_pairs(&planned)?;
        for pair in &record.merge_plan {
            info!(
                page = pair.page,
                first = %pair.first.display(),
                second = %pair.second.display(),
                "planned merge"
            );
        }
        return Ok(());
    }

    let oriented = rotate_scans(
        &sequence,
        tools.raster,
        &workspace.rotated,
        &mut record.rotations,
    )?;
    let scan_images: Vec<ScanImages> = match config.mode {
        LayoutMode::SinglePage => oriented.into_iter().map(ScanImages::from).collect(),
        LayoutMode::Spread => split_scans(&oriented, tools.raster, &workspace.split)?,
    };

    record.merge_plan = pairing.build_pairs(&scan_images)?;
    info!(pairs = record.merge_plan.len(), "built merge pairs");

    let merged = merge_pairs(
        &record.merge_plan,
        tools.merger,
        &workspace.merged,
        &root,
        config.on_merge_failure,
        &mut record.failed_pages,
    )?;

    ensure_directory(&config.output_dir)?;
    if let Err(err) = adjust_pages(
        &merged,
        tools.raster,
        config.levels,
        &config.output_dir,
        &root,
        &mut record.output_pages,
    ) {
        if let Some(RecombineError::Contrast { page, .. }) = err.downcast_ref() {
            record.failed_pages.push(PageFailure {
                page: *page,
                stage: "contrast".to_string(),
                reason: format!("{err:#}"),
            });
        }
        return Err(err);
    }

    if !record.failed_pages.is_empty() {
        let pages = record
            .failed_pages
            .iter()
            .map(|failure| failure.page)
            .collect();
        return Err(RecombineError::IncompletePages { pages }.into());
    }

    Ok(())
}

fn extract_sequence(
    config: &RecombineConfig,
    tools: &Toolchain<'_>,
    workspace: &Workspace,
    root: &str,
) -> Result<ScanSequence> {
    let output_root = workspace.extracted.join(root);
    tools
        .extractor
        .extract(&config.pdf_path, &output_root)
        .map_err(RecombineError::Extraction)?;

    let files = list_extracted(&workspace.extracted)?;
    check_extraction(&workspace.extracted, files.len())?;

    let indexer = ScanIndexer::new()?;
    let sequence = indexer.build_sequence(files)?;
    info!(scans = sequence.scans().len(), "indexed extracted scans");
    Ok(sequence)
}

/// The images each scan would contribute, named as the rotate and crop
/// stages would name them.
fn planned_images(
    sequence: &ScanSequence,
    mode: LayoutMode,
    workspace: &Workspace,
) -> Vec<ScanImages> {
    sequence
        .scans()
        .iter()
        .zip(plan_rotations(sequence.scans().len()))
        .map(|(scan, rotation)| {
            let oriented = OrientedScan {
                index: scan.index,
                rotation,
                path: rotated_path(&workspace.rotated, scan),
            };
            match mode {
                LayoutMode::SinglePage => ScanImages::from(oriented),
                LayoutMode::Spread => ScanImages {
                    index: scan.index,
                    images: Half::BOTH
                        .iter()
                        .map(|half| half_path(&workspace.split, &oriented, *half))
                        .collect(),
                },
            }
        })
        .collect()
}

fn render_recombine_command(args: &RecombineArgs) -> String {
    let mut command = vec![
        "scan-recombine".to_string(),
        "recombine".to_string(),
        "--mode".to_string(),
        args.mode.as_str().to_string(),
        "--tmp-dir".to_string(),
        args.tmp_dir.display().to_string(),
    ];

    if args.pdfimages_bin != Path::new("pdfimages") {
        command.push("--pdfimages-bin".to_string());
        command.push(args.pdfimages_bin.display().to_string());
    }
    if args.convert_bin != Path::new("convert") {
        command.push("--convert-bin".to_string());
        command.push(args.convert_bin.display().to_string());
    }
    command.push("--black-point".to_string());
    command.push(args.black_point.to_string());
    command.push("--white-point".to_string());
    command.push(args.white_point.to_string());
    command.push("--on-merge-failure".to_string());
    command.push(args.on_merge_failure.as_str().to_string());
    if args.dry_run {
        command.push("--dry-run".to_string());
    }

    command.push(args.pdf_scan.display().to_string());
    command.push(args.output_dir.display().to_string());
    command.push(args.align_and_merge.display().to_string());

    command.join(" ")
}

#[cfg(test)]
pub(super) fn test_config(pdf_path: &Path, output_dir: &Path, tmp_dir: &Path) -> RecombineConfig {
    RecombineConfig {
        pdf_path: pdf_path.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        tmp_dir: tmp_dir.to_path_buf(),
        align_and_merge: PathBuf::from("align_and_merge"),
        mode: LayoutMode::SinglePage,
        levels: LevelAdjustment::default(),
        on_merge_failure: MergeFailurePolicy::SkipPage,
        dry_run: false,
        command: "scan-recombine recombine".to_string(),
    }
}
