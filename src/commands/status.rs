use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::recombine::manifest_path;
use crate::model::RecombineRunManifest;

pub fn run(args: StatusArgs) -> Result<()> {
    let run_manifest_path = manifest_path(&args.tmp_dir);

    info!(tmp_dir = %args.tmp_dir.display(), "status requested");

    if !run_manifest_path.exists() {
        warn!(path = %run_manifest_path.display(), "run manifest missing");
        return Ok(());
    }

    let manifest = load_manifest(&run_manifest_path)?;

    info!(
        run_id = %manifest.run_id,
        status = %manifest.status,
        mode = %manifest.mode,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        input_pdf = %manifest.paths.input_pdf,
        input_sha256 = %manifest.input_sha256.clone().unwrap_or_default(),
        output_dir = %manifest.paths.output_dir,
        extractor_version = %manifest.tool_versions.extractor.clone().unwrap_or_default(),
        raster_version = %manifest.tool_versions.raster.clone().unwrap_or_default(),
        scans = manifest.counts.scan_count,
        pairs = manifest.counts.pair_count,
        pages_written = manifest.counts.pages_written,
        pages_failed = manifest.counts.pages_failed,
        "loaded run manifest"
    );

    if let Some(reason) = &manifest.failure_reason {
        warn!(reason = %reason, "last run did not complete");
    }
    for failure in &manifest.failed_pages {
        warn!(
            page = failure.page,
            stage = %failure.stage,
            reason = %failure.reason,
            "page failed"
        );
    }

    Ok(())
}

fn load_manifest(path: &Path) -> Result<RecombineRunManifest> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
