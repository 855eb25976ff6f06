use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use super::tools::RasterToolkit;
use crate::error::RecombineError;
use crate::model::{Half, OrientedScan, ScanImages, SubPage};

fn scan_stem(scan: &OrientedScan) -> String {
    scan.path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| scan.index.to_string())
}

pub fn split_pattern(split_dir: &Path, scan: &OrientedScan) -> PathBuf {
    split_dir.join(format!("{}-split-%02d.png", scan_stem(scan)))
}

/// Where the crop tool writes `half` of `scan`, given the `%02d` pattern.
pub fn half_path(split_dir: &Path, scan: &OrientedScan, half: Half) -> PathBuf {
    split_dir.join(format!(
        "{}-split-{:02}.png",
        scan_stem(scan),
        half.position()
    ))
}

pub fn split_scans(
    scans: &[OrientedScan],
    raster: &dyn RasterToolkit,
    split_dir: &Path,
) -> Result<Vec<ScanImages>> {
    let mut split = Vec::with_capacity(scans.len());

    for scan in scans {
        raster
            .crop_halves(&scan.path, &split_pattern(split_dir, scan))
            .map_err(|source| RecombineError::Crop {
                scan: scan.index,
                reason: source.to_string(),
            })?;

        let halves = collect_halves(split_dir, scan)?;
        split.push(ScanImages::from_halves(scan.index, halves));
    }

    info!(scans = split.len(), sub_pages = split.len() * 2, "split spreads");
    Ok(split)
}

fn collect_halves(
    split_dir: &Path,
    scan: &OrientedScan,
) -> Result<Vec<SubPage>, RecombineError> {
    let mut halves = Vec::with_capacity(Half::BOTH.len());

    for half in Half::BOTH {
        let path = half_path(split_dir, scan, half);
        let non_empty = fs::metadata(&path)
            .map(|metadata| metadata.is_file() && metadata.len() > 0)
            .unwrap_or(false);
        if !non_empty {
            return Err(RecombineError::Crop {
                scan: scan.index,
                reason: format!("missing or empty half {}", path.display()),
            });
        }
        halves.push(SubPage {
            parent_index: scan.index,
            half,
            path,
        });
    }

    let extra = split_dir.join(format!("{}-split-02.png", scan_stem(scan)));
    if extra.exists() {
        return Err(RecombineError::Crop {
            scan: scan.index,
            reason: format!("crop produced more than two tiles: {}", extra.display()),
        });
    }

    Ok(halves)
}
