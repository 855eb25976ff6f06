use std::iter::successors;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use super::tools::RasterToolkit;
use crate::error::RecombineError;
use crate::model::{ExtractedScan, OrientedScan, Rotation, ScanRotation, ScanSequence};

/// Every other scan was fed the other way round, so directions alternate by
/// position, starting clockwise.
pub fn plan_rotations(count: usize) -> Vec<Rotation> {
    successors(Some(Rotation::Clockwise), |rotation| Some(rotation.flipped()))
        .take(count)
        .collect()
}

pub fn rotated_path(rotated_dir: &Path, scan: &ExtractedScan) -> PathBuf {
    let stem = Path::new(&scan.file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| scan.index.to_string());
    rotated_dir.join(format!("{stem}.png"))
}

/// Rotates every scan in order. Each finished rotation is appended to
/// `applied` as it lands, so a failure part-way leaves the completed ones on
/// record.
pub fn rotate_scans(
    sequence: &ScanSequence,
    raster: &dyn RasterToolkit,
    rotated_dir: &Path,
    applied: &mut Vec<ScanRotation>,
) -> Result<Vec<OrientedScan>> {
    let rotations = plan_rotations(sequence.scans().len());
    let mut oriented = Vec::with_capacity(rotations.len());

    for (scan, rotation) in sequence.scans().iter().zip(rotations) {
        let destination = rotated_path(rotated_dir, scan);
        raster
            .rotate(&scan.path, rotation.degrees(), &destination)
            .map_err(|source| RecombineError::Rotate {
                scan: scan.index,
                source,
            })?;

        applied.push(ScanRotation {
            index: scan.index,
            rotation,
        });
        oriented.push(OrientedScan {
            index: scan.index,
            rotation,
            path: destination,
        });
    }

    info!(scans = oriented.len(), "rotated scans");
    Ok(oriented)
}
