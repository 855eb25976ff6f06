use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One raster image deposited by the extraction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedScan {
    pub path: PathBuf,
    pub file_name: String,
    pub index: u64,
}

/// Extracted scans in ascending numeric index order.
#[derive(Debug, Clone, Default)]
pub struct ScanSequence {
    scans: Vec<ExtractedScan>,
}

impl ScanSequence {
    /// Callers must hand in scans already sorted by index with no duplicates;
    /// `indexer::build_sequence` is the only producer outside of tests.
    pub(crate) fn from_sorted(scans: Vec<ExtractedScan>) -> Self {
        Self { scans }
    }

    pub fn scans(&self) -> &[ExtractedScan] {
        &self.scans
    }

    pub fn indices(&self) -> Vec<u64> {
        self.scans.iter().map(|scan| scan.index).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Self::Clockwise => 90,
            Self::CounterClockwise => -90,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrientedScan {
    pub index: u64,
    pub rotation: Rotation,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Half {
    Left,
    Right,
}

impl Half {
    pub const BOTH: [Half; 2] = [Half::Left, Half::Right];

    pub fn position(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPage {
    pub parent_index: u64,
    pub half: Half,
    pub path: PathBuf,
}

/// The page images one scan contributes to pairing: the whole oriented scan
/// in single-page mode, its left and right halves in spread mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanImages {
    pub index: u64,
    pub images: Vec<PathBuf>,
}

impl From<OrientedScan> for ScanImages {
    fn from(scan: OrientedScan) -> Self {
        Self {
            index: scan.index,
            images: vec![scan.path],
        }
    }
}

impl ScanImages {
    pub fn from_halves(index: u64, halves: Vec<SubPage>) -> Self {
        let mut halves = halves;
        debug_assert!(halves.iter().all(|sub_page| sub_page.parent_index == index));
        halves.sort_by_key(|sub_page| sub_page.half.position());
        Self {
            index,
            images: halves.into_iter().map(|sub_page| sub_page.path).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRotation {
    pub index: u64,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePair {
    pub page: usize,
    pub first_scan: u64,
    pub second_scan: u64,
    pub image_slot: usize,
    pub first: PathBuf,
    pub second: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPage {
    pub page: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPage {
    pub page: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: usize,
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolVersions {
    pub extractor: Option<String>,
    pub raster: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub input_pdf: String,
    pub output_dir: String,
    pub tmp_dir: String,
    pub align_and_merge: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub scan_count: usize,
    pub pair_count: usize,
    pub pages_written: usize,
    pub pages_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecombineRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub mode: String,
    pub command: String,
    pub input_sha256: Option<String>,
    pub failure_reason: Option<String>,
    pub tool_versions: ToolVersions,
    pub paths: RunPaths,
    pub counts: RunCounts,
    pub scan_indices: Vec<u64>,
    pub rotations: Vec<ScanRotation>,
    pub merge_plan: Vec<MergePair>,
    pub output_pages: Vec<OutputPage>,
    pub failed_pages: Vec<PageFailure>,
}
