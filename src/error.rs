use std::path::PathBuf;

use thiserror::Error;

use crate::commands::recombine::ToolError;

#[derive(Error, Debug)]
pub enum RecombineError {
    #[error("the pdf file {} doesn't exist", .0.display())]
    InputNotFound(PathBuf),

    #[error("invalid level adjustment: black point {black}% must be below white point {white}% within 0..=100")]
    InvalidLevels { black: f32, white: f32 },

    #[error("temp directory {} has no final path component to lock", .0.display())]
    InvalidTmpDir(PathBuf),

    #[error("temp directory {} is locked by another run (lock file {})", .tmp_dir.display(), .lock_path.display())]
    WorkspaceBusy { tmp_dir: PathBuf, lock_path: PathBuf },

    #[error("image extraction failed")]
    Extraction(#[source] ToolError),

    #[error("no images extracted into {}", .0.display())]
    NoImagesExtracted(PathBuf),

    #[error("odd number of scans: {0}")]
    OddScanCount(usize),

    #[error("file name has no numeric index: {0}")]
    MalformedName(String),

    #[error("scan index {index} appears in both {first} and {second}")]
    DuplicateScanIndex {
        index: u64,
        first: String,
        second: String,
    },

    #[error("pairing failed: {0}")]
    Pairing(String),

    #[error("rotation failed for scan {scan}")]
    Rotate {
        scan: u64,
        #[source]
        source: ToolError,
    },

    #[error("crop failed for scan {scan}: {reason}")]
    Crop { scan: u64, reason: String },

    #[error("merge failed for page {page}")]
    Merge {
        page: usize,
        #[source]
        source: ToolError,
    },

    #[error("level adjustment failed for page {page}")]
    Contrast {
        page: usize,
        #[source]
        source: ToolError,
    },

    #[error("pages not produced: {pages:?}")]
    IncompletePages { pages: Vec<usize> },

    #[error("i/o error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
