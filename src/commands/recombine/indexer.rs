use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::RecombineError;
use crate::model::{ExtractedScan, ScanSequence};

/// Recovers scan order from extracted file names.
pub struct ScanIndexer {
    digits: Regex,
}

impl ScanIndexer {
    pub fn new() -> Result<Self> {
        let digits = Regex::new(r"\d+").context("failed to compile scan index regex")?;
        Ok(Self { digits })
    }

    /// Returns the last run of digits in `file_name`, e.g. `book2-010.jpg` -> 10.
    pub fn scan_index(&self, file_name: &str) -> Result<u64, RecombineError> {
        self.digits
            .find_iter(file_name)
            .last()
            .and_then(|found| found.as_str().parse::<u64>().ok())
            .ok_or_else(|| RecombineError::MalformedName(file_name.to_string()))
    }

    pub fn build_sequence(&self, paths: Vec<PathBuf>) -> Result<ScanSequence, RecombineError> {
        let mut scans = Vec::with_capacity(paths.len());
        for path in paths {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| RecombineError::MalformedName(path.display().to_string()))?;
            let index = self.scan_index(&file_name)?;
            scans.push(ExtractedScan {
                path,
                file_name,
                index,
            });
        }

        scans.sort_by_key(|scan| scan.index);

        if let Some(pair) = scans.windows(2).find(|pair| pair[0].index == pair[1].index) {
            return Err(RecombineError::DuplicateScanIndex {
                index: pair[0].index,
                first: pair[0].file_name.clone(),
                second: pair[1].file_name.clone(),
            });
        }

        Ok(ScanSequence::from_sorted(scans))
    }
}

/// Lists the regular files the extraction step left in `dir`, sorted by name.
pub fn list_extracted(dir: &Path) -> Result<Vec<PathBuf>, RecombineError> {
    let io_error = |source: std::io::Error| RecombineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|source| RecombineError::Io {
            path: path.clone(),
            source,
        })?;

        if file_type.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub fn check_extraction(dir: &Path, scan_count: usize) -> Result<(), RecombineError> {
    if scan_count == 0 {
        return Err(RecombineError::NoImagesExtracted(dir.to_path_buf()));
    }
    if scan_count % 2 == 1 {
        return Err(RecombineError::OddScanCount(scan_count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer() -> ScanIndexer {
        ScanIndexer::new().expect("regex should compile")
    }

    #[test]
    fn scan_index_uses_trailing_digit_run() {
        let indexer = indexer();
        assert_eq!(indexer.scan_index("scan-2.jpg").expect("index"), 2);
        assert_eq!(indexer.scan_index("book2019-007.ppm").expect("index"), 7);
        assert_eq!(indexer.scan_index("foo123-001.png").expect("index"), 1);
        assert_eq!(indexer.scan_index("page42").expect("index"), 42);
    }

    #[test]
    fn scan_index_rejects_names_without_digits() {
        let err = indexer().scan_index("cover.jpg").expect_err("no digits");
        assert!(matches!(err, RecombineError::MalformedName(name) if name == "cover.jpg"));
    }

    #[test]
    fn scan_index_rejects_overflowing_digit_runs() {
        let err = indexer()
            .scan_index("scan-99999999999999999999999.jpg")
            .expect_err("overflow");
        assert!(matches!(err, RecombineError::MalformedName(_)));
    }

    #[test]
    fn build_sequence_sorts_numerically() {
        let paths = ["scan-10.jpg", "scan-2.jpg", "scan-1.jpg", "scan-100.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let sequence = indexer().build_sequence(paths).expect("sequence");
        assert_eq!(sequence.indices(), vec![1, 2, 10, 100]);
        assert_eq!(sequence.scans()[1].file_name, "scan-2.jpg");
        assert_eq!(sequence.scans()[2].file_name, "scan-10.jpg");
    }

    #[test]
    fn build_sequence_keeps_sparse_indices() {
        let paths = ["b-0007.jpg", "b-0003.jpg"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let sequence = indexer().build_sequence(paths).expect("sequence");
        assert_eq!(sequence.indices(), vec![3, 7]);
    }

    #[test]
    fn build_sequence_rejects_duplicate_indices() {
        let paths = ["scan-01.jpg", "scan-1.ppm"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let err = indexer().build_sequence(paths).expect_err("duplicate");
        assert!(matches!(err, RecombineError::DuplicateScanIndex { index: 1, .. }));
    }

    #[test]
    fn check_extraction_requires_even_non_empty_set() {
        let dir = Path::new("/tmp/extracted");
        assert!(matches!(
            check_extraction(dir, 0),
            Err(RecombineError::NoImagesExtracted(_))
        ));
        assert!(matches!(
            check_extraction(dir, 3),
            Err(RecombineError::OddScanCount(3))
        ));
        assert!(check_extraction(dir, 4).is_ok());
    }

    #[test]
    fn list_extracted_skips_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("book-001.jpg"), b"x").expect("write");
        fs::write(dir.path().join("book-000.jpg"), b"x").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let files = list_extracted(dir.path()).expect("list");
        assert_eq!(
            files,
            vec![
                dir.path().join("book-000.jpg"),
                dir.path().join("book-001.jpg")
            ]
        );
    }

    #[test]
    fn list_extracted_names_unreadable_dir() {
        let base = tempfile::tempdir().expect("tempdir");
        let missing = base.path().join("extracted");

        let err = list_extracted(&missing).expect_err("missing dir");
        assert!(matches!(err, RecombineError::Io { path, .. } if path == missing));
    }
}
