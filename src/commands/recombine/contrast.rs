use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use super::tools::RasterToolkit;
use crate::error::RecombineError;
use crate::model::{MergedPage, OutputPage};

/// Linear intensity remap: input below `black_percent` goes to black, above
/// `white_percent` to white.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelAdjustment {
    pub black_percent: f32,
    pub white_percent: f32,
}

impl Default for LevelAdjustment {
    fn default() -> Self {
        Self {
            black_percent: 14.0,
            white_percent: 86.0,
        }
    }
}

impl LevelAdjustment {
    pub fn validate(&self) -> Result<(), RecombineError> {
        let in_range = |value: f32| (0.0..=100.0).contains(&value);
        if in_range(self.black_percent)
            && in_range(self.white_percent)
            && self.black_percent < self.white_percent
        {
            Ok(())
        } else {
            Err(RecombineError::InvalidLevels {
                black: self.black_percent,
                white: self.white_percent,
            })
        }
    }
}

pub fn output_page_path(output_dir: &Path, root: &str, page: usize) -> PathBuf {
    output_dir.join(format!("{root}-{page}.jpg"))
}

/// Writes one output page per merged page, appending each to `written`
/// once the level tool has produced it.
pub fn adjust_pages(
    merged: &[MergedPage],
    raster: &dyn RasterToolkit,
    levels: LevelAdjustment,
    output_dir: &Path,
    root: &str,
    written: &mut Vec<OutputPage>,
) -> Result<()> {
    for page in merged {
        let destination = output_page_path(output_dir, root, page.page);
        raster
            .level(
                &page.path,
                levels.black_percent,
                levels.white_percent,
                &destination,
            )
            .map_err(|source| RecombineError::Contrast {
                page: page.page,
                source,
            })?;
        written.push(OutputPage {
            page: page.page,
            path: destination,
        });
    }

    info!(pages = merged.len(), "adjusted levels");
    Ok(())
}
