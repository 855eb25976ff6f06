use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{error, info};

use super::tools::{MergeTool, ToolError};
use crate::cli::MergeFailurePolicy;
use crate::error::RecombineError;
use crate::model::{MergePair, MergedPage, PageFailure};

pub fn merged_path(merged_dir: &Path, root: &str, page: usize) -> PathBuf {
    merged_dir.join(format!("{root}-{page}-merged.png"))
}

/// Merges every pair in plan order. Failed pages are appended to `failures`
/// under either policy; `Abort` then stops at the first one.
pub fn merge_pairs(
    pairs: &[MergePair],
    merger: &dyn MergeTool,
    merged_dir: &Path,
    root: &str,
    policy: MergeFailurePolicy,
    failures: &mut Vec<PageFailure>,
) -> Result<Vec<MergedPage>> {
    let mut merged = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let destination = merged_path(merged_dir, root, pair.page);
        match merge_one(pair, merger, &destination) {
            Ok(()) => merged.push(MergedPage {
                page: pair.page,
                path: destination,
            }),
            Err(source) => {
                let failure = RecombineError::Merge {
                    page: pair.page,
                    source,
                };
                let reason = error_chain(&failure);
                failures.push(PageFailure {
                    page: pair.page,
                    stage: "merge".to_string(),
                    reason: reason.clone(),
                });
                if policy == MergeFailurePolicy::Abort {
                    return Err(failure.into());
                }

                error!(
                    page = pair.page,
                    first_scan = pair.first_scan,
                    second_scan = pair.second_scan,
                    reason = %reason,
                    "merge failed, skipping page"
                );
            }
        }
    }

    info!(
        merged = merged.len(),
        failed = failures.len(),
        "merged page pairs"
    );
    Ok(merged)
}

fn merge_one(
    pair: &MergePair,
    merger: &dyn MergeTool,
    destination: &Path,
) -> Result<(), ToolError> {
    merger.merge(&pair.first, &pair.second, destination)?;
    if !destination.is_file() {
        return Err(ToolError::MissingOutput(destination.to_path_buf()));
    }
    Ok(())
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
