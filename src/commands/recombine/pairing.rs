use crate::error::RecombineError;
use crate::model::{MergePair, ScanImages};

/// Decides which two images are duplicates of the same page.
pub trait PairingStrategy {
    fn name(&self) -> &'static str;

    fn build_pairs(&self, scans: &[ScanImages]) -> Result<Vec<MergePair>, RecombineError>;
}

/// Trusts scan order: scans `2k` and `2k+1` hold the same content, and image
/// slot `j` of one matches slot `j` of the other. Nothing is verified
/// against pixel content.
///
/// With `h` images per scan, the pair built from slot `j` of scan pair `k`
/// becomes output page `k * h + j`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionalPairing;

impl PairingStrategy for PositionalPairing {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn build_pairs(&self, scans: &[ScanImages]) -> Result<Vec<MergePair>, RecombineError> {
        if scans.len() % 2 == 1 {
            return Err(RecombineError::Pairing(format!(
                "cannot pair an odd number of scans ({})",
                scans.len()
            )));
        }

        let images_per_scan = scans.first().map(|scan| scan.images.len()).unwrap_or(0);
        if let Some(scan) = scans.iter().find(|scan| scan.images.len() != images_per_scan) {
            return Err(RecombineError::Pairing(format!(
                "scan {} has {} images, expected {}",
                scan.index,
                scan.images.len(),
                images_per_scan
            )));
        }
        if images_per_scan == 0 && !scans.is_empty() {
            return Err(RecombineError::Pairing(
                "scans carry no page images".to_string(),
            ));
        }

        let mut pairs = Vec::with_capacity(scans.len() / 2 * images_per_scan);
        for (pair_number, scan_pair) in scans.chunks_exact(2).enumerate() {
            let (first, second) = (&scan_pair[0], &scan_pair[1]);
            for slot in 0..images_per_scan {
                pairs.push(MergePair {
                    page: pair_number * images_per_scan + slot,
                    first_scan: first.index,
                    second_scan: second.index,
                    image_slot: slot,
                    first: first.images[slot].clone(),
                    second: second.images[slot].clone(),
                });
            }
        }

        Ok(pairs)
    }
}
