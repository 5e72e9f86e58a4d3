use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channels::ChannelImage;

use super::components::{label_components, touches_border};
use super::config::TissueMaskConfig;
use super::morphology::Connectivity;

/// Area bookkeeping for one cleaned mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaskMetadata {
    /// Foreground pixels straight after thresholding.
    pub raw_area_px: usize,
    /// Foreground pixels after cleanup.
    pub clean_area_px: usize,
    /// Pixels in the whole plane (H*W).
    pub full_area_px: usize,
    pub removed_small_object_area_px: usize,
    pub filled_hole_area_px: usize,
    /// `100 * clean_area_px / full_area_px`, 0 for an empty plane.
    pub coverage_percent: f64,
    /// `clean_area_px - raw_area_px`.
    pub area_delta_px: i64,
    /// Delta relative to the raw area, 0 when the raw mask is empty.
    pub area_delta_percent: f64,
}

impl MaskMetadata {
    fn from_areas(raw: usize, clean: usize, full: usize, removed: usize, filled: usize) -> Self {
        let coverage_percent = if full > 0 {
            100.0 * clean as f64 / full as f64
        } else {
            0.0
        };
        let area_delta_px = clean as i64 - raw as i64;
        let area_delta_percent = if raw > 0 {
            100.0 * area_delta_px as f64 / raw as f64
        } else {
            0.0
        };
        Self {
            raw_area_px: raw,
            clean_area_px: clean,
            full_area_px: full,
            removed_small_object_area_px: removed,
            filled_hole_area_px: filled,
            coverage_percent,
            area_delta_px,
            area_delta_percent,
        }
    }
}

/// Threshold the composite and clean the result.
///
/// A pixel is tissue when any channel exceeds `threshold`. Small objects are
/// removed before small holes are filled.
pub fn generate_tissue_mask(
    composite: &ChannelImage,
    threshold: f32,
    remove_objects: bool,
    fill_holes: bool,
    config: &TissueMaskConfig,
) -> (Array2<bool>, MaskMetadata) {
    let raw = composite.any_above(threshold);
    let raw_area = count_true(&raw);

    let mut mask = raw.clone();
    let mut removed_area = 0;
    if remove_objects {
        let pruned = remove_small_objects(&mask, config.small_object_threshold);
        removed_area = count_and_not(&raw, &pruned);
        mask = pruned;
    }

    let mut filled_area = 0;
    if fill_holes {
        let filled = fill_small_holes(&mask, config.small_hole_threshold);
        filled_area = count_and_not(&filled, &mask);
        mask = filled;
    }

    let metadata = MaskMetadata::from_areas(
        raw_area,
        count_true(&mask),
        composite.plane_area(),
        removed_area,
        filled_area,
    );
    debug!(
        raw = metadata.raw_area_px,
        clean = metadata.clean_area_px,
        removed = removed_area,
        filled = filled_area,
        "Mask cleaned"
    );
    (mask, metadata)
}

/// Drop 4-connected foreground components with fewer than `min_area` pixels.
pub fn remove_small_objects(mask: &Array2<bool>, min_area: usize) -> Array2<bool> {
    let labeling = label_components(mask, Connectivity::Four);
    labeling.labels.mapv(|lbl| {
        labeling
            .component(lbl)
            .is_some_and(|c| c.area >= min_area)
    })
}

/// Fill 4-connected background components with fewer than `max_area` pixels
/// that do not touch the image border.
pub fn fill_small_holes(mask: &Array2<bool>, max_area: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let background = mask.mapv(|v| !v);
    let labeling = label_components(&background, Connectivity::Four);

    Zip::from(mask)
        .and(&labeling.labels)
        .map_collect(|&fg, &lbl| {
            fg || labeling
                .component(lbl)
                .is_some_and(|c| c.area < max_area && !touches_border(c.bbox, h, w))
        })
}

fn count_true(mask: &Array2<bool>) -> usize {
    mask.iter().filter(|&&v| v).count()
}

/// Pixels set in `a` but not in `b`.
fn count_and_not(a: &Array2<bool>, b: &Array2<bool>) -> usize {
    Zip::from(a)
        .and(b)
        .fold(0, |acc, &x, &y| if x && !y { acc + 1 } else { acc })
}
