use serde::Serialize;

use crate::mask::MaskMetadata;
use crate::threshold::{EstimatedWith, ThresholdRecord};

/// Threshold record and mask metadata merged into one flat row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MaskRecord {
    pub method: EstimatedWith,
    pub threshold: f32,
    pub min_threshold: f32,
    pub gmm_mean_background: Option<f64>,
    pub gmm_mean_tissue: Option<f64>,
    pub gmm_std_background: Option<f64>,
    pub gmm_std_tissue: Option<f64>,
    pub gmm_weight_background: Option<f64>,
    pub gmm_weight_tissue: Option<f64>,
    pub fallback_reason: Option<String>,
    pub raw_area_px: usize,
    pub clean_area_px: usize,
    pub full_area_px: usize,
    pub removed_small_object_area_px: usize,
    pub filled_hole_area_px: usize,
    pub coverage_percent: f64,
    pub area_delta_px: i64,
    pub area_delta_percent: f64,
}

impl MaskRecord {
    pub fn new(threshold: &ThresholdRecord, metadata: &MaskMetadata) -> Self {
        let mix = threshold.mixture.as_ref();
        Self {
            method: threshold.method,
            threshold: threshold.threshold,
            min_threshold: threshold.min_threshold,
            gmm_mean_background: mix.map(|m| m.means[0]),
            gmm_mean_tissue: mix.map(|m| m.means[1]),
            gmm_std_background: mix.map(|m| m.stds[0]),
            gmm_std_tissue: mix.map(|m| m.stds[1]),
            gmm_weight_background: mix.map(|m| m.weights[0]),
            gmm_weight_tissue: mix.map(|m| m.weights[1]),
            fallback_reason: threshold.fallback_reason.clone(),
            raw_area_px: metadata.raw_area_px,
            clean_area_px: metadata.clean_area_px,
            full_area_px: metadata.full_area_px,
            removed_small_object_area_px: metadata.removed_small_object_area_px,
            filled_hole_area_px: metadata.filled_hole_area_px,
            coverage_percent: metadata.coverage_percent,
            area_delta_px: metadata.area_delta_px,
            area_delta_percent: metadata.area_delta_percent,
        }
    }
}
