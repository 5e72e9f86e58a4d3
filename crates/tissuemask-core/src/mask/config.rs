use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SMALL_HOLE_THRESHOLD, DEFAULT_SMALL_OBJECT_THRESHOLD};
use crate::threshold::ThresholdMethod;

/// Tissue-mask section of the mask configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TissueMaskConfig {
    /// Threshold estimator.
    pub method: ThresholdMethod,
    /// Floor applied to every estimated threshold.
    pub min_tissue_threshold: f32,
    /// Foreground components smaller than this (pixels) are removed.
    pub small_object_threshold: usize,
    /// Enclosed background components smaller than this (pixels) are filled.
    pub small_hole_threshold: usize,
    /// Channels shown as red, green and blue in QC figures.
    pub rgb_markers: Vec<String>,
    /// Channels the mask is computed from; empty means every channel.
    pub mask_generation_markers: Vec<String>,
}

impl Default for TissueMaskConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            min_tissue_threshold: 0.0,
            small_object_threshold: DEFAULT_SMALL_OBJECT_THRESHOLD,
            small_hole_threshold: DEFAULT_SMALL_HOLE_THRESHOLD,
            rgb_markers: Vec::new(),
            mask_generation_markers: Vec::new(),
        }
    }
}
