use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SEED, QC_DISPLAY_CHANNELS};
use crate::error::{Result, TissueMaskError};
use crate::mask::TissueMaskConfig;
use crate::preprocess::{PreprocessingConfig, PreprocessingPipeline};
use crate::threshold::ThresholdParams;

/// Full configuration of the mask transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Seed for the Gaussian-mixture initialisation.
    pub seed: u64,
    pub preprocessing: PreprocessingConfig,
    pub tissue_mask: TissueMaskConfig,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            preprocessing: PreprocessingConfig::default(),
            tissue_mask: TissueMaskConfig::default(),
        }
    }
}

impl MaskConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| TissueMaskError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| TissueMaskError::config(e.to_string()))
    }

    /// Reject parameter values no stage or estimator can work with.
    pub fn validate(&self) -> Result<()> {
        PreprocessingPipeline::from_config(&self.preprocessing)?;

        let mask = &self.tissue_mask;
        if !mask.min_tissue_threshold.is_finite() {
            return Err(TissueMaskError::config(
                "tissue_mask.min_tissue_threshold must be finite",
            ));
        }
        if !mask.rgb_markers.is_empty() && mask.rgb_markers.len() != QC_DISPLAY_CHANNELS {
            return Err(TissueMaskError::config(format!(
                "tissue_mask.rgb_markers must list exactly {QC_DISPLAY_CHANNELS} channels, got {}",
                mask.rgb_markers.len()
            )));
        }
        self.validate_display_markers()
    }

    /// QC display channels must survive composite selection and stain removal.
    fn validate_display_markers(&self) -> Result<()> {
        let mask = &self.tissue_mask;
        let selected = &mask.mask_generation_markers;
        let stains = &self.preprocessing.background_stains;
        let stains_removed = self.preprocessing.toggles.apply_background_stain_removal;

        for marker in &mask.rgb_markers {
            if !selected.is_empty() && !selected.contains(marker) {
                return Err(TissueMaskError::config(format!(
                    "tissue_mask.rgb_markers entry {marker} is not in tissue_mask.mask_generation_markers"
                )));
            }
            if stains_removed && stains.contains(marker) {
                return Err(TissueMaskError::config(format!(
                    "tissue_mask.rgb_markers entry {marker} is removed as a background stain"
                )));
            }
        }
        Ok(())
    }

    pub fn threshold_params(&self) -> ThresholdParams {
        ThresholdParams {
            min_tissue_threshold: self.tissue_mask.min_tissue_threshold,
            seed: self.seed,
        }
    }
}
