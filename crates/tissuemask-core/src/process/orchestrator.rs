use ndarray::Array2;
use tracing::info;

use crate::channels::ChannelImage;
use crate::config::MaskConfig;
use crate::error::{Result, TissueMaskError};
use crate::mask::{generate_tissue_mask, MaskMetadata};
use crate::preprocess::preprocess_image;
use crate::qc::{render_qc, QcFigure};
use crate::threshold::{ThresholdMethod, ThresholdRecord};

use super::record::MaskRecord;

/// Per-run switches that sit outside the configuration file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskOptions {
    pub method: ThresholdMethod,
    pub preprocess: bool,
    pub remove_small_objects: bool,
    pub fill_small_holes: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            preprocess: true,
            remove_small_objects: true,
            fill_small_holes: true,
        }
    }
}

impl MaskOptions {
    /// Defaults with the estimator taken from `config`.
    pub fn for_config(config: &MaskConfig) -> Self {
        Self {
            method: config.tissue_mask.method,
            ..Default::default()
        }
    }
}

/// Everything produced for one image.
#[derive(Clone, Debug)]
pub struct MaskOutcome {
    /// `true` marks tissue.
    pub mask: Array2<bool>,
    /// The (preprocessed) composite the mask was computed from.
    pub composite: ChannelImage,
    pub threshold: ThresholdRecord,
    pub metadata: MaskMetadata,
}

impl MaskOutcome {
    pub fn record(&self) -> MaskRecord {
        MaskRecord::new(&self.threshold, &self.metadata)
    }

    pub fn render_qc(&self, rgb_markers: &[String], image_id: &str) -> Result<QcFigure> {
        render_qc(
            &self.mask,
            &self.composite,
            rgb_markers,
            &self.threshold,
            &self.metadata,
            image_id,
        )
    }
}

/// Run the full transform on one image: composite selection, preprocessing,
/// threshold estimation and mask cleanup.
pub fn generate_mask(
    image: &ChannelImage,
    config: &MaskConfig,
    options: &MaskOptions,
) -> Result<MaskOutcome> {
    let mut composite = image.select(&config.tissue_mask.mask_generation_markers)?;
    if options.preprocess {
        composite = preprocess_image(&composite, &config.preprocessing)?;
    }
    if composite.channel_count() == 0 {
        return Err(TissueMaskError::EmptyComposite);
    }

    let (threshold, record) = options
        .method
        .estimate(&composite, &config.threshold_params())?;

    let (mask, metadata) = generate_tissue_mask(
        &composite,
        threshold,
        options.remove_small_objects,
        options.fill_small_holes,
        &config.tissue_mask,
    );
    info!(
        channels = composite.channel_count(),
        threshold,
        coverage = metadata.coverage_percent,
        "Tissue mask generated"
    );

    Ok(MaskOutcome {
        mask,
        composite,
        threshold: record,
        metadata,
    })
}
