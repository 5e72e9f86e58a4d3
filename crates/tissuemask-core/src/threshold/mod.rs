pub mod gmm;
pub mod otsu;
mod record;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::channels::ChannelImage;
use crate::consts::GMM_MIN_INTENSITY;
use crate::error::{Result, TissueMaskError};

pub use gmm::{fit_gaussian_mixture, gaussian_intersection, GmmFitError, MixtureComponents};
pub use otsu::otsu_threshold;
pub use record::{EstimatedWith, ThresholdRecord};

/// Strategy used to separate tissue from background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    /// Otsu's method on every composite intensity pooled together.
    #[default]
    Otsu,
    /// Two-component Gaussian mixture on the per-pixel channel maximum.
    Gmm,
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Otsu => write!(f, "Otsu"),
            Self::Gmm => write!(f, "GMM"),
        }
    }
}

/// Inputs every estimator shares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdParams {
    /// No estimate is ever returned below this value.
    pub min_tissue_threshold: f32,
    /// Seed for the mixture initialisation.
    pub seed: u64,
}

impl ThresholdMethod {
    /// Estimate a tissue threshold for `composite`.
    ///
    /// The GMM strategy never fails on a bad fit: it falls back to Otsu on
    /// the same aggregated population and says so in the record.
    pub fn estimate(
        &self,
        composite: &ChannelImage,
        params: &ThresholdParams,
    ) -> Result<(f32, ThresholdRecord)> {
        if composite.channel_count() == 0 {
            return Err(TissueMaskError::EmptyComposite);
        }
        if composite.plane_area() == 0 {
            return Err(TissueMaskError::EmptyImage);
        }

        let record = match self {
            Self::Otsu => {
                let pooled: Vec<f32> = composite.data().iter().copied().collect();
                otsu_record(&pooled, params, EstimatedWith::Otsu, None)
            }
            Self::Gmm => gmm_record(composite, params)?,
        };
        info!(
            method = %record.method,
            threshold = record.threshold,
            "Tissue threshold estimated"
        );
        Ok((record.threshold, record))
    }
}

fn otsu_record(
    population: &[f32],
    params: &ThresholdParams,
    method: EstimatedWith,
    fallback_reason: Option<String>,
) -> ThresholdRecord {
    let raw = otsu_threshold(population).unwrap_or(params.min_tissue_threshold);
    ThresholdRecord {
        method,
        threshold: raw.max(params.min_tissue_threshold),
        min_threshold: params.min_tissue_threshold,
        mixture: None,
        fallback_reason,
    }
}

fn gmm_record(composite: &ChannelImage, params: &ThresholdParams) -> Result<ThresholdRecord> {
    let aggregated = composite.max_projection()?;
    let population: Vec<f32> = aggregated.iter().copied().collect();
    let foreground: Vec<f32> = population
        .iter()
        .copied()
        .filter(|&v| v > GMM_MIN_INTENSITY)
        .collect();

    match fit_gaussian_mixture(&foreground, params.seed) {
        Ok(mixture) => {
            let crossing = mixture.intersection() as f32;
            Ok(ThresholdRecord {
                method: EstimatedWith::Gmm,
                threshold: crossing.max(params.min_tissue_threshold),
                min_threshold: params.min_tissue_threshold,
                mixture: Some(mixture),
                fallback_reason: None,
            })
        }
        Err(e) => {
            warn!(error = %e, "GMM fit failed, using Otsu fallback");
            Ok(otsu_record(
                &population,
                params,
                EstimatedWith::GmmFallbackOtsu,
                Some(e.to_string()),
            ))
        }
    }
}
