use tracing::{debug, info};

use crate::channels::ChannelImage;
use crate::error::{Result, TissueMaskError};

use super::config::{PreprocessingConfig, StripeDirection};
use super::hot_pixel::remove_hot_pixels;
use super::intensity::{arcsinh_transform, min_max_scale, subtract_background, winsorize};
use super::striping::remove_striping;

/// One preprocessing stage and its parameters.
///
/// Every stage is a pure `ChannelImage -> ChannelImage` transform. Numeric
/// stages work on each plane independently.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    BackgroundStainRemoval { stains: Vec<String> },
    HotPixelRemoval { window_size: usize, z_score_threshold: f32 },
    StripingRemoval { direction: StripeDirection, size: usize },
    Denoising { cofactor: f32 },
    BackgroundSubtraction { percentile: f32 },
    Winsorization { lower: f64, upper: f64 },
    MinMaxScaling,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackgroundStainRemoval { stains } => {
                write!(f, "Background stain removal ({} stains)", stains.len())
            }
            Self::HotPixelRemoval {
                window_size,
                z_score_threshold,
            } => write!(
                f,
                "Hot pixel removal (window {window_size}, z > {z_score_threshold})"
            ),
            Self::StripingRemoval { direction, size } => {
                write!(f, "Striping removal ({direction}, size {size})")
            }
            Self::Denoising { cofactor } => write!(f, "Arcsinh denoising (cofactor {cofactor})"),
            Self::BackgroundSubtraction { percentile } => {
                write!(f, "Background subtraction (p{percentile})")
            }
            Self::Winsorization { lower, upper } => {
                write!(f, "Winsorization ({lower}, {upper})")
            }
            Self::MinMaxScaling => write!(f, "Min-max scaling"),
        }
    }
}

impl Stage {
    /// Check that the stage's parameters are usable.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::BackgroundStainRemoval { .. } | Self::MinMaxScaling => Ok(()),
            Self::HotPixelRemoval {
                window_size,
                z_score_threshold,
            } => {
                if *window_size == 0 {
                    return Err(TissueMaskError::config(
                        "preprocessing.hot_pixel.window_size must be at least 1",
                    ));
                }
                if !z_score_threshold.is_finite() || *z_score_threshold < 0.0 {
                    return Err(TissueMaskError::config(format!(
                        "preprocessing.hot_pixel.z_score_threshold must be a non-negative number, got {z_score_threshold}"
                    )));
                }
                Ok(())
            }
            Self::StripingRemoval { size, .. } => {
                if *size == 0 {
                    return Err(TissueMaskError::config(
                        "preprocessing.striping.size must be at least 1",
                    ));
                }
                Ok(())
            }
            Self::Denoising { cofactor } => {
                if !cofactor.is_finite() || *cofactor <= 0.0 {
                    return Err(TissueMaskError::config(format!(
                        "preprocessing.denoising.cofactor must be positive, got {cofactor}"
                    )));
                }
                Ok(())
            }
            Self::BackgroundSubtraction { percentile } => {
                if !(0.0..=100.0).contains(percentile) {
                    return Err(TissueMaskError::config(format!(
                        "preprocessing.background_subtraction.percentile must be in [0, 100], got {percentile}"
                    )));
                }
                Ok(())
            }
            Self::Winsorization { lower, upper } => {
                let valid = |v: f64| (0.0..1.0).contains(&v);
                if !valid(*lower) || !valid(*upper) || lower + upper >= 1.0 {
                    return Err(TissueMaskError::config(format!(
                        "preprocessing.winsorization.limits must be fractions in [0, 1) summing below 1, got [{lower}, {upper}]"
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn apply(&self, image: &ChannelImage) -> ChannelImage {
        match self {
            Self::BackgroundStainRemoval { stains } => image.without(stains),
            Self::HotPixelRemoval {
                window_size,
                z_score_threshold,
            } => image.map_planes(|p| remove_hot_pixels(p, *window_size, *z_score_threshold)),
            Self::StripingRemoval { direction, size } => {
                image.map_planes(|p| remove_striping(p, *direction, *size))
            }
            Self::Denoising { cofactor } => image.map_planes(|p| arcsinh_transform(p, *cofactor)),
            Self::BackgroundSubtraction { percentile } => {
                image.map_planes(|p| subtract_background(p, *percentile))
            }
            Self::Winsorization { lower, upper } => {
                image.map_planes(|p| winsorize(p, *lower, *upper))
            }
            Self::MinMaxScaling => image.map_planes(min_max_scale),
        }
    }
}

/// A stage paired with its on/off switch.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineStep {
    pub enabled: bool,
    pub stage: Stage,
}

/// The seven preprocessing stages in their fixed order.
///
/// Each stage assumes the output distribution of the one before it, so the
/// order is not configurable; only the switches and parameters are.
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessingPipeline {
    steps: Vec<PipelineStep>,
}

impl PreprocessingPipeline {
    /// Build the pipeline, validating the parameters of every enabled stage.
    pub fn from_config(config: &PreprocessingConfig) -> Result<Self> {
        let t = &config.toggles;
        let [lower, upper] = config.winsorization.limits;
        let steps = vec![
            PipelineStep {
                enabled: t.apply_background_stain_removal,
                stage: Stage::BackgroundStainRemoval {
                    stains: config.background_stains.clone(),
                },
            },
            PipelineStep {
                enabled: t.apply_hot_pixel_removal,
                stage: Stage::HotPixelRemoval {
                    window_size: config.hot_pixel.window_size,
                    z_score_threshold: config.hot_pixel.z_score_threshold,
                },
            },
            PipelineStep {
                enabled: t.apply_striping_removal,
                stage: Stage::StripingRemoval {
                    direction: config.striping.direction,
                    size: config.striping.size,
                },
            },
            PipelineStep {
                enabled: t.apply_denoising,
                stage: Stage::Denoising {
                    cofactor: config.denoising.cofactor,
                },
            },
            PipelineStep {
                enabled: t.apply_background_subtraction,
                stage: Stage::BackgroundSubtraction {
                    percentile: config.background_subtraction.percentile,
                },
            },
            PipelineStep {
                enabled: t.apply_winsorization,
                stage: Stage::Winsorization { lower, upper },
            },
            PipelineStep {
                enabled: t.apply_min_max_scaling,
                stage: Stage::MinMaxScaling,
            },
        ];

        for step in steps.iter().filter(|s| s.enabled) {
            step.stage.validate()?;
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn enabled_stages(&self) -> impl Iterator<Item = &Stage> {
        self.steps.iter().filter(|s| s.enabled).map(|s| &s.stage)
    }

    /// Fold the enabled stages over `image`, left to right.
    pub fn run(&self, image: &ChannelImage) -> ChannelImage {
        info!(
            channels = image.channel_count(),
            stages = self.enabled_stages().count(),
            "Preprocessing image"
        );
        self.enabled_stages().fold(image.clone(), |current, stage| {
            debug!(stage = %stage, channels = current.channel_count(), "Applying stage");
            stage.apply(&current)
        })
    }
}

/// Build the pipeline from `config` and run it on `image`.
pub fn preprocess_image(image: &ChannelImage, config: &PreprocessingConfig) -> Result<ChannelImage> {
    Ok(PreprocessingPipeline::from_config(config)?.run(image))
}
