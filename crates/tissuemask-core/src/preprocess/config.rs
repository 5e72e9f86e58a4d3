use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BACKGROUND_PERCENTILE, DEFAULT_DENOISE_COFACTOR, DEFAULT_HOT_PIXEL_WINDOW,
    DEFAULT_HOT_PIXEL_Z_SCORE, DEFAULT_STRIPING_SIZE, DEFAULT_WINSORIZATION_LIMITS,
};

/// Preprocessing section of the mask configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub toggles: StageToggles,
    pub hot_pixel: HotPixelConfig,
    pub striping: StripingConfig,
    pub denoising: DenoisingConfig,
    pub background_subtraction: BackgroundSubtractionConfig,
    pub winsorization: WinsorizationConfig,
    /// Channel identities dropped by background-stain removal.
    pub background_stains: Vec<String>,
}

/// One switch per preprocessing stage. Every stage is on by default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub apply_background_stain_removal: bool,
    pub apply_hot_pixel_removal: bool,
    pub apply_striping_removal: bool,
    pub apply_denoising: bool,
    pub apply_background_subtraction: bool,
    pub apply_winsorization: bool,
    pub apply_min_max_scaling: bool,
}

impl StageToggles {
    pub fn all(enabled: bool) -> Self {
        Self {
            apply_background_stain_removal: enabled,
            apply_hot_pixel_removal: enabled,
            apply_striping_removal: enabled,
            apply_denoising: enabled,
            apply_background_subtraction: enabled,
            apply_winsorization: enabled,
            apply_min_max_scaling: enabled,
        }
    }
}

impl Default for StageToggles {
    fn default() -> Self {
        Self::all(true)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotPixelConfig {
    /// Side length of the square median window.
    pub window_size: usize,
    /// |z| above which a pixel is a hot-pixel candidate.
    pub z_score_threshold: f32,
}

impl Default for HotPixelConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_HOT_PIXEL_WINDOW,
            z_score_threshold: DEFAULT_HOT_PIXEL_Z_SCORE,
        }
    }
}

/// Axis along which the destriping median filter runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeDirection {
    /// Filter along each row (window spans columns).
    #[default]
    Row,
    /// Filter along each column (window spans rows).
    Column,
}

impl std::fmt::Display for StripeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Row => write!(f, "row"),
            Self::Column => write!(f, "column"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripingConfig {
    pub direction: StripeDirection,
    pub size: usize,
}

impl Default for StripingConfig {
    fn default() -> Self {
        Self {
            direction: StripeDirection::default(),
            size: DEFAULT_STRIPING_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoisingConfig {
    pub cofactor: f32,
}

impl Default for DenoisingConfig {
    fn default() -> Self {
        Self {
            cofactor: DEFAULT_DENOISE_COFACTOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundSubtractionConfig {
    /// Percentile in [0, 100].
    pub percentile: f32,
}

impl Default for BackgroundSubtractionConfig {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_BACKGROUND_PERCENTILE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinsorizationConfig {
    /// Lower and upper tail fractions, each in [0, 1).
    pub limits: [f64; 2],
}

impl Default for WinsorizationConfig {
    fn default() -> Self {
        Self {
            limits: DEFAULT_WINSORIZATION_LIMITS,
        }
    }
}
