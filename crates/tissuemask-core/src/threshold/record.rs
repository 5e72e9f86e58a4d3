use serde::{Deserialize, Serialize};

use super::gmm::MixtureComponents;

/// Which estimator actually produced a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedWith {
    Otsu,
    Gmm,
    /// Gaussian mixture was requested but the fit failed; Otsu was used.
    GmmFallbackOtsu,
}

impl std::fmt::Display for EstimatedWith {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Otsu => write!(f, "Otsu"),
            Self::Gmm => write!(f, "GMM"),
            Self::GmmFallbackOtsu => write!(f, "Otsu (GMM fallback)"),
        }
    }
}

/// Outcome of threshold estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub method: EstimatedWith,
    /// Final threshold, already floored at `min_threshold`.
    pub threshold: f32,
    /// The configured safeguard floor.
    pub min_threshold: f32,
    /// Fitted mixture, present only for a successful GMM estimate.
    pub mixture: Option<MixtureComponents>,
    /// Why the mixture fit was rejected, for `GmmFallbackOtsu`.
    pub fallback_reason: Option<String>,
}

impl ThresholdRecord {
    pub fn is_fallback(&self) -> bool {
        self.method == EstimatedWith::GmmFallbackOtsu
    }
}
