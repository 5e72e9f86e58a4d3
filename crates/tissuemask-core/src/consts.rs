/// Minimum pixel count (c*h*w) to process channels in parallel with Rayon.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Seed used for Gaussian-mixture initialisation when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Value substituted for a zero local MAD during hot-pixel detection.
pub const HOT_PIXEL_MAD_EPSILON: f32 = 1e-6;

/// Default side length of the square hot-pixel median window.
pub const DEFAULT_HOT_PIXEL_WINDOW: usize = 3;

/// Default |z| above which a pixel becomes a hot-pixel candidate.
pub const DEFAULT_HOT_PIXEL_Z_SCORE: f32 = 5.0;

/// Default length of the 1-D destriping median filter.
pub const DEFAULT_STRIPING_SIZE: usize = 3;

/// Default arcsinh cofactor for shot-noise variance stabilisation.
pub const DEFAULT_DENOISE_COFACTOR: f32 = 5.0;

/// Default low percentile (0..=100) used as the per-channel background level.
pub const DEFAULT_BACKGROUND_PERCENTILE: f32 = 1.0;

/// Default lower/upper tail fractions clipped by winsorization.
pub const DEFAULT_WINSORIZATION_LIMITS: [f64; 2] = [0.001, 0.001];

/// Default minimum area (pixels) of a foreground object kept by cleanup.
pub const DEFAULT_SMALL_OBJECT_THRESHOLD: usize = 64;

/// Default maximum area (pixels) of an enclosed hole filled by cleanup.
pub const DEFAULT_SMALL_HOLE_THRESHOLD: usize = 64;

/// Number of histogram bins for Otsu's thresholding.
pub const OTSU_HISTOGRAM_BINS: usize = 256;

/// Pixels at or below this intensity are excluded from the mixture fit.
pub const GMM_MIN_INTENSITY: f32 = 0.01;

/// Maximum number of EM iterations before the fit counts as non-converged.
pub const GMM_MAX_ITERATIONS: usize = 100;

/// Convergence tolerance on the change of the mean log-likelihood.
pub const GMM_TOLERANCE: f64 = 1e-3;

/// Regularisation added to every component variance.
pub const GMM_VARIANCE_FLOOR: f64 = 1e-6;

/// Relative tolerance under which two component deviations count as equal.
pub const GMM_EQUAL_STD_TOLERANCE: f64 = 1e-5;

/// Number of Lloyd iterations used to seed the mixture means.
pub const GMM_KMEANS_ITERATIONS: usize = 20;

/// Opacity of the red mask overlay in QC figures.
pub const QC_OVERLAY_ALPHA: f32 = 0.3;

/// Width in pixels of the black gutter between the two QC panels.
pub const QC_PANEL_GAP: u32 = 8;

/// Number of display channels in a QC figure (R, G, B).
pub const QC_DISPLAY_CHANNELS: usize = 3;

/// PNG text keyword holding the QC figure title.
pub const QC_TITLE_KEYWORD: &str = "Title";

/// PNG text keyword holding the QC caption, one line per caption entry.
pub const QC_CAPTION_KEYWORD: &str = "Description";
