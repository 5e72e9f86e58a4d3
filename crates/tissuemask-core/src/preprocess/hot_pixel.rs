use ndarray::{Array2, ArrayView2, Zip};

use crate::consts::HOT_PIXEL_MAD_EPSILON;
use crate::mask::morphology::{isolated_pixels, Connectivity};

use super::median::median_filter;

/// Replace spatially isolated hot pixels in one plane with their local median.
///
/// A pixel is a candidate when `|value - local_median| / local_mad` exceeds
/// `z_score_threshold`, where both statistics come from a square window of
/// side `window_size`. Only candidates with no 8-connected candidate
/// neighbour are corrected; clusters of two or more are left untouched.
pub fn remove_hot_pixels(
    plane: ArrayView2<'_, f32>,
    window_size: usize,
    z_score_threshold: f32,
) -> Array2<f32> {
    let window = (window_size, window_size);
    let local_median = median_filter(plane, window);

    let residual = Zip::from(plane)
        .and(&local_median)
        .map_collect(|&v, &m| (v - m).abs());
    let mut local_mad = median_filter(residual.view(), window);
    local_mad.mapv_inplace(|mad| if mad == 0.0 { HOT_PIXEL_MAD_EPSILON } else { mad });

    let candidates = Zip::from(plane)
        .and(&local_median)
        .and(&local_mad)
        .map_collect(|&v, &m, &mad| ((v - m) / mad).abs() > z_score_threshold);
    let isolated = isolated_pixels(&candidates, Connectivity::Eight);

    let mut cleaned = plane.to_owned();
    Zip::from(&mut cleaned)
        .and(&isolated)
        .and(&local_median)
        .for_each(|out, &hot, &m| {
            if hot {
                *out = m;
            }
        });
    cleaned
}
