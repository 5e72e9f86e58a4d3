//! Per-plane intensity transforms: variance stabilisation, background
//! subtraction, winsorization and min-max scaling.

use ndarray::{Array2, ArrayView2};

/// `arcsinh(v / cofactor)` elementwise.
pub fn arcsinh_transform(plane: ArrayView2<'_, f32>, cofactor: f32) -> Array2<f32> {
    plane.mapv(|v| (v / cofactor).asinh())
}

/// Subtract the plane's `percentile` (0..=100) and clip at zero.
pub fn subtract_background(plane: ArrayView2<'_, f32>, percentile: f32) -> Array2<f32> {
    let sorted = sorted_values(plane);
    if sorted.is_empty() {
        return plane.to_owned();
    }
    let background = percentile_of_sorted(&sorted, percentile);
    plane.mapv(|v| (v - background).max(0.0))
}

/// Clip the lowest `lower` and highest `upper` fractions of the plane to the
/// nearest retained value.
///
/// With `n` values sorted ascending, the `floor(lower * n)` smallest are
/// raised to the next value and the `floor(upper * n)` largest are lowered to
/// the previous one.
pub fn winsorize(plane: ArrayView2<'_, f32>, lower: f64, upper: f64) -> Array2<f32> {
    let sorted = sorted_values(plane);
    let n = sorted.len();
    if n == 0 {
        return plane.to_owned();
    }

    let low_idx = ((lower * n as f64) as usize).min(n - 1);
    let high_idx = n - ((upper * n as f64) as usize).min(n - 1) - 1;
    let (lo, hi) = (sorted[low_idx], sorted[high_idx.max(low_idx)]);

    plane.mapv(|v| v.clamp(lo, hi))
}

/// Rescale the plane to [0, 1] using its own minimum and maximum.
///
/// A constant plane maps to 0 everywhere.
pub fn min_max_scale(plane: ArrayView2<'_, f32>) -> Array2<f32> {
    let (min, max) = plane
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(plane.raw_dim());
    }
    plane.mapv(|v| ((v - min) / range).clamp(0.0, 1.0))
}

fn sorted_values(plane: ArrayView2<'_, f32>) -> Vec<f32> {
    let mut values: Vec<f32> = plane.iter().copied().collect();
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    values
}

/// Percentile (0..=100) of ascending `sorted` with linear interpolation
/// between closest ranks.
pub fn percentile_of_sorted(sorted: &[f32], percentile: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (percentile.clamp(0.0, 100.0) as f64 / 100.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            (sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac) as f32
        }
    }
}
