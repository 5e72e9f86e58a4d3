use crate::consts::OTSU_HISTOGRAM_BINS;

/// Otsu's thresholding: find the value that maximises between-class variance.
///
/// The histogram spans the observed `[min, max]` range of the finite values
/// in `data`, and the returned threshold is the centre of the last bin of the
/// background class. A constant population returns its single value; a
/// population with no finite values returns `None`.
pub fn otsu_threshold(data: &[f32]) -> Option<f32> {
    let (min, max) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        return None;
    }
    if min == max {
        return Some(min);
    }

    let bins = OTSU_HISTOGRAM_BINS;
    let bin_width = (max as f64 - min as f64) / bins as f64;
    let mut histogram = vec![0u64; bins];
    for &v in data.iter().filter(|v| v.is_finite()) {
        let bin = (((v as f64 - min as f64) / bin_width) as usize).min(bins - 1);
        histogram[bin] += 1;
    }

    let total: f64 = histogram.iter().map(|&c| c as f64).sum();
    let mut sum_all: f64 = 0.0;
    for (i, &count) in histogram.iter().enumerate() {
        sum_all += i as f64 * count as f64;
    }

    let mut weight_bg: f64 = 0.0;
    let mut sum_bg: f64 = 0.0;
    let mut best_variance = 0.0_f64;
    let mut best_bin = 0usize;

    for (i, &count) in histogram.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += i as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between_variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);

        if between_variance > best_variance {
            best_variance = between_variance;
            best_bin = i;
        }
    }

    Some((min as f64 + (best_bin as f64 + 0.5) * bin_width) as f32)
}
