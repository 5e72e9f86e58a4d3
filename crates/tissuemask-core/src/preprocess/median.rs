use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Sliding-window median filter with a `(height, width)` window and
/// half-sample symmetric ("reflect") borders: `d c b a | a b c d | d c b a`.
///
/// The window for output `(r, c)` covers rows `r - height/2 ..` and columns
/// `c - width/2 ..`. For even window sizes the upper median is returned.
pub fn median_filter(data: ArrayView2<'_, f32>, window: (usize, usize)) -> Array2<f32> {
    let (h, w) = data.dim();
    let (wh, ww) = (window.0.max(1), window.1.max(1));
    if h == 0 || w == 0 || (wh == 1 && ww == 1) {
        return data.to_owned();
    }

    let row_offsets: Vec<isize> = (0..wh).map(|i| i as isize - (wh / 2) as isize).collect();
    let col_offsets: Vec<isize> = (0..ww).map(|i| i as isize - (ww / 2) as isize).collect();

    let filter_row = |row: usize| -> Vec<f32> {
        let mut values = Vec::with_capacity(wh * ww);
        let src_rows: Vec<usize> = row_offsets
            .iter()
            .map(|&dr| reflect_index(row as isize + dr, h))
            .collect();
        (0..w)
            .map(|col| {
                values.clear();
                for &sr in &src_rows {
                    for &dc in &col_offsets {
                        values.push(data[[sr, reflect_index(col as isize + dc, w)]]);
                    }
                }
                upper_median(&mut values)
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h).into_par_iter().map(filter_row).collect()
    } else {
        (0..h).map(filter_row).collect()
    };

    let mut result = Array2::<f32>::zeros((h, w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            result[[row, col]] = val;
        }
    }
    result
}

/// Map an out-of-range index back into `0..len` by mirror reflection about
/// the outer pixel edge.
pub(crate) fn reflect_index(mut i: isize, len: usize) -> usize {
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Element of rank `len / 2` (the median for odd lengths).
fn upper_median(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
}
