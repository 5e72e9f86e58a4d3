use ndarray::{Array2, ArrayView2};

use super::config::StripeDirection;
use super::median::median_filter;

/// 1-D median filter of length `size` along `direction`, reflect borders.
pub fn remove_striping(
    plane: ArrayView2<'_, f32>,
    direction: StripeDirection,
    size: usize,
) -> Array2<f32> {
    let window = match direction {
        StripeDirection::Row => (1, size),
        StripeDirection::Column => (size, 1),
    };
    median_filter(plane, window)
}
