#![allow(dead_code)]

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use tissuemask_core::channels::ChannelImage;

/// Owned channel labels from string literals.
pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Image whose channels are the given planes, labelled in order.
pub fn image_from_planes(planes: Vec<(&str, Array2<f32>)>) -> ChannelImage {
    ChannelImage::from_planes(
        planes
            .into_iter()
            .map(|(name, plane)| (name.to_string(), plane))
            .collect(),
    )
    .unwrap()
}

/// Single-channel `h x w` image, zero except a filled square block.
pub fn block_image(h: usize, w: usize, top: usize, left: usize, side: usize, value: f32) -> ChannelImage {
    let mut plane = Array2::<f32>::zeros((h, w));
    for row in top..top + side {
        for col in left..left + side {
            plane[[row, col]] = value;
        }
    }
    image_from_planes(vec![("DNA1", plane)])
}

/// `h x w` plane whose left half draws from `N(bg_mean, bg_std)` and right
/// half from `N(fg_mean, fg_std)`.
pub fn bimodal_plane(
    h: usize,
    w: usize,
    (bg_mean, bg_std): (f32, f32),
    (fg_mean, fg_std): (f32, f32),
    seed: u64,
) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let background = Normal::new(bg_mean, bg_std).unwrap();
    let tissue = Normal::new(fg_mean, fg_std).unwrap();
    Array2::from_shape_fn((h, w), |(_, col)| {
        if col < w / 2 {
            background.sample(&mut rng)
        } else {
            tissue.sample(&mut rng)
        }
    })
}

/// Samples from two normals concatenated.
pub fn bimodal_samples(
    n: usize,
    (bg_mean, bg_std): (f32, f32),
    (fg_mean, fg_std): (f32, f32),
    seed: u64,
) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let background = Normal::new(bg_mean, bg_std).unwrap();
    let tissue = Normal::new(fg_mean, fg_std).unwrap();
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                background.sample(&mut rng)
            } else {
                tissue.sample(&mut rng)
            }
        })
        .collect()
}

pub fn count_true(mask: &Array2<bool>) -> usize {
    mask.iter().filter(|&&v| v).count()
}
