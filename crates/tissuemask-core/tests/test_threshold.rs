mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array2, Array3};

use common::{bimodal_plane, bimodal_samples, image_from_planes};
use tissuemask_core::channels::ChannelImage;
use tissuemask_core::error::TissueMaskError;
use tissuemask_core::threshold::{
    fit_gaussian_mixture, gaussian_intersection, otsu_threshold, EstimatedWith, ThresholdMethod,
    ThresholdParams,
};

fn params(floor: f32) -> ThresholdParams {
    ThresholdParams {
        min_tissue_threshold: floor,
        seed: 42,
    }
}

fn bimodal_image(seed: u64) -> ChannelImage {
    image_from_planes(vec![(
        "DNA1",
        bimodal_plane(40, 100, (0.2, 0.05), (0.8, 0.05), seed),
    )])
}

// ---------------------------------------------------------------------------
// Gaussian intersection
// ---------------------------------------------------------------------------

#[test]
fn test_symmetric_components_cross_at_zero() {
    let x = gaussian_intersection(-1.0, 1.0, 0.5, 1.0, 1.0, 0.5);
    assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
}

#[test]
fn test_equal_stds_give_midpoint_regardless_of_weights() {
    let x = gaussian_intersection(0.0, 1.0, 0.9, 4.0, 1.0, 0.1);
    assert_abs_diff_eq!(x, 2.0, epsilon = 1e-12);
}

#[test]
fn test_narrow_background_wide_tissue_crossing_lies_between_means() {
    let x = gaussian_intersection(0.0, 0.1, 0.5, 5.0, 0.5, 0.5);
    assert!(x > 0.0 && x < 5.0, "got {x}");
    // The narrow background density falls off first.
    assert!(x < 2.5, "got {x}");
}

#[test]
fn test_no_root_between_means_falls_back_to_midpoint() {
    let x = gaussian_intersection(0.0, 5.0, 0.999, 0.1, 0.01, 0.001);
    let lo_hi = 0.0..=0.1;
    assert!(lo_hi.contains(&x), "got {x}");
}

// ---------------------------------------------------------------------------
// Mixture fit
// ---------------------------------------------------------------------------

#[test]
fn test_mixture_recovers_bimodal_components() {
    let samples = bimodal_samples(4000, (0.0, 0.1), (5.0, 0.5), 7);
    let mix = fit_gaussian_mixture(&samples, 42).unwrap();

    assert_abs_diff_eq!(mix.means[0], 0.0, epsilon = 0.05);
    assert_abs_diff_eq!(mix.means[1], 5.0, epsilon = 0.1);
    assert_abs_diff_eq!(mix.stds[0], 0.1, epsilon = 0.02);
    assert_abs_diff_eq!(mix.stds[1], 0.5, epsilon = 0.05);
    assert_abs_diff_eq!(mix.weights[0] + mix.weights[1], 1.0, epsilon = 1e-9);

    let threshold = mix.intersection();
    assert!(threshold > 0.0 && threshold < 5.0, "got {threshold}");
}

#[test]
fn test_mixture_fit_is_deterministic_for_seed() {
    let samples = bimodal_samples(2000, (1.0, 0.2), (3.0, 0.4), 11);
    let a = fit_gaussian_mixture(&samples, 42).unwrap();
    let b = fit_gaussian_mixture(&samples, 42).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Otsu
// ---------------------------------------------------------------------------

#[test]
fn test_otsu_separates_two_levels() {
    let mut data = vec![10.0f32; 500];
    data.extend(vec![200.0f32; 500]);
    let t = otsu_threshold(&data).unwrap();
    assert!(t > 10.0 && t < 200.0, "got {t}");
}

#[test]
fn test_otsu_constant_and_empty_inputs() {
    assert_eq!(otsu_threshold(&[3.0; 10]), Some(3.0));
    assert_eq!(otsu_threshold(&[]), None);
    assert_eq!(otsu_threshold(&[f32::NAN]), None);
}

// ---------------------------------------------------------------------------
// Estimators
// ---------------------------------------------------------------------------

#[test]
fn test_otsu_estimate_on_bimodal_image() {
    let (t, record) = ThresholdMethod::Otsu
        .estimate(&bimodal_image(3), &params(0.0))
        .unwrap();
    assert!(t > 0.3 && t < 0.7, "got {t}");
    assert_eq!(record.method, EstimatedWith::Otsu);
    assert_eq!(record.threshold, t);
    assert!(record.mixture.is_none());
}

#[test]
fn test_gmm_estimate_on_bimodal_image() {
    let image = bimodal_image(5);
    let (t, record) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();
    assert!(t > 0.3 && t < 0.7, "got {t}");
    assert_eq!(record.method, EstimatedWith::Gmm);
    let mix = record.mixture.as_ref().unwrap();
    assert!(mix.means[0] < mix.means[1]);

    let (again, _) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();
    assert_eq!(t, again);
}

#[test]
fn test_gmm_estimate_on_narrow_background_wide_tissue() {
    // 500 background pixels ~ N(0, 0.1) and 500 tissue pixels ~ N(5, 0.5).
    let image = image_from_planes(vec![(
        "DNA1",
        bimodal_plane(20, 50, (0.0, 0.1), (5.0, 0.5), 13),
    )]);

    let (t, record) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();
    assert_eq!(record.method, EstimatedWith::Gmm);
    assert!(t > 0.0 && t < 5.0, "got {t}");

    let (again, repeat) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();
    assert_eq!(t, again);
    assert_eq!(record, repeat);
}

#[test]
fn test_gmm_on_multichannel_composite() {
    // Tissue lives in one channel on the left half and the other on the right.
    let tissue = |r: usize, c: usize| 0.8 + 0.01 * ((r + c) % 10) as f32;
    let left = Array2::from_shape_fn((20, 20), |(r, c)| {
        if c < 10 && r >= 10 {
            tissue(r, c)
        } else {
            0.1 + 0.001 * (r + c) as f32
        }
    });
    let right = Array2::from_shape_fn((20, 20), |(r, c)| {
        if c >= 10 && r >= 10 {
            tissue(r, c)
        } else {
            0.1 + 0.001 * (r * c) as f32
        }
    });
    let image = image_from_planes(vec![("CD3", left), ("CD20", right)]);

    let (t, record) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();
    assert!(!record.is_fallback());
    assert!(t > 0.25 && t < 0.8, "got {t}");
}

#[test]
fn test_thresholds_respect_floor() {
    let image = bimodal_image(9);
    for method in [ThresholdMethod::Otsu, ThresholdMethod::Gmm] {
        let (t, record) = method.estimate(&image, &params(0.95)).unwrap();
        assert_eq!(t, 0.95);
        assert_eq!(record.min_threshold, 0.95);
    }
}

#[test]
fn test_gmm_falls_back_to_otsu_on_constant_image() {
    let image = image_from_planes(vec![("DNA1", Array2::from_elem((16, 16), 0.5))]);
    let (t, record) = ThresholdMethod::Gmm.estimate(&image, &params(0.0)).unwrap();

    assert_eq!(record.method, EstimatedWith::GmmFallbackOtsu);
    assert!(record.is_fallback());
    assert!(record.fallback_reason.is_some());
    assert!(record.mixture.is_none());
    assert_eq!(t, 0.5);
}

#[test]
fn test_gmm_falls_back_when_everything_is_dark() {
    let image = image_from_planes(vec![("DNA1", Array2::from_elem((8, 8), 0.005))]);
    let (t, record) = ThresholdMethod::Gmm.estimate(&image, &params(0.1)).unwrap();
    assert!(record.is_fallback());
    assert_eq!(t, 0.1);
}

#[test]
fn test_estimate_rejects_empty_inputs() {
    let no_channels = ChannelImage::new(Array3::zeros((0, 4, 4)), Vec::new()).unwrap();
    let err = ThresholdMethod::Otsu
        .estimate(&no_channels, &params(0.0))
        .unwrap_err();
    assert!(matches!(err, TissueMaskError::EmptyComposite));

    let no_pixels = ChannelImage::new(Array3::zeros((1, 0, 0)), vec!["DNA1".into()]).unwrap();
    let err = ThresholdMethod::Gmm
        .estimate(&no_pixels, &params(0.0))
        .unwrap_err();
    assert!(matches!(err, TissueMaskError::EmptyImage));
}
