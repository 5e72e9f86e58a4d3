mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{bimodal_plane, block_image, count_true, image_from_planes, labels};
use tissuemask_core::config::MaskConfig;
use tissuemask_core::error::TissueMaskError;
use tissuemask_core::mask::components::label_components;
use tissuemask_core::mask::morphology::Connectivity;
use tissuemask_core::mask::{
    fill_small_holes, generate_tissue_mask, remove_small_objects, TissueMaskConfig,
};
use tissuemask_core::process::{generate_mask, MaskOptions, MaskRecord, RunStats};
use tissuemask_core::threshold::{EstimatedWith, ThresholdMethod};

fn cleanup_config(objects: usize, holes: usize) -> TissueMaskConfig {
    TissueMaskConfig {
        small_object_threshold: objects,
        small_hole_threshold: holes,
        ..Default::default()
    }
}

/// 12x12 mask with an 8x8 square at (2, 2) and a 2-pixel hole inside it.
fn square_with_hole() -> Array2<bool> {
    let mut mask = Array2::from_elem((12, 12), false);
    for r in 2..10 {
        for c in 2..10 {
            mask[[r, c]] = true;
        }
    }
    mask[[5, 5]] = false;
    mask[[5, 6]] = false;
    mask
}

// ---------------------------------------------------------------------------
// generate_tissue_mask
// ---------------------------------------------------------------------------

#[test]
fn test_small_block_removed_entirely() {
    let image = block_image(10, 10, 3, 3, 3, 1.0);
    let (mask, meta) = generate_tissue_mask(&image, 0.5, true, true, &cleanup_config(20, 20));

    assert_eq!(count_true(&mask), 0);
    assert_eq!(meta.raw_area_px, 9);
    assert_eq!(meta.clean_area_px, 0);
    assert_eq!(meta.full_area_px, 100);
    assert_eq!(meta.removed_small_object_area_px, 9);
    assert_eq!(meta.filled_hole_area_px, 0);
    assert_eq!(meta.area_delta_px, -9);
    assert_abs_diff_eq!(meta.area_delta_percent, -100.0);
    assert_abs_diff_eq!(meta.coverage_percent, 0.0);
}

#[test]
fn test_cleanup_disabled_keeps_raw_mask() {
    let image = block_image(10, 10, 3, 3, 3, 1.0);
    let (mask, meta) = generate_tissue_mask(&image, 0.5, false, false, &cleanup_config(20, 20));

    assert_eq!(mask, image.any_above(0.5));
    assert_eq!(meta.clean_area_px, meta.raw_area_px);
    assert_eq!(meta.area_delta_px, 0);
    assert_abs_diff_eq!(meta.coverage_percent, 9.0);
}

#[test]
fn test_threshold_is_strict() {
    let image = block_image(6, 6, 1, 1, 2, 0.5);
    let (mask, meta) = generate_tissue_mask(&image, 0.5, false, false, &cleanup_config(0, 0));
    assert_eq!(count_true(&mask), 0);
    assert_eq!(meta.raw_area_px, 0);
    assert_abs_diff_eq!(meta.area_delta_percent, 0.0);
}

#[test]
fn test_any_channel_above_threshold_marks_tissue() {
    let mut a = Array2::<f32>::zeros((4, 4));
    let mut b = Array2::<f32>::zeros((4, 4));
    a[[0, 0]] = 1.0;
    b[[3, 3]] = 1.0;
    let image = image_from_planes(vec![("CD3", a), ("CD20", b)]);

    let (mask, meta) = generate_tissue_mask(&image, 0.5, false, false, &cleanup_config(0, 0));
    assert!(mask[[0, 0]] && mask[[3, 3]]);
    assert_eq!(meta.raw_area_px, 2);
}

#[test]
fn test_hole_fill_reported_against_pruned_mask() {
    let mask = square_with_hole();
    let plane = mask.mapv(|v| if v { 1.0f32 } else { 0.0 });
    let image = image_from_planes(vec![("DNA1", plane)]);

    let (clean, meta) = generate_tissue_mask(&image, 0.5, true, true, &cleanup_config(10, 10));
    assert!(clean[[5, 5]] && clean[[5, 6]]);
    assert_eq!(meta.raw_area_px, 62);
    assert_eq!(meta.clean_area_px, 64);
    assert_eq!(meta.filled_hole_area_px, 2);
    assert_eq!(meta.removed_small_object_area_px, 0);
    assert_eq!(meta.area_delta_px, 2);
}

#[test]
fn test_coverage_is_bounded_percentage() {
    let image = image_from_planes(vec![(
        "DNA1",
        bimodal_plane(30, 40, (0.2, 0.05), (0.8, 0.05), 21),
    )]);
    for threshold in [-1.0, 0.0, 0.5, 2.0] {
        let (mask, meta) =
            generate_tissue_mask(&image, threshold, true, true, &TissueMaskConfig::default());
        assert!((0.0..=100.0).contains(&meta.coverage_percent));
        assert_eq!(meta.clean_area_px, count_true(&mask));
        assert_eq!(
            meta.area_delta_px,
            meta.clean_area_px as i64 - meta.raw_area_px as i64
        );
    }
}

#[test]
fn test_cleanup_is_a_fixed_point() {
    let mut rng = StdRng::seed_from_u64(17);
    let config = cleanup_config(6, 6);

    for _ in 0..50 {
        let plane = Array2::from_shape_fn((24, 24), |_| {
            if rng.random_bool(0.55) { 1.0f32 } else { 0.0 }
        });
        let image = image_from_planes(vec![("DNA1", plane)]);
        let (once, _) = generate_tissue_mask(&image, 0.5, true, true, &config);

        let again = image_from_planes(vec![("DNA1", once.mapv(|v| if v { 1.0f32 } else { 0.0 }))]);
        let (twice, meta) = generate_tissue_mask(&again, 0.5, true, true, &config);
        assert_eq!(twice, once);
        assert_eq!(meta.removed_small_object_area_px, 0);
        assert_eq!(meta.filled_hole_area_px, 0);
        assert_eq!(meta.area_delta_px, 0);
    }
}

// ---------------------------------------------------------------------------
// Object removal and hole filling
// ---------------------------------------------------------------------------

#[test]
fn test_remove_small_objects_is_idempotent() {
    let mut mask = square_with_hole();
    mask[[0, 11]] = true;
    mask[[11, 0]] = true;
    mask[[11, 1]] = true;

    let once = remove_small_objects(&mask, 5);
    let twice = remove_small_objects(&once, 5);
    assert_eq!(once, twice);
    assert!(!once[[0, 11]] && !once[[11, 0]]);
    assert_eq!(count_true(&once), 62);
}

#[test]
fn test_remove_small_objects_keeps_threshold_sized_component() {
    let image = block_image(8, 8, 2, 2, 3, 1.0);
    let mask = image.any_above(0.5);
    assert_eq!(remove_small_objects(&mask, 9), mask);
    assert_eq!(count_true(&remove_small_objects(&mask, 10)), 0);
}

#[test]
fn test_diagonal_neighbours_are_separate_objects() {
    let mut mask = Array2::from_elem((5, 5), false);
    mask[[1, 1]] = true;
    mask[[2, 2]] = true;
    assert_eq!(label_components(&mask, Connectivity::Four).components.len(), 2);
    assert_eq!(count_true(&remove_small_objects(&mask, 2)), 0);
}

#[test]
fn test_fill_small_holes_respects_size_and_border() {
    let mask = square_with_hole();
    assert_eq!(fill_small_holes(&mask, 2), mask);
    let filled = fill_small_holes(&mask, 3);
    assert_eq!(count_true(&filled), 64);

    // Background touching the border is never a hole.
    let mut open = Array2::from_elem((6, 6), true);
    open[[0, 2]] = false;
    open[[1, 2]] = false;
    assert_eq!(fill_small_holes(&open, 100), open);
}

#[test]
fn test_fill_small_holes_is_idempotent() {
    let once = fill_small_holes(&square_with_hole(), 10);
    assert_eq!(fill_small_holes(&once, 10), once);
}

// ---------------------------------------------------------------------------
// generate_mask
// ---------------------------------------------------------------------------

fn two_channel_tissue() -> tissuemask_core::channels::ChannelImage {
    image_from_planes(vec![
        ("DNA1", bimodal_plane(32, 48, (2.0, 0.5), (40.0, 4.0), 31)),
        ("CD45", bimodal_plane(32, 48, (1.0, 0.3), (25.0, 3.0), 32)),
        ("Bg", Array2::from_elem((32, 48), 7.0)),
    ])
}

#[test]
fn test_generate_mask_finds_tissue_half() {
    let mut config = MaskConfig::default();
    config.preprocessing.background_stains = labels(&["Bg"]);

    for method in [ThresholdMethod::Otsu, ThresholdMethod::Gmm] {
        let options = MaskOptions {
            method,
            ..Default::default()
        };
        let outcome = generate_mask(&two_channel_tissue(), &config, &options).unwrap();

        assert_eq!(outcome.composite.channels(), labels(&["DNA1", "CD45"]).as_slice());
        assert_eq!(outcome.mask.dim(), (32, 48));
        let left = outcome.mask.iter().enumerate().filter(|(i, &v)| v && i % 48 < 24).count();
        let right = outcome.mask.iter().enumerate().filter(|(i, &v)| v && i % 48 >= 24).count();
        assert_eq!(left, 0, "{method}");
        assert_eq!(right, 32 * 24, "{method}");
        assert_abs_diff_eq!(outcome.metadata.coverage_percent, 50.0);
    }
}

#[test]
fn test_generate_mask_restricts_to_configured_markers() {
    let mut config = MaskConfig::default();
    config.tissue_mask.mask_generation_markers = labels(&["CD45", "Missing"]);
    let options = MaskOptions {
        preprocess: false,
        ..Default::default()
    };

    let outcome = generate_mask(&two_channel_tissue(), &config, &options).unwrap();
    assert_eq!(outcome.composite.channels(), labels(&["CD45"]).as_slice());
}

#[test]
fn test_generate_mask_without_any_marker_fails() {
    let mut config = MaskConfig::default();
    config.tissue_mask.mask_generation_markers = labels(&["Missing"]);
    let err = generate_mask(&two_channel_tissue(), &config, &MaskOptions::default()).unwrap_err();
    assert!(matches!(err, TissueMaskError::MissingChannel(_)));
}

#[test]
fn test_generate_mask_when_stain_removal_empties_composite() {
    let mut config = MaskConfig::default();
    config.preprocessing.background_stains = labels(&["DNA1", "CD45", "Bg"]);
    let err = generate_mask(&two_channel_tissue(), &config, &MaskOptions::default()).unwrap_err();
    assert!(matches!(err, TissueMaskError::EmptyComposite));
}

#[test]
fn test_mask_record_flattens_gmm_fields() {
    let config = MaskConfig::default();
    let image = two_channel_tissue();

    let otsu = generate_mask(&image, &config, &MaskOptions::default()).unwrap();
    let record: MaskRecord = otsu.record();
    assert_eq!(record.method, EstimatedWith::Otsu);
    assert!(record.gmm_mean_tissue.is_none());
    assert_eq!(record.clean_area_px, otsu.metadata.clean_area_px);

    let options = MaskOptions {
        method: ThresholdMethod::Gmm,
        ..Default::default()
    };
    let gmm = generate_mask(&image, &config, &options).unwrap();
    let record = gmm.record();
    assert_eq!(record.method, EstimatedWith::Gmm);
    assert!(record.gmm_mean_background.unwrap() < record.gmm_mean_tissue.unwrap());
}

#[test]
fn test_run_stats_fold_and_merge() {
    let image = two_channel_tissue();
    let config = MaskConfig::default();
    let outcome = generate_mask(&image, &config, &MaskOptions::default()).unwrap();

    let a = RunStats::default()
        .accumulate(Some(&outcome.threshold))
        .accumulate(None);
    let b = RunStats::default().accumulate(Some(&outcome.threshold));
    let total = a.merge(b);
    assert_eq!(total.attempted, 3);
    assert_eq!(total.succeeded, 2);
    assert_eq!(total.failed, 1);
    assert_eq!(total.gmm_fallbacks, 0);
}
