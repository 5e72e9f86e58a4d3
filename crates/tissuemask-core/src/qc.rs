//! Data preparation for the two-panel QC figure: the raw display composite
//! beside the same composite with the mask overlaid in translucent red.

use image::{Rgb, RgbImage};
use ndarray::{Array2, Zip};

use crate::channels::ChannelImage;
use crate::consts::{QC_DISPLAY_CHANNELS, QC_OVERLAY_ALPHA, QC_PANEL_GAP};
use crate::error::{Result, TissueMaskError};
use crate::mask::MaskMetadata;
use crate::preprocess::intensity::min_max_scale;
use crate::threshold::ThresholdRecord;

/// A rendered QC figure, ready to be saved.
#[derive(Clone, Debug)]
pub struct QcFigure {
    pub title: String,
    /// Display composite without the mask.
    pub raw: RgbImage,
    /// Display composite with the mask blended in red.
    pub overlay: RgbImage,
    pub caption: Vec<String>,
}

impl QcFigure {
    /// Both panels side by side on a black background.
    pub fn compose(&self) -> RgbImage {
        let (w, h) = self.raw.dimensions();
        let mut out = RgbImage::new(w * 2 + QC_PANEL_GAP, h);
        for (x, y, px) in self.raw.enumerate_pixels() {
            out.put_pixel(x, y, *px);
        }
        for (x, y, px) in self.overlay.enumerate_pixels() {
            out.put_pixel(x + w + QC_PANEL_GAP, y, *px);
        }
        out
    }
}

/// Caption lines: method, threshold (4 dp), coverage (2 dp), display channels.
pub fn qc_caption(
    threshold: &ThresholdRecord,
    metadata: &MaskMetadata,
    rgb_markers: &[String],
) -> Vec<String> {
    vec![
        format!("Method: {}", threshold.method),
        format!("Threshold: {:.4}", threshold.threshold),
        format!("Coverage: {:.2}%", metadata.coverage_percent),
        format!("RGB: {}", rgb_markers.join(" / ")),
    ]
}

/// Build the QC figure for one image.
///
/// `rgb_markers` names the three composite channels shown as red, green and
/// blue. Each is min-max scaled independently for display.
pub fn render_qc(
    mask: &Array2<bool>,
    composite: &ChannelImage,
    rgb_markers: &[String],
    threshold: &ThresholdRecord,
    metadata: &MaskMetadata,
    image_id: &str,
) -> Result<QcFigure> {
    if rgb_markers.len() != QC_DISPLAY_CHANNELS {
        return Err(TissueMaskError::config(format!(
            "QC needs exactly {QC_DISPLAY_CHANNELS} display channels, got {}",
            rgb_markers.len()
        )));
    }
    let (h, w) = (composite.height(), composite.width());
    if mask.dim() != (h, w) {
        return Err(TissueMaskError::ShapeMismatch {
            expected_height: h,
            expected_width: w,
            height: mask.nrows(),
            width: mask.ncols(),
        });
    }

    let mut display: Vec<Array2<f32>> = Vec::with_capacity(QC_DISPLAY_CHANNELS);
    for marker in rgb_markers {
        let plane = composite
            .plane(marker)
            .ok_or_else(|| TissueMaskError::MissingChannel(marker.clone()))?;
        display.push(min_max_scale(plane));
    }

    let mut raw = RgbImage::new(w as u32, h as u32);
    let mut overlay = RgbImage::new(w as u32, h as u32);
    Zip::indexed(mask)
        .and(&display[0])
        .and(&display[1])
        .and(&display[2])
        .for_each(|(row, col), &tissue, &r, &g, &b| {
            let base = [r, g, b];
            let tinted = if tissue {
                [
                    blend(base[0], 1.0),
                    blend(base[1], 0.0),
                    blend(base[2], 0.0),
                ]
            } else {
                base
            };
            raw.put_pixel(col as u32, row as u32, to_rgb8(base));
            overlay.put_pixel(col as u32, row as u32, to_rgb8(tinted));
        });

    Ok(QcFigure {
        title: format!("Tissue Mask QC - {image_id}"),
        raw,
        overlay,
        caption: qc_caption(threshold, metadata, rgb_markers),
    })
}

fn blend(base: f32, tint: f32) -> f32 {
    (1.0 - QC_OVERLAY_ALPHA) * base + QC_OVERLAY_ALPHA * tint
}

fn to_rgb8(rgb: [f32; 3]) -> Rgb<u8> {
    Rgb(rgb.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
}
