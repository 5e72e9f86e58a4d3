use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;
use serde::Serialize;

use crate::consts::{QC_CAPTION_KEYWORD, QC_TITLE_KEYWORD};
use crate::error::Result;
use crate::qc::QcFigure;
use crate::process::MaskRecord;

/// Save a mask as an 8-bit single-channel image (1 = tissue, 0 = background).
///
/// The format follows the file extension; TIFF when there is none.
pub fn save_mask(mask: &Array2<bool>, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();
    let mut img = GrayImage::new(w as u32, h as u32);
    for ((row, col), &tissue) in mask.indexed_iter() {
        img.put_pixel(col as u32, row as u32, Luma([u8::from(tissue)]));
    }

    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => ImageFormat::Png,
        _ => ImageFormat::Tiff,
    };
    img.save_with_format(path, format)?;
    Ok(())
}

/// Save the composed QC figure as an 8-bit RGB PNG.
///
/// The title and the caption lines (newline-separated) are stored as `tEXt`
/// chunks under [`QC_TITLE_KEYWORD`] and [`QC_CAPTION_KEYWORD`].
pub fn save_qc(figure: &QcFigure, path: &Path) -> Result<()> {
    let composed = figure.compose();
    let (w, h) = composed.dimensions();

    let file = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(file, w, h);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk(QC_TITLE_KEYWORD.to_string(), figure.title.clone())?;
    encoder.add_text_chunk(QC_CAPTION_KEYWORD.to_string(), figure.caption.join("\n"))?;

    let mut writer = encoder.write_header()?;
    writer.write_image_data(composed.as_raw())?;
    writer.finish()?;
    Ok(())
}

/// Write a single-row CSV with a header.
pub fn save_mask_metadata(record: &MaskRecord, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct IdMappingRow<'a> {
    wsi_id: &'a str,
    file_path: String,
}

/// Assign `wsi_<i>` ids to `sources` in sorted order and write the mapping as
/// CSV. Returns `(id, source)` pairs in that order.
pub fn write_id_mapping(sources: &[PathBuf], path: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut sorted = sources.to_vec();
    sorted.sort();
    let mapping: Vec<(String, PathBuf)> = sorted
        .into_iter()
        .enumerate()
        .map(|(i, p)| (format!("wsi_{i}"), p))
        .collect();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for (id, source) in &mapping {
        writer.serialize(IdMappingRow {
            wsi_id: id,
            file_path: source.display().to_string(),
        })?;
    }
    writer.flush()?;
    Ok(mapping)
}
