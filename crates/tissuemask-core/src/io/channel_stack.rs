use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use ndarray::Array2;
use tracing::{debug, warn};

use crate::channels::ChannelImage;
use crate::error::{Result, TissueMaskError};

/// File extensions recognised as single-channel planes.
pub const PLANE_EXTENSIONS: &[&str] = &["tiff", "tif", "png"];

/// Canonical form of a channel label: whitespace dropped, then all letters
/// followed by all digits (`"191 Ir"` becomes `"Ir191"`).
pub fn canonical_channel_id(raw: &str) -> String {
    let letters: String = raw.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if letters.is_empty() && digits.is_empty() {
        return raw.split_whitespace().collect();
    }
    format!("{letters}{digits}")
}

/// Sorted subdirectories of `folder`, one per source image.
pub fn list_image_sources(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    sources.sort();
    Ok(sources)
}

/// Load one plane as raw intensities.
///
/// 8- and 16-bit grayscale keep their integer counts; any other pixel type is
/// converted to normalised floating-point luminance.
pub fn load_plane(path: &Path) -> Result<Array2<f32>> {
    let img = image::open(path)?;
    let (w, h) = img.dimensions();
    let values: Vec<f32> = match img {
        DynamicImage::ImageLuma8(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        DynamicImage::ImageLuma16(buf) => buf.into_raw().into_iter().map(f32::from).collect(),
        other => other.to_luma32f().into_raw(),
    };
    Ok(Array2::from_shape_vec((h as usize, w as usize), values)
        .expect("buffer size matches dimensions"))
}

/// Load a directory holding one plane file per channel.
///
/// Channel labels come from the canonicalised file stems. Files are read in
/// name order; a label seen twice keeps its first plane.
pub fn load_channel_stack(dir: &Path) -> Result<ChannelImage> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PLANE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    files.sort();

    let mut planes: Vec<(String, Array2<f32>)> = Vec::with_capacity(files.len());
    for file in &files {
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let label = canonical_channel_id(stem);
        if planes.iter().any(|(l, _)| *l == label) {
            warn!(channel = %label, file = %file.display(), "Duplicate channel, keeping first");
            continue;
        }
        planes.push((label, load_plane(file)?));
    }

    if planes.is_empty() {
        return Err(TissueMaskError::NoPlanes(dir.to_path_buf()));
    }
    debug!(dir = %dir.display(), channels = planes.len(), "Loaded channel stack");
    ChannelImage::from_planes(planes)
}
