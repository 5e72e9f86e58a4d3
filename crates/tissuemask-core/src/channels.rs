use ndarray::{Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::warn;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, TissueMaskError};

/// A stack of 2-D intensity planes, shape `(C, H, W)`, one per channel.
///
/// Each plane carries an identity label (a marker or metal tag such as
/// `Ir191`). Labels are expected to be unique; the loader canonicalises them
/// before an image reaches the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelImage {
    data: Array3<f32>,
    channels: Vec<String>,
}

impl ChannelImage {
    pub fn new(data: Array3<f32>, channels: Vec<String>) -> Result<Self> {
        if data.len_of(Axis(0)) != channels.len() {
            return Err(TissueMaskError::LabelCountMismatch {
                channels: data.len_of(Axis(0)),
                labels: channels.len(),
            });
        }
        Ok(Self { data, channels })
    }

    /// Build an image from labelled planes. All planes must share one shape.
    pub fn from_planes(planes: Vec<(String, Array2<f32>)>) -> Result<Self> {
        let Some((_, first)) = planes.first() else {
            return Err(TissueMaskError::EmptyComposite);
        };
        let (h, w) = first.dim();
        let mut data = Array3::<f32>::zeros((planes.len(), h, w));
        let mut channels = Vec::with_capacity(planes.len());

        for (i, (label, plane)) in planes.into_iter().enumerate() {
            let (ph, pw) = plane.dim();
            if (ph, pw) != (h, w) {
                return Err(TissueMaskError::ShapeMismatch {
                    expected_height: h,
                    expected_width: w,
                    height: ph,
                    width: pw,
                });
            }
            data.index_axis_mut(Axis(0), i).assign(&plane);
            channels.push(label);
        }

        Ok(Self { data, channels })
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Number of pixels in one plane (H*W).
    pub fn plane_area(&self) -> usize {
        self.height() * self.width()
    }

    pub fn index_of(&self, channel: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }

    pub fn plane(&self, channel: &str) -> Option<ArrayView2<'_, f32>> {
        self.index_of(channel)
            .map(|i| self.data.index_axis(Axis(0), i))
    }

    pub fn planes(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.data.outer_iter()
    }

    /// Project onto the listed channels, in the listed order.
    ///
    /// An empty list keeps every channel. Requested channels that are not
    /// present are skipped with a warning; if none remain the projection fails.
    pub fn select(&self, wanted: &[String]) -> Result<Self> {
        if wanted.is_empty() {
            return Ok(self.clone());
        }

        let mut indices: Vec<usize> = Vec::with_capacity(wanted.len());
        for channel in wanted {
            match self.index_of(channel) {
                Some(i) if !indices.contains(&i) => indices.push(i),
                Some(_) => {}
                None => warn!(channel = %channel, "Requested channel not present, skipping"),
            }
        }

        if indices.is_empty() {
            return Err(TissueMaskError::MissingChannel(wanted.join(", ")));
        }
        Ok(self.take(&indices))
    }

    /// Drop every channel whose label is in `excluded`. Labels that are not
    /// present are ignored.
    pub fn without(&self, excluded: &[String]) -> Self {
        let keep: Vec<usize> = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, c)| !excluded.contains(c))
            .map(|(i, _)| i)
            .collect();
        self.take(&keep)
    }

    fn take(&self, indices: &[usize]) -> Self {
        Self {
            data: self.data.select(Axis(0), indices),
            channels: indices.iter().map(|&i| self.channels[i].clone()).collect(),
        }
    }

    /// Apply `f` to every plane independently and collect the results into a
    /// new image with the same labels. `f` must preserve the plane shape.
    ///
    /// Planes are processed in parallel for large images.
    pub fn map_planes<F>(&self, f: F) -> Self
    where
        F: Fn(ArrayView2<'_, f32>) -> Array2<f32> + Send + Sync,
    {
        let c = self.channel_count();
        let planes: Vec<Array2<f32>> = if self.data.len() >= PARALLEL_PIXEL_THRESHOLD && c > 1 {
            (0..c)
                .into_par_iter()
                .map(|i| f(self.data.index_axis(Axis(0), i)))
                .collect()
        } else {
            self.data.outer_iter().map(&f).collect()
        };

        let mut data = Array3::<f32>::zeros(self.data.raw_dim());
        for (i, plane) in planes.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), i).assign(&plane);
        }
        Self {
            data,
            channels: self.channels.clone(),
        }
    }

    /// Per-pixel maximum across channels.
    pub fn max_projection(&self) -> Result<Array2<f32>> {
        if self.channel_count() == 0 {
            return Err(TissueMaskError::EmptyComposite);
        }
        Ok(self
            .data
            .fold_axis(Axis(0), f32::NEG_INFINITY, |&acc, &v| acc.max(v)))
    }

    /// Per-pixel "any channel above threshold".
    pub fn any_above(&self, threshold: f32) -> Array2<bool> {
        self.data
            .fold_axis(Axis(0), false, |&acc, &v| acc || v > threshold)
    }
}
