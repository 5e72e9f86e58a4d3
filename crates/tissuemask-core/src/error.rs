use thiserror::Error;

#[derive(Error, Debug)]
pub enum TissueMaskError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Plane shape mismatch: expected {expected_height}x{expected_width}, got {height}x{width}")]
    ShapeMismatch {
        expected_height: usize,
        expected_width: usize,
        height: usize,
        width: usize,
    },

    #[error("Channel count {channels} does not match {labels} channel labels")]
    LabelCountMismatch { channels: usize, labels: usize },

    #[error("Channel not present in image: {0}")]
    MissingChannel(String),

    #[error("No channel planes found in {}", .0.display())]
    NoPlanes(std::path::PathBuf),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("No channels left to build a composite from")]
    EmptyComposite,
}

impl TissueMaskError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, TissueMaskError>;
