pub mod config;
pub mod hot_pixel;
pub mod intensity;
pub mod median;
mod pipeline;
pub mod striping;

pub use config::{PreprocessingConfig, StageToggles, StripeDirection};
pub use pipeline::{preprocess_image, PipelineStep, PreprocessingPipeline, Stage};
