pub mod cleanup;
pub mod components;
pub mod config;
pub mod morphology;

pub use cleanup::{fill_small_holes, generate_tissue_mask, remove_small_objects, MaskMetadata};
pub use config::TissueMaskConfig;
