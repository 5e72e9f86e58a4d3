pub mod channel_stack;
pub mod writers;

pub use channel_stack::{canonical_channel_id, list_image_sources, load_channel_stack};
pub use writers::{save_mask, save_mask_metadata, save_qc, write_id_mapping};
