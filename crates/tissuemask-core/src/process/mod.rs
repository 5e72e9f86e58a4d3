mod orchestrator;
mod record;
mod stats;

pub use orchestrator::{generate_mask, MaskOptions, MaskOutcome};
pub use record::MaskRecord;
pub use stats::RunStats;
