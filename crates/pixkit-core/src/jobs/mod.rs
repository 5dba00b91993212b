pub mod channel_offsets;
pub mod images_from_rois;
pub mod params;
mod resolve;
mod types;

pub use channel_offsets::run_channel_offsets;
pub use images_from_rois::run_images_from_rois;
pub use resolve::{resolve_images, Resolved};
pub use types::{JobStage, NoOpReporter, OffsetsOutcome, ProgressReporter, RoisOutcome};
