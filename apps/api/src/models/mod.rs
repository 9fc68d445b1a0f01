pub mod estimate;

pub use estimate::{EstimatedRecord, ExtractedItem};
