// =============================================================================
// Dataset tools: merge structured outputs, split by date into train/test
// =============================================================================

pub mod merge;
pub mod split;

pub use merge::merge_structured;
pub use split::split_by_date;
