// Pipeline processing: validation, deduplication, and ordering of weather events

pub mod normalize;
pub mod dedup;
pub mod sort;

pub use dedup::dedupe;
pub use normalize::{Normalizer, RejectReason};
pub use sort::sort_most_recent_first;
