//! Segment metadata: descriptors, the lookup seam, and the boundary cache
//!
//! Real deployments back `SegmentLookup` with a database connector; this
//! crate ships an in-memory implementation for the runner and tests. The
//! segmenter never talks to a store directly, only through a
//! `BoundaryCache`.

mod cache;
mod descriptor;
mod store;

pub use cache::BoundaryCache;
pub use descriptor::SegmentDescriptor;
pub use store::{MemorySegmentStore, SegmentLookup};
