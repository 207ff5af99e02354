//! Shot segmentation module
//!
//! This module groups decoded frames into shot-level containers using
//! histogram-distance cut detection over a sliding pre-shot window,
//! reconciled against previously persisted segment boundaries.

mod container;
mod histogram;
mod segmenter;

pub use container::ShotContainer;
pub use histogram::SpatialHistogram;
pub use segmenter::ShotSegmenter;
