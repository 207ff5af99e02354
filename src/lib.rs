//! Video decode and shot segmentation pipeline
//!
//! Pulls compressed audio/video out of a media container through FFmpeg,
//! decodes and normalizes it (RGB24 video scaled into configured bounds,
//! packed S16 audio resampled to target rate/channels), attaches audio to
//! video frames by timestamp, and groups the frame stream into shot-level
//! containers using histogram-distance cut detection reconciled against
//! previously persisted segment boundaries.

pub mod config;
pub mod decode;
pub mod error;
pub mod ffmpeg_utils;
pub mod frame;
pub mod metadata;
pub mod segment;

#[cfg(test)]
pub(crate) mod tests;

pub use config::{DecoderConfig, RunnerConfig};
pub use decode::{DecoderState, FrameSource, VideoDecoder};
pub use error::{FfmpegError, PipelineError, Result};
pub use frame::{AudioDescriptor, AudioFrame, RgbRaster, VideoDescriptor, VideoFrame};
pub use metadata::{BoundaryCache, MemorySegmentStore, SegmentDescriptor, SegmentLookup};
pub use segment::{ShotContainer, ShotSegmenter};
