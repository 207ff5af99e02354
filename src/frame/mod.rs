//! Decoded media value types
//!
//! Frames are immutable after construction: id, timestamp and payload never
//! change. The only sanctioned mutations are appending audio to a video
//! frame and `clear()`, which releases the pixel payload early.

mod audio;
mod raster;
mod video;

pub use audio::AudioFrame;
pub use raster::RgbRaster;
pub use video::VideoFrame;

/// Video stream metadata computed once at decoder initialization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoDescriptor {
    /// Frames per second from the container's average frame rate
    pub fps: f32,
    /// Total stream duration in milliseconds (0 when unknown)
    pub duration_ms: i64,
    /// Output frame width after any downscaling
    pub width: u32,
    /// Output frame height after any downscaling
    pub height: u32,
}

/// Audio stream metadata computed once at decoder initialization.
///
/// Reflects the resampling target when a resample context is active,
/// otherwise the source stream parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioDescriptor {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
    /// Total stream duration in milliseconds (0 when unknown)
    pub duration_ms: i64,
}
