//! FFmpeg module - initialization and shared utilities
//!
//! This module handles:
//! - FFmpeg library initialization and native log level
//! - Timebase conversion helpers used by the decoder

pub mod utils;

pub use ffmpeg_next as ffmpeg;
#[allow(unused_imports)]
pub use utils::*;

/// Initialize the FFmpeg library.
///
/// This should be called exactly once at application startup before any
/// decoder is constructed. Returns an error if the underlying C library
/// fails to initialize context structures.
pub fn init() -> Result<(), crate::error::FfmpegError> {
    ffmpeg::init().map_err(|e| {
        crate::error::FfmpegError::InitFailed(format!("ffmpeg::init() failed: {}", e))
    })?;

    // SAFETY: modifies global FFmpeg state; called exactly once at startup
    // before any threads begin decoding.
    unsafe {
        ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_WARNING as i32);
    }

    tracing::info!("FFmpeg initialized");

    Ok(())
}
