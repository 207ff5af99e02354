//! Audio resampler for the decode pipeline
//!
//! Converts decoded PCM frames to packed S16 at the configured rate and
//! channel count before they are copied into `AudioFrame` payloads.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type};

use crate::error::FfmpegError;

/// Output sample format: signed 16-bit interleaved
const TARGET_FORMAT: Sample = Sample::I16(Type::Packed);

/// Audio resampler wrapping FFmpeg's `SwrContext`
pub(crate) struct AudioResampler {
    context: resampling::Context,
    rate: u32,
    channels: u16,
}

impl AudioResampler {
    /// Create a resampler converting the decoder's output format to packed
    /// S16 at `rate`/`channels`.
    pub fn new(
        decoder: &ffmpeg::decoder::Audio,
        rate: u32,
        channels: u16,
    ) -> Result<Self, FfmpegError> {
        let src_layout = if decoder.channel_layout().bits() == 0 {
            // No channel layout set; fall back based on channel count
            match decoder.channels() {
                1 => ChannelLayout::MONO,
                _ => ChannelLayout::STEREO,
            }
        } else {
            decoder.channel_layout()
        };
        let dst_layout = match channels {
            1 => ChannelLayout::MONO,
            _ => ChannelLayout::STEREO,
        };

        let context = resampling::Context::get(
            decoder.format(),
            src_layout,
            decoder.rate(),
            TARGET_FORMAT,
            dst_layout,
            rate,
        )
        .map_err(|e| {
            FfmpegError::ResamplerCreate(format!("failed to create resampling context: {}", e))
        })?;

        Ok(Self {
            context,
            rate,
            channels,
        })
    }

    /// Convert one decoded frame and drain any delayed output.
    ///
    /// Returns the converted chunks in order; a chunk list may be empty when
    /// the resampler buffers everything (short frames at stream start).
    pub fn convert(
        &mut self,
        frame: &ffmpeg::util::frame::Audio,
    ) -> Result<Vec<ffmpeg::util::frame::Audio>, FfmpegError> {
        let mut out = ffmpeg::util::frame::Audio::empty();
        self.context
            .run(frame, &mut out)
            .map_err(|e| FfmpegError::DecodePacket(format!("resampling error: {}", e)))?;

        let mut chunks = Vec::new();
        if out.samples() > 0 {
            chunks.push(out);
        }

        // Drain delayed samples so each source frame maps to one payload.
        loop {
            let mut more = ffmpeg::util::frame::Audio::empty();
            match self.context.flush(&mut more) {
                Ok(_) => {
                    if more.samples() == 0 {
                        break;
                    }
                    chunks.push(more);
                }
                Err(e) => {
                    // Passthrough contexts have nothing buffered and report
                    // an error here; there is no output to lose.
                    tracing::debug!("resampler drain returned non-fatal error: {}", e);
                    break;
                }
            }
        }

        Ok(chunks)
    }

    /// The output sample rate.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// The output channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_format_is_packed_s16() {
        assert_eq!(TARGET_FORMAT, Sample::I16(Type::Packed));
        assert_eq!(TARGET_FORMAT.bytes(), 2);
    }
}
