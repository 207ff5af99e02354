//! FFmpeg-backed video decoder
//!
//! Owns the demux/decode/resample state for one container: pulls compressed
//! packets, routes them to the video or audio codec, scales video to RGB24
//! within the configured bounds, resamples audio to packed S16, and yields
//! video frames with timestamp-aligned audio attached.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use ffmpeg_next as ffmpeg;
use ffmpeg_next::software::scaling::{context::Context as Scaler, flag::Flags as ScalerFlags};

use crate::config::DecoderConfig;
use crate::decode::mime;
use crate::decode::resample::AudioResampler;
use crate::decode::FrameSource;
use crate::error::{FfmpegError, PipelineError, Result};
use crate::ffmpeg_utils::utils::{rate_to_fps, stream_duration_millis, ts_to_millis};
use crate::frame::{AudioDescriptor, AudioFrame, RgbRaster, VideoDescriptor, VideoFrame};

/// Decoder lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Uninitialized,
    Initialized,
    Decoding,
    Draining,
    Closed,
}

/// Native state for the selected video stream.
struct VideoStreamState {
    index: usize,
    decoder: ffmpeg::decoder::Video,
    scaler: Scaler,
    timebase: ffmpeg::Rational,
    descriptor: VideoDescriptor,
    reported_frames: u64,
    frames_decoded: u64,
}

/// Native state for the selected audio stream. Absent when the container
/// has no audio or its codec could not be opened.
struct AudioStreamState {
    index: usize,
    decoder: ffmpeg::decoder::Audio,
    resampler: Option<AudioResampler>,
    timebase: ffmpeg::Rational,
    descriptor: AudioDescriptor,
    frames_decoded: u64,
}

/// Pull-based decoder for one media file.
///
/// All native handles are exclusively owned here and released in dependency
/// order on `close` (or drop), on every exit path including init failures.
pub struct VideoDecoder {
    state: DecoderState,
    path: PathBuf,
    input: Option<ffmpeg::format::context::Input>,
    video: Option<VideoStreamState>,
    audio: Option<AudioStreamState>,
    video_queue: VecDeque<VideoFrame>,
    audio_queue: VecDeque<AudioFrame>,
    eof: bool,
    video_complete: bool,
    audio_complete: bool,
}

// SAFETY: the decoder is owned by exactly one thread at a time. It is
// constructed by the caller, moved into the segmenter worker, and handed
// back when the worker exits. The FFmpeg contexts it owns carry no thread
// affinity, they only forbid concurrent use, and nothing here is shared.
unsafe impl Send for VideoDecoder {}

impl VideoDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Uninitialized,
            path: PathBuf::new(),
            input: None,
            video: None,
            audio: None,
            video_queue: VecDeque::new(),
            audio_queue: VecDeque::new(),
            eof: false,
            video_complete: false,
            audio_complete: false,
        }
    }

    /// Open the container and select streams.
    ///
    /// Fails when the file is missing, not an allowed type, has no usable
    /// video stream, or the video codec cannot be opened. Audio problems are
    /// not fatal: the decoder degrades to video-only.
    pub fn init<P: AsRef<Path>>(&mut self, path: P, config: &DecoderConfig) -> Result<()> {
        let path = path.as_ref();
        if !mime::is_supported(path) {
            return Err(PipelineError::UnsupportedMediaType(
                path.display().to_string(),
            ));
        }
        if !path.is_file() {
            return Err(PipelineError::FileNotFound(path.display().to_string()));
        }

        // Re-init releases any previous session first.
        self.close();
        self.state = DecoderState::Uninitialized;

        let input = ffmpeg::format::input(path).map_err(|e| {
            FfmpegError::OpenInput(format!("failed to open {}: {}", path.display(), e))
        })?;
        let video = Self::init_video(&input, config)?;
        let audio = Self::init_audio(&input, config);

        self.audio_complete = audio.is_none();
        self.video_complete = false;
        self.eof = false;
        self.video_queue.clear();
        self.audio_queue.clear();
        self.path = path.to_path_buf();
        self.input = Some(input);
        self.video = Some(video);
        self.audio = audio;
        self.state = DecoderState::Initialized;

        tracing::info!(path = %self.path.display(), "decoder initialized");
        Ok(())
    }

    fn init_video(
        input: &ffmpeg::format::context::Input,
        config: &DecoderConfig,
    ) -> Result<VideoStreamState> {
        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(PipelineError::NoVideoStream)?;
        let index = stream.index();

        let context =
            ffmpeg::codec::Context::from_parameters(stream.parameters()).map_err(|e| {
                FfmpegError::DecoderCreate(format!(
                    "video codec context for stream {}: {}",
                    index, e
                ))
            })?;
        let decoder = context.decoder().video().map_err(|e| {
            FfmpegError::DecoderCreate(format!("video decoder for stream {}: {}", index, e))
        })?;

        let (width, height) = config.scaled_dimensions(decoder.width(), decoder.height());
        let scaler = Scaler::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ScalerFlags::BILINEAR,
        )
        .map_err(|e| FfmpegError::ScalerCreate(format!("scaler for stream {}: {}", index, e)))?;

        let descriptor = VideoDescriptor {
            fps: rate_to_fps(stream.avg_frame_rate()),
            duration_ms: stream_duration_millis(stream.duration(), stream.time_base()),
            width,
            height,
        };
        tracing::debug!(
            stream = index,
            src_width = decoder.width(),
            src_height = decoder.height(),
            width,
            height,
            fps = descriptor.fps,
            "video stream selected"
        );

        Ok(VideoStreamState {
            index,
            decoder,
            scaler,
            timebase: stream.time_base(),
            descriptor,
            reported_frames: stream.frames().max(0) as u64,
            frames_decoded: 0,
        })
    }

    fn init_audio(
        input: &ffmpeg::format::context::Input,
        config: &DecoderConfig,
    ) -> Option<AudioStreamState> {
        let stream = match input.streams().best(ffmpeg::media::Type::Audio) {
            Some(stream) => stream,
            None => {
                tracing::warn!("no audio stream found, continuing without audio");
                return None;
            }
        };
        let index = stream.index();

        let context = match ffmpeg::codec::Context::from_parameters(stream.parameters()) {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(
                    stream = index,
                    error = %e,
                    "audio codec context failed, continuing without audio"
                );
                return None;
            }
        };
        let decoder = match context.decoder().audio() {
            Ok(decoder) => decoder,
            Err(e) => {
                tracing::warn!(
                    stream = index,
                    error = %e,
                    "audio decoder failed, continuing without audio"
                );
                return None;
            }
        };

        let duration_ms = stream_duration_millis(stream.duration(), stream.time_base());
        let resampler = match AudioResampler::new(&decoder, config.samplerate, config.channels) {
            Ok(resampler) => Some(resampler),
            Err(e) => {
                tracing::warn!(
                    stream = index,
                    error = %e,
                    "resampler setup failed, original sample format will be kept"
                );
                None
            }
        };
        let descriptor = match &resampler {
            Some(resampler) => AudioDescriptor {
                sample_rate: resampler.rate(),
                channels: resampler.channels(),
                duration_ms,
            },
            None => AudioDescriptor {
                sample_rate: decoder.rate(),
                channels: decoder.channels(),
                duration_ms,
            },
        };
        tracing::debug!(
            stream = index,
            sample_rate = descriptor.sample_rate,
            channels = descriptor.channels,
            resampled = resampler.is_some(),
            "audio stream selected"
        );

        Some(AudioStreamState {
            index,
            decoder,
            resampler,
            timebase: stream.time_base(),
            descriptor,
            frames_decoded: 0,
        })
    }

    /// Pull the next fully decoded video frame, with any audio whose
    /// timestamp does not exceed the frame's attached in queue order.
    ///
    /// Returns `None` once end-of-stream has been reached and the video
    /// queue is drained; `is_complete()` reports true from then on.
    pub fn next_frame(&mut self) -> Option<VideoFrame> {
        match self.state {
            DecoderState::Uninitialized | DecoderState::Closed => return None,
            DecoderState::Initialized => self.state = DecoderState::Decoding,
            _ => {}
        }

        while self.video_queue.is_empty() && !self.eof {
            if !self.pump() {
                break;
            }
        }
        let mut frame = match self.video_queue.pop_front() {
            Some(frame) => frame,
            None => {
                if self.eof {
                    self.video_complete = true;
                }
                return None;
            }
        };

        let timestamp = frame.timestamp();
        while !self.audio_complete {
            while self.audio_queue.is_empty() && !self.eof {
                if !self.pump() {
                    break;
                }
            }
            match self.audio_queue.front() {
                Some(audio) if audio.timestamp() <= timestamp => {
                    if let Some(audio) = self.audio_queue.pop_front() {
                        frame.add_audio_frame(audio);
                    }
                }
                Some(_) => break,
                None => {
                    if self.eof {
                        self.audio_complete = true;
                    }
                    break;
                }
            }
        }

        Some(frame)
    }

    /// Container-reported frame count for the video stream; 0 when unknown.
    pub fn frame_count(&self) -> u64 {
        self.video.as_ref().map(|v| v.reported_frames).unwrap_or(0)
    }

    /// True once the last video frame has been delivered.
    pub fn is_complete(&self) -> bool {
        self.video_complete
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Stream metadata computed at init.
    pub fn video_descriptor(&self) -> Option<VideoDescriptor> {
        self.video.as_ref().map(|v| v.descriptor)
    }

    /// Audio metadata computed at init; reflects the resampling target when
    /// a resample context is active, the source parameters otherwise.
    pub fn audio_descriptor(&self) -> Option<AudioDescriptor> {
        self.audio.as_ref().map(|a| a.descriptor)
    }

    /// Read one packet and route it to the matching codec.
    ///
    /// Returns false when reading has ended. End-of-stream and read failures
    /// both end the stream (codecs are flushed exactly once and their
    /// buffered frames drained); only the logging differs. A failed read is
    /// never retried.
    fn pump(&mut self) -> bool {
        let input = match self.input.as_mut() {
            Some(input) => input,
            None => return false,
        };
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(input) {
            Ok(()) => {}
            Err(e) => {
                if !matches!(e, ffmpeg::Error::Eof) {
                    tracing::error!(path = %self.path.display(), error = %e, "error reading packet, ending stream");
                }
                if !self.eof {
                    self.eof = true;
                    self.state = DecoderState::Draining;
                    self.flush_decoders();
                }
                return false;
            }
        }

        let stream_index = packet.stream();
        if self.video.as_ref().map(|v| v.index) == Some(stream_index) {
            self.decode_video_packet(&packet);
        } else if self.audio.as_ref().map(|a| a.index) == Some(stream_index) {
            self.decode_audio_packet(&packet);
        }
        true
    }

    fn decode_video_packet(&mut self, packet: &ffmpeg::Packet) {
        let video = match self.video.as_mut() {
            Some(video) => video,
            None => return,
        };
        match video.decoder.send_packet(packet) {
            Ok(()) => {}
            Err(ffmpeg::Error::InvalidData) => {
                tracing::debug!(stream = video.index, "send_packet: skipping invalid packet");
                return;
            }
            Err(e) => {
                tracing::error!(stream = video.index, error = %e, "video send_packet failed");
                return;
            }
        }
        self.drain_video_decoder();
    }

    fn decode_audio_packet(&mut self, packet: &ffmpeg::Packet) {
        let audio = match self.audio.as_mut() {
            Some(audio) => audio,
            None => return,
        };
        match audio.decoder.send_packet(packet) {
            Ok(()) => {}
            Err(ffmpeg::Error::InvalidData) => {
                tracing::debug!(stream = audio.index, "send_packet: skipping invalid packet");
                return;
            }
            Err(e) => {
                tracing::error!(stream = audio.index, error = %e, "audio send_packet failed");
                return;
            }
        }
        self.drain_audio_decoder();
    }

    /// Send EOF to each codec exactly once and drain what they buffered.
    fn flush_decoders(&mut self) {
        if let Some(video) = self.video.as_mut() {
            match video.decoder.send_eof() {
                Ok(()) => {}
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {}
                Err(ffmpeg::Error::Eof) => {}
                Err(e) => {
                    tracing::error!(stream = video.index, error = %e, "video send_eof failed")
                }
            }
        }
        self.drain_video_decoder();

        if let Some(audio) = self.audio.as_mut() {
            match audio.decoder.send_eof() {
                Ok(()) => {}
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {}
                Err(ffmpeg::Error::Eof) => {}
                Err(e) => {
                    tracing::error!(stream = audio.index, error = %e, "audio send_eof failed")
                }
            }
        }
        self.drain_audio_decoder();
    }

    /// Receive every pending video frame, convert to RGB at the output
    /// dimensions, and queue it. Only fully converted frames are queued.
    fn drain_video_decoder(&mut self) {
        let video = match self.video.as_mut() {
            Some(video) => video,
            None => return,
        };
        let mut decoded = ffmpeg::util::frame::Video::empty();
        loop {
            match video.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let mut rgb = ffmpeg::util::frame::Video::empty();
                    if let Err(e) = video.scaler.run(&decoded, &mut rgb) {
                        tracing::warn!(
                            stream = video.index,
                            error = %e,
                            "scaling failed, frame dropped"
                        );
                        continue;
                    }
                    video.frames_decoded += 1;
                    let timestamp = ts_to_millis(decoded.timestamp(), video.timebase);
                    match RgbRaster::from_plane(
                        video.descriptor.width,
                        video.descriptor.height,
                        rgb.data(0),
                        rgb.stride(0),
                    ) {
                        Some(raster) => self.video_queue.push_back(VideoFrame::new(
                            video.frames_decoded,
                            timestamp,
                            raster,
                            video.descriptor,
                        )),
                        None => tracing::warn!(
                            stream = video.index,
                            frame = video.frames_decoded,
                            "scaled plane too short, frame dropped"
                        ),
                    }
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                Err(ffmpeg::Error::Eof) => break,
                Err(e) => {
                    tracing::error!(stream = video.index, error = %e, "video receive_frame failed");
                    break;
                }
            }
        }
    }

    /// Receive every pending audio frame, resample when a context exists,
    /// and queue one payload per source frame.
    fn drain_audio_decoder(&mut self) {
        let audio = match self.audio.as_mut() {
            Some(audio) => audio,
            None => return,
        };
        let mut decoded = ffmpeg::util::frame::Audio::empty();
        loop {
            match audio.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    audio.frames_decoded += 1;
                    let timestamp = ts_to_millis(decoded.timestamp(), audio.timebase);
                    match audio.resampler.as_mut() {
                        Some(resampler) => match resampler.convert(&decoded) {
                            Ok(chunks) => {
                                let mut merged: Option<AudioFrame> = None;
                                for chunk in &chunks {
                                    let part = AudioFrame::new(
                                        audio.frames_decoded,
                                        timestamp,
                                        copy_packed_samples(chunk),
                                        audio.descriptor,
                                    );
                                    match merged.as_mut() {
                                        Some(merged) => merged.append(&part),
                                        None => merged = Some(part),
                                    }
                                }
                                if let Some(frame) = merged {
                                    self.audio_queue.push_back(frame);
                                }
                            }
                            Err(e) => tracing::warn!(
                                stream = audio.index,
                                error = %e,
                                "resample failed, audio frame dropped"
                            ),
                        },
                        None => self.audio_queue.push_back(AudioFrame::new(
                            audio.frames_decoded,
                            timestamp,
                            copy_packed_samples(&decoded),
                            audio.descriptor,
                        )),
                    }
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                Err(ffmpeg::Error::Eof) => break,
                Err(e) => {
                    tracing::error!(stream = audio.index, error = %e, "audio receive_frame failed");
                    break;
                }
            }
        }
    }

    /// Release all native resources in dependency order: buffered frames,
    /// resample context, audio codec, scaler, video codec, container.
    /// Idempotent, and safe before `init`.
    pub fn close(&mut self) {
        if self.state == DecoderState::Closed {
            return;
        }
        let had_session = self.input.is_some();

        self.video_queue.clear();
        self.audio_queue.clear();
        if let Some(mut audio) = self.audio.take() {
            drop(audio.resampler.take());
            drop(audio.decoder);
        }
        if let Some(video) = self.video.take() {
            drop(video.scaler);
            drop(video.decoder);
        }
        drop(self.input.take());
        self.state = DecoderState::Closed;

        if had_session {
            tracing::debug!(path = %self.path.display(), "decoder closed");
        }
    }
}

impl Default for VideoDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        self.close();
    }
}

impl FrameSource for VideoDecoder {
    fn next_frame(&mut self) -> Option<VideoFrame> {
        VideoDecoder::next_frame(self)
    }

    fn frame_count(&self) -> u64 {
        VideoDecoder::frame_count(self)
    }

    fn is_complete(&self) -> bool {
        VideoDecoder::is_complete(self)
    }

    fn close(&mut self) {
        VideoDecoder::close(self)
    }
}

/// Copy a frame's packed samples, excluding any allocator padding.
fn copy_packed_samples(frame: &ffmpeg::util::frame::Audio) -> Bytes {
    let want = frame.samples() * frame.format().bytes() * frame.channels() as usize;
    let data = frame.data(0);
    Bytes::copy_from_slice(&data[..want.min(data.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecoderConfig;

    #[test]
    fn test_new_decoder_is_uninitialized() {
        let mut decoder = VideoDecoder::new();
        assert_eq!(decoder.state(), DecoderState::Uninitialized);
        assert!(!decoder.is_complete());
        assert_eq!(decoder.frame_count(), 0);
        assert!(decoder.video_descriptor().is_none());
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn test_close_before_init_and_twice() {
        let mut decoder = VideoDecoder::new();
        decoder.close();
        assert_eq!(decoder.state(), DecoderState::Closed);
        decoder.close();
        assert_eq!(decoder.state(), DecoderState::Closed);
    }

    #[test]
    fn test_next_frame_after_close_returns_none() {
        let mut decoder = VideoDecoder::new();
        decoder.close();
        assert!(decoder.next_frame().is_none());
        assert!(!decoder.is_complete());
    }

    #[test]
    fn test_init_rejects_unsupported_type() {
        let mut decoder = VideoDecoder::new();
        let err = decoder
            .init("clip.mkv", &DecoderConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedMediaType(_)));
        assert_eq!(decoder.state(), DecoderState::Uninitialized);
    }

    #[test]
    fn test_init_rejects_missing_file() {
        let mut decoder = VideoDecoder::new();
        let err = decoder
            .init("/nonexistent/clip.mp4", &DecoderConfig::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
        assert_eq!(decoder.state(), DecoderState::Uninitialized);
    }
}
