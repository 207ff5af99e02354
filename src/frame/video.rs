use crate::frame::{AudioFrame, RgbRaster, VideoDescriptor};

/// One fully decoded video frame with any time-aligned audio attached.
///
/// `id` is the decoder's own sequence number, strictly increasing within a
/// stream; `timestamp` is best-effort milliseconds from the container
/// timebase. Both are fixed at construction, as is the raster. The audio
/// list only grows.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    id: u64,
    timestamp: i64,
    raster: RgbRaster,
    descriptor: VideoDescriptor,
    audio: Vec<AudioFrame>,
}

impl VideoFrame {
    pub fn new(id: u64, timestamp: i64, raster: RgbRaster, descriptor: VideoDescriptor) -> Self {
        Self {
            id,
            timestamp,
            raster,
            descriptor,
            audio: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Presentation timestamp in milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn raster(&self) -> &RgbRaster {
        &self.raster
    }

    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }

    pub fn audio(&self) -> &[AudioFrame] {
        &self.audio
    }

    pub fn has_audio(&self) -> bool {
        !self.audio.is_empty()
    }

    /// Attach an audio frame. Callers only attach frames whose timestamp
    /// does not exceed this frame's.
    pub fn add_audio_frame(&mut self, frame: AudioFrame) {
        self.audio.push(frame);
    }

    /// Release the pixel and audio payloads early.
    pub fn clear(&mut self) {
        self.raster.clear();
        self.audio.clear();
    }
}
