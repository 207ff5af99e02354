//! Shot container

use crate::frame::VideoFrame;

/// An accumulating sequence of video frames representing one shot.
///
/// Grows only by append while a shot is being assembled; ownership moves to
/// the output queue when the shot is finished, after which it is never
/// mutated. Frames are appended in decode order, so ids are strictly
/// increasing within a container.
#[derive(Debug, Default)]
pub struct ShotContainer {
    frames: Vec<VideoFrame>,
}

impl ShotContainer {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn add_frame(&mut self, frame: VideoFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[VideoFrame] {
        &self.frames
    }

    /// Id of the first frame, `None` while empty.
    pub fn first_frame_id(&self) -> Option<u64> {
        self.frames.first().map(|f| f.id())
    }

    /// Id of the last frame, `None` while empty.
    pub fn last_frame_id(&self) -> Option<u64> {
        self.frames.last().map(|f| f.id())
    }

    /// Timestamp of the first frame in milliseconds, `None` while empty.
    pub fn start_timestamp(&self) -> Option<i64> {
        self.frames.first().map(|f| f.timestamp())
    }

    /// Timestamp of the last frame in milliseconds, `None` while empty.
    pub fn end_timestamp(&self) -> Option<i64> {
        self.frames.last().map(|f| f.timestamp())
    }

    pub fn into_frames(self) -> Vec<VideoFrame> {
        self.frames
    }
}
