use crate::frame::VideoFrame;

/// Pull interface the segmenter consumes.
///
/// `VideoDecoder` is the production implementation; tests substitute
/// scripted sources. Implementations are single-consumer: only one thread
/// calls `next_frame` at a time.
pub trait FrameSource: Send {
    /// The next fully decoded frame, or `None` when no frame is currently
    /// obtainable. Once `is_complete()` also holds, the stream is exhausted.
    fn next_frame(&mut self) -> Option<VideoFrame>;

    /// Container-reported total frame count. A best-effort hint, not
    /// authoritative; 0 when unknown.
    fn frame_count(&self) -> u64;

    /// True once the source has delivered its last frame.
    fn is_complete(&self) -> bool;

    /// Release underlying resources. Idempotent.
    fn close(&mut self);
}
