//! Shot segmenter
//!
//! Consumes a frame source on a dedicated worker thread and groups frames
//! into shots: a sliding pre-shot window is scanned for the local maximum of
//! inter-frame histogram distance, and previously persisted boundaries are
//! trusted over live detection. Finished shots travel to the consumer
//! through a bounded channel with blocking send.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::decode::FrameSource;
use crate::error::{PipelineError, Result};
use crate::frame::VideoFrame;
use crate::metadata::{BoundaryCache, SegmentDescriptor};
use crate::segment::container::ShotContainer;
use crate::segment::histogram::SpatialHistogram;

/// Histogram distance above which a cut is assumed.
const DISTANCE_THRESHOLD: f64 = 0.05;

/// Capacity of the output queue.
const SEGMENT_QUEUE_LENGTH: usize = 10;

/// Capacity of the pre-shot window.
const PRESHOT_QUEUE_LENGTH: usize = 10;

/// Hard cap on frames per shot.
const MAX_SHOT_LENGTH: usize = 720;

/// Consumer poll timeout.
const SEGMENT_POLL_TIMEOUT: Duration = Duration::from_millis(1000);

/// Frames pulled from the source per refill.
const REFILL_BATCH: usize = 20;

/// Streaming shot segmenter.
///
/// Lifecycle: `init` (loads known boundaries, installs the source), `start`
/// (spawns the worker), then `next_segment` until `is_complete`, then
/// `close`. The source lives in a shared slot: the worker takes it for the
/// duration of the run and returns it on exit, so `close` can only reach it
/// while no worker is active.
pub struct ShotSegmenter {
    boundaries: Arc<BoundaryCache>,
    source: Arc<Mutex<Option<Box<dyn FrameSource>>>>,
    known_boundaries: Vec<SegmentDescriptor>,
    receiver: Option<Receiver<ShotContainer>>,
    isrunning: Arc<AtomicBool>,
    source_complete: Arc<AtomicBool>,
    complete: bool,
    object_id: String,
}

impl ShotSegmenter {
    pub fn new(boundaries: Arc<BoundaryCache>) -> Self {
        Self {
            boundaries,
            source: Arc::new(Mutex::new(None)),
            known_boundaries: Vec::new(),
            receiver: None,
            isrunning: Arc::new(AtomicBool::new(false)),
            source_complete: Arc::new(AtomicBool::new(false)),
            complete: false,
            object_id: String::new(),
        }
    }

    /// Assign a frame source and load the known boundaries for `object_id`,
    /// sorted by sequence number. Rejected while a worker is active.
    pub fn init(&mut self, source: Box<dyn FrameSource>, object_id: &str) -> Result<()> {
        if self.isrunning.load(Ordering::Acquire) {
            return Err(PipelineError::SegmenterRunning(self.object_id.clone()));
        }
        let mut known = self.boundaries.segments_of_object(object_id);
        known.sort_by_key(|segment| segment.sequence_number);

        self.known_boundaries = known;
        *self.source.lock() = Some(source);
        self.receiver = None;
        self.complete = false;
        self.source_complete.store(false, Ordering::Release);
        self.object_id = object_id.to_string();

        tracing::debug!(
            object = %self.object_id,
            boundaries = self.known_boundaries.len(),
            "segmenter initialized"
        );
        Ok(())
    }

    /// Spawn the worker thread. Requires a prior `init`; rejected while a
    /// worker is already active.
    pub fn start(&mut self) -> Result<()> {
        if self.isrunning.load(Ordering::Acquire) {
            return Err(PipelineError::SegmenterRunning(self.object_id.clone()));
        }
        let source = self
            .source
            .lock()
            .take()
            .ok_or(PipelineError::NotInitialized)?;

        let (sender, receiver) = bounded(SEGMENT_QUEUE_LENGTH);
        self.receiver = Some(receiver);
        // The flag flips before the thread exists so a racing init/close
        // between spawn and first worker instruction is already rejected.
        self.isrunning.store(true, Ordering::Release);

        let worker = Worker {
            source,
            sender,
            slot: Arc::clone(&self.source),
            isrunning: Arc::clone(&self.isrunning),
            source_complete: Arc::clone(&self.source_complete),
            known_boundaries: std::mem::take(&mut self.known_boundaries).into(),
            object_id: self.object_id.clone(),
        };
        let spawned = thread::Builder::new()
            .name(format!("segmenter-{}", self.object_id))
            .spawn(move || worker.run());
        if let Err(e) = spawned {
            self.isrunning.store(false, Ordering::Release);
            return Err(PipelineError::Io(e));
        }
        Ok(())
    }

    /// Blocking pop from the output queue with a timeout.
    ///
    /// `None` is terminal only once `is_complete()` reports true; before
    /// that it means "nothing ready yet, poll again".
    pub fn next_segment(&mut self) -> Option<ShotContainer> {
        let receiver = match self.receiver.as_ref() {
            Some(receiver) => receiver,
            None => return None,
        };
        match receiver.recv_timeout(SEGMENT_POLL_TIMEOUT) {
            Ok(container) => Some(container),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                if !self.isrunning.load(Ordering::Acquire)
                    && self.source_complete.load(Ordering::Acquire)
                {
                    self.complete = true;
                }
                None
            }
        }
    }

    /// True once the worker has stopped and the source reports complete.
    /// Never flips true while the worker is still active.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Close the owned frame source. Skipped while the worker is active,
    /// since the source must not be torn down mid-read.
    pub fn close(&mut self) {
        if self.isrunning.load(Ordering::Acquire) {
            tracing::warn!(
                object = %self.object_id,
                "close requested while segmenter is running, skipped"
            );
            return;
        }
        if let Some(source) = self.source.lock().as_mut() {
            source.close();
        }
    }
}

/// State moved onto the worker thread for one run.
struct Worker {
    source: Box<dyn FrameSource>,
    sender: Sender<ShotContainer>,
    slot: Arc<Mutex<Option<Box<dyn FrameSource>>>>,
    isrunning: Arc<AtomicBool>,
    source_complete: Arc<AtomicBool>,
    known_boundaries: VecDeque<SegmentDescriptor>,
    object_id: String,
}

impl Worker {
    fn run(mut self) {
        tracing::debug!(object = %self.object_id, "segmenter worker started");
        let aborted = !self.segment_all();
        let complete = self.source.is_complete();
        self.source_complete.store(complete, Ordering::Release);
        // Return the source before clearing the running flag so close()
        // never observes "not running" with an empty slot.
        *self.slot.lock() = Some(self.source);
        self.isrunning.store(false, Ordering::Release);
        tracing::debug!(
            object = %self.object_id,
            complete,
            aborted,
            "segmenter worker stopped"
        );
    }

    /// Run the cut-detection loop until the source is exhausted. Returns
    /// false when the consumer disconnected and the run was abandoned.
    fn segment_all(&mut self) -> bool {
        let mut lookahead: VecDeque<VideoFrame> = VecDeque::new();
        let mut preshot: VecDeque<(VideoFrame, f64)> = VecDeque::new();

        loop {
            if lookahead.is_empty() {
                self.refill(&mut lookahead);
            }
            if self.source.is_complete() && lookahead.is_empty() && preshot.is_empty() {
                return true;
            }

            let mut shot = ShotContainer::new();

            // Frames left over from the previous cut decision already passed
            // the window test as same-shot candidates; they seed this shot.
            while let Some((frame, _)) = preshot.pop_front() {
                shot.add_frame(frame);
            }

            if lookahead.is_empty() {
                // Nothing to pull right now: emit what accumulated, even if
                // empty, so the consumer observes progress.
                if !self.emit(shot) {
                    return false;
                }
                continue;
            }
            let frame = match lookahead.pop_front() {
                Some(frame) => frame,
                None => continue,
            };

            if let Some(bounds) = self.match_boundary(frame.id()) {
                // A persisted boundary covers this frame: take the whole
                // range verbatim, no histogram comparison.
                shot.add_frame(frame);
                loop {
                    if lookahead.is_empty() {
                        self.refill(&mut lookahead);
                    }
                    match lookahead.front() {
                        Some(next) if next.id() <= bounds.end => {
                            if let Some(next) = lookahead.pop_front() {
                                shot.add_frame(next);
                            }
                        }
                        // Next frame is past the boundary, or the source ran
                        // dry before the boundary end.
                        _ => break,
                    }
                }
                tracing::trace!(
                    object = %self.object_id,
                    segment = %bounds.segment_id,
                    frames = shot.len(),
                    "known boundary consumed"
                );
                if !self.emit(shot) {
                    return false;
                }
                continue;
            }

            // Histogram detection: accumulate into the shot until the
            // pre-shot window resolves a cut or the input runs dry.
            let mut previous = SpatialHistogram::of(frame.raster());
            shot.add_frame(frame);
            loop {
                if lookahead.is_empty() {
                    self.refill(&mut lookahead);
                }
                let frame = match lookahead.pop_front() {
                    Some(frame) => frame,
                    None => {
                        // Source exhausted mid-shot: the window cannot be
                        // resolved any further, it belongs to this shot.
                        while let Some((frame, _)) = preshot.pop_front() {
                            shot.add_frame(frame);
                        }
                        break;
                    }
                };
                let histogram = SpatialHistogram::of(frame.raster());
                let distance = previous.distance(&histogram);
                previous = histogram;
                preshot.push_back((frame, distance));

                if preshot.len() <= PRESHOT_QUEUE_LENGTH {
                    continue;
                }

                let mut max = 0.0f64;
                let mut index = 0usize;
                for (i, (_, distance)) in preshot.iter().enumerate() {
                    if *distance > max {
                        max = *distance;
                        index = i;
                    }
                }

                if max <= DISTANCE_THRESHOLD && shot.len() < MAX_SHOT_LENGTH {
                    // No cut: absorb the window, clamped to the shot cap.
                    let take = preshot.len().min(MAX_SHOT_LENGTH - shot.len());
                    for _ in 0..take {
                        if let Some((frame, _)) = preshot.pop_front() {
                            shot.add_frame(frame);
                        }
                    }
                    if shot.len() >= MAX_SHOT_LENGTH {
                        break;
                    }
                } else {
                    // Cut at the maximum-distance frame: everything strictly
                    // before it ends this shot, the rest seeds the next one.
                    let take = index.min(MAX_SHOT_LENGTH.saturating_sub(shot.len()));
                    for _ in 0..take {
                        if let Some((frame, _)) = preshot.pop_front() {
                            shot.add_frame(frame);
                        }
                    }
                    break;
                }
            }
            if !self.emit(shot) {
                return false;
            }
        }
    }

    /// Pull up to one batch of frames from the source.
    fn refill(&mut self, lookahead: &mut VecDeque<VideoFrame>) {
        for _ in 0..REFILL_BATCH {
            match self.source.next_frame() {
                Some(frame) => lookahead.push_back(frame),
                None => break,
            }
        }
    }

    /// Drop boundaries already passed by; return the front one when it
    /// covers `id`. A boundary still ahead of `id` stays queued.
    fn match_boundary(&mut self, id: u64) -> Option<SegmentDescriptor> {
        while let Some(bounds) = self.known_boundaries.front() {
            if bounds.end < id {
                if let Some(stale) = self.known_boundaries.pop_front() {
                    tracing::debug!(
                        object = %self.object_id,
                        segment = %stale.segment_id,
                        frame = id,
                        "stale boundary dropped"
                    );
                }
                continue;
            }
            if bounds.contains(id) {
                return self.known_boundaries.pop_front();
            }
            return None;
        }
        None
    }

    /// Push one finished shot, blocking while the queue is full. False when
    /// the consumer side has gone away.
    fn emit(&mut self, shot: ShotContainer) -> bool {
        let first_frame = shot.first_frame_id();
        let frames = shot.len();
        match self.sender.send(shot) {
            Ok(()) => {
                tracing::trace!(
                    object = %self.object_id,
                    first_frame = ?first_frame,
                    frames,
                    "shot emitted"
                );
                true
            }
            Err(_) => {
                tracing::warn!(
                    object = %self.object_id,
                    "segment consumer disconnected, stopping"
                );
                false
            }
        }
    }
}
