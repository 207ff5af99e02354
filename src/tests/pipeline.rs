//! End-to-end segmentation tests against scripted frame sources.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::frame::VideoFrame;
use crate::metadata::{BoundaryCache, MemorySegmentStore, SegmentDescriptor};
use crate::segment::{ShotContainer, ShotSegmenter};
use crate::tests::fixtures::{self, ScriptedSource};

fn empty_cache() -> Arc<BoundaryCache> {
    Arc::new(BoundaryCache::new(Arc::new(MemorySegmentStore::new())))
}

/// Drive a segmenter over `frames` until complete, collecting every
/// non-empty container in emission order.
fn segment_all(
    frames: Vec<VideoFrame>,
    cache: Arc<BoundaryCache>,
    object_id: &str,
) -> Vec<ShotContainer> {
    let source = ScriptedSource::new(frames);
    let mut segmenter = ShotSegmenter::new(cache);
    segmenter.init(Box::new(source), object_id).unwrap();
    segmenter.start().unwrap();

    let mut containers = Vec::new();
    while !segmenter.is_complete() {
        if let Some(container) = segmenter.next_segment() {
            if !container.is_empty() {
                containers.push(container);
            }
        }
    }
    segmenter.close();
    containers
}

fn emitted_ids(containers: &[ShotContainer]) -> Vec<u64> {
    containers
        .iter()
        .flat_map(|c| c.frames().iter().map(|f| f.id()))
        .collect()
}

#[test]
fn test_every_frame_lands_in_exactly_one_container() {
    let mut frames = fixtures::solid_run(1, 30, [0, 0, 0]);
    frames.extend(fixtures::solid_run(31, 25, [255, 255, 255]));
    frames.extend(fixtures::solid_run(56, 40, [128, 128, 128]));

    let containers = segment_all(frames, empty_cache(), "v_mixed");
    assert!(containers.len() >= 2, "expected at least one detected cut");

    let ids = emitted_ids(&containers);
    assert_eq!(ids, (1..=95).collect::<Vec<u64>>());
}

#[test]
fn test_containers_emitted_in_frame_order() {
    let mut frames = fixtures::solid_run(1, 40, [0, 0, 0]);
    frames.extend(fixtures::solid_run(41, 40, [255, 255, 255]));

    let containers = segment_all(frames, empty_cache(), "v_order");
    let starts: Vec<u64> = containers
        .iter()
        .filter_map(|c| c.first_frame_id())
        .collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]), "starts: {:?}", starts);
}

#[test]
fn test_uniform_sequence_yields_single_shot() {
    // 13 frames give 12 pairwise distances, all zero.
    let frames = fixtures::solid_run(1, 13, [90, 90, 90]);
    let containers = segment_all(frames, empty_cache(), "v_uniform");
    assert_eq!(containers.len(), 1);
    assert_eq!(emitted_ids(&containers), (1..=13).collect::<Vec<u64>>());
}

#[test]
fn test_cut_lands_at_distance_spike() {
    // Distances spike between positions 6 and 7 once the pre-shot window
    // overflows: frames 0..6 close the first shot, 7 onward seed the next.
    let mut frames = fixtures::solid_run(0, 7, [0, 0, 0]);
    frames.extend(fixtures::solid_run(7, 13, [255, 255, 255]));

    let containers = segment_all(frames, empty_cache(), "v_spike");
    assert_eq!(containers.len(), 2);
    assert_eq!(
        containers[0]
            .frames()
            .iter()
            .map(|f| f.id())
            .collect::<Vec<u64>>(),
        (0..=6).collect::<Vec<u64>>()
    );
    assert_eq!(containers[1].first_frame_id(), Some(7));
    assert_eq!(containers[1].last_frame_id(), Some(19));
}

#[test]
fn test_known_boundary_consumed_verbatim() {
    let store = Arc::new(MemorySegmentStore::new());
    store.insert(SegmentDescriptor::with_generated_id(
        "v_known", 1, 1, 9, 0.04, 0.36,
    ));
    store.insert(SegmentDescriptor::with_generated_id(
        "v_known", 2, 10, 40, 0.4, 1.6,
    ));
    let cache = Arc::new(BoundaryCache::new(store));
    cache.warm_up();

    // Uniform colors: histogram detection alone would never split this.
    let frames = fixtures::solid_run(1, 60, [20, 20, 20]);
    let containers = segment_all(frames, cache, "v_known");

    assert_eq!(containers.len(), 3);
    assert_eq!(containers[0].first_frame_id(), Some(1));
    assert_eq!(containers[0].last_frame_id(), Some(9));
    assert_eq!(
        containers[1]
            .frames()
            .iter()
            .map(|f| f.id())
            .collect::<Vec<u64>>(),
        (10..=40).collect::<Vec<u64>>()
    );
    assert_eq!(containers[2].first_frame_id(), Some(41));
    assert_eq!(containers[2].last_frame_id(), Some(60));
}

#[test]
fn test_shot_length_never_exceeds_cap() {
    let frames = fixtures::solid_run(1, 1500, [60, 60, 60]);
    let containers = segment_all(frames, empty_cache(), "v_long");

    assert!(containers.iter().all(|c| c.len() <= 720));
    assert_eq!(containers[0].len(), 720);
    assert_eq!(emitted_ids(&containers), (1..=1500).collect::<Vec<u64>>());
}

#[test]
fn test_attached_audio_never_ahead_of_video() {
    let frames: Vec<VideoFrame> = (1..=30).map(|id| fixtures::frame_with_audio(id, 3)).collect();
    let containers = segment_all(frames, empty_cache(), "v_audio");

    for container in &containers {
        for frame in container.frames() {
            assert_eq!(frame.audio().len(), 3);
            for audio in frame.audio() {
                assert!(audio.timestamp() <= frame.timestamp());
            }
        }
    }
}

#[test]
fn test_empty_source_completes_with_no_shots() {
    let containers = segment_all(Vec::new(), empty_cache(), "v_empty");
    assert!(containers.is_empty());
}

#[test]
fn test_close_reaches_source_after_worker_stops() {
    let source = ScriptedSource::new(fixtures::solid_run(1, 5, [0, 0, 0]));
    let closed = source.close_flag();

    let mut segmenter = ShotSegmenter::new(empty_cache());
    segmenter.init(Box::new(source), "v_close").unwrap();
    segmenter.start().unwrap();
    while !segmenter.is_complete() {
        segmenter.next_segment();
    }

    assert!(!closed.load(Ordering::Acquire));
    segmenter.close();
    assert!(closed.load(Ordering::Acquire));
}

#[test]
fn test_start_without_init_fails() {
    let mut segmenter = ShotSegmenter::new(empty_cache());
    assert!(segmenter.start().is_err());
}

#[test]
fn test_next_segment_before_start_is_non_terminal() {
    let mut segmenter = ShotSegmenter::new(empty_cache());
    assert!(segmenter.next_segment().is_none());
    assert!(!segmenter.is_complete());
}
