use dashmap::DashMap;

use crate::metadata::SegmentDescriptor;

/// Lookup interface for stored segment metadata.
///
/// The segmenter only reads through this seam; storage backends implement
/// it. Results carry no ordering guarantee, callers sort as needed.
pub trait SegmentLookup: Send + Sync {
    fn segment_by_id(&self, segment_id: &str) -> Option<SegmentDescriptor>;

    fn segments_of_object(&self, object_id: &str) -> Vec<SegmentDescriptor>;

    fn all_segments(&self) -> Vec<SegmentDescriptor>;
}

/// In-memory segment store, keyed by segment id.
#[derive(Default)]
pub struct MemorySegmentStore {
    segments: DashMap<String, SegmentDescriptor>,
}

impl MemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, descriptor: SegmentDescriptor) {
        self.segments
            .insert(descriptor.segment_id.clone(), descriptor);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl SegmentLookup for MemorySegmentStore {
    fn segment_by_id(&self, segment_id: &str) -> Option<SegmentDescriptor> {
        self.segments.get(segment_id).map(|e| e.value().clone())
    }

    fn segments_of_object(&self, object_id: &str) -> Vec<SegmentDescriptor> {
        self.segments
            .iter()
            .filter(|e| e.value().object_id == object_id)
            .map(|e| e.value().clone())
            .collect()
    }

    fn all_segments(&self) -> Vec<SegmentDescriptor> {
        self.segments.iter().map(|e| e.value().clone()).collect()
    }
}
