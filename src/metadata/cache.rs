//! Boundary descriptor cache
//!
//! Read-through cache over a `SegmentLookup`, with an explicit bulk
//! `warm_up` for workloads that scan whole objects. Owned by the caller and
//! injected into the segmenter; nothing here is process-global.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::metadata::{SegmentDescriptor, SegmentLookup};

/// Cache of segment descriptors keyed by segment id.
pub struct BoundaryCache {
    store: Arc<dyn SegmentLookup>,
    entries: DashMap<String, SegmentDescriptor>,
    warmed: AtomicBool,
}

impl BoundaryCache {
    pub fn new(store: Arc<dyn SegmentLookup>) -> Self {
        Self {
            store,
            entries: DashMap::new(),
            warmed: AtomicBool::new(false),
        }
    }

    /// Bulk-load every descriptor from the store.
    ///
    /// After warm-up, per-object scans are served from the cache alone.
    pub fn warm_up(&self) {
        let all = self.store.all_segments();
        let count = all.len();
        for descriptor in all {
            self.entries
                .insert(descriptor.segment_id.clone(), descriptor);
        }
        self.warmed.store(true, Ordering::Release);
        tracing::info!(segments = count, "boundary cache warmed up");
    }

    /// Drop every cached descriptor and re-load from the store.
    pub fn refresh(&self) {
        self.entries.clear();
        self.warm_up();
    }

    pub fn is_warmed(&self) -> bool {
        self.warmed.load(Ordering::Acquire)
    }

    /// Fetch one descriptor, reading through to the store on a miss.
    pub fn segment_by_id(&self, segment_id: &str) -> Option<SegmentDescriptor> {
        if let Some(entry) = self.entries.get(segment_id) {
            return Some(entry.value().clone());
        }
        let descriptor = self.store.segment_by_id(segment_id)?;
        self.entries
            .insert(descriptor.segment_id.clone(), descriptor.clone());
        Some(descriptor)
    }

    /// All descriptors for one object, unordered.
    ///
    /// Served from the cache when warmed; otherwise delegated to the store,
    /// caching whatever comes back.
    pub fn segments_of_object(&self, object_id: &str) -> Vec<SegmentDescriptor> {
        if self.is_warmed() {
            return self
                .entries
                .iter()
                .filter(|e| e.value().object_id == object_id)
                .map(|e| e.value().clone())
                .collect();
        }
        let found = self.store.segments_of_object(object_id);
        for descriptor in &found {
            self.entries
                .insert(descriptor.segment_id.clone(), descriptor.clone());
        }
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MemorySegmentStore;

    fn store_with(descriptors: &[(u32, u64, u64)]) -> Arc<MemorySegmentStore> {
        let store = MemorySegmentStore::new();
        for (seq, start, end) in descriptors {
            store.insert(SegmentDescriptor::with_generated_id(
                "obj-1", *seq, *start, *end, 0.0, 0.0,
            ));
        }
        Arc::new(store)
    }

    #[test]
    fn test_warm_up_loads_everything() {
        let store = store_with(&[(1, 0, 9), (2, 10, 19)]);
        let cache = BoundaryCache::new(store);
        assert!(cache.is_empty());
        assert!(!cache.is_warmed());

        cache.warm_up();
        assert!(cache.is_warmed());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_read_through_caches_misses() {
        let store = store_with(&[(1, 0, 9)]);
        let cache = BoundaryCache::new(store);

        let found = cache.segment_by_id("obj-1_1").unwrap();
        assert_eq!(found.end, 9);
        assert_eq!(cache.len(), 1);
        assert!(cache.segment_by_id("obj-1_9").is_none());
    }

    #[test]
    fn test_object_scan_serves_from_warm_cache() {
        let store = store_with(&[(1, 0, 9), (2, 10, 19)]);
        let cache = BoundaryCache::new(Arc::clone(&store) as Arc<dyn SegmentLookup>);
        cache.warm_up();

        // a later store insert is invisible until refresh
        store.insert(SegmentDescriptor::with_generated_id(
            "obj-1", 3, 20, 29, 0.0, 0.0,
        ));
        assert_eq!(cache.segments_of_object("obj-1").len(), 2);

        cache.refresh();
        assert_eq!(cache.segments_of_object("obj-1").len(), 3);
    }

    #[test]
    fn test_cold_object_scan_delegates_and_caches() {
        let store = store_with(&[(1, 0, 9), (2, 10, 19)]);
        let cache = BoundaryCache::new(store);

        let found = cache.segments_of_object("obj-1");
        assert_eq!(found.len(), 2);
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_warmed());
    }
}
