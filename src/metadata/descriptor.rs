/// Immutable record of one stored shot boundary.
///
/// `start`/`end` are an inclusive frame-id range; `start_abs`/`end_abs` are
/// the corresponding absolute positions in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    pub segment_id: String,
    pub object_id: String,
    pub sequence_number: u32,
    pub start: u64,
    pub end: u64,
    pub start_abs: f32,
    pub end_abs: f32,
}

impl SegmentDescriptor {
    pub fn new(
        segment_id: String,
        object_id: String,
        sequence_number: u32,
        start: u64,
        end: u64,
        start_abs: f32,
        end_abs: f32,
    ) -> Self {
        Self {
            segment_id,
            object_id,
            sequence_number,
            start,
            end,
            start_abs,
            end_abs,
        }
    }

    /// Build a descriptor with the conventional `{object_id}_{sequence}` id.
    pub fn with_generated_id(
        object_id: &str,
        sequence_number: u32,
        start: u64,
        end: u64,
        start_abs: f32,
        end_abs: f32,
    ) -> Self {
        Self::new(
            format!("{}_{}", object_id, sequence_number),
            object_id.to_string(),
            sequence_number,
            start,
            end,
            start_abs,
            end_abs,
        )
    }

    /// Whether a frame id falls inside this boundary's inclusive range.
    pub fn contains(&self, frame_id: u64) -> bool {
        self.start <= frame_id && frame_id <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_format() {
        let desc = SegmentDescriptor::with_generated_id("video-7", 3, 10, 40, 0.4, 1.6);
        assert_eq!(desc.segment_id, "video-7_3");
        assert_eq!(desc.object_id, "video-7");
        assert_eq!(desc.sequence_number, 3);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let desc = SegmentDescriptor::with_generated_id("v", 1, 10, 40, 0.0, 0.0);
        assert!(desc.contains(10));
        assert!(desc.contains(25));
        assert!(desc.contains(40));
        assert!(!desc.contains(9));
        assert!(!desc.contains(41));
    }
}
