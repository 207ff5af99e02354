use bytes::{Bytes, BytesMut};

use crate::frame::AudioDescriptor;

/// One decoded, possibly resampled, chunk of PCM audio.
///
/// The payload is signed 16-bit interleaved samples and never mutated in
/// place: `append` builds a fresh concatenated payload, so a payload shared
/// with an earlier clone stays intact.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    id: u64,
    timestamp: i64,
    samples: Bytes,
    descriptor: AudioDescriptor,
}

impl AudioFrame {
    pub fn new(id: u64, timestamp: i64, samples: Bytes, descriptor: AudioDescriptor) -> Self {
        Self {
            id,
            timestamp,
            samples,
            descriptor,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Presentation timestamp in milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn samples(&self) -> &Bytes {
        &self.samples
    }

    pub fn descriptor(&self) -> &AudioDescriptor {
        &self.descriptor
    }

    /// Number of per-channel samples in the payload.
    pub fn sample_count(&self) -> usize {
        let frame_size = 2 * self.descriptor.channels as usize;
        if frame_size == 0 {
            return 0;
        }
        self.samples.len() / frame_size
    }

    /// Concatenate another frame's samples after this frame's.
    ///
    /// Allocates a new payload; any outstanding handle to the previous
    /// payload is unaffected.
    pub fn append(&mut self, other: &AudioFrame) {
        let mut joined = BytesMut::with_capacity(self.samples.len() + other.samples.len());
        joined.extend_from_slice(&self.samples);
        joined.extend_from_slice(&other.samples);
        self.samples = joined.freeze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> AudioDescriptor {
        AudioDescriptor {
            sample_rate: 44100,
            channels: 1,
            duration_ms: 1000,
        }
    }

    #[test]
    fn test_append_concatenates() {
        let mut a = AudioFrame::new(1, 0, Bytes::from_static(&[1, 2, 3, 4]), descriptor());
        let b = AudioFrame::new(2, 10, Bytes::from_static(&[5, 6]), descriptor());
        a.append(&b);
        assert_eq!(a.samples().as_ref(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(a.timestamp(), 0);
    }

    #[test]
    fn test_append_leaves_shared_payload_intact() {
        let mut a = AudioFrame::new(1, 0, Bytes::from_static(&[1, 2]), descriptor());
        let shared = a.samples().clone();
        let b = AudioFrame::new(2, 10, Bytes::from_static(&[3, 4]), descriptor());
        a.append(&b);
        assert_eq!(shared.as_ref(), &[1, 2]);
        assert_eq!(a.samples().as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_sample_count() {
        // 8 bytes of mono S16 = 4 samples
        let frame = AudioFrame::new(1, 0, Bytes::from(vec![0u8; 8]), descriptor());
        assert_eq!(frame.sample_count(), 4);

        let stereo = AudioDescriptor {
            channels: 2,
            ..descriptor()
        };
        let frame = AudioFrame::new(1, 0, Bytes::from(vec![0u8; 8]), stereo);
        assert_eq!(frame.sample_count(), 2);
    }
}
