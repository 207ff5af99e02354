//! Container decoding
//!
//! `VideoDecoder` owns the native demux/decode/resample state for one file
//! and exposes the pull interface (`FrameSource`) the segmenter consumes.

mod mime;
mod resample;
mod source;
mod video;

pub use mime::{is_supported, mime_type_of, supported_mime_types};
pub use source::FrameSource;
pub use video::{DecoderState, VideoDecoder};
