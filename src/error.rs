use thiserror::Error;

/// Main error type for the decode and segmentation pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] FfmpegError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("No video stream found in source file")]
    NoVideoStream,

    #[error("Decoder not initialized")]
    NotInitialized,

    #[error("Segmenter is running: {0}")]
    SegmenterRunning(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// FFmpeg-specific errors
#[derive(Error, Debug)]
pub enum FfmpegError {
    #[error("FFmpeg initialization failed: {0}")]
    InitFailed(String),

    #[error("Failed to open input file: {0}")]
    OpenInput(String),

    #[error("Failed to create decoder: {0}")]
    DecoderCreate(String),

    #[error("Failed to create scaler: {0}")]
    ScalerCreate(String),

    #[error("Failed to create resampler: {0}")]
    ResamplerCreate(String),

    #[error("Failed to decode packet: {0}")]
    DecodePacket(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PipelineError>;
