//! Shot segmentation runner
//!
//! Scans a file or directory for supported media, runs the decode and shot
//! segmentation pipeline on each file, and prints a JSON run report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shotseg::{
    decode, BoundaryCache, MemorySegmentStore, PipelineError, Result, RunnerConfig,
    SegmentDescriptor, ShotContainer, ShotSegmenter, VideoDecoder,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "shotseg";

// helper.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

/// One segmented shot in the run report.
#[derive(Debug, Serialize)]
struct ShotReport {
    segment_id: String,
    sequence_number: u32,
    start: u64,
    end: u64,
    start_abs: f32,
    end_abs: f32,
    frames: usize,
    audio_frames: usize,
}

#[derive(Debug, Serialize)]
struct AudioReport {
    sample_rate: u32,
    channels: u16,
}

/// One processed file in the run report.
#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    object_id: String,
    width: u32,
    height: u32,
    fps: f32,
    duration_ms: i64,
    audio: Option<AudioReport>,
    shots: Vec<ShotReport>,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    path: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct RunReport {
    app: &'static str,
    version: &'static str,
    started_at: String,
    finished_at: String,
    files: Vec<FileReport>,
    failures: Vec<FailureReport>,
}

fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    tracing::info!("{} v{} starting", APP_NAME, VERSION);

    // Initialize FFmpeg
    shotseg::ffmpeg_utils::init()?;

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(input) => PathBuf::from(input),
        None => {
            eprintln!("usage: {} <media-file-or-directory> [config.toml]", APP_NAME);
            return Err(PipelineError::Config("missing input path".to_string()));
        }
    };
    let config = match args.next() {
        Some(path) => match RunnerConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config file {}: {}. Using defaults.",
                    path,
                    e
                );
                RunnerConfig::default()
            }
        },
        None => RunnerConfig::default(),
    };
    tracing::info!("Configuration loaded: {:?}", config);

    // A real deployment injects its database-backed segment store here; the
    // runner keeps boundaries in memory for the lifetime of the run.
    let store = Arc::new(MemorySegmentStore::new());
    let boundaries = Arc::new(BoundaryCache::new(store.clone()));
    boundaries.warm_up();

    let files = collect_media_files(&input)?;
    if files.is_empty() {
        tracing::warn!(path = %input.display(), "no supported media files found");
    }

    let started_at = chrono::Utc::now();
    let mut report = RunReport {
        app: APP_NAME,
        version: VERSION,
        started_at: started_at.to_rfc3339(),
        finished_at: String::new(),
        files: Vec::new(),
        failures: Vec::new(),
    };

    for file in &files {
        match process_file(file, &config, &store, &boundaries) {
            Ok(file_report) => report.files.push(file_report),
            Err(e) => {
                tracing::error!(path = %file.display(), error = %e, "segmentation failed");
                report.failures.push(FailureReport {
                    path: file.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
    report.finished_at = chrono::Utc::now().to_rfc3339();

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("failed to serialize run report: {}", e),
    }
    Ok(())
}

/// Run the decode and segmentation pipeline for one file.
fn process_file(
    path: &Path,
    config: &RunnerConfig,
    store: &MemorySegmentStore,
    boundaries: &Arc<BoundaryCache>,
) -> Result<FileReport> {
    let object_id = object_id_for(path);
    tracing::info!(path = %path.display(), object = %object_id, "segmenting");

    let mut decoder = VideoDecoder::new();
    decoder.init(path, &config.decoder)?;
    let video = decoder
        .video_descriptor()
        .ok_or(PipelineError::NotInitialized)?;
    let audio = decoder.audio_descriptor();
    tracing::debug!(
        frames = decoder.frame_count(),
        duration_ms = video.duration_ms,
        "container opened"
    );

    let mut segmenter = ShotSegmenter::new(Arc::clone(boundaries));
    segmenter.init(Box::new(decoder), &object_id)?;
    segmenter.start()?;

    let mut shots = Vec::new();
    let mut sequence: u32 = 0;
    loop {
        match segmenter.next_segment() {
            Some(shot) => {
                if shot.is_empty() {
                    continue;
                }
                sequence += 1;
                if let Some(descriptor) = shot_descriptor(&object_id, sequence, &shot) {
                    shots.push(shot_report(descriptor.clone(), &shot));
                    store.insert(descriptor);
                }
            }
            None => {
                if segmenter.is_complete() {
                    break;
                }
            }
        }
    }
    segmenter.close();

    tracing::info!(
        path = %path.display(),
        object = %object_id,
        shots = shots.len(),
        "segmentation finished"
    );
    Ok(FileReport {
        path: path.display().to_string(),
        object_id,
        width: video.width,
        height: video.height,
        fps: video.fps,
        duration_ms: video.duration_ms,
        audio: audio.map(|a| AudioReport {
            sample_rate: a.sample_rate,
            channels: a.channels,
        }),
        shots,
    })
}

/// Descriptor for a finished shot; `None` only for an empty container.
fn shot_descriptor(
    object_id: &str,
    sequence_number: u32,
    shot: &ShotContainer,
) -> Option<SegmentDescriptor> {
    let start = shot.first_frame_id()?;
    let end = shot.last_frame_id()?;
    let start_abs = shot.start_timestamp()? as f32 / 1000.0;
    let end_abs = shot.end_timestamp()? as f32 / 1000.0;
    Some(SegmentDescriptor::with_generated_id(
        object_id,
        sequence_number,
        start,
        end,
        start_abs,
        end_abs,
    ))
}

fn shot_report(descriptor: SegmentDescriptor, shot: &ShotContainer) -> ShotReport {
    let audio_frames = shot.frames().iter().map(|f| f.audio().len()).sum();
    ShotReport {
        segment_id: descriptor.segment_id,
        sequence_number: descriptor.sequence_number,
        start: descriptor.start,
        end: descriptor.end,
        start_abs: descriptor.start_abs,
        end_abs: descriptor.end_abs,
        frames: shot.len(),
        audio_frames,
    }
}

/// A single file as-is, or every supported file directly inside a directory
/// (sorted for stable report order).
fn collect_media_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && decode::is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Derive a storage-safe object id from the file name. Falls back to a
/// random id when nothing of the name survives sanitization.
fn object_id_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("");
    let sanitized = regex!("[^A-Za-z0-9_-]+")
        .replace_all(stem, "_")
        .trim_matches('_')
        .to_string();
    if sanitized.is_empty() {
        format!("v_{}", uuid::Uuid::new_v4().simple())
    } else {
        format!("v_{}", sanitized)
    }
}

/// Initialize logging with tracing
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shotseg=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_object_id_sanitizes_file_name() {
        let id = object_id_for(Path::new("/media/My Movie (2019).mp4"));
        assert_eq!(id, "v_My_Movie_2019");
    }

    #[test]
    fn test_object_id_falls_back_to_random() {
        let id = object_id_for(Path::new("/media/???.mp4"));
        assert!(id.starts_with("v_"));
        assert!(id.len() > "v_".len());
    }

    #[test]
    fn test_collect_single_file_passes_through() {
        let files = collect_media_files(Path::new("/no/such/clip.mp4")).unwrap();
        assert_eq!(files, vec![PathBuf::from("/no/such/clip.mp4")]);
    }
}
