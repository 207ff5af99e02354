//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Decoder configuration
///
/// Missing keys fall back to the defaults below; unknown keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum output frame width in pixels
    pub max_frame_width: u32,

    /// Maximum output frame height in pixels
    pub max_frame_height: u32,

    /// Target channel count for resampled audio
    pub channels: u16,

    /// Target sample rate for resampled audio in Hz
    pub samplerate: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_frame_width: 640,
            max_frame_height: 480,
            channels: 1,
            samplerate: 44100,
        }
    }
}

impl DecoderConfig {
    /// Compute output dimensions for a source resolution.
    ///
    /// Sources within the configured bounds pass through unchanged; larger
    /// sources are scaled down by `min(maxW/srcW, maxH/srcH)` preserving
    /// aspect ratio, rounded to the nearest integer dimensions.
    pub fn scaled_dimensions(&self, src_width: u32, src_height: u32) -> (u32, u32) {
        if src_width <= self.max_frame_width && src_height <= self.max_frame_height {
            return (src_width, src_height);
        }
        let scale = (self.max_frame_width as f32 / src_width as f32)
            .min(self.max_frame_height as f32 / src_height as f32);
        (
            (src_width as f32 * scale).round() as u32,
            (src_height as f32 * scale).round() as u32,
        )
    }
}

/// Runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Decoder settings
    pub decoder: DecoderConfig,
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RunnerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_frame_width, 640);
        assert_eq!(config.max_frame_height, 480);
        assert_eq!(config.channels, 1);
        assert_eq!(config.samplerate, 44100);
    }

    #[test]
    fn test_scaled_dimensions_within_bounds() {
        let config = DecoderConfig::default();
        assert_eq!(config.scaled_dimensions(320, 240), (320, 240));
        assert_eq!(config.scaled_dimensions(640, 480), (640, 480));
    }

    #[test]
    fn test_scaled_dimensions_downscale() {
        let config = DecoderConfig {
            max_frame_width: 320,
            max_frame_height: 240,
            ..Default::default()
        };
        // 1280x960 scales uniformly by 0.25
        assert_eq!(config.scaled_dimensions(1280, 960), (320, 240));
    }

    #[test]
    fn test_scaled_dimensions_preserves_aspect() {
        let config = DecoderConfig::default();
        // 1920x1080 limited by width: 640/1920 = 1/3
        assert_eq!(config.scaled_dimensions(1920, 1080), (640, 360));
        // 480x960 limited by height: 480/960 = 1/2
        assert_eq!(config.scaled_dimensions(480, 960), (240, 480));
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: DecoderConfig = toml::from_str("max_frame_width = 320").unwrap();
        assert_eq!(config.max_frame_width, 320);
        assert_eq!(config.max_frame_height, 480);
        assert_eq!(config.channels, 1);
        assert_eq!(config.samplerate, 44100);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config: DecoderConfig =
            toml::from_str("samplerate = 48000\nframerate = 25\n").unwrap();
        assert_eq!(config.samplerate, 48000);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let config = RunnerConfig {
            decoder: DecoderConfig {
                max_frame_width: 320,
                max_frame_height: 240,
                channels: 2,
                samplerate: 48000,
            },
        };

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded = RunnerConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.decoder.max_frame_width, 320);
        assert_eq!(loaded.decoder.samplerate, 48000);
    }
}
