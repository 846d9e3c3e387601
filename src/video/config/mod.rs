use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;
use crate::video::render::resolve::DEFAULT_CLIP_EXTENSION;
use crate::video::segment::FitPolicy;
use crate::video::settings::{AspectRatio, Corner, EncoderNames, MAX_FPS};

/// Persistent render defaults. Command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output aspect ratio (16:9, 9:16 or 1:1)
    pub aspect: AspectRatio,
    /// Output frame rate
    pub fps: u32,
    /// Try the hardware encoder first
    pub prefer_gpu: bool,
    /// Hardware encoder probed for when prefer_gpu is set
    pub hardware_encoder: String,
    /// Encoder used when no hardware encoder is available
    pub software_encoder: String,
    /// Extension for numbered clips (<clips>/<index>.<ext>)
    pub clip_extension: String,
    /// Fit policy for segments without an explicit one
    pub default_fit: FitPolicy,
    /// Background music volume (0.0-2.0)
    pub music_volume: f64,
    /// Watermark opacity (0.0-1.0)
    pub watermark_opacity: f64,
    /// Watermark distance from the frame edge in pixels
    pub watermark_padding: u32,
    /// Watermark corner
    pub watermark_position: Corner,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let encoders = EncoderNames::default();
        Self {
            aspect: AspectRatio::default(),
            fps: Self::DEFAULT_FPS,
            prefer_gpu: false,
            hardware_encoder: encoders.hardware,
            software_encoder: encoders.software,
            clip_extension: DEFAULT_CLIP_EXTENSION.to_string(),
            default_fit: FitPolicy::default(),
            music_volume: Self::DEFAULT_MUSIC_VOLUME,
            watermark_opacity: Self::DEFAULT_WATERMARK_OPACITY,
            watermark_padding: Self::DEFAULT_WATERMARK_PADDING,
            watermark_position: Corner::default(),
        }
    }
}

impl RenderConfig {
    pub const DEFAULT_FPS: u32 = 30;
    pub const DEFAULT_MUSIC_VOLUME: f64 = 0.35;
    pub const DEFAULT_WATERMARK_OPACITY: f64 = 0.85;
    pub const DEFAULT_WATERMARK_PADDING: u32 = 24;

    pub fn load() -> Result<Self> {
        Self::load_from_path(config_path()?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading broll config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents).context("parsing broll config")?;
        Ok(config.sanitized())
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating broll config directory {}", parent.display()))?;
        }

        let toml = toml::to_string_pretty(self).context("serializing broll config")?;
        fs::write(path, toml)
            .with_context(|| format!("writing broll config to {}", path.display()))?;
        Ok(())
    }

    /// Replace out-of-range values with defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.fps == 0 || self.fps > MAX_FPS {
            self.fps = defaults.fps;
        }
        if !self.music_volume.is_finite() || !(0.0..=2.0).contains(&self.music_volume) {
            self.music_volume = defaults.music_volume;
        }
        if !self.watermark_opacity.is_finite() || !(0.0..=1.0).contains(&self.watermark_opacity)
        {
            self.watermark_opacity = defaults.watermark_opacity;
        }
        if self.software_encoder.trim().is_empty() {
            self.software_encoder = defaults.software_encoder;
        }
        if self.hardware_encoder.trim().is_empty() {
            self.hardware_encoder = defaults.hardware_encoder;
        }
        if self.clip_extension.trim_start_matches('.').is_empty() {
            self.clip_extension = defaults.clip_extension;
        }
        self
    }

    pub fn encoder_names(&self) -> EncoderNames {
        EncoderNames {
            hardware: self.hardware_encoder.clone(),
            software: self.software_encoder.clone(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(paths::broll_config_dir()?.join("broll.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("broll.toml");
        let config = RenderConfig::load_from_path(&path).unwrap();
        assert_eq!(config, RenderConfig::default());
        assert!(path.exists());
        assert_eq!(RenderConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broll.toml");
        fs::write(
            &path,
            "aspect = \"9:16\"\ndefault_fit = \"loop\"\nwatermark_position = \"top-left\"\n",
        )
        .unwrap();

        let config = RenderConfig::load_from_path(&path).unwrap();
        assert_eq!(config.aspect, AspectRatio::Portrait);
        assert_eq!(config.default_fit, FitPolicy::Loop);
        assert_eq!(config.watermark_position, Corner::TopLeft);
        assert_eq!(config.fps, RenderConfig::DEFAULT_FPS);
        assert_eq!(config.software_encoder, "libx264");
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broll.toml");
        fs::write(
            &path,
            "fps = 0\nmusic_volume = 9.5\nwatermark_opacity = -1.0\nsoftware_encoder = \" \"\nclip_extension = \".\"\n",
        )
        .unwrap();

        let config = RenderConfig::load_from_path(&path).unwrap();
        let defaults = RenderConfig::default();
        assert_eq!(config.fps, defaults.fps);
        assert_eq!(config.music_volume, defaults.music_volume);
        assert_eq!(config.watermark_opacity, defaults.watermark_opacity);
        assert_eq!(config.software_encoder, defaults.software_encoder);
        assert_eq!(config.clip_extension, defaults.clip_extension);
    }

    #[test]
    fn rejects_unknown_fit_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broll.toml");
        fs::write(&path, "default_fit = \"stretch\"\n").unwrap();
        assert!(RenderConfig::load_from_path(&path).is_err());
    }
}
