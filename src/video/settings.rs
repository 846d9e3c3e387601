use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::render::error::RenderError;

/// Output aspect ratio; each maps to a fixed canvas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    #[value(name = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    #[value(name = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    #[value(name = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Landscape => (1920, 1080),
            AspectRatio::Portrait => (1080, 1920),
            AspectRatio::Square => (1080, 1080),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub path: PathBuf,
    pub opacity: f64,
    pub padding: u32,
    pub position: Corner,
    pub max_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicSpec {
    pub path: PathBuf,
    pub looped: bool,
    pub start: f64,
    pub end: Option<f64>,
    pub volume: f64,
    pub speed: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderNames {
    pub hardware: String,
    pub software: String,
}

impl Default for EncoderNames {
    fn default() -> Self {
        Self {
            hardware: "h264_nvenc".to_string(),
            software: "libx264".to_string(),
        }
    }
}

/// Everything a render run needs besides the segments. Read-only for the
/// duration of a run.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub aspect: AspectRatio,
    pub fps: u32,
    pub narration: PathBuf,
    pub watermark: Option<WatermarkSpec>,
    pub music: Option<MusicSpec>,
    pub prefer_gpu: bool,
    pub encoders: EncoderNames,
}

pub const MAX_FPS: u32 = 240;

impl RenderSettings {
    pub fn new(narration: impl Into<PathBuf>) -> Self {
        Self {
            aspect: AspectRatio::default(),
            fps: 30,
            narration: narration.into(),
            watermark: None,
            music: None,
            prefer_gpu: false,
            encoders: EncoderNames::default(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.aspect.dimensions()
    }

    /// Range and existence checks; runs before anything is spawned.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(RenderError::invalid(format!(
                "frame rate must be between 1 and {MAX_FPS}, got {}",
                self.fps
            )));
        }
        if !self.narration.is_file() {
            return Err(RenderError::invalid(format!(
                "narration audio {} does not exist",
                self.narration.display()
            )));
        }
        if self.encoders.software.trim().is_empty() {
            return Err(RenderError::invalid("software encoder name must not be empty"));
        }

        if let Some(watermark) = &self.watermark {
            if !watermark.path.is_file() {
                return Err(RenderError::invalid(format!(
                    "watermark image {} does not exist",
                    watermark.path.display()
                )));
            }
            if !(0.0..=1.0).contains(&watermark.opacity) {
                return Err(RenderError::invalid(format!(
                    "watermark opacity must be within [0, 1], got {}",
                    watermark.opacity
                )));
            }
            if watermark.max_width == Some(0) {
                return Err(RenderError::invalid("watermark max width must be positive"));
            }
        }

        if let Some(music) = &self.music {
            if !music.path.is_file() {
                return Err(RenderError::invalid(format!(
                    "background music {} does not exist",
                    music.path.display()
                )));
            }
            if !(0.0..=2.0).contains(&music.volume) {
                return Err(RenderError::invalid(format!(
                    "music volume must be within [0, 2], got {}",
                    music.volume
                )));
            }
            if !(0.5..=2.0).contains(&music.speed) {
                return Err(RenderError::invalid(format!(
                    "music speed must be within [0.5, 2], got {}",
                    music.speed
                )));
            }
            if !music.start.is_finite() || music.start < 0.0 {
                return Err(RenderError::invalid(format!(
                    "music start must be a non-negative time, got {}",
                    music.start
                )));
            }
            if let Some(end) = music.end
                && !(end.is_finite() && end > music.start)
            {
                return Err(RenderError::invalid(format!(
                    "music end ({end}) must come after music start ({})",
                    music.start
                )));
            }
        }

        Ok(())
    }
}
