mod audio;
mod overlays;
mod util;
mod video;

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::video::render::encoder::EncoderChoice;
use crate::video::render::fit::FitPlan;
use crate::video::settings::WatermarkSpec;

pub use self::audio::MusicMix;
pub use self::util::{format_decimal, manifest_entry};

const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "192k";
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;

#[derive(Debug, Clone)]
pub struct FfmpegCompileOutput {
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    filters: Vec<String>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: String) {
        self.filters.push(filter);
    }

    pub fn join(&self) -> String {
        self.filters.join("; ")
    }
}

/// Video dimensions (width x height in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Inputs for one per-segment normalization job.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSpec<'a> {
    pub clip: &'a Path,
    pub plan: &'a FitPlan,
    pub watermark: Option<&'a WatermarkSpec>,
    pub output: &'a Path,
}

/// Inputs for the final concat + audio step.
#[derive(Debug, Clone)]
pub struct CompositionSpec<'a> {
    pub manifest: &'a Path,
    pub narration: &'a Path,
    pub music: Option<MusicMix>,
    pub total_duration: f64,
    pub output: &'a Path,
}

/// Turns fit plans and composition inputs into ffmpeg argument vectors.
/// Pure: identical inputs always give identical arguments.
pub struct FfmpegCompiler {
    target_width: u32,
    target_height: u32,
    fps: u32,
}

impl FfmpegCompiler {
    pub fn new(dimensions: VideoDimensions, fps: u32) -> Self {
        Self {
            target_width: dimensions.width,
            target_height: dimensions.height,
            fps,
        }
    }

    pub fn compile_segment(&self, spec: &SegmentSpec<'_>, encoder: &EncoderChoice) -> FfmpegCompileOutput {
        let mut args = base_args();

        args.push("-i".to_string());
        args.push(path_arg(spec.clip));
        if let Some(watermark) = spec.watermark {
            args.push("-i".to_string());
            args.push(path_arg(&watermark.path));
        }

        let mut filters = FilterChain::new();
        match spec.watermark {
            Some(watermark) => {
                self.push_fit_filters(&mut filters, spec.plan, "0:v", "v_fit");
                self.push_watermark_filters(&mut filters, watermark, 1, "v_fit", "outv");
            }
            None => self.push_fit_filters(&mut filters, spec.plan, "0:v", "outv"),
        }

        args.push("-filter_complex".to_string());
        args.push(filters.join());
        args.push("-map".to_string());
        args.push("[outv]".to_string());
        args.push("-an".to_string());
        args.push("-t".to_string());
        args.push(format_decimal(spec.plan.trim));
        args.push("-r".to_string());
        args.push(self.fps.to_string());
        encoder.push_to(&mut args);
        push_container_args(&mut args);
        args.push(path_arg(spec.output));

        FfmpegCompileOutput { args }
    }

    pub fn compile_composition(
        &self,
        spec: &CompositionSpec<'_>,
        encoder: &EncoderChoice,
    ) -> FfmpegCompileOutput {
        let mut args = base_args();

        args.extend(
            ["-f", "concat", "-safe", "0", "-i"]
                .iter()
                .map(|arg| arg.to_string()),
        );
        args.push(path_arg(spec.manifest));
        args.push("-i".to_string());
        args.push(path_arg(spec.narration));

        args.push("-map".to_string());
        args.push("0:v:0".to_string());

        match &spec.music {
            Some(music) => {
                args.push("-i".to_string());
                args.push(path_arg(&music.path));

                let mut filters = FilterChain::new();
                self.push_music_mix_filters(&mut filters, music, 1, 2, spec.total_duration);
                args.push("-filter_complex".to_string());
                args.push(filters.join());
                args.push("-map".to_string());
                args.push("[outa]".to_string());
            }
            None => {
                args.push("-map".to_string());
                args.push("1:a:0".to_string());
            }
        }

        encoder.push_to(&mut args);
        args.push("-r".to_string());
        args.push(self.fps.to_string());
        args.extend(
            [
                "-c:a".to_string(),
                AUDIO_CODEC.to_string(),
                "-b:a".to_string(),
                AUDIO_BITRATE.to_string(),
                "-ar".to_string(),
                AUDIO_SAMPLE_RATE.to_string(),
            ],
        );
        // The slot total is authoritative; -shortest only guards against drift.
        args.push("-t".to_string());
        args.push(format_decimal(spec.total_duration));
        args.push("-shortest".to_string());
        push_container_args(&mut args);
        args.push(path_arg(spec.output));

        FfmpegCompileOutput { args }
    }
}

fn base_args() -> Vec<String> {
    ["-hide_banner", "-nostdin", "-y"]
        .iter()
        .map(|arg| arg.to_string())
        .collect()
}

fn push_container_args(args: &mut Vec<String>) {
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
