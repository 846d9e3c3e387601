use std::fs;
use std::path::{Path, PathBuf};

use super::encoder::EncoderChoice;
use super::error::RenderError;
use super::ffmpeg::compiler::{
    AUDIO_SAMPLE_RATE, CompositionSpec, FfmpegCompiler, MusicMix, manifest_entry,
};
use super::ffmpeg::services::{FfmpegRunOptions, MediaEngine};
use super::job::output_written;
use super::logging::log_event;
use super::paths::RunDirs;
use crate::ui::prelude::Level;
use crate::video::segment::Segment;
use crate::video::settings::MusicSpec;

/// Concat manifest for the run, one line per intermediate in ascending
/// segment index. Fails on the first missing intermediate.
pub fn build_manifest(segments: &[Segment], dirs: &RunDirs) -> Result<String, RenderError> {
    let mut indices: Vec<usize> = segments.iter().map(|segment| segment.index).collect();
    indices.sort_unstable();

    let mut lines = Vec::with_capacity(indices.len());
    for index in indices {
        let path = dirs.intermediate_path(index);
        if !output_written(&path) {
            return Err(RenderError::MissingIntermediate { index, path });
        }
        lines.push(manifest_entry(&path));
    }

    let mut manifest = lines.join("\n");
    manifest.push('\n');
    Ok(manifest)
}

/// Shape the music input for a final mix of `total_duration` seconds.
///
/// `source_duration` is the probed length of the music file; it is only
/// needed to size the loop window when no explicit end is set.
pub fn music_mix(
    spec: &MusicSpec,
    total_duration: f64,
    source_duration: Option<f64>,
) -> Result<MusicMix, RenderError> {
    let loop_samples = if spec.looped {
        let end = spec.end.or(source_duration).ok_or_else(|| {
            RenderError::invalid("looping music needs either an end time or a probed duration")
        })?;
        let window = end - spec.start;
        if !window.is_finite() || window <= 0.0 {
            return Err(RenderError::invalid(format!(
                "music window [{}, {end}) is empty",
                spec.start
            )));
        }
        let samples = (window * f64::from(AUDIO_SAMPLE_RATE)).ceil();
        if samples > f64::from(i32::MAX) {
            return Err(RenderError::invalid(format!(
                "music loop window of {window:.1}s is too long to loop"
            )));
        }
        Some(samples as u64)
    } else {
        None
    };

    if !(total_duration.is_finite() && total_duration > 0.0) {
        return Err(RenderError::invalid(format!(
            "total duration must be positive, got {total_duration}"
        )));
    }

    Ok(MusicMix {
        path: spec.path.clone(),
        start: spec.start,
        end: spec.end,
        loop_samples,
        volume: spec.volume,
        speed: spec.speed,
    })
}

/// Final concat + narration (+ music) step.
pub struct Composer<'a> {
    engine: &'a dyn MediaEngine,
    compiler: &'a FfmpegCompiler,
    encoder: &'a EncoderChoice,
    verbose: bool,
}

pub struct ComposeInputs<'a> {
    pub manifest: &'a Path,
    pub narration: &'a Path,
    pub music: Option<MusicMix>,
    pub total_duration: f64,
    /// Where ffmpeg writes; moved to `output` only after it is verified.
    pub staging: &'a Path,
    pub output: &'a Path,
}

impl<'a> Composer<'a> {
    pub fn new(
        engine: &'a dyn MediaEngine,
        compiler: &'a FfmpegCompiler,
        encoder: &'a EncoderChoice,
        verbose: bool,
    ) -> Self {
        Self {
            engine,
            compiler,
            encoder,
            verbose,
        }
    }

    pub fn args_for(&self, inputs: &ComposeInputs<'_>) -> Vec<String> {
        let spec = CompositionSpec {
            manifest: inputs.manifest,
            narration: inputs.narration,
            music: inputs.music.clone(),
            total_duration: inputs.total_duration,
            output: inputs.staging,
        };
        self.compiler.compile_composition(&spec, self.encoder).args
    }

    pub fn compose(&self, inputs: &ComposeInputs<'_>) -> Result<PathBuf, RenderError> {
        let args = self.args_for(inputs);
        log_event(
            Level::Info,
            "broll.render.compose",
            format!(
                "Composing {:.2}s of video into {}",
                inputs.total_duration,
                inputs.output.display()
            ),
        );

        let options = FfmpegRunOptions::new(Some(inputs.total_duration), self.verbose)
            .with_label("Final");
        if let Err(error) = self.encode(&args, options, inputs.staging) {
            discard_partial(inputs.staging);
            return Err(error);
        }

        fs::rename(inputs.staging, inputs.output)
            .inspect_err(|_| discard_partial(inputs.staging))?;
        Ok(inputs.output.to_path_buf())
    }

    fn encode(
        &self,
        args: &[String],
        options: FfmpegRunOptions,
        staging: &Path,
    ) -> Result<(), RenderError> {
        let outcome = self
            .engine
            .run(args, options)
            .map_err(|error| RenderError::Compose {
                diagnostics: format!("{error:#}"),
            })?;

        if !outcome.success {
            return Err(RenderError::Compose {
                diagnostics: outcome.describe(),
            });
        }
        if !output_written(staging) {
            return Err(RenderError::Compose {
                diagnostics: format!(
                    "ffmpeg reported success but {} was not written",
                    staging.display()
                ),
            });
        }
        Ok(())
    }
}

fn discard_partial(path: &Path) {
    if let Err(error) = fs::remove_file(path)
        && error.kind() != std::io::ErrorKind::NotFound
    {
        log_event(
            Level::Warn,
            "broll.render.partial",
            format!("Failed to remove partial output {}: {error}", path.display()),
        );
    }
}

pub fn write_manifest(path: &Path, contents: &str) -> Result<(), RenderError> {
    fs::write(path, contents)?;
    Ok(())
}
