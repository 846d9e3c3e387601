use std::fs;
use std::path::{Path, PathBuf};

use super::encoder::EncoderChoice;
use super::error::RenderError;
use super::ffmpeg::compiler::{FfmpegCompiler, SegmentSpec};
use super::ffmpeg::services::{FfmpegRunOptions, MediaEngine};
use super::fit::FitPlan;
use super::logging::log_event;
use crate::ui::prelude::Level;
use crate::video::settings::WatermarkSpec;

/// One segment's normalization: resolved clip in, `clip_<index>.mp4` out.
#[derive(Debug, Clone)]
pub struct SegmentJob<'a> {
    pub index: usize,
    pub clip: &'a Path,
    pub plan: &'a FitPlan,
    pub output: PathBuf,
}

/// Runs per-segment jobs one at a time through the media engine.
pub struct JobRunner<'a> {
    engine: &'a dyn MediaEngine,
    compiler: &'a FfmpegCompiler,
    encoder: &'a EncoderChoice,
    watermark: Option<&'a WatermarkSpec>,
    verbose: bool,
}

impl<'a> JobRunner<'a> {
    pub fn new(
        engine: &'a dyn MediaEngine,
        compiler: &'a FfmpegCompiler,
        encoder: &'a EncoderChoice,
        watermark: Option<&'a WatermarkSpec>,
        verbose: bool,
    ) -> Self {
        Self {
            engine,
            compiler,
            encoder,
            watermark,
            verbose,
        }
    }

    pub fn args_for(&self, job: &SegmentJob<'_>) -> Vec<String> {
        let spec = SegmentSpec {
            clip: job.clip,
            plan: job.plan,
            watermark: self.watermark,
            output: &job.output,
        };
        self.compiler.compile_segment(&spec, self.encoder).args
    }

    /// Encode one intermediate. Success needs both a clean exit and a
    /// non-empty output file; existing intermediates are overwritten.
    pub fn run(&self, job: &SegmentJob<'_>) -> Result<PathBuf, RenderError> {
        let args = self.args_for(job);
        log_event(
            Level::Debug,
            "broll.render.segment.encode",
            format!(
                "Encoding segment {} from {} into {}",
                job.index,
                job.clip.display(),
                job.output.display()
            ),
        );

        let options = FfmpegRunOptions::new(Some(job.plan.trim), self.verbose)
            .with_label(format!("Segment {}", job.index));
        let outcome = self
            .engine
            .run(&args, options)
            .map_err(|error| RenderError::Encode {
                index: job.index,
                diagnostics: format!("{error:#}"),
            })?;

        if !outcome.success {
            return Err(RenderError::Encode {
                index: job.index,
                diagnostics: outcome.describe(),
            });
        }
        if !output_written(&job.output) {
            return Err(RenderError::Encode {
                index: job.index,
                diagnostics: format!(
                    "ffmpeg reported success but {} was not written",
                    job.output.display()
                ),
            });
        }

        Ok(job.output.clone())
    }
}

/// True when `path` is a regular file with content.
pub(super) fn output_written(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::render::ffmpeg::compiler::VideoDimensions;
    use crate::video::render::ffmpeg::fake::FakeEngine;
    use crate::video::render::fit::{FitRequest, fit_segment};
    use crate::video::segment::FitPolicy;

    fn plan() -> FitPlan {
        fit_segment(&FitRequest {
            policy: FitPolicy::Slow,
            clip_duration: 5.0,
            slot_duration: 10.0,
            fps: 30,
            width: 1920,
            height: 1080,
        })
        .unwrap()
    }

    #[test]
    fn reruns_produce_identical_commands() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();
        let compiler = FfmpegCompiler::new(VideoDimensions::new(1920, 1080), 30);
        let encoder = EncoderChoice::software("libx264");
        let runner = JobRunner::new(&engine, &compiler, &encoder, None, false);
        let plan = plan();
        let clip = Path::new("/clips/1.mp4");
        let job = SegmentJob {
            index: 1,
            clip,
            plan: &plan,
            output: dir.path().join("clip_1.mp4"),
        };

        let first = runner.run(&job).unwrap();
        let first_bytes = fs::read(&first).unwrap();
        let second = runner.run(&job).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), first_bytes);

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert!(calls[0].contains(&"-y".to_string()));
    }

    #[test]
    fn failure_names_the_segment() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new().failing_output("clip_7.mp4");
        let compiler = FfmpegCompiler::new(VideoDimensions::new(1080, 1920), 30);
        let encoder = EncoderChoice::software("libx264");
        let runner = JobRunner::new(&engine, &compiler, &encoder, None, false);
        let plan = plan();
        let job = SegmentJob {
            index: 7,
            clip: Path::new("/clips/7.mp4"),
            plan: &plan,
            output: dir.path().join("clip_7.mp4"),
        };

        let err = runner.run(&job).unwrap_err();
        assert_eq!(err.segment_index(), Some(7));
        assert!(err.to_string().contains("Error while filtering"));
    }

    #[test]
    fn clean_exit_without_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new().silent_output("clip_2.mp4");
        let compiler = FfmpegCompiler::new(VideoDimensions::new(1080, 1080), 25);
        let encoder = EncoderChoice::software("libx264");
        let runner = JobRunner::new(&engine, &compiler, &encoder, None, false);
        let plan = plan();
        let job = SegmentJob {
            index: 2,
            clip: Path::new("/clips/2.mp4"),
            plan: &plan,
            output: dir.path().join("clip_2.mp4"),
        };

        let err = runner.run(&job).unwrap_err();
        assert!(matches!(err, RenderError::Encode { index: 2, .. }));
        assert!(err.to_string().contains("was not written"));
    }

    #[test]
    fn empty_files_do_not_count_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip_1.mp4");
        assert!(!output_written(&path));
        fs::write(&path, b"").unwrap();
        assert!(!output_written(&path));
        fs::write(&path, b"data").unwrap();
        assert!(output_written(&path));
        assert!(!output_written(dir.path()));
    }
}
