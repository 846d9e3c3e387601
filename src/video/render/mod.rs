pub mod compose;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod fit;
pub mod job;
mod logging;
pub mod paths;
pub mod resolve;


use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Result, bail};
use serde_json::json;

use crate::common::paths::remote_clip_cache_dir;
use crate::common::requirements::{Tool, ensure_tools};
use crate::ui::prelude::Level;

use self::compose::{ComposeInputs, Composer, build_manifest, music_mix, write_manifest};
use self::encoder::EncoderCache;
use self::error::RenderError;
use self::ffmpeg::compiler::{FfmpegCompiler, VideoDimensions, manifest_entry};
use self::ffmpeg::services::{MediaEngine, SystemFfmpeg};
use self::fit::{FitPlan, FitRequest, fit_segment};
use self::job::{JobRunner, SegmentJob};
pub(crate) use self::logging::{log_event, log_event_with_data};
use self::paths::RunDirs;
use self::resolve::ClipResolver;
use super::assignments::load_assignments;
use super::cli::RenderArgs;
use super::config::RenderConfig;
use super::segment::{Segment, segments_from_cues, total_duration};
use super::settings::{MusicSpec, RenderSettings, WatermarkSpec};
use super::srt::read_srt;

/// Narration may run this much shorter than the slots before it is reported.
const NARRATION_TOLERANCE_SECS: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub dry_run: bool,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(PathBuf),
    /// Commands that would have run, in order.
    DryRun(Vec<Vec<String>>),
}

/// A segment whose clip has been located, probed and fitted.
struct PlannedSegment {
    index: usize,
    clip: PathBuf,
    plan: FitPlan,
}

/// State owned by one render run: the encoder decision is cached here and
/// nowhere else.
pub struct RenderRun<'a> {
    settings: &'a RenderSettings,
    engine: &'a dyn MediaEngine,
    resolver: ClipResolver,
    dirs: RunDirs,
    encoders: EncoderCache,
    options: RenderOptions,
}

impl<'a> RenderRun<'a> {
    pub fn new(
        settings: &'a RenderSettings,
        engine: &'a dyn MediaEngine,
        resolver: ClipResolver,
        dirs: RunDirs,
        options: RenderOptions,
    ) -> Self {
        Self {
            settings,
            engine,
            resolver,
            dirs,
            encoders: EncoderCache::new(),
            options,
        }
    }

    pub fn dirs(&self) -> &RunDirs {
        &self.dirs
    }

    pub fn execute(&mut self, segments: &mut [Segment]) -> Result<RenderOutcome, RenderError> {
        self.settings.validate()?;
        validate_segments(segments)?;

        let total = total_duration(segments);
        self.check_narration(total)?;
        let music = match &self.settings.music {
            Some(spec) => Some(music_mix(spec, total, self.music_duration(spec)?)?),
            None => None,
        };

        let encoder =
            self.encoders
                .resolve(self.engine, self.settings.prefer_gpu, &self.settings.encoders);
        let (width, height) = self.settings.dimensions();
        let compiler = FfmpegCompiler::new(VideoDimensions::new(width, height), self.settings.fps);

        let planned = self.plan_segments(segments)?;

        let mut commands = Vec::new();
        let runner = JobRunner::new(
            self.engine,
            &compiler,
            &encoder,
            self.settings.watermark.as_ref(),
            self.options.verbose,
        );
        for (position, segment) in planned.iter().enumerate() {
            let job = SegmentJob {
                index: segment.index,
                clip: &segment.clip,
                plan: &segment.plan,
                output: self.dirs.intermediate_path(segment.index),
            };
            if self.options.dry_run {
                commands.push(runner.args_for(&job));
                continue;
            }
            log_event(
                Level::Info,
                "broll.render.segment",
                format!(
                    "Rendering segment {} ({}/{})",
                    segment.index,
                    position + 1,
                    planned.len()
                ),
            );
            runner.run(&job)?;
        }

        let manifest_path = self.dirs.manifest_path();
        if self.options.dry_run {
            log_event(
                Level::Debug,
                "broll.render.manifest",
                planned
                    .iter()
                    .map(|segment| manifest_entry(&self.dirs.intermediate_path(segment.index)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        } else {
            let manifest = build_manifest(segments, &self.dirs)?;
            write_manifest(&manifest_path, &manifest)?;
        }

        let staging = self.dirs.partial_output();
        let output = self.dirs.final_output();
        let composer = Composer::new(self.engine, &compiler, &encoder, self.options.verbose);
        let inputs = ComposeInputs {
            manifest: &manifest_path,
            narration: &self.settings.narration,
            music,
            total_duration: total,
            staging: &staging,
            output: &output,
        };

        if self.options.dry_run {
            commands.push(composer.args_for(&inputs));
            return Ok(RenderOutcome::DryRun(commands));
        }

        composer.compose(&inputs)?;
        Ok(RenderOutcome::Rendered(output))
    }

    fn check_narration(&self, total: f64) -> Result<(), RenderError> {
        let narration = &self.settings.narration;
        let duration =
            self.engine
                .probe_duration(narration)
                .map_err(|error| RenderError::Probe {
                    subject: "narration".to_string(),
                    path: narration.clone(),
                    reason: format!("{error:#}"),
                })?;

        if duration + NARRATION_TOLERANCE_SECS < total {
            log_event(
                Level::Warn,
                "broll.render.narration.short",
                format!(
                    "Narration runs {duration:.2}s but the segments cover {total:.2}s; the tail will be silent"
                ),
            );
        } else if duration > total + NARRATION_TOLERANCE_SECS {
            log_event(
                Level::Info,
                "broll.render.narration.capped",
                format!("Narration runs {duration:.2}s; output is capped at {total:.2}s"),
            );
        }
        Ok(())
    }

    /// Locate, probe and fit every segment in index order before anything
    /// is encoded.
    fn plan_segments(&self, segments: &mut [Segment]) -> Result<Vec<PlannedSegment>, RenderError> {
        let mut order: Vec<usize> = (0..segments.len()).collect();
        order.sort_by_key(|&position| segments[position].index);

        let (width, height) = self.settings.dimensions();
        let mut planned = Vec::with_capacity(segments.len());
        for position in order {
            let segment = &mut segments[position];
            let clip = self.resolver.resolve(segment)?;
            let clip_duration =
                self.engine
                    .probe_duration(&clip)
                    .map_err(|error| RenderError::Probe {
                        subject: format!("segment {} clip", segment.index),
                        path: clip.clone(),
                        reason: format!("{error:#}"),
                    })?;

            let plan = fit_segment(&FitRequest {
                policy: segment.fit_policy,
                clip_duration,
                slot_duration: segment.duration(),
                fps: self.settings.fps,
                width,
                height,
            })
            .map_err(|source| RenderError::Fitting {
                index: segment.index,
                source,
            })?;

            segment.resolved_speed = plan.speed;
            log_event_with_data(
                Level::Debug,
                "broll.render.segment.fit",
                format!(
                    "Segment {}: {} -> {} at {:.3}x",
                    segment.index, plan.requested, plan.resolved, plan.speed
                ),
                json!({
                    "index": segment.index,
                    "clip": clip.display().to_string(),
                    "clip_duration": clip_duration,
                    "slot_duration": plan.trim,
                    "policy": plan.resolved.as_str(),
                    "speed": plan.speed,
                    "setpts_factor": plan.time_remap(),
                    "loop_frames": plan.loop_frames(),
                }),
            );
            if let Some(diagnostic) = &plan.diagnostic {
                log_event(
                    Level::Warn,
                    "broll.render.segment.fit",
                    format!("Segment {}: {diagnostic}", segment.index),
                );
            }

            planned.push(PlannedSegment {
                index: segment.index,
                clip,
                plan,
            });
        }
        Ok(planned)
    }

    fn music_duration(&self, spec: &MusicSpec) -> Result<Option<f64>, RenderError> {
        if !spec.looped || spec.end.is_some() {
            return Ok(None);
        }
        self.engine
            .probe_duration(&spec.path)
            .map(Some)
            .map_err(|error| RenderError::Probe {
                subject: "music".to_string(),
                path: spec.path.clone(),
                reason: format!("{error:#}"),
            })
    }
}

fn validate_segments(segments: &[Segment]) -> Result<(), RenderError> {
    if segments.is_empty() {
        return Err(RenderError::invalid("transcript contains no segments"));
    }

    let mut seen = HashSet::new();
    for segment in segments {
        if segment.index == 0 {
            return Err(RenderError::invalid("segment indices start at 1"));
        }
        if !seen.insert(segment.index) {
            return Err(RenderError::invalid(format!(
                "segment index {} appears more than once",
                segment.index
            )));
        }
        let duration = segment.duration();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(RenderError::invalid(format!(
                "segment {} has a non-positive duration ({duration})",
                segment.index
            )));
        }
    }
    Ok(())
}

/// Merge config defaults with command-line overrides.
pub fn build_settings(args: &RenderArgs, config: &RenderConfig) -> RenderSettings {
    let mut settings = RenderSettings::new(args.audio.clone());
    settings.aspect = args.aspect.unwrap_or(config.aspect);
    settings.fps = args.fps.unwrap_or(config.fps);
    settings.prefer_gpu = match (args.gpu, args.no_gpu) {
        (true, _) => true,
        (_, true) => false,
        _ => config.prefer_gpu,
    };
    settings.encoders = config.encoder_names();

    settings.watermark = args.watermark.watermark.as_ref().map(|path| WatermarkSpec {
        path: path.clone(),
        opacity: args
            .watermark
            .watermark_opacity
            .unwrap_or(config.watermark_opacity),
        padding: args
            .watermark
            .watermark_padding
            .unwrap_or(config.watermark_padding),
        position: args
            .watermark
            .watermark_position
            .unwrap_or(config.watermark_position),
        max_width: args.watermark.watermark_max_width,
    });

    settings.music = args.music.music.as_ref().map(|path| MusicSpec {
        path: path.clone(),
        looped: !args.music.no_music_loop,
        start: args.music.music_start.unwrap_or(0.0),
        end: args.music.music_end,
        volume: args.music.music_volume.unwrap_or(config.music_volume),
        speed: args.music.music_speed.unwrap_or(1.0),
    });

    settings
}

pub fn handle_render(args: RenderArgs) -> Result<Option<PathBuf>> {
    ensure_tools(&[Tool::Ffmpeg, Tool::Ffprobe])?;
    let config = RenderConfig::load()?;
    let engine = SystemFfmpeg;
    render_with_engine(&args, &config, &engine)
}

pub(crate) fn render_with_engine(
    args: &RenderArgs,
    config: &RenderConfig,
    engine: &dyn MediaEngine,
) -> Result<Option<PathBuf>> {
    log_event(
        Level::Info,
        "broll.render.start",
        format!("Preparing render from {}", args.transcript.display()),
    );

    let cues = read_srt(&args.transcript)?;
    let mut segments = segments_from_cues(&cues, args.fit.unwrap_or(config.default_fit));
    if let Some(path) = &args.assignments {
        load_assignments(path)?.apply(&mut segments)?;
    }

    let settings = build_settings(args, config);
    let final_output = args.out_dir.join(paths::FINAL_OUTPUT_NAME);
    if final_output.exists() && !args.force && !args.dry_run {
        bail!(
            "Output file {} already exists. Use --force to overwrite.",
            final_output.display()
        );
    }

    let dirs = RunDirs::prepare(
        args.work_dir.as_deref(),
        &args.out_dir,
        args.keep_intermediates,
    )?;
    let extension = args
        .clip_extension
        .clone()
        .unwrap_or_else(|| config.clip_extension.clone());
    let resolver =
        ClipResolver::new(&args.clips, extension).with_cache_dir(remote_clip_cache_dir().ok());

    let options = RenderOptions {
        dry_run: args.dry_run,
        verbose: args.verbose,
    };
    let mut run = RenderRun::new(&settings, engine, resolver, dirs, options);
    let outcome = run.execute(&mut segments)?;

    if args.keep_intermediates && args.work_dir.is_none() {
        log_event(
            Level::Info,
            "broll.render.intermediates",
            format!("Intermediates kept in {}", run.dirs().work_dir().display()),
        );
    }

    match outcome {
        RenderOutcome::Rendered(path) => {
            log_event(
                Level::Success,
                "broll.render.success",
                format!(
                    "Rendered {} segment(s) to {}",
                    segments.len(),
                    path.display()
                ),
            );
            Ok(Some(path))
        }
        RenderOutcome::DryRun(commands) => {
            println!("ffmpeg commands that would be executed:");
            for command in &commands {
                println!("ffmpeg {}", shell_words::join(command));
            }
            log_event(
                Level::Info,
                "broll.render.dry_run",
                format!("Dry run completed - {} command(s) printed above", commands.len()),
            );
            Ok(None)
        }
    }
}
