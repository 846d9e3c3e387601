use std::path::PathBuf;

use anyhow::{Result, bail};
use serde_json::json;

use crate::common::paths::remote_clip_cache_dir;
use crate::common::requirements::{Tool, ensure_tools};
use crate::ui::prelude::{Level, emit};

use super::assignments::load_assignments;
use super::cli::CheckArgs;
use super::config::RenderConfig;
use super::render::ffmpeg::services::{MediaEngine, SystemFfmpeg};
use super::render::fit::{FitPlan, FitRequest, fit_segment};
use super::render::resolve::ClipResolver;
use super::segment::{Segment, segments_from_cues, total_duration};
use super::srt::read_srt;

#[derive(Debug)]
pub enum SegmentStatus {
    Resolved {
        clip: PathBuf,
        /// Present when clip durations were probed.
        plan: Option<FitPlan>,
    },
    Failed(String),
}

#[derive(Debug)]
pub struct SegmentReport {
    pub index: usize,
    pub duration: f64,
    pub status: SegmentStatus,
}

/// Probing parameters for a check that also plans each fit.
pub struct ProbeContext<'a> {
    pub engine: &'a dyn MediaEngine,
    pub fps: u32,
    pub dimensions: (u32, u32),
}

/// Resolve (and optionally probe and fit) every segment without rendering
/// anything. Each segment is reported independently.
pub fn check_segments(
    segments: &[Segment],
    resolver: &ClipResolver,
    probe: Option<&ProbeContext<'_>>,
) -> Vec<SegmentReport> {
    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|segment| segment.index);

    ordered
        .into_iter()
        .map(|segment| SegmentReport {
            index: segment.index,
            duration: segment.duration(),
            status: check_segment(segment, resolver, probe),
        })
        .collect()
}

fn check_segment(
    segment: &Segment,
    resolver: &ClipResolver,
    probe: Option<&ProbeContext<'_>>,
) -> SegmentStatus {
    let clip = match resolver.resolve(segment) {
        Ok(clip) => clip,
        Err(error) => return SegmentStatus::Failed(error.to_string()),
    };
    let Some(probe) = probe else {
        return SegmentStatus::Resolved { clip, plan: None };
    };

    let clip_duration = match probe.engine.probe_duration(&clip) {
        Ok(duration) => duration,
        Err(error) => {
            return SegmentStatus::Failed(format!(
                "Segment {}: failed to probe {}: {error:#}",
                segment.index,
                clip.display()
            ));
        }
    };

    let (width, height) = probe.dimensions;
    match fit_segment(&FitRequest {
        policy: segment.fit_policy,
        clip_duration,
        slot_duration: segment.duration(),
        fps: probe.fps,
        width,
        height,
    }) {
        Ok(plan) => SegmentStatus::Resolved {
            clip,
            plan: Some(plan),
        },
        Err(error) => SegmentStatus::Failed(format!("Segment {}: {error}", segment.index)),
    }
}

pub fn handle_check(args: CheckArgs) -> Result<()> {
    let config = RenderConfig::load()?;
    let cues = read_srt(&args.transcript)?;
    let mut segments = segments_from_cues(&cues, config.default_fit);
    if let Some(path) = &args.assignments {
        load_assignments(path)?.apply(&mut segments)?;
    }
    if segments.is_empty() {
        bail!("{} contains no segments", args.transcript.display());
    }

    let extension = args
        .clip_extension
        .clone()
        .unwrap_or_else(|| config.clip_extension.clone());
    let resolver =
        ClipResolver::new(&args.clips, extension).with_cache_dir(remote_clip_cache_dir().ok());

    let engine = SystemFfmpeg;
    let context = if args.probe {
        ensure_tools(&[Tool::Ffprobe])?;
        Some(ProbeContext {
            engine: &engine,
            fps: config.fps,
            dimensions: config.aspect.dimensions(),
        })
    } else {
        None
    };

    let reports = check_segments(&segments, &resolver, context.as_ref());
    let failures = reports
        .iter()
        .filter(|report| matches!(report.status, SegmentStatus::Failed(_)))
        .count();

    for report in &reports {
        emit_report(report);
    }

    emit(
        Level::Info,
        "broll.check.duration",
        &format!(
            "{} segment(s), {:.3}s of output",
            segments.len(),
            total_duration(&segments)
        ),
        None,
    );

    if failures > 0 {
        bail!(
            "{failures} of {} segment(s) have no usable clip",
            reports.len()
        );
    }

    emit(
        Level::Success,
        "broll.check.valid",
        "Every segment resolves to a clip",
        None,
    );
    Ok(())
}

fn emit_report(report: &SegmentReport) {
    match &report.status {
        SegmentStatus::Resolved { clip, plan: None } => emit(
            Level::Success,
            "broll.check.segment",
            &format!("Segment {}: {}", report.index, clip.display()),
            Some(json!({
                "index": report.index,
                "duration": report.duration,
                "clip": clip.display().to_string(),
            })),
        ),
        SegmentStatus::Resolved {
            clip,
            plan: Some(plan),
        } => {
            emit(
                Level::Success,
                "broll.check.segment",
                &format!(
                    "Segment {}: {} ({} at {:.3}x)",
                    report.index,
                    clip.display(),
                    plan.resolved,
                    plan.speed
                ),
                Some(json!({
                    "index": report.index,
                    "duration": report.duration,
                    "clip": clip.display().to_string(),
                    "policy": plan.resolved.as_str(),
                    "speed": plan.speed,
                })),
            );
            if let Some(diagnostic) = &plan.diagnostic {
                emit(
                    Level::Warn,
                    "broll.check.fit",
                    &format!("Segment {}: {diagnostic}", report.index),
                    None,
                );
            }
        }
        SegmentStatus::Failed(reason) => emit(
            Level::Error,
            "broll.check.segment",
            reason,
            Some(json!({
                "index": report.index,
                "duration": report.duration,
                "error": reason,
            })),
        ),
    }
}
