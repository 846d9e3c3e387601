//! Segment fitting: reconcile a clip's probed duration with its slot.
//!
//! The narration is the master clock, so the slot length `S` is never
//! adjusted. Each policy produces the same [`FitPlan`] shape that the
//! ffmpeg compiler turns into a filter graph.

use thiserror::Error;

use crate::video::segment::FitPolicy;

/// Largest frame buffer the ffmpeg `loop` filter accepts.
pub const MAX_LOOP_FRAMES: u32 = i16::MAX as u32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("{what} must be a positive number of seconds, got {value}")]
    NonPositiveDuration { what: &'static str, value: f64 },

    #[error("computed playback speed {0} is not positive")]
    DegenerateSpeed(f64),

    #[error("looping needs {frames} frames, more than the {max} the loop filter can buffer")]
    LoopTooLong { frames: u64, max: u32 },
}

/// How the clip's timeline is manipulated before it is scaled and cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeAdjust {
    /// Native speed.
    None,
    /// Multiply presentation timestamps by `factor` (`1 / speed`).
    Remap { factor: f64 },
    /// Repeat the first `frames` frames (the whole clip) indefinitely.
    Loop { frames: u32 },
}

/// Uniform across policies: scale to cover the canvas, then center-crop.
/// Letterboxing is never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropStrategy {
    #[default]
    CoverCenter,
}

#[derive(Debug, Clone, Copy)]
pub struct FitRequest {
    pub policy: FitPolicy,
    /// Probed clip duration `D`.
    pub clip_duration: f64,
    /// Slot duration `S`.
    pub slot_duration: f64,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitPlan {
    pub requested: FitPolicy,
    /// Never `Auto`.
    pub resolved: FitPolicy,
    pub speed: f64,
    pub adjust: TimeAdjust,
    /// Output length cap; always the slot duration.
    pub trim: f64,
    pub width: u32,
    pub height: u32,
    pub crop: CropStrategy,
    pub diagnostic: Option<String>,
}

impl FitPlan {
    pub fn time_remap(&self) -> Option<f64> {
        match self.adjust {
            TimeAdjust::Remap { factor } => Some(factor),
            _ => None,
        }
    }

    pub fn loop_frames(&self) -> Option<u32> {
        match self.adjust {
            TimeAdjust::Loop { frames } => Some(frames),
            _ => None,
        }
    }
}

/// `Auto` picks `Trim` for clips that cover the slot and `Slow` otherwise.
pub fn resolve_policy(policy: FitPolicy, clip_duration: f64, slot_duration: f64) -> FitPolicy {
    match policy {
        FitPolicy::Auto if clip_duration >= slot_duration => FitPolicy::Trim,
        FitPolicy::Auto => FitPolicy::Slow,
        explicit => explicit,
    }
}

pub fn fit_segment(request: &FitRequest) -> Result<FitPlan, FitError> {
    let d = request.clip_duration;
    let s = request.slot_duration;
    ensure_positive("clip duration", d)?;
    ensure_positive("slot duration", s)?;

    let resolved = resolve_policy(request.policy, d, s);
    let mut diagnostic = None;

    let (speed, adjust) = match resolved {
        FitPolicy::Trim => {
            if d < s {
                diagnostic = Some(format!(
                    "clip runs {d:.3}s, shorter than the {s:.3}s slot; the intermediate will under-run"
                ));
            }
            (1.0, TimeAdjust::None)
        }
        FitPolicy::Slow => {
            if d < s {
                stretch(d, s)?
            } else {
                diagnostic = Some(format!(
                    "slow requested but the {d:.3}s clip already covers the {s:.3}s slot; playing at native speed"
                ));
                (1.0, TimeAdjust::None)
            }
        }
        FitPolicy::Speed => {
            if d > s {
                stretch(d, s)?
            } else {
                diagnostic = Some(format!(
                    "speed requested but the {d:.3}s clip does not exceed the {s:.3}s slot; playing at native speed"
                ));
                (1.0, TimeAdjust::None)
            }
        }
        FitPolicy::Loop if d >= s => {
            diagnostic = Some(format!(
                "loop requested but the {d:.3}s clip already covers the {s:.3}s slot; playing once at native speed"
            ));
            (1.0, TimeAdjust::None)
        }
        FitPolicy::Loop => {
            let frames = (d * f64::from(request.fps)).ceil() as u64;
            if frames > u64::from(MAX_LOOP_FRAMES) {
                return Err(FitError::LoopTooLong {
                    frames,
                    max: MAX_LOOP_FRAMES,
                });
            }
            (
                1.0,
                TimeAdjust::Loop {
                    frames: frames.max(1) as u32,
                },
            )
        }
        FitPolicy::Auto => unreachable!("resolve_policy never returns Auto"),
    };

    Ok(FitPlan {
        requested: request.policy,
        resolved,
        speed,
        adjust,
        trim: s,
        width: request.width,
        height: request.height,
        crop: CropStrategy::CoverCenter,
        diagnostic,
    })
}

fn stretch(clip_duration: f64, slot_duration: f64) -> Result<(f64, TimeAdjust), FitError> {
    let speed = clip_duration / slot_duration;
    if !(speed.is_finite() && speed > 0.0) {
        return Err(FitError::DegenerateSpeed(speed));
    }
    Ok((speed, TimeAdjust::Remap { factor: 1.0 / speed }))
}

fn ensure_positive(what: &'static str, value: f64) -> Result<(), FitError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FitError::NonPositiveDuration { what, value })
    }
}
