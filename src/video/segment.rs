use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use super::srt::SrtCue;

/// How a clip of probed duration D is reconciled with a slot of length S.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// Trim when the clip is long enough, otherwise slow it down
    #[default]
    Auto,
    /// Native speed, cut at the slot length
    Trim,
    /// Stretch an under-running clip to fill the slot
    Slow,
    /// Speed up an over-running clip to fit the slot
    Speed,
    /// Repeat the clip until the slot is covered
    Loop,
}

impl FitPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FitPolicy::Auto => "auto",
            FitPolicy::Trim => "trim",
            FitPolicy::Slow => "slow",
            FitPolicy::Speed => "speed",
            FitPolicy::Loop => "loop",
        }
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(FitPolicy::Auto),
            "trim" => Ok(FitPolicy::Trim),
            "slow" => Ok(FitPolicy::Slow),
            "speed" => Ok(FitPolicy::Speed),
            "loop" => Ok(FitPolicy::Loop),
            other => bail!("unknown fit policy `{other}` (expected auto, trim, slow, speed or loop)"),
        }
    }
}

/// Reference to the source media assigned to a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipRef {
    /// File name inside the clips folder, or an explicit path
    File(PathBuf),
    /// Remote locator; must already be materialized in the clip cache
    Url(String),
}

impl ClipRef {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if is_url(trimmed) {
            ClipRef::Url(trimmed.to_string())
        } else {
            ClipRef::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipRef::File(path) => write!(f, "{}", path.display()),
            ClipRef::Url(url) => f.write_str(url),
        }
    }
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// One fixed-length slot of the output timeline.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub assigned_clip: Option<ClipRef>,
    pub fit_policy: FitPolicy,
    /// Playback rate chosen by the fitting engine on the last render pass.
    pub resolved_speed: f64,
}

impl Segment {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
            assigned_clip: None,
            fit_policy: FitPolicy::default(),
            resolved_speed: 1.0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Build segments from parsed cues, renumbering 1..N in file order.
pub fn segments_from_cues(cues: &[SrtCue], default_policy: FitPolicy) -> Vec<Segment> {
    cues.iter()
        .enumerate()
        .map(|(idx, cue)| {
            let mut segment = Segment::new(
                idx + 1,
                cue.start.as_secs_f64(),
                cue.end.as_secs_f64(),
                cue.text.clone(),
            );
            segment.fit_policy = default_policy;
            segment
        })
        .collect()
}

/// Sum of all slot durations; the authoritative length of the final output.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::duration).sum()
}
