//! External tool requirements.

use anyhow::{Result, bail};

/// Programs a render run shells out to.
#[derive(Debug, Clone, Copy)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
}

impl Tool {
    pub fn program(self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    pub fn is_available(self) -> bool {
        which::which(self.program()).is_ok()
    }
}

/// Fail early with an actionable message when a tool is missing from PATH.
pub fn ensure_tools(tools: &[Tool]) -> Result<()> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| !tool.is_available())
        .map(Tool::program)
        .collect();

    if !missing.is_empty() {
        bail!(
            "Required program(s) not found on PATH: {}. Install ffmpeg to continue.",
            missing.join(", ")
        );
    }
    Ok(())
}
