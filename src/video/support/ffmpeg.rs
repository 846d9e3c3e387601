use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

pub fn probe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    parse_duration_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe returned no usable duration for {}", path.display()))
}

fn parse_duration_output(stdout: &str) -> Result<f64> {
    let value = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .context("ffprobe printed nothing")?;
    let duration: f64 = value
        .parse()
        .with_context(|| format!("Failed to parse ffprobe duration `{value}` as f64"))?;
    Ok(duration)
}

pub fn list_encoders() -> Result<String> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .context("Failed to run ffmpeg -encoders")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffmpeg -encoders exited with status {:?}: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    String::from_utf8(output.stdout).context("ffmpeg returned non-UTF8 encoder listing")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_duration() {
        assert_eq!(parse_duration_output("12.480000\n").unwrap(), 12.48);
    }

    #[test]
    fn rejects_unavailable_duration() {
        assert!(parse_duration_output("N/A\n").is_err());
        assert!(parse_duration_output("\n").is_err());
    }
}
