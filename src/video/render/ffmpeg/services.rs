use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::ui::prelude::{Level, OutputFormat, emit, get_output_format};
use crate::video::support::ffmpeg::{list_encoders, probe_duration_seconds};

/// Number of trailing stderr lines kept for error reports when ffmpeg did
/// not print anything that looks like an error.
const DIAGNOSTIC_TAIL_LINES: usize = 12;

/// Process boundary to the external media engine.
pub trait MediaEngine {
    /// Run one ffmpeg invocation to completion. `Err` means the process could
    /// not be driven at all; a non-zero exit is reported through the outcome.
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<EngineOutcome>;

    fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Raw `ffmpeg -encoders` listing.
    fn list_encoders(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutcome {
    pub success: bool,
    pub code: Option<i32>,
    pub diagnostics: String,
}

impl EngineOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            diagnostics: String::new(),
        }
    }

    pub fn failed(code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            diagnostics: diagnostics.into(),
        }
    }

    /// Human-readable failure text including the exit status.
    pub fn describe(&self) -> String {
        let status = match self.code {
            Some(code) => format!("ffmpeg exited with status {code}"),
            None => "ffmpeg was terminated by a signal".to_string(),
        };
        if self.diagnostics.trim().is_empty() {
            status
        } else {
            format!("{status}: {}", self.diagnostics.trim())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FfmpegRunOptions {
    /// Expected output length, drives the progress bar.
    pub total_duration: Option<f64>,
    pub label: Option<String>,
    pub verbose: bool,
}

impl FfmpegRunOptions {
    pub fn new(total_duration: Option<f64>, verbose: bool) -> Self {
        Self {
            total_duration,
            label: None,
            verbose,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpeg;

impl MediaEngine for SystemFfmpeg {
    fn run(&self, args: &[String], options: FfmpegRunOptions) -> Result<EngineOutcome> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| "Failed to spawn ffmpeg")?;

        let stderr = child
            .stderr
            .take()
            .context("Failed to capture ffmpeg stderr")?;

        let pb = progress_bar(&options);
        let mut collector = DiagnosticCollector::default();
        let read_result = read_ffmpeg_stderr(stderr, options.verbose, pb.as_ref(), &mut collector);

        let status = child.wait().context("Failed to wait for ffmpeg")?;
        read_result?;

        if let Some(pb) = pb {
            if status.success() {
                pb.finish_and_clear();
            } else {
                pb.abandon();
            }
        }

        if status.success() {
            Ok(EngineOutcome::ok())
        } else {
            Ok(EngineOutcome::failed(status.code(), collector.summary()))
        }
    }

    fn probe_duration(&self, path: &Path) -> Result<f64> {
        probe_duration_seconds(path)
    }

    fn list_encoders(&self) -> Result<String> {
        list_encoders()
    }
}

fn progress_bar(options: &FfmpegRunOptions) -> Option<ProgressBar> {
    let duration = options.total_duration?;
    if options.verbose || get_output_format() == OutputFormat::Json {
        return None;
    }

    let pb = ProgressBar::new((duration * 1000.0) as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(options.label.clone().unwrap_or_else(|| "rendering".to_string()));
    Some(pb)
}

#[derive(Debug, Default)]
struct DiagnosticCollector {
    error_lines: Vec<String>,
    tail: VecDeque<String>,
}

impl DiagnosticCollector {
    fn push(&mut self, line: &str) {
        if line.contains("error") || line.contains("Error") || line.contains("ERROR") {
            self.error_lines.push(line.to_string());
        }
        if self.tail.len() == DIAGNOSTIC_TAIL_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_string());
    }

    fn summary(&self) -> String {
        if self.error_lines.is_empty() {
            self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
        } else {
            self.error_lines.join("\n")
        }
    }
}

fn read_ffmpeg_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    pb: Option<&ProgressBar>,
    collector: &mut DiagnosticCollector,
) -> Result<()> {
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr
            .read(&mut buffer)
            .context("Failed to read ffmpeg stderr")?;
        if bytes_read == 0 {
            break;
        }

        accumulated.push_str(&String::from_utf8_lossy(&buffer[..bytes_read]));

        // ffmpeg rewrites its stats line with '\r'
        while let Some(pos) = accumulated.find(['\r', '\n']) {
            let line = accumulated[..pos].trim_end().to_string();
            accumulated.drain(..=pos);
            handle_line(&line, verbose, pb, collector);
        }
    }

    let rest = accumulated.trim_end().to_string();
    handle_line(&rest, verbose, pb, collector);

    Ok(())
}

fn handle_line(line: &str, verbose: bool, pb: Option<&ProgressBar>, collector: &mut DiagnosticCollector) {
    if line.is_empty() {
        return;
    }

    collector.push(line);

    if verbose {
        emit(Level::Info, "broll.ffmpeg.stderr", line, None);
    }

    if let Some(pb) = pb
        && let Some(progress) = parse_ffmpeg_progress(line)
    {
        pb.set_position((progress * 1000.0) as u64);
        if let Some(speed) = parse_ffmpeg_speed(line) {
            pb.set_message(speed);
        }
    }
}

fn parse_ffmpeg_progress(line: &str) -> Option<f64> {
    let time_start = line.find("time=")?;
    let time_str = &line[time_start + 5..];
    let time_end = time_str.find(' ').unwrap_or(time_str.len());
    parse_time_to_seconds(&time_str[..time_end])
}

fn parse_time_to_seconds(time_str: &str) -> Option<f64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_ffmpeg_speed(line: &str) -> Option<String> {
    let speed_start = line.find("speed=")?;
    let speed_str = line[speed_start + 6..].trim_start();
    let speed_end = speed_str.find('x')?;
    Some(speed_str[..=speed_end].to_string())
}
