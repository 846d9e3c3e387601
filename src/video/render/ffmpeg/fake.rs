//! Recording stand-in for ffmpeg/ffprobe used by the render tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};

use super::services::{EngineOutcome, FfmpegRunOptions, MediaEngine};

#[derive(Debug, Default)]
pub struct FakeEngine {
    durations: HashMap<PathBuf, f64>,
    encoders: Option<String>,
    /// Output file names whose encode exits non-zero.
    failing_outputs: Vec<String>,
    /// Output file names that "succeed" without writing anything.
    silent_outputs: Vec<String>,
    /// Output file names that are partly written before the encode fails.
    truncated_outputs: Vec<String>,
    calls: RefCell<Vec<Vec<String>>>,
    encoder_probes: Cell<usize>,
    duration_probes: Cell<usize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            encoders: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn with_duration(mut self, path: impl Into<PathBuf>, seconds: f64) -> Self {
        self.durations.insert(path.into(), seconds);
        self
    }

    pub fn with_encoders(mut self, listing: &str) -> Self {
        self.encoders = Some(listing.to_string());
        self
    }

    pub fn failing_encoder_probe(mut self) -> Self {
        self.encoders = None;
        self
    }

    pub fn failing_output(mut self, file_name: &str) -> Self {
        self.failing_outputs.push(file_name.to_string());
        self
    }

    pub fn silent_output(mut self, file_name: &str) -> Self {
        self.silent_outputs.push(file_name.to_string());
        self
    }

    pub fn truncated_output(mut self, file_name: &str) -> Self {
        self.truncated_outputs.push(file_name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn encoder_probes(&self) -> usize {
        self.encoder_probes.get()
    }

    pub fn duration_probes(&self) -> usize {
        self.duration_probes.get()
    }
}

impl MediaEngine for FakeEngine {
    fn run(&self, args: &[String], _options: FfmpegRunOptions) -> Result<EngineOutcome> {
        self.calls.borrow_mut().push(args.to_vec());

        let output = args
            .last()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("ffmpeg invoked without arguments"))?;
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.failing_outputs.contains(&file_name) {
            return Ok(EngineOutcome::failed(
                Some(1),
                format!("{file_name}: Error while filtering: Invalid argument"),
            ));
        }
        if self.truncated_outputs.contains(&file_name) {
            fs::write(&output, b"moov atom not found")?;
            return Ok(EngineOutcome::failed(
                Some(255),
                format!("{file_name}: Conversion failed!"),
            ));
        }
        if !self.silent_outputs.contains(&file_name) {
            fs::write(&output, args.join(" "))?;
        }
        Ok(EngineOutcome::ok())
    }

    fn probe_duration(&self, path: &Path) -> Result<f64> {
        self.duration_probes.set(self.duration_probes.get() + 1);
        match self.durations.get(path) {
            Some(seconds) => Ok(*seconds),
            None => bail!("{}: Invalid data found when processing input", path.display()),
        }
    }

    fn list_encoders(&self) -> Result<String> {
        self.encoder_probes.set(self.encoder_probes.get() + 1);
        self.encoders
            .clone()
            .ok_or_else(|| anyhow!("failed to spawn ffmpeg"))
    }
}
