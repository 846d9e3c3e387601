use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn run_broll_command(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_broll"))
        .args(args)
        .current_dir(env.path())
        .env("HOME", env.home())
        .env("XDG_CONFIG_HOME", env.config_home())
        .env("XDG_CACHE_HOME", env.cache_home())
        .env("NO_COLOR", "1")
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

pub fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(path.to_path_buf())
}

pub fn read_file(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Three four-second cues.
pub fn write_transcript(env: &TestEnvironment) -> Result<PathBuf> {
    write_file(
        &env.path().join("talk.srt"),
        "1\n00:00:00,000 --> 00:00:04,000\nOil tankers crossed the strait.\n\n\
         2\n00:00:04,000 --> 00:00:08,000\nA quiet morning.\n\n\
         3\n00:00:08,000 --> 00:00:12,000\nInflation keeps prices high.\n",
    )
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
