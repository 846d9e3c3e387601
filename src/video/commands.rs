use std::fs;

use anyhow::{Context, Result, bail};
use serde_json::json;

use crate::common::requirements::{Tool, ensure_tools};
use crate::ui::prelude::{Level, OutputFormat, emit, get_output_format};

use super::check::handle_check;
use super::cli::{ConfigArgs, EncodersArgs, KeywordsArgs, SlotsArgs, VideoCommands};
use super::config::{RenderConfig, config_path};
use super::keywords::render_keyword_blocks;
use super::render::encoder::EncoderCache;
use super::render::ffmpeg::services::{MediaEngine, SystemFfmpeg};
use super::render::handle_render;
use super::slots::{CUE_END_PAD_SECONDS, TimedText, fill_slots, slots_to_cues};
use super::srt::{read_srt, write_srt};
use super::support::utils::sibling_with_suffix;

pub fn handle_video_command(command: VideoCommands) -> Result<()> {
    match command {
        VideoCommands::Render(args) => handle_render(args).map(|_| ()),
        VideoCommands::Check(args) => handle_check(args),
        VideoCommands::Encoders(args) => handle_encoders(args),
        VideoCommands::Slots(args) => handle_slots(args),
        VideoCommands::Keywords(args) => handle_keywords(args),
        VideoCommands::Config(args) => handle_config(args),
    }
}

fn handle_encoders(args: EncodersArgs) -> Result<()> {
    ensure_tools(&[Tool::Ffmpeg])?;
    let config = RenderConfig::load()?;
    let prefer_gpu = args.gpu || config.prefer_gpu;

    let mut cache = EncoderCache::new();
    let choice = cache.resolve(&SystemFfmpeg, prefer_gpu, &config.encoder_names());
    emit(
        Level::Success,
        "broll.encoders.selected",
        &format!(
            "Video encoder: {} ({})",
            choice.codec,
            if choice.hardware { "hardware" } else { "software" }
        ),
        Some(json!({
            "codec": choice.codec,
            "hardware": choice.hardware,
            "prefer_gpu": prefer_gpu,
        })),
    );
    Ok(())
}

fn handle_slots(args: SlotsArgs) -> Result<()> {
    let duration = match (args.duration, &args.audio) {
        (Some(duration), _) => duration,
        (None, Some(audio)) => {
            ensure_tools(&[Tool::Ffprobe])?;
            SystemFfmpeg.probe_duration(audio)?
        }
        (None, None) => bail!("Pass --audio or --duration to size the slots"),
    };

    let items: Vec<TimedText> = match &args.from {
        Some(path) => read_srt(path)?.iter().map(TimedText::from).collect(),
        None => Vec::new(),
    };

    let slots = fill_slots(&items, duration, args.slot_seconds, CUE_END_PAD_SECONDS)?;
    let srt = write_srt(&slots_to_cues(&slots));

    match &args.out_file {
        Some(path) => {
            fs::write(path, &srt)
                .with_context(|| format!("writing slots to {}", path.display()))?;
            emit(
                Level::Success,
                "broll.slots.written",
                &format!(
                    "Wrote {} slot(s) covering {duration:.3}s to {}",
                    slots.len(),
                    path.display()
                ),
                None,
            );
        }
        None => print!("{srt}"),
    }
    Ok(())
}

fn handle_keywords(args: KeywordsArgs) -> Result<()> {
    let cues = read_srt(&args.transcript)?;
    let output_path = match &args.out_file {
        Some(path) => path.clone(),
        None => sibling_with_suffix(&args.transcript, "_keywords", "txt")?,
    };

    fs::write(&output_path, render_keyword_blocks(&cues))
        .with_context(|| format!("writing keywords to {}", output_path.display()))?;
    emit(
        Level::Success,
        "broll.keywords.written",
        &format!(
            "Wrote keywords for {} block(s) to {}",
            cues.len(),
            output_path.display()
        ),
        None,
    );
    Ok(())
}

fn handle_config(args: ConfigArgs) -> Result<()> {
    let path = config_path()?;
    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    let config = RenderConfig::load_from_path(&path)?;
    match get_output_format() {
        OutputFormat::Json => emit(
            Level::Info,
            "broll.config",
            &format!("Configuration at {}", path.display()),
            Some(serde_json::to_value(&config).context("serializing broll config")?),
        ),
        OutputFormat::Text => {
            println!("# {}", path.display());
            print!(
                "{}",
                toml::to_string_pretty(&config).context("serializing broll config")?
            );
        }
    }
    Ok(())
}
