use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

use super::segment::FitPolicy;
use super::settings::{AspectRatio, Corner};
use super::slots::DEFAULT_SLOT_SECONDS;

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// Render the narrated video from a transcript, clips and narration
    Render(RenderArgs),
    /// Resolve every segment's clip without rendering
    Check(CheckArgs),
    /// Probe ffmpeg for the hardware encoder
    Encoders(EncodersArgs),
    /// Cut the narration into fixed-length slots and pour transcript text into them
    Slots(SlotsArgs),
    /// Suggest stock-footage search phrases per transcript block
    Keywords(KeywordsArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Narration audio track
    #[arg(short = 'a', long = "audio", value_hint = ValueHint::FilePath)]
    pub audio: PathBuf,

    /// SRT transcript with one cue per segment
    #[arg(short = 't', long = "transcript", value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Folder holding the clips (numbered <index>.<ext> or named in assignments)
    #[arg(short = 'c', long = "clips", value_hint = ValueHint::DirPath)]
    pub clips: PathBuf,

    /// TOML file assigning clips and fit policies to segments
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub assignments: Option<PathBuf>,

    /// Fit policy for segments without an explicit one
    #[arg(long, value_enum)]
    pub fit: Option<FitPolicy>,

    /// Output aspect ratio
    #[arg(long, value_enum)]
    pub aspect: Option<AspectRatio>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Extension used for numbered clips
    #[arg(long = "clip-ext")]
    pub clip_extension: Option<String>,

    /// Prefer the hardware encoder when available
    #[arg(long, conflicts_with = "no_gpu")]
    pub gpu: bool,

    /// Always use the software encoder
    #[arg(long)]
    pub no_gpu: bool,

    #[command(flatten)]
    pub watermark: WatermarkArgs,

    #[command(flatten)]
    pub music: MusicArgs,

    /// Directory receiving final.mp4
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Directory for intermediates; a temporary directory is used otherwise
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub work_dir: Option<PathBuf>,

    /// Keep the temporary work directory after the run
    #[arg(long)]
    pub keep_intermediates: bool,

    /// Overwrite an existing final.mp4
    #[arg(long)]
    pub force: bool,

    /// Print the ffmpeg commands that would be executed without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Forward ffmpeg output instead of showing a progress bar
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatermarkArgs {
    /// Image overlaid on every segment
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub watermark: Option<PathBuf>,

    /// Watermark opacity (0.0-1.0)
    #[arg(long, requires = "watermark")]
    pub watermark_opacity: Option<f64>,

    /// Watermark distance from the frame edge in pixels
    #[arg(long, requires = "watermark")]
    pub watermark_padding: Option<u32>,

    /// Watermark corner
    #[arg(long, value_enum, requires = "watermark")]
    pub watermark_position: Option<Corner>,

    /// Downscale the watermark to at most this width
    #[arg(long, requires = "watermark")]
    pub watermark_max_width: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MusicArgs {
    /// Background music mixed under the narration
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub music: Option<PathBuf>,

    /// Music volume (0.0-2.0)
    #[arg(long, requires = "music")]
    pub music_volume: Option<f64>,

    /// Music playback speed (0.5-2.0)
    #[arg(long, requires = "music")]
    pub music_speed: Option<f64>,

    /// Start of the music window in seconds
    #[arg(long, requires = "music")]
    pub music_start: Option<f64>,

    /// End of the music window in seconds
    #[arg(long, requires = "music")]
    pub music_end: Option<f64>,

    /// Play the music window once instead of looping it
    #[arg(long, requires = "music")]
    pub no_music_loop: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// SRT transcript with one cue per segment
    #[arg(short = 't', long = "transcript", value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Folder holding the clips
    #[arg(short = 'c', long = "clips", value_hint = ValueHint::DirPath)]
    pub clips: PathBuf,

    /// TOML file assigning clips and fit policies to segments
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub assignments: Option<PathBuf>,

    /// Extension used for numbered clips
    #[arg(long = "clip-ext")]
    pub clip_extension: Option<String>,

    /// Also probe clip durations and report the fit each segment would get
    #[arg(long)]
    pub probe: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EncodersArgs {
    /// Probe for the hardware encoder
    #[arg(long)]
    pub gpu: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SlotsArgs {
    /// Narration audio whose duration defines the slots
    #[arg(short = 'a', long = "audio", value_hint = ValueHint::FilePath)]
    pub audio: Option<PathBuf>,

    /// Narration duration in seconds (skips probing)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Transcript whose text is poured into the slots
    #[arg(long = "from", value_hint = ValueHint::FilePath)]
    pub from: Option<PathBuf>,

    /// Slot length in seconds
    #[arg(long, default_value_t = DEFAULT_SLOT_SECONDS)]
    pub slot_seconds: f64,

    /// Output SRT; printed to stdout when omitted
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct KeywordsArgs {
    /// SRT transcript to derive search phrases from
    #[arg(short = 't', long = "transcript", value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Output file; defaults to <transcript stem>_keywords.txt
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print only the configuration file path
    #[arg(long)]
    pub path: bool,
}
