use std::path::PathBuf;

use super::util::format_decimal;
use super::{AUDIO_SAMPLE_RATE, FfmpegCompiler, FilterChain};

/// Background music as it enters the final mix.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicMix {
    pub path: PathBuf,
    /// Window of the music's own timeline to use.
    pub start: f64,
    pub end: Option<f64>,
    /// Window length in samples when looping indefinitely.
    pub loop_samples: Option<u64>,
    pub volume: f64,
    pub speed: f64,
}

impl FfmpegCompiler {
    /// Trim, loop, retime, attenuate and pad the music, then sum it with the
    /// narration into `[outa]`.
    pub(super) fn push_music_mix_filters(
        &self,
        filters: &mut FilterChain,
        music: &MusicMix,
        narration_index: usize,
        music_index: usize,
        total_duration: f64,
    ) {
        let mut chain = Vec::new();

        let mut trim = format!("atrim=start={}", format_decimal(music.start));
        if let Some(end) = music.end {
            trim.push_str(&format!(":end={}", format_decimal(end)));
        }
        chain.push(trim);
        chain.push("asetpts=PTS-STARTPTS".to_string());
        chain.push(format!("aresample={AUDIO_SAMPLE_RATE}"));

        if let Some(samples) = music.loop_samples {
            chain.push(format!("aloop=loop=-1:size={samples}"));
        }

        chain.push(format!("atempo={}", format_decimal(music.speed)));
        chain.push(format!("volume={}", format_decimal(music.volume)));
        chain.push(format!("apad=whole_dur={}", format_decimal(total_duration)));

        filters.push(format!(
            "[{input}:a]{chain}[music]",
            input = music_index,
            chain = chain.join(","),
        ));
        filters.push(format!(
            "[{input}:a]aresample={AUDIO_SAMPLE_RATE}[voice]",
            input = narration_index,
        ));
        filters.push(
            "[voice][music]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0[outa]"
                .to_string(),
        );
    }
}
