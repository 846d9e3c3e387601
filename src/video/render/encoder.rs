use crate::ui::prelude::Level;
use crate::video::render::ffmpeg::services::MediaEngine;
use crate::video::render::logging::log_event;
use crate::video::settings::EncoderNames;

/// Video encoder chosen for a run, plus the arguments that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderChoice {
    pub codec: String,
    pub hardware: bool,
}

impl EncoderChoice {
    pub fn software(codec: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            hardware: false,
        }
    }

    pub fn hardware(codec: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            hardware: true,
        }
    }

    pub fn push_to(&self, args: &mut Vec<String>) {
        args.push("-c:v".to_string());
        args.push(self.codec.clone());

        let tuning: &[&str] = if self.codec == "libx264" || self.codec == "libx265" {
            &["-preset", "veryfast", "-crf", "20"]
        } else if self.codec.ends_with("_nvenc") {
            &["-preset", "p4", "-rc", "vbr", "-cq", "23"]
        } else {
            &[]
        };
        args.extend(tuning.iter().map(|arg| arg.to_string()));

        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());
    }
}

/// Encoder decision cached for one render run, keyed by the hardware
/// preference it was made under.
#[derive(Debug, Default)]
pub struct EncoderCache {
    entry: Option<(bool, EncoderChoice)>,
}

impl EncoderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, prefer_gpu: bool) -> Option<&EncoderChoice> {
        match &self.entry {
            Some((flag, choice)) if *flag == prefer_gpu => Some(choice),
            _ => None,
        }
    }

    /// Never fails: probe problems degrade to the software encoder.
    pub fn resolve(
        &mut self,
        engine: &dyn MediaEngine,
        prefer_gpu: bool,
        names: &EncoderNames,
    ) -> EncoderChoice {
        if let Some(choice) = self.cached(prefer_gpu) {
            return choice.clone();
        }

        let choice = select_encoder(engine, prefer_gpu, names);
        self.entry = Some((prefer_gpu, choice.clone()));
        choice
    }
}

fn select_encoder(engine: &dyn MediaEngine, prefer_gpu: bool, names: &EncoderNames) -> EncoderChoice {
    if !prefer_gpu {
        log_event(
            Level::Debug,
            "broll.encoder.software",
            format!("Hardware encoding not requested; using {}", names.software),
        );
        return EncoderChoice::software(&names.software);
    }

    match engine.list_encoders() {
        Ok(listing) if encoder_listed(&listing, &names.hardware) => {
            log_event(
                Level::Info,
                "broll.encoder.hardware",
                format!("Using hardware encoder {}", names.hardware),
            );
            EncoderChoice::hardware(&names.hardware)
        }
        Ok(_) => {
            log_event(
                Level::Warn,
                "broll.encoder.fallback",
                format!(
                    "Hardware encoder {} is not available in this ffmpeg build; falling back to {}",
                    names.hardware, names.software
                ),
            );
            EncoderChoice::software(&names.software)
        }
        Err(error) => {
            log_event(
                Level::Warn,
                "broll.encoder.fallback",
                format!(
                    "Could not query ffmpeg encoders ({error:#}); falling back to {}",
                    names.software
                ),
            );
            EncoderChoice::software(&names.software)
        }
    }
}

/// Look for `name` as a video encoder in `ffmpeg -encoders` output, where
/// rows look like ` V....D h264_nvenc           NVIDIA NVENC H.264 encoder`.
pub fn encoder_listed(listing: &str, name: &str) -> bool {
    listing.lines().any(|line| {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(flags), Some(encoder)) => {
                flags.starts_with('V') && flags.len() == 6 && encoder == name
            }
            _ => false,
        }
    })
}
