use super::util::format_decimal;
use super::{FfmpegCompiler, FilterChain};
use crate::video::render::fit::{CropStrategy, FitPlan, TimeAdjust};

impl FfmpegCompiler {
    /// Time manipulation, cover-crop and frame-rate normalization for one clip.
    pub(super) fn push_fit_filters(
        &self,
        filters: &mut FilterChain,
        plan: &FitPlan,
        input_label: &str,
        output_label: &str,
    ) {
        let mut chain = Vec::new();

        match plan.adjust {
            TimeAdjust::None => chain.push("setpts=PTS-STARTPTS".to_string()),
            TimeAdjust::Remap { factor } => {
                chain.push(format!("setpts={}*(PTS-STARTPTS)", format_decimal(factor)))
            }
            TimeAdjust::Loop { frames } => {
                // Loop at the target rate so the frame count matches the buffer size.
                chain.push(format!("fps={}", self.fps));
                chain.push(format!("loop=loop=-1:size={frames}:start=0"));
                chain.push(format!("setpts=N/({}*TB)", self.fps));
            }
        }

        chain.push(self.build_crop_filter(plan.crop));

        if !matches!(plan.adjust, TimeAdjust::Loop { .. }) {
            chain.push(format!("fps={}", self.fps));
        }
        chain.push(format!("trim=duration={}", format_decimal(plan.trim)));
        chain.push("format=yuv420p".to_string());

        filters.push(format!(
            "[{input}]{chain}[{output}]",
            input = input_label,
            chain = chain.join(","),
            output = output_label,
        ));
    }

    fn build_crop_filter(&self, crop: CropStrategy) -> String {
        match crop {
            CropStrategy::CoverCenter => format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase:flags=lanczos,crop={w}:{h},setsar=1",
                w = self.target_width,
                h = self.target_height,
            ),
        }
    }
}
