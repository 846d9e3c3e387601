use super::util::format_decimal;
use super::{FfmpegCompiler, FilterChain};
use crate::video::settings::{Corner, WatermarkSpec};

impl FfmpegCompiler {
    pub(super) fn push_watermark_filters(
        &self,
        filters: &mut FilterChain,
        watermark: &WatermarkSpec,
        input_index: usize,
        base_label: &str,
        output_label: &str,
    ) {
        let mut chain = vec![
            "format=rgba".to_string(),
            format!("colorchannelmixer=aa={}", format_decimal(watermark.opacity)),
        ];
        if let Some(max_width) = watermark.max_width {
            chain.push(format!("scale='min({max_width},iw)':-1"));
        }

        filters.push(format!(
            "[{input}:v]{chain}[wm]",
            input = input_index,
            chain = chain.join(","),
        ));

        let (x, y) = overlay_position(watermark.position, watermark.padding);
        filters.push(format!(
            "[{base}][wm]overlay=x={x}:y={y}:format=auto,format=yuv420p[{output}]",
            base = base_label,
            output = output_label,
        ));
    }
}

fn overlay_position(corner: Corner, padding: u32) -> (String, String) {
    let near = padding.to_string();
    let far_x = format!("main_w-overlay_w-{padding}");
    let far_y = format!("main_h-overlay_h-{padding}");
    match corner {
        Corner::TopLeft => (near.clone(), near),
        Corner::TopRight => (far_x, near),
        Corner::BottomLeft => (near, far_y),
        Corner::BottomRight => (far_x, far_y),
    }
}
