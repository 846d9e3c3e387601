use std::path::{Path, PathBuf};

use super::util::manifest_entry;
use super::{CompositionSpec, FfmpegCompiler, MusicMix, SegmentSpec, VideoDimensions};
use crate::video::render::encoder::EncoderChoice;
use crate::video::render::fit::{FitPlan, FitRequest, fit_segment};
use crate::video::segment::FitPolicy;
use crate::video::settings::{Corner, WatermarkSpec};

fn plan(policy: FitPolicy, clip: f64, slot: f64) -> FitPlan {
    fit_segment(&FitRequest {
        policy,
        clip_duration: clip,
        slot_duration: slot,
        fps: 30,
        width: 1920,
        height: 1080,
    })
    .unwrap()
}

fn compiler() -> FfmpegCompiler {
    FfmpegCompiler::new(VideoDimensions::new(1920, 1080), 30)
}

fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
    let position = args.iter().position(|arg| arg == flag).unwrap();
    &args[position + 1]
}

fn segment_args(plan: &FitPlan, watermark: Option<&WatermarkSpec>) -> Vec<String> {
    compiler()
        .compile_segment(
            &SegmentSpec {
                clip: Path::new("/clips/1.mp4"),
                plan,
                watermark,
                output: Path::new("/work/clip_1.mp4"),
            },
            &EncoderChoice::software("libx264"),
        )
        .args
}

#[test]
fn segment_output_is_muted_and_capped() {
    let plan = plan(FitPolicy::Trim, 10.0, 4.0);
    let args = segment_args(&plan, None);

    assert_eq!(args.last().unwrap(), "/work/clip_1.mp4");
    assert!(args.contains(&"-y".to_string()));
    assert!(args.contains(&"-an".to_string()));
    assert_eq!(value_after(&args, "-t"), "4.000000");
    assert_eq!(value_after(&args, "-r"), "30");
    assert_eq!(value_after(&args, "-map"), "[outv]");
    assert_eq!(value_after(&args, "-c:v"), "libx264");
    assert_eq!(value_after(&args, "-pix_fmt"), "yuv420p");

    let graph = value_after(&args, "-filter_complex");
    assert_eq!(
        graph,
        "[0:v]setpts=PTS-STARTPTS,scale=1920:1080:force_original_aspect_ratio=increase:flags=lanczos,crop=1920:1080,setsar=1,fps=30,trim=duration=4.000000,format=yuv420p[outv]"
    );
}

#[test]
fn slow_fit_stretches_timestamps() {
    let plan = plan(FitPolicy::Slow, 5.0, 10.0);
    let args = segment_args(&plan, None);
    let graph = value_after(&args, "-filter_complex");
    assert!(graph.starts_with("[0:v]setpts=2.000000*(PTS-STARTPTS),"));
    assert!(graph.contains("trim=duration=10.000000"));
}

#[test]
fn speed_fit_compresses_timestamps() {
    let plan = plan(FitPolicy::Speed, 20.0, 10.0);
    let args = segment_args(&plan, None);
    let graph = value_after(&args, "-filter_complex");
    assert!(graph.starts_with("[0:v]setpts=0.500000*(PTS-STARTPTS),"));
}

#[test]
fn loop_fit_buffers_the_whole_clip() {
    let plan = plan(FitPolicy::Loop, 2.5, 9.0);
    let args = segment_args(&plan, None);
    let graph = value_after(&args, "-filter_complex");
    assert!(graph.starts_with("[0:v]fps=30,loop=loop=-1:size=75:start=0,setpts=N/(30*TB),"));
    assert_eq!(graph.matches("fps=30").count(), 1);
    assert!(graph.contains("trim=duration=9.000000"));
}

#[test]
fn watermark_is_overlaid_after_fitting() {
    let watermark = WatermarkSpec {
        path: PathBuf::from("/brand/logo.png"),
        opacity: 0.5,
        padding: 20,
        position: Corner::TopRight,
        max_width: Some(320),
    };
    let plan = plan(FitPolicy::Trim, 10.0, 4.0);
    let args = segment_args(&plan, Some(&watermark));

    let inputs: Vec<&String> = args
        .iter()
        .zip(args.iter().skip(1))
        .filter(|(flag, _)| *flag == "-i")
        .map(|(_, value)| value)
        .collect();
    assert_eq!(inputs, vec!["/clips/1.mp4", "/brand/logo.png"]);

    let graph = value_after(&args, "-filter_complex");
    let filters: Vec<&str> = graph.split("; ").collect();
    assert_eq!(filters.len(), 3);
    assert!(filters[0].ends_with("[v_fit]"));
    assert_eq!(
        filters[1],
        "[1:v]format=rgba,colorchannelmixer=aa=0.500000,scale='min(320,iw)':-1[wm]"
    );
    assert_eq!(
        filters[2],
        "[v_fit][wm]overlay=x=main_w-overlay_w-20:y=20:format=auto,format=yuv420p[outv]"
    );
}

#[test]
fn bottom_left_watermark_without_downscale() {
    let watermark = WatermarkSpec {
        path: PathBuf::from("/brand/logo.png"),
        opacity: 1.0,
        padding: 0,
        position: Corner::BottomLeft,
        max_width: None,
    };
    let plan = plan(FitPolicy::Trim, 10.0, 4.0);
    let args = segment_args(&plan, Some(&watermark));
    let graph = value_after(&args, "-filter_complex");
    assert!(!graph.contains("scale='min"));
    assert!(graph.contains("overlay=x=0:y=main_h-overlay_h-0"));
}

#[test]
fn segment_commands_are_deterministic() {
    let plan = plan(FitPolicy::Auto, 4.0, 6.0);
    assert_eq!(segment_args(&plan, None), segment_args(&plan, None));
}

#[test]
fn composition_without_music_passes_narration_through() {
    let args = compiler()
        .compile_composition(
            &CompositionSpec {
                manifest: Path::new("/work/concat.txt"),
                narration: Path::new("/audio/voice.wav"),
                music: None,
                total_duration: 12.0,
                output: Path::new("/out/final.mp4"),
            },
            &EncoderChoice::hardware("h264_nvenc"),
        )
        .args;

    assert_eq!(value_after(&args, "-f"), "concat");
    assert_eq!(value_after(&args, "-safe"), "0");
    assert_eq!(value_after(&args, "-i"), "/work/concat.txt");
    assert!(!args.contains(&"-filter_complex".to_string()));
    assert!(args.contains(&"1:a:0".to_string()));
    assert_eq!(value_after(&args, "-c:v"), "h264_nvenc");
    assert_eq!(value_after(&args, "-c:a"), "aac");
    assert_eq!(value_after(&args, "-t"), "12.000000");
    assert!(args.contains(&"-shortest".to_string()));
    assert_eq!(args.last().unwrap(), "/out/final.mp4");
}

#[test]
fn composition_mixes_music_under_narration() {
    let music = MusicMix {
        path: PathBuf::from("/audio/bed.mp3"),
        start: 10.0,
        end: Some(40.0),
        loop_samples: Some(1_440_000),
        volume: 0.35,
        speed: 1.0,
    };
    let args = compiler()
        .compile_composition(
            &CompositionSpec {
                manifest: Path::new("/work/concat.txt"),
                narration: Path::new("/audio/voice.wav"),
                music: Some(music),
                total_duration: 12.0,
                output: Path::new("/out/final.mp4"),
            },
            &EncoderChoice::software("libx264"),
        )
        .args;

    let graph = value_after(&args, "-filter_complex");
    assert_eq!(
        graph,
        "[2:a]atrim=start=10.000000:end=40.000000,asetpts=PTS-STARTPTS,aresample=48000,aloop=loop=-1:size=1440000,atempo=1.000000,volume=0.350000,apad=whole_dur=12.000000[music]; \
         [1:a]aresample=48000[voice]; \
         [voice][music]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0[outa]"
    );
    assert!(args.contains(&"[outa]".to_string()));
    assert!(!args.contains(&"1:a:0".to_string()));
    assert_eq!(value_after(&args, "-t"), "12.000000");
}

#[test]
fn unbounded_music_window_has_no_end() {
    let music = MusicMix {
        path: PathBuf::from("/audio/bed.mp3"),
        start: 0.0,
        end: None,
        loop_samples: None,
        volume: 1.0,
        speed: 1.25,
    };
    let args = compiler()
        .compile_composition(
            &CompositionSpec {
                manifest: Path::new("/work/concat.txt"),
                narration: Path::new("/audio/voice.wav"),
                music: Some(music),
                total_duration: 7.5,
                output: Path::new("/out/final.mp4"),
            },
            &EncoderChoice::software("libx264"),
        )
        .args;
    let graph = value_after(&args, "-filter_complex");
    assert!(graph.starts_with("[2:a]atrim=start=0.000000,asetpts"));
    assert!(!graph.contains("aloop"));
    assert!(graph.contains("atempo=1.250000,volume=1.000000,apad=whole_dur=7.500000"));
}

#[test]
fn manifest_entries_escape_quotes() {
    assert_eq!(
        manifest_entry(Path::new("/work/clip_1.mp4")),
        "file '/work/clip_1.mp4'"
    );
    assert_eq!(
        manifest_entry(Path::new("/work/it's/clip_2.mp4")),
        "file '/work/it'\\''s/clip_2.mp4'"
    );
}
