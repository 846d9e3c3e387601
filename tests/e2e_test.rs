mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use utils::{path_arg, read_file, run_broll_command, write_file, write_transcript};

#[test]
fn test_check_resolves_numbered_clips() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;
    for index in 1..=3 {
        write_file(&env.clips().join(format!("{index}.mp4")), "clip")?;
    }

    let output = run_broll_command(
        &env,
        &[
            "check",
            "--transcript",
            &path_arg(&transcript),
            "--clips",
            &path_arg(&env.clips()),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    assert!(output.stdout.contains("Every segment resolves to a clip"));
    assert!(env.config_file().exists(), "default config was not written");

    Ok(())
}

#[test]
fn test_check_fails_on_missing_clip() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;
    write_file(&env.clips().join("1.mp4"), "clip")?;
    write_file(&env.clips().join("3.mp4"), "clip")?;

    let output = run_broll_command(
        &env,
        &[
            "check",
            "--transcript",
            &path_arg(&transcript),
            "--clips",
            &path_arg(&env.clips()),
        ],
    )?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("Segment 2"), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("1 of 3"));

    Ok(())
}

#[test]
fn test_check_applies_assignments() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;
    write_file(&env.clips().join("1.mp4"), "clip")?;
    write_file(&env.clips().join("harbor.mov"), "clip")?;
    write_file(&env.clips().join("3.mp4"), "clip")?;
    let assignments = write_file(
        &env.path().join("assign.toml"),
        "[[segment]]\nindex = 2\nclip = \"harbor.mov\"\nfit = \"loop\"\n",
    )?;

    let output = run_broll_command(
        &env,
        &[
            "--output",
            "json",
            "check",
            "--transcript",
            &path_arg(&transcript),
            "--clips",
            &path_arg(&env.clips()),
            "--assignments",
            &path_arg(&assignments),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "check failed: {}", output.stderr);
    let events: Vec<serde_json::Value> = output
        .stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert!(events.iter().any(|event| {
        event["code"] == "broll.check.segment"
            && event["data"]["index"] == 2
            && event["data"]["clip"]
                .as_str()
                .is_some_and(|clip| clip.ends_with("harbor.mov"))
    }));

    Ok(())
}

#[test]
fn test_unknown_fit_policy_is_rejected() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;
    let assignments = write_file(
        &env.path().join("assign.toml"),
        "[[segment]]\nindex = 1\nfit = \"stretch\"\n",
    )?;

    let output = run_broll_command(
        &env,
        &[
            "check",
            "--transcript",
            &path_arg(&transcript),
            "--clips",
            &path_arg(&env.clips()),
            "--assignments",
            &path_arg(&assignments),
        ],
    )?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("unknown fit policy `stretch`"));

    Ok(())
}

#[test]
fn test_slots_cover_duration() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;
    let out = env.path().join("slots.srt");

    let output = run_broll_command(
        &env,
        &[
            "slots",
            "--duration",
            "20",
            "--from",
            &path_arg(&transcript),
            "-o",
            &path_arg(&out),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "slots failed: {}", output.stderr);

    let srt = read_file(&out)?;
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:07,000\n"));
    assert!(srt.contains("3\n00:00:14,000 --> 00:00:20,000\n[no narration]\n"));
    assert!(srt.contains("tankers"));
    assert!(srt.contains("high."));

    Ok(())
}

#[test]
fn test_slots_require_a_duration_source() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_broll_command(&env, &["slots"])?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("--duration"));
    Ok(())
}

#[test]
fn test_keywords_written_next_to_transcript() -> Result<()> {
    let env = TestEnvironment::new()?;
    let transcript = write_transcript(&env)?;

    let output = run_broll_command(
        &env,
        &["keywords", "--transcript", &path_arg(&transcript)],
    )?;
    assert_eq!(output.exit_code, 0, "keywords failed: {}", output.stderr);

    let keywords = read_file(&env.path().join("talk_keywords.txt"))?;
    assert!(keywords.starts_with("[Block 1]\noil tanker at sea\n"));
    assert!(keywords.contains("[Block 2]\nworld news visuals\n"));
    assert!(keywords.contains("[Block 3]\neconomic uncertainty\n"));
    assert_eq!(keywords.matches("[Block").count(), 3);

    Ok(())
}

#[test]
fn test_config_path_uses_config_home() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = run_broll_command(&env, &["config", "--path"])?;
    assert_eq!(output.exit_code, 0, "config failed: {}", output.stderr);
    assert_eq!(output.stdout.trim(), path_arg(&env.config_file()));

    let output = run_broll_command(&env, &["config"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("software_encoder = \"libx264\""));
    assert!(output.stdout.contains("aspect = \"16:9\""));

    Ok(())
}
