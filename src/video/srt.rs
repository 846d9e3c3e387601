use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct SrtCue {
    /// Index as written in the file (0 when the line was missing or invalid).
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

pub fn read_srt(path: &Path) -> Result<Vec<SrtCue>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    parse_srt(&contents).with_context(|| format!("Failed to parse transcript {}", path.display()))
}

/// Parse cues in file order. Cue order is never changed; callers renumber.
pub fn parse_srt(input: &str) -> Result<Vec<SrtCue>> {
    let input = input.trim_start_matches('\u{feff}');
    let mut cues = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let first = line.trim();
        if first.is_empty() {
            continue;
        }

        // Index line can sometimes be omitted
        let (index, times) = if first.contains("-->") {
            (0, first)
        } else {
            let times = lines
                .next()
                .map(str::trim)
                .with_context(|| format!("SRT cue `{first}` is missing a timestamp line"))?;
            (first.parse::<usize>().unwrap_or(0), times)
        };

        let (start_raw, end_raw) = times
            .split_once("-->")
            .map(|(a, b)| (a.trim(), b.trim()))
            .context("SRT cue timestamp line must contain '-->'")?;

        let start = parse_timestamp(start_raw)
            .with_context(|| format!("Failed to parse SRT start timestamp '{start_raw}'"))?;
        let end = parse_timestamp(end_raw)
            .with_context(|| format!("Failed to parse SRT end timestamp '{end_raw}'"))?;

        if end <= start {
            bail!("SRT cue must end after it starts: {start_raw} --> {end_raw}");
        }

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text_lines.push(next.trim().to_string());
            lines.next();
        }

        cues.push(SrtCue {
            index,
            start,
            end,
            text: text_lines.join(" "),
        });
    }

    Ok(cues)
}

fn parse_timestamp(value: &str) -> Result<Duration> {
    let cleaned = value.trim().replace(',', ".");
    let mut parts = cleaned.split('.');
    let time_part = parts
        .next()
        .context("Timestamp is missing time component (HH:MM:SS)")?;
    let fractional_part = parts.next().unwrap_or("0");

    let mut hms = time_part.split(':');
    let hours = hms
        .next()
        .context("Timestamp missing hours")?
        .parse::<u64>()
        .context("Invalid hours in timestamp")?;
    let minutes = hms
        .next()
        .context("Timestamp missing minutes")?
        .parse::<u64>()
        .context("Invalid minutes in timestamp")?;
    let seconds = hms
        .next()
        .context("Timestamp missing seconds")?
        .parse::<u64>()
        .context("Invalid seconds in timestamp")?;

    if hms.next().is_some() {
        bail!("Timestamp has more than three components: {value}");
    }

    let mut millis_str: String = fractional_part.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis = millis_str
        .parse::<u64>()
        .context("Invalid millisecond component in timestamp")?;

    let total_seconds = hours * 3600 + minutes * 60 + seconds;
    Ok(Duration::from_secs(total_seconds) + Duration::from_millis(millis))
}

/// Format seconds as `HH:MM:SS,mmm`.
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Serialize cues as SRT, numbering them 1..N.
pub fn write_srt(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for (idx, cue) in cues.iter().enumerate() {
        let _ = writeln!(out, "{}", idx + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(cue.start.as_secs_f64()),
            format_timestamp(cue.end.as_secs_f64())
        );
        let _ = writeln!(out, "{}", cue.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_srt() {
        let input = "1\n00:00:01,000 --> 00:00:03,500\nHello world!\n\n2\n00:00:04,000 --> 00:00:05,000\nNext line\n";
        let cues = parse_srt(input).expect("parse srt");
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hello world!");
        assert_eq!(cues[0].end.as_millis(), 3500);
        assert_eq!(cues[1].start.as_millis(), 4000);
    }

    #[test]
    fn keeps_file_order_and_joins_multiline_text() {
        let input = "7\n00:00:10,000 --> 00:00:12,000\nsecond\nline two\n\n3\n00:00:00,000 --> 00:00:10,000\nfirst\n";
        let cues = parse_srt(input).unwrap();
        assert_eq!(cues[0].index, 7);
        assert_eq!(cues[0].text, "second line two");
        assert_eq!(cues[1].start, Duration::ZERO);
    }

    #[test]
    fn rejects_zero_length_cues() {
        let input = "1\n00:00:02,000 --> 00:00:02,000\nnothing\n";
        assert!(parse_srt(input).is_err());
    }

    #[test]
    fn accepts_missing_index_and_bom() {
        let input = "\u{feff}00:00:00,500 --> 00:00:01,250\nhi\n";
        let cues = parse_srt(input).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start.as_millis(), 500);
        assert_eq!(cues[0].end.as_millis(), 1250);
    }

    #[test]
    fn formats_timestamps_with_millisecond_carry() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(7.0), "00:00:07,000");
        assert_eq!(format_timestamp(3661.9996), "01:01:02,000");
    }

    #[test]
    fn written_srt_parses_back() {
        let cues = vec![SrtCue {
            index: 4,
            start: Duration::from_millis(1500),
            end: Duration::from_millis(8250),
            text: "[no narration]".to_string(),
        }];
        let text = write_srt(&cues);
        assert!(text.starts_with("1\n00:00:01,500 --> 00:00:08,250\n"));
        let parsed = parse_srt(&text).unwrap();
        assert_eq!(parsed[0].end, cues[0].end);
    }
}
