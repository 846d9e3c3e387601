//! Fixed-length re-slotting of a transcript.
//!
//! The narration is cut into slots of equal length (the last one may be
//! shorter) and the transcript text is poured into them by timestamp overlap.
//! Words are never dropped: text without usable timestamps ends up in the
//! final slot.

use std::time::Duration;

use anyhow::{Result, bail};
use lazy_static::lazy_static;
use regex::Regex;

use super::srt::SrtCue;

pub const DEFAULT_SLOT_SECONDS: f64 = 7.0;
/// Cue ends are extended by this much so trailing words are not cut off.
pub const CUE_END_PAD_SECONDS: f64 = 0.35;
pub const EMPTY_SLOT_TEXT: &str = "[no narration]";

const EPSILON: f64 = 1e-6;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
    static ref SPACE_BEFORE_PUNCTUATION: Regex =
        Regex::new(r"\s+([,.!?])").expect("valid punctuation regex");
}

/// Transcript text with optional timing, as produced by a recognizer or
/// read from an SRT.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedText {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
}

impl From<&SrtCue> for TimedText {
    fn from(cue: &SrtCue) -> Self {
        Self {
            start: Some(cue.start.as_secs_f64()),
            end: Some(cue.end.as_secs_f64()),
            text: cue.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub start: f64,
    pub end: f64,
    pub texts: Vec<String>,
}

impl Slot {
    pub fn text(&self) -> String {
        clean_text(&self.texts.join(" "))
    }
}

/// Collapse whitespace and drop spaces before punctuation.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text.trim(), " ");
    SPACE_BEFORE_PUNCTUATION
        .replace_all(&collapsed, "$1")
        .into_owned()
}

/// Empty slots covering `[0, duration)`.
pub fn build_slots(duration: f64, slot_seconds: f64) -> Result<Vec<Slot>> {
    if !(slot_seconds.is_finite() && slot_seconds > 0.0) {
        bail!("slot length must be positive, got {slot_seconds}");
    }
    if !duration.is_finite() || duration < 0.0 {
        bail!("narration duration must be a non-negative number, got {duration}");
    }

    let mut slots = Vec::new();
    let mut start = 0.0;
    while start < duration - EPSILON {
        let end = (start + slot_seconds).min(duration);
        slots.push(Slot {
            start,
            end,
            texts: Vec::new(),
        });
        start = end;
    }
    Ok(slots)
}

/// Build slots and distribute `items` over them.
pub fn fill_slots(
    items: &[TimedText],
    duration: f64,
    slot_seconds: f64,
    end_pad: f64,
) -> Result<Vec<Slot>> {
    let mut slots = build_slots(duration, slot_seconds)?;
    if slots.is_empty() {
        return Ok(slots);
    }

    let last = slots.len() - 1;
    let mut untimed = Vec::new();

    for item in items {
        let text = clean_text(&item.text);
        if text.is_empty() {
            continue;
        }

        let (start, end) = match (item.start, item.end) {
            (Some(start), Some(end)) if end > start => (start, end),
            _ => {
                untimed.push(text);
                continue;
            }
        };
        let end = (end + end_pad).min(duration);

        let first_slot = ((start.max(0.0) / slot_seconds) as usize).min(last);
        let last_slot = (((end - EPSILON).max(0.0) / slot_seconds) as usize).min(last);
        let indices: Vec<usize> = (first_slot..=last_slot.max(first_slot)).collect();

        let overlaps: Vec<f64> = indices
            .iter()
            .map(|&index| {
                let slot = &slots[index];
                (end.min(slot.end) - start.max(slot.start)).max(0.0)
            })
            .collect();

        let words: Vec<&str> = text.split_whitespace().collect();
        let chunks = allocate_words_by_overlaps(&words, &overlaps);
        for (index, chunk) in indices.into_iter().zip(chunks) {
            if !chunk.is_empty() {
                slots[index].texts.push(chunk.join(" "));
            }
        }
    }

    if !untimed.is_empty() {
        slots[last].texts.push(untimed.join(" "));
    }
    Ok(slots)
}

/// Split `words` into `overlaps.len()` sequential chunks sized in proportion
/// to the overlaps. Order is preserved and the last chunk takes whatever is
/// left, so no word is lost.
pub fn allocate_words_by_overlaps<'a>(words: &[&'a str], overlaps: &[f64]) -> Vec<Vec<&'a str>> {
    let count = overlaps.len();
    if count == 0 {
        return Vec::new();
    }
    let mut chunks = vec![Vec::new(); count];
    if words.is_empty() {
        return chunks;
    }

    let total: f64 = overlaps.iter().sum();
    if total <= 0.0 {
        chunks[count - 1] = words.to_vec();
        return chunks;
    }

    let mut targets: Vec<usize> = overlaps
        .iter()
        .map(|overlap| (words.len() as f64 * (overlap / total)).round() as usize)
        .collect();

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| overlaps[b].total_cmp(&overlaps[a]));

    let mut assigned: usize = targets.iter().sum();
    let mut cursor = 0;
    while assigned != words.len() {
        let slot = order[cursor % count];
        if assigned < words.len() {
            targets[slot] += 1;
            assigned += 1;
        } else if targets[slot] > 0 {
            targets[slot] -= 1;
            assigned -= 1;
        }
        cursor += 1;
    }

    let mut position = 0;
    for (index, chunk) in chunks.iter_mut().enumerate() {
        if index == count - 1 {
            *chunk = words[position..].to_vec();
        } else {
            let take = targets[index].min(words.len() - position);
            *chunk = words[position..position + take].to_vec();
            position += take;
        }
    }
    chunks
}

/// SRT cues for the slots, numbered 1..N, with a placeholder for silence.
pub fn slots_to_cues(slots: &[Slot]) -> Vec<SrtCue> {
    slots
        .iter()
        .enumerate()
        .map(|(position, slot)| {
            let text = slot.text();
            SrtCue {
                index: position + 1,
                start: Duration::from_secs_f64(slot.start),
                end: Duration::from_secs_f64(slot.end),
                text: if text.is_empty() {
                    EMPTY_SLOT_TEXT.to_string()
                } else {
                    text
                },
            }
        })
        .collect()
}
