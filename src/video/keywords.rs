//! Stock-footage search phrases for transcript blocks.

use super::slots::{EMPTY_SLOT_TEXT, clean_text};
use super::srt::SrtCue;

pub const MAX_PHRASES: usize = 5;

struct Topic {
    triggers: &'static [&'static str],
    phrases: &'static [&'static str],
}

const TOPICS: &[Topic] = &[
    Topic {
        triggers: &["oil", "tanker", "pipeline", "barrel", "refinery"],
        phrases: &[
            "oil tanker at sea",
            "cargo ship ocean",
            "energy supply chain",
            "global shipping trade",
        ],
    },
    Topic {
        triggers: &["military", "missile", "jet", "airstrike", "troops"],
        phrases: &[
            "fighter jets in sky",
            "military aircraft runway",
            "soldiers training",
            "defense forces visuals",
        ],
    },
    Topic {
        triggers: &["economy", "inflation", "prices", "recession", "market"],
        phrases: &[
            "economic uncertainty",
            "financial charts abstract",
            "cost of living visuals",
            "city business district",
        ],
    },
    Topic {
        triggers: &["government", "sanctions", "policy", "law", "officials"],
        phrases: &[
            "government building exterior",
            "international relations visuals",
            "press conference podium",
            "capitol city skyline",
        ],
    },
];

const GENERIC_PHRASES: &[&str] = &[
    "world news visuals",
    "serious documentary b-roll",
    "global affairs imagery",
    "city skyline night",
];

const SILENCE_PHRASES: &[&str] = &[
    "ambient b-roll",
    "city skyline",
    "hands typing",
    "soft abstract background",
    "nature scenery",
];

/// Phrases for one block of narration. Triggers match anywhere in the
/// lowercased text, topics contribute in a fixed order and the list is
/// capped at [`MAX_PHRASES`].
pub fn suggest_keywords(text: &str) -> Vec<&'static str> {
    let text = clean_text(text);
    if text.is_empty() || text == EMPTY_SLOT_TEXT {
        return SILENCE_PHRASES.to_vec();
    }

    let lowered = text.to_lowercase();
    let mut phrases: Vec<&'static str> = Vec::new();
    for topic in TOPICS {
        if topic.triggers.iter().any(|word| lowered.contains(word)) {
            for &phrase in topic.phrases {
                if !phrases.contains(&phrase) {
                    phrases.push(phrase);
                }
            }
        }
    }
    if phrases.is_empty() {
        phrases.extend_from_slice(GENERIC_PHRASES);
    }

    phrases.truncate(MAX_PHRASES);
    phrases
}

/// One `[Block i]` section per cue, so block numbers line up with the SRT.
pub fn render_keyword_blocks(cues: &[SrtCue]) -> String {
    let mut output = String::new();
    for (position, cue) in cues.iter().enumerate() {
        output.push_str(&format!("[Block {}]\n", position + 1));
        for phrase in suggest_keywords(&cue.text) {
            output.push_str(phrase);
            output.push('\n');
        }
        output.push('\n');
    }
    output
}
