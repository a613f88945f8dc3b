//! Keyword-based intent classification.
//!
//! Classification is an ordered list of substring predicates with
//! first-match-wins precedence. Overlapping keyword sets make the result
//! order-dependent, and that ordering is deliberate: Emergency is checked
//! before Navigation and Dining so a safety-relevant utterance is never
//! shadowed by a convenience match, while Translation and CulturalInquiry
//! come first because their lexical patterns are unambiguous.

use serde::{Deserialize, Serialize};

/// The classified purpose of a user utterance. Closed set; derived per turn
/// and never stored beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Translation,
    CulturalInquiry,
    Emergency,
    Navigation,
    Dining,
    Transportation,
    General,
}

const CULTURAL_KEYWORDS: &[&str] = &["custom", "culture", "etiquette"];
const EMERGENCY_KEYWORDS: &[&str] = &["emergency", "help", "urgent"];
const NAVIGATION_KEYWORDS: &[&str] = &["where", "direction", "navigate"];
const DINING_KEYWORDS: &[&str] = &["food", "restaurant", "eat"];
const TRANSPORT_KEYWORDS: &[&str] = &["transport", "taxi", "bus"];

fn any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

impl Intent {
    /// Classifies a raw transcript. Pure; no error condition — empty or
    /// unmatched input always falls through to `General`.
    pub fn classify(transcript: &str) -> Intent {
        let text = transcript.to_lowercase();

        if text.contains("say") && text.contains("in") {
            Intent::Translation
        } else if any(&text, CULTURAL_KEYWORDS) {
            Intent::CulturalInquiry
        } else if any(&text, EMERGENCY_KEYWORDS) {
            Intent::Emergency
        } else if any(&text, NAVIGATION_KEYWORDS) {
            Intent::Navigation
        } else if any(&text, DINING_KEYWORDS) {
            Intent::Dining
        } else if any(&text, TRANSPORT_KEYWORDS) {
            Intent::Transportation
        } else {
            Intent::General
        }
    }
}
