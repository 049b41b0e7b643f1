//! Keyword tone heuristic.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Tone assessment on a 0-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub current_tone: String,
    #[serde(default = "default_recommended")]
    pub recommended_tone: String,
    pub score: f32,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

fn default_recommended() -> String {
    "professional".to_string()
}

fn count(pattern: &str, text: &str) -> usize {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|re: Regex| re.find_iter(text).count())
        .unwrap_or(0)
}

/// Classifies tone from marker word counts.
pub fn heuristic_tone(email: &str) -> ToneAnalysis {
    let casual = count(r"\b(hi|hey|thanks|btw)\b", email);
    let formal = count(r"\b(dear|sincerely|respectfully|kindly)\b", email);
    let aggressive = count(r"\b(must|immediately|urgent|asap)\b", email);
    let apologetic = count(r"\b(sorry|apologi[sz]e)\b", email);

    let (current_tone, score) = if aggressive > 2 {
        ("aggressive", 4.0)
    } else if apologetic > 3 {
        ("overly apologetic", 5.5)
    } else if casual > formal {
        ("casual", 6.0)
    } else if formal > casual {
        ("formal", 8.5)
    } else {
        ("professional", 7.5)
    };

    let mut issues = Vec::new();
    let mut improvements = Vec::new();
    if aggressive > 0 {
        issues.push("Pushy wording".to_string());
        improvements.push("Prefer \"We kindly request\" over demands".to_string());
    }
    if apologetic > 3 {
        issues.push("Repeated apologies".to_string());
        improvements.push("One sincere apology is enough".to_string());
    }
    if casual > 3 {
        issues.push("Too casual for business correspondence".to_string());
        improvements.push("Open with \"Dear\" and a formal greeting".to_string());
    }

    ToneAnalysis {
        current_tone: current_tone.to_string(),
        recommended_tone: default_recommended(),
        score,
        issues,
        improvements,
    }
}
