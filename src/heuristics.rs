//! Keyword rubric scores, reported next to the semantic scores.

use crate::models::RuleScores;

const PERSONA_MARKERS: &[&str] = &["I've been", "Let's", "What I've learned", "journey", "experiment"];
const PERSONAL_INDICATORS: &[&str] = &["I", "my", "me", "personally"];
const BRAND_KEYWORDS: &[&str] = &[
    "sustainable",
    "eco",
    "plant-based",
    "mindful",
    "yoga",
    "environment",
    "conscious",
];
const PERSONA_EMOJI: &[&str] = &["😊", "🌱", "💚", "✨", "🧘", "🌿"];
const CONVERSATIONAL_WORDS: &[&str] = &["really", "totally", "honestly", "actually", "definitely"];

const MAX_SCORE: f64 = 100.0;

fn count_present(haystack: &str, needles: &[&str]) -> usize {
    needles
        .iter()
        .filter(|needle| haystack.contains(&needle.to_lowercase()))
        .count()
}

/// Character consistency: persona phrases and expected themes
pub fn consistency(response: &str, expected_themes: &[String]) -> f64 {
    let lower = response.to_lowercase();
    let mut score = 70.0;

    score += 5.0 * count_present(&lower, PERSONA_MARKERS) as f64;
    score += 3.0
        * expected_themes
            .iter()
            .filter(|theme| lower.contains(&theme.to_lowercase()))
            .count() as f64;

    score.min(MAX_SCORE)
}

/// Engagement: questions, personal touch and a conversational length
pub fn engagement(response: &str) -> f64 {
    let lower = response.to_lowercase();
    let mut score = 60.0;

    let questions = response.matches('?').count() as f64;
    score += (questions * 10.0).min(30.0);

    score += 2.0 * count_present(&lower, PERSONAL_INDICATORS) as f64;

    let word_count = response.split_whitespace().count();
    if (20..=100).contains(&word_count) {
        score += 10.0;
    }

    score.min(MAX_SCORE)
}

/// Alignment with the sustainable-living brand
pub fn brand_alignment(response: &str) -> f64 {
    let lower = response.to_lowercase();
    (70.0 + 5.0 * count_present(&lower, BRAND_KEYWORDS) as f64).min(MAX_SCORE)
}

/// How natural and human the response reads
pub fn authenticity(response: &str) -> f64 {
    let lower = response.to_lowercase();
    let mut score = 75.0;

    if response.contains('!') {
        score += 5.0;
    }
    if PERSONA_EMOJI.iter().any(|emoji| response.contains(emoji)) {
        score += 10.0;
    }
    score += 3.0 * count_present(&lower, CONVERSATIONAL_WORDS) as f64;

    score.min(MAX_SCORE)
}

pub fn score_all(response: &str, expected_themes: &[String]) -> RuleScores {
    RuleScores {
        consistency: consistency(response, expected_themes),
        engagement: engagement(response),
        brand_alignment: brand_alignment(response),
        authenticity: authenticity(response),
    }
}
