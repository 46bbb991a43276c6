//! Lexicon-based polarity scoring.
//!
//! Each known word carries a valence. A negator within the three preceding
//! words flips and dampens it, an intensifier directly before it boosts it,
//! and exclamation marks amplify the total. The raw sum is squashed into
//! [-1, 1] with `x / sqrt(x^2 + 15)`.

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_FACTOR: f64 = -0.74;
const INTENSIFIER_BOOST: f64 = 0.293;
const EXCLAMATION_BOOST: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const NEGATION_SCOPE: usize = 3;

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("love", 3.2),
    ("loved", 2.9),
    ("amazing", 2.8),
    ("wonderful", 2.7),
    ("awesome", 3.1),
    ("excellent", 3.2),
    ("fantastic", 2.6),
    ("great", 3.1),
    ("delicious", 2.7),
    ("beautiful", 2.9),
    ("happy", 2.7),
    ("joy", 2.8),
    ("excited", 2.2),
    ("exciting", 2.2),
    ("enjoy", 2.2),
    ("fun", 2.3),
    ("glad", 2.0),
    ("good", 1.9),
    ("nice", 1.8),
    ("best", 3.2),
    ("better", 1.9),
    ("helpful", 1.8),
    ("easy", 1.9),
    ("simple", 1.0),
    ("calm", 1.3),
    ("peaceful", 2.2),
    ("grateful", 2.0),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("inspire", 2.0),
    ("inspiring", 2.2),
    ("kind", 2.4),
    ("healthy", 1.7),
    ("hope", 1.9),
    ("welcome", 2.0),
    ("perfect", 2.7),
    ("recommend", 1.5),
    ("support", 1.7),
    ("progress", 1.6),
    ("growth", 1.6),
    ("fresh", 1.3),
    ("yay", 2.4),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("hate", -2.7),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("horrible", -2.5),
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("sad", -2.1),
    ("angry", -2.3),
    ("annoying", -1.7),
    ("boring", -1.3),
    ("difficult", -1.5),
    ("hard", -0.4),
    ("fail", -2.5),
    ("failed", -2.3),
    ("failure", -2.3),
    ("mistake", -1.4),
    ("mistakes", -1.5),
    ("problem", -1.7),
    ("problems", -1.7),
    ("wrong", -2.1),
    ("stress", -1.8),
    ("stressed", -1.4),
    ("anxious", -1.0),
    ("worried", -1.2),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("pain", -2.3),
    ("sorry", -0.3),
    ("unfortunately", -1.3),
    ("waste", -1.8),
    ("toxic", -2.2),
    ("ugly", -2.3),
    ("tired", -1.9),
    ("guilty", -1.8),
    ("overwhelmed", -1.5),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "cannot", "can't",
    "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "won't", "wouldn't", "shouldn't",
];

const INTENSIFIERS: &[&str] = &[
    "very",
    "really",
    "so",
    "totally",
    "extremely",
    "incredibly",
    "absolutely",
    "super",
    "truly",
    "definitely",
];

const POSITIVE_EMOJI: &[char] = &['😊', '🌱', '💚', '✨', '🧘', '🌿', '🙌', '❤'];
const EMOJI_VALENCE: f64 = 1.5;

fn valence(word: &str) -> Option<f64> {
    POSITIVE_WORDS
        .iter()
        .chain(NEGATIVE_WORDS.iter())
        .find(|(w, _)| *w == word)
        .map(|(_, v)| *v)
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Polarity of `text` in [-1, 1]. Text without sentiment words is 0.0.
pub fn polarity(text: &str) -> f64 {
    let tokens = tokenize(text);
    let mut total = 0.0;

    for (i, token) in tokens.iter().enumerate() {
        let Some(mut score) = valence(token) else {
            continue;
        };

        if i > 0 && INTENSIFIERS.contains(&tokens[i - 1].as_str()) {
            score += INTENSIFIER_BOOST * score.signum();
        }

        let scope_start = i.saturating_sub(NEGATION_SCOPE);
        if tokens[scope_start..i]
            .iter()
            .any(|t| NEGATORS.contains(&t.as_str()) || t.ends_with("n't"))
        {
            score *= NEGATION_FACTOR;
        }

        total += score;
    }

    total += text.chars().filter(|c| POSITIVE_EMOJI.contains(c)).count() as f64 * EMOJI_VALENCE;

    if total == 0.0 {
        return 0.0;
    }

    let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS) as f64;
    total += exclamations * EXCLAMATION_BOOST * total.signum();

    (total / (total * total + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_neutral() {
        assert_eq!(polarity(""), 0.0);
        assert_eq!(polarity("   "), 0.0);
    }

    #[test]
    fn test_no_sentiment_words_is_neutral() {
        assert_eq!(polarity("The recipe uses lentils and rice."), 0.0);
    }

    #[test]
    fn test_positive_text() {
        let score = polarity("I love this recipe, it is delicious and easy!");
        assert!(score > 0.5, "score was {}", score);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_negative_text() {
        let score = polarity("That was a terrible, awful mistake.");
        assert!(score < -0.5, "score was {}", score);
        assert!(score >= -1.0);
    }

    #[test]
    fn test_negation_flips_polarity() {
        assert!(polarity("this is good") > 0.0);
        assert!(polarity("this is not good") < 0.0);
        assert!(polarity("I don't hate it") > 0.0);
    }

    #[test]
    fn test_intensifier_and_exclamation_amplify() {
        let plain = polarity("this is good");
        let intensified = polarity("this is really good");
        let exclaimed = polarity("this is good!!");
        assert!(intensified > plain);
        assert!(exclaimed > plain);
    }

    #[test]
    fn test_emoji_counts_as_positive() {
        assert!(polarity("🌱💚") > 0.0);
    }

    #[test]
    fn test_bounded_for_long_text() {
        let text = "amazing wonderful excellent ".repeat(200);
        let score = polarity(&text);
        assert!(score > 0.99 && score <= 1.0);
    }
}
