//! Per-post sentiment scoring.
//!
//! `SentimentModel` is the seam: anything that can turn text into polarity and
//! subjectivity can stand in for the lexicon scorer. The three-way label is
//! always derived from polarity by `Sentiment::from_polarity`, never by the model.

use crate::domain::Sentiment;
use crate::sentiment::lexicon::Lexicon;

/// Tokens after a negation that it still flips.
const NEGATION_WINDOW: usize = 3;
/// Polarity multiplier for a negated hit.
const NEGATION_FACTOR: f64 = -0.5;
/// Polarity multiplier for a hit directly followed by `!`.
const EXCLAMATION_FACTOR: f64 = 1.25;

/// Raw model output for one text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores {
    /// In `[0, 1]`.
    pub subjectivity: f64,
    /// In `[-1, 1]`.
    pub polarity: f64,
}

/// Scores plus the derived label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostScore {
    pub subjectivity: f64,
    pub polarity: f64,
    pub sentiment: Sentiment,
}

pub trait SentimentModel {
    /// Must not fail: degenerate text (empty, punctuation only) yields zeros.
    fn assess(&self, text: &str) -> Scores;

    fn score(&self, text: &str) -> PostScore {
        let Scores {
            subjectivity,
            polarity,
        } = self.assess(text);
        PostScore {
            subjectivity,
            polarity,
            sentiment: Sentiment::from_polarity(polarity),
        }
    }
}

/// Averages word-level assessments found in the lexicon.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer {
    lexicon: Lexicon,
}

impl LexiconScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }
}

impl SentimentModel for LexiconScorer {
    fn assess(&self, text: &str) -> Scores {
        let tokens = tokenize(text);

        let mut assessments: Vec<(f64, f64)> = Vec::new();
        let mut last_hit: Option<usize> = None;
        let mut last_negation: Option<usize> = None;

        for (i, token) in tokens.iter().enumerate() {
            if token == "!" {
                if let (Some(hit), Some(last)) = (last_hit, assessments.last_mut()) {
                    if hit + 1 == i {
                        last.0 *= EXCLAMATION_FACTOR;
                    }
                }
                continue;
            }

            if self.lexicon.is_negation(token) {
                last_negation = Some(i);
                continue;
            }

            let Some(entry) = self.lexicon.entry(token) else {
                continue;
            };

            let mut polarity = entry.polarity;
            let mut subjectivity = entry.subjectivity;

            if let Some(factor) = i.checked_sub(1).and_then(|prev| self.lexicon.intensity(&tokens[prev])) {
                polarity *= factor;
                subjectivity = (subjectivity * factor).min(1.0);
            }

            if last_negation.is_some_and(|n| i - n <= NEGATION_WINDOW) {
                polarity *= NEGATION_FACTOR;
            }

            assessments.push((polarity, subjectivity));
            last_hit = Some(i);
        }

        if assessments.is_empty() {
            return Scores::default();
        }

        let n = assessments.len() as f64;
        let polarity = assessments.iter().map(|(p, _)| p).sum::<f64>() / n;
        let subjectivity = assessments.iter().map(|(_, s)| s).sum::<f64>() / n;

        Scores {
            subjectivity: finite_or_zero(subjectivity).clamp(0.0, 1.0),
            polarity: finite_or_zero(polarity).clamp(-1.0, 1.0),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Lowercase word tokens (letters, digits, apostrophes); `!` is kept as its own token.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' || ch == '\u{2019}' {
            let ch = if ch == '\u{2019}' { '\'' } else { ch };
            current.extend(ch.to_lowercase());
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if ch == '!' {
            tokens.push("!".to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> LexiconScorer {
        LexiconScorer::default()
    }

    #[test]
    fn degenerate_text_is_neutral_zero() {
        for text in ["", "   ", "?!.,;", "check", "Bitcoin"] {
            let s = scorer().score(text);
            assert_eq!(s.polarity, 0.0, "{text:?}");
            assert_eq!(s.subjectivity, 0.0, "{text:?}");
            assert_eq!(s.sentiment, Sentiment::Neutral, "{text:?}");
        }
    }

    #[test]
    fn moon_is_positive_and_crash_is_negative() {
        let up = scorer().score("Bitcoin to the moon!");
        assert!(up.polarity > 0.0);
        assert_eq!(up.sentiment, Sentiment::Positive);

        let down = scorer().score("Bitcoin crashing, bad day");
        assert!(down.polarity < 0.0);
        assert_eq!(down.sentiment, Sentiment::Negative);
    }

    #[test]
    fn exclamation_strengthens_preceding_hit() {
        let plain = scorer().assess("good");
        let loud = scorer().assess("good!");
        assert!((loud.polarity - plain.polarity * EXCLAMATION_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn negation_flips_and_dampens() {
        let plain = scorer().assess("good");
        let negated = scorer().assess("not good");
        assert!((negated.polarity - plain.polarity * NEGATION_FACTOR).abs() < 1e-12);

        let contracted = scorer().assess("it isn't very good");
        assert!(contracted.polarity < 0.0);

        // Too far away to apply.
        let far = scorer().assess("not that it was a good");
        assert!(far.polarity > 0.0);
    }

    #[test]
    fn intensifier_scales_next_hit() {
        let plain = scorer().assess("good");
        let strong = scorer().assess("very good");
        assert!((strong.polarity - plain.polarity * 1.3).abs() < 1e-12);
        assert!(strong.subjectivity <= 1.0);
    }

    #[test]
    fn scores_stay_in_range() {
        let s = scorer().assess("absolutely awesome! absolutely wonderful! absolutely excellent!");
        assert!(s.polarity <= 1.0 && s.polarity > 0.0);
        assert!((0.0..=1.0).contains(&s.subjectivity));
    }

    #[test]
    fn averages_mixed_assessments() {
        // good = 0.7, bad = -0.7
        let s = scorer().assess("good and bad");
        assert!(s.polarity.abs() < 1e-12);
        assert_eq!(Sentiment::from_polarity(s.polarity), Sentiment::Neutral);
    }

    #[test]
    fn tokenizer_keeps_apostrophes_and_bangs() {
        assert_eq!(tokenize("Don't SELL!!"), vec!["don't", "sell", "!", "!"]);
        assert_eq!(tokenize("it\u{2019}s"), vec!["it's"]);
    }
}
